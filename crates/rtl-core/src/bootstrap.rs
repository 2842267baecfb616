//! One-shot "observe until the target exists, then rewire".

use rtl_dom::{Document, MutationRecord, NodeId, ObserveError, ObserverId, ObserverOptions};
use tracing::{debug, info};

/// Finds the awaited descendant of the watch root, if it exists yet.
pub type Locator = Box<dyn Fn(&Document, NodeId) -> Option<NodeId>>;

/// Locate the first element with tag `tag` below the watch root.
pub fn locate_by_tag(tag: impl Into<String>) -> Locator {
    let tag = tag.into();
    Box::new(move |doc: &Document, watch_root: NodeId| doc.find_first_by_tag(watch_root, &tag))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// Subscribed to the watch root; the target has not been seen.
    WaitingForTarget { observer: ObserverId },
    /// The target was found and the subscription is gone. Terminal.
    Attached { target: NodeId },
}

/// Watches an ancestor until the awaited descendant appears, then
/// unsubscribes. Transitions to [`BootstrapState::Attached`] exactly once.
pub struct BootstrapObserver {
    locate: Locator,
    watch_root: NodeId,
    state: BootstrapState,
}

impl std::fmt::Debug for BootstrapObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapObserver")
            .field("watch_root", &self.watch_root)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl BootstrapObserver {
    /// Check for the target once, eagerly, and subscribe to `watch_root`
    /// only if it is missing. The second tuple field is the hand-off target
    /// when it already exists.
    pub fn observe_until(
        doc: &mut Document,
        watch_root: NodeId,
        locate: Locator,
    ) -> Result<(Self, Option<NodeId>), ObserveError> {
        if let Some(target) = locate(doc, watch_root) {
            info!(?target, "bootstrap target present at start");
            let observer = Self {
                locate,
                watch_root,
                state: BootstrapState::Attached { target },
            };
            return Ok((observer, Some(target)));
        }

        let observer = doc.observe(watch_root, ObserverOptions::child_list_subtree())?;
        debug!(?watch_root, ?observer, "bootstrap waiting for target");
        Ok((
            Self {
                locate,
                watch_root,
                state: BootstrapState::WaitingForTarget { observer },
            },
            None,
        ))
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// The live subscription, while waiting.
    pub fn observer(&self) -> Option<ObserverId> {
        match self.state {
            BootstrapState::WaitingForTarget { observer } => Some(observer),
            BootstrapState::Attached { .. } => None,
        }
    }

    /// Handle one batch from the watch root. Returns the target the first
    /// time it is found and `None` on every other call.
    pub fn on_batch(&mut self, doc: &mut Document, batch: &[MutationRecord]) -> Option<NodeId> {
        let BootstrapState::WaitingForTarget { observer } = self.state else {
            return None;
        };
        if batch.is_empty() {
            return None;
        }
        let target = (self.locate)(doc, self.watch_root)?;
        doc.disconnect(observer);
        self.state = BootstrapState::Attached { target };
        info!(?target, records = batch.len(), "bootstrap target appeared");
        Some(target)
    }
}
