use rtl_config::RtlConfig;
use rtl_dom::{Document, MutationRecord, NodeId, ObserveError};
use tracing::{debug, info, warn};

use crate::{
    bootstrap::{BootstrapObserver, locate_by_tag},
    direction::DirectionPolicy,
    enabled::{EnabledStore, GlobalToggle, ToggleMessage},
    observer::ContinuousObserver,
    router::{MutationRouter, RouteReport},
    scanner::scan,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// [`RtlSession::start`] has not run.
    Idle,
    /// Bootstrap observer is waiting for the target subtree.
    Waiting,
    /// Continuous observation of `target` is active.
    Attached { target: NodeId },
}

/// What one [`RtlSession::pump`] delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Batches handed to the bootstrap observer or the router.
    pub batches: usize,
    /// Whether this pump attached the continuous observer.
    pub handed_off: bool,
    pub routed: RouteReport,
}

/// The content-script wiring: bootstrap, continuous observation, routing
/// and the global enabled flag, over one [`Document`].
#[derive(Debug)]
pub struct RtlSession {
    router: MutationRouter,
    global: GlobalToggle,
    bootstrap_tag: String,
    target_tag: String,
    bootstrap: Option<BootstrapObserver>,
    continuous: Option<ContinuousObserver>,
    handoffs: usize,
}

impl Default for RtlSession {
    fn default() -> Self {
        Self::new(&RtlConfig::default())
    }
}

impl RtlSession {
    pub fn new(config: &RtlConfig) -> Self {
        Self {
            router: MutationRouter::new(DirectionPolicy::from_config(config)),
            global: GlobalToggle::new(config.marker.global_class.clone()),
            bootstrap_tag: config.observe.bootstrap_tag.clone(),
            target_tag: config.observe.target_tag.clone(),
            bootstrap: None,
            continuous: None,
            handoffs: 0,
        }
    }

    pub fn router(&self) -> &MutationRouter {
        &self.router
    }

    pub fn state(&self) -> SessionState {
        match (&self.continuous, &self.bootstrap) {
            (Some(continuous), _) => SessionState::Attached {
                target: continuous.target(),
            },
            (None, Some(_)) => SessionState::Waiting,
            (None, None) => SessionState::Idle,
        }
    }

    /// How many times the continuous observer was attached. Never above one.
    pub fn handoffs(&self) -> usize {
        self.handoffs
    }

    /// Install the bootstrap observer. If the target already exists the
    /// hand-off happens immediately. Calling `start` twice is a no-op.
    pub fn start(&mut self, doc: &mut Document) -> Result<(), ObserveError> {
        if self.bootstrap.is_some() {
            return Ok(());
        }
        let watch_root = doc
            .find_first_by_tag(doc.root(), &self.bootstrap_tag)
            .unwrap_or_else(|| doc.root());
        let (bootstrap, found) = BootstrapObserver::observe_until(
            doc,
            watch_root,
            locate_by_tag(self.target_tag.clone()),
        )?;
        self.bootstrap = Some(bootstrap);
        if let Some(target) = found {
            self.hand_off(doc, target)?;
        }
        Ok(())
    }

    /// Deliver every queued batch in order: the bootstrap observer's first,
    /// then the continuous observer's. Repeats until both queues are empty.
    pub fn pump(&mut self, doc: &mut Document) -> Result<PumpReport, ObserveError> {
        let mut report = PumpReport::default();
        loop {
            let mut delivered = false;

            let waiting = self.bootstrap.as_ref().and_then(BootstrapObserver::observer);
            if let Some(observer) = waiting {
                let batch = doc.take_records(observer);
                if !batch.is_empty() {
                    delivered = true;
                    report.batches += 1;
                    let found = self
                        .bootstrap
                        .as_mut()
                        .and_then(|bootstrap| bootstrap.on_batch(doc, &batch));
                    if let Some(target) = found {
                        self.hand_off(doc, target)?;
                        report.handed_off = true;
                    }
                }
            }

            if let Some(continuous) = self.continuous
                && let Some(routed) = continuous.deliver(doc, &self.router)
            {
                delivered = true;
                report.batches += 1;
                report.routed.merge(routed);
            }

            if !delivered {
                break;
            }
        }
        Ok(report)
    }

    /// Route one batch synchronously. The scheduling of batches is the
    /// caller's business.
    pub fn handle_batch(&self, doc: &mut Document, batch: &[MutationRecord]) -> RouteReport {
        self.router.route(doc, batch)
    }

    /// Read the stored flag and apply it. A failed read logs and continues
    /// as disabled without writing the store.
    pub async fn init_enabled<S: EnabledStore>(&self, doc: &mut Document, store: &S) -> bool {
        match store.load().await {
            Ok(enabled) => {
                self.set_enabled(doc, store, enabled).await;
                enabled
            }
            Err(error) => {
                warn!(%error, "failed to read enabled flag; continuing disabled");
                self.global.apply(doc, false);
                false
            }
        }
    }

    /// Handle an inbound toggle message. Returns the applied value, or
    /// `None` when the message is not a toggle.
    pub async fn handle_message<S: EnabledStore>(
        &self,
        doc: &mut Document,
        store: &S,
        raw: &str,
    ) -> Option<bool> {
        let ToggleMessage { enabled } = ToggleMessage::parse(raw)?;
        self.set_enabled(doc, store, enabled).await;
        Some(enabled)
    }

    /// Apply the global class now, then persist. Persist failures are logged.
    pub async fn set_enabled<S: EnabledStore>(
        &self,
        doc: &mut Document,
        store: &S,
        enabled: bool,
    ) {
        self.global.apply(doc, enabled);
        debug!(enabled, "global toggle applied");
        if let Err(error) = store.save(enabled).await {
            warn!(%error, enabled, "failed to persist enabled flag");
        }
    }

    pub fn is_enabled(&self, doc: &Document) -> bool {
        self.global.is_enabled(doc)
    }

    fn hand_off(&mut self, doc: &mut Document, target: NodeId) -> Result<(), ObserveError> {
        if self.continuous.is_some() {
            return Ok(());
        }
        let continuous = ContinuousObserver::attach(doc, target)?;
        let initial = scan(doc, target, self.router.policy());
        self.continuous = Some(continuous);
        self.handoffs += 1;
        info!(
            ?target,
            matched = initial.matched,
            changed = initial.changed,
            "continuous observation attached"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_twice_is_a_no_op() {
        let mut doc = Document::parse_html("<html><body><main></main></body></html>");
        let mut session = RtlSession::default();
        session.start(&mut doc).expect("start");
        session.start(&mut doc).expect("start again");
        assert_eq!(session.handoffs(), 1);
    }

    #[test]
    fn idle_until_started() {
        let session = RtlSession::default();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn falls_back_to_document_root_without_body_tag() {
        let mut doc = Document::new();
        let mut session = RtlSession::default();
        session.start(&mut doc).expect("start");
        assert_eq!(session.state(), SessionState::Waiting);

        let root = doc.root();
        let main = doc.create_element("main");
        doc.append_child(root, main);
        let report = session.pump(&mut doc).expect("pump");
        assert!(report.handed_off);
        assert_eq!(session.state(), SessionState::Attached { target: main });
    }
}
