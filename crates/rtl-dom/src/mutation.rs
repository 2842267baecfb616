use ego_tree::NodeId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of document edit carried by a [`MutationRecord`].
///
/// External JSON uses snake_case names (`child_list`, `character_data`, `attributes`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Children were inserted into or removed from `target`.
    ChildList,
    /// The text node `target` changed its data in place.
    CharacterData,
    /// An attribute (including the class list) of `target` changed.
    Attributes,
}

/// One reported document edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeId,
}

impl MutationRecord {
    pub fn child_list(target: NodeId) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
        }
    }

    pub fn character_data(target: NodeId) -> Self {
        Self {
            kind: MutationKind::CharacterData,
            target,
        }
    }

    pub fn attributes(target: NodeId) -> Self {
        Self {
            kind: MutationKind::Attributes,
            target,
        }
    }
}

/// Subscription granularity, mirroring the host notification primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverOptions {
    pub child_list: bool,
    pub character_data: bool,
    pub attributes: bool,
    pub subtree: bool,
}

impl ObserverOptions {
    /// Child-list changes anywhere below the observed root.
    pub fn child_list_subtree() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Self::default()
        }
    }

    /// Child-list and character-data changes below the root. Attributes are
    /// never watched, so class writes cannot come back as records.
    pub fn text_and_structure() -> Self {
        Self {
            child_list: true,
            character_data: true,
            attributes: false,
            subtree: true,
        }
    }

    pub fn accepts(&self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::CharacterData => self.character_data,
            MutationKind::Attributes => self.attributes,
        }
    }

    pub fn validate(&self) -> Result<(), ObserveError> {
        if self.child_list || self.character_data || self.attributes {
            Ok(())
        } else {
            Err(ObserveError::EmptyOptions)
        }
    }
}

/// Handle returned by [`crate::Document::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Errors raised when subscribing to document changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObserveError {
    /// None of child_list / character_data / attributes was requested.
    #[error("observer options must watch at least one mutation kind")]
    EmptyOptions,

    /// The root node does not belong to this document.
    #[error("observed root is not a node of this document")]
    UnknownNode,
}

#[derive(Debug)]
struct Registration {
    id: ObserverId,
    root: NodeId,
    options: ObserverOptions,
    queue: Vec<MutationRecord>,
}

/// Per-observer record queues. Records are appended in edit order and
/// drained as one batch by [`ObserverRegistry::take`].
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    registrations: Vec<Registration>,
}

impl ObserverRegistry {
    pub(crate) fn register(&mut self, root: NodeId, options: ObserverOptions) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.registrations.push(Registration {
            id,
            root,
            options,
            queue: Vec::new(),
        });
        id
    }

    /// Drops the registration and any undelivered records.
    pub(crate) fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|reg| reg.id != id);
        before != self.registrations.len()
    }

    pub(crate) fn is_registered(&self, id: ObserverId) -> bool {
        self.registrations.iter().any(|reg| reg.id == id)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Queue `record` for every observer that watches `record.kind` and whose
    /// root is `chain[0]` (the target) or, with `subtree`, any later entry.
    pub(crate) fn enqueue(&mut self, record: MutationRecord, chain: &[NodeId]) {
        for reg in &mut self.registrations {
            if !reg.options.accepts(record.kind) {
                continue;
            }
            let matches = match chain.iter().position(|id| *id == reg.root) {
                Some(0) => true,
                Some(_) => reg.options.subtree,
                None => false,
            };
            if matches {
                reg.queue.push(record);
            }
        }
    }

    pub(crate) fn take(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.registrations
            .iter_mut()
            .find(|reg| reg.id == id)
            .map(|reg| std::mem::take(&mut reg.queue))
            .unwrap_or_default()
    }

    pub(crate) fn pending(&self) -> Vec<ObserverId> {
        self.registrations
            .iter()
            .filter(|reg| !reg.queue.is_empty())
            .map(|reg| reg.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_kind_uses_snake_case() {
        let json = serde_json::to_string(&MutationKind::CharacterData).expect("serialize kind");
        assert_eq!(json, "\"character_data\"");
        let back: MutationKind = serde_json::from_str("\"child_list\"").expect("deserialize kind");
        assert_eq!(back, MutationKind::ChildList);
    }

    #[test]
    fn options_reject_empty_subscription() {
        let options = ObserverOptions {
            subtree: true,
            ..ObserverOptions::default()
        };
        assert_eq!(options.validate(), Err(ObserveError::EmptyOptions));
        assert!(ObserverOptions::child_list_subtree().validate().is_ok());
    }

    #[test]
    fn text_and_structure_never_accepts_attributes() {
        let options = ObserverOptions::text_and_structure();
        assert!(options.accepts(MutationKind::ChildList));
        assert!(options.accepts(MutationKind::CharacterData));
        assert!(!options.accepts(MutationKind::Attributes));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ObserverOptions =
            serde_json::from_str(r#"{"child_list": true}"#).expect("deserialize options");
        assert!(options.child_list);
        assert!(!options.subtree);
        assert!(!options.attributes);
    }
}
