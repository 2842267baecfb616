//! Global enabled flag: storage seam, toggle message and body class.

use std::{cell::Cell, rc::Rc};

use rtl_dom::Document;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;

/// Persisted enabled flag. Reads may suspend; callers treat a failed read
/// as "disabled".
#[allow(async_fn_in_trait)]
pub trait EnabledStore {
    async fn load(&self) -> Result<bool, StoreError>;
    async fn save(&self, enabled: bool) -> Result<(), StoreError>;
}

/// In-process store. Clones share the same value.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    value: Rc<Cell<Option<bool>>>,
    default_enabled: bool,
}

impl MemoryStore {
    pub fn new(default_enabled: bool) -> Self {
        Self {
            value: Rc::new(Cell::new(None)),
            default_enabled,
        }
    }

    pub fn with_value(enabled: bool) -> Self {
        let store = Self::new(enabled);
        store.value.set(Some(enabled));
        store
    }

    /// What has been saved so far, if anything.
    pub fn stored(&self) -> Option<bool> {
        self.value.get()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(true)
    }
}

impl EnabledStore for MemoryStore {
    async fn load(&self) -> Result<bool, StoreError> {
        Ok(self.value.get().unwrap_or(self.default_enabled))
    }

    async fn save(&self, enabled: bool) -> Result<(), StoreError> {
        self.value.set(Some(enabled));
        Ok(())
    }
}

/// The one inbound message shape: `{"enabled": bool}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleMessage {
    pub enabled: bool,
}

impl ToggleMessage {
    /// Parse a raw message. Anything that is not exactly the toggle shape
    /// yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(message) => Some(message),
            Err(error) => {
                debug!(%error, "ignoring unrecognised message");
                None
            }
        }
    }
}

/// Root-level class that switches the whole feature's presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalToggle {
    class_name: String,
}

impl GlobalToggle {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Set the class on `<body>`. Returns whether the document was written;
    /// a document without a body is left alone.
    pub fn apply(&self, doc: &mut Document, enabled: bool) -> bool {
        let Some(body) = doc.body() else {
            debug!("no <body>; global toggle skipped");
            return false;
        };
        if enabled {
            doc.add_class(body, &self.class_name)
        } else {
            doc.remove_class(body, &self.class_name)
        }
    }

    pub fn is_enabled(&self, doc: &Document) -> bool {
        doc.body()
            .is_some_and(|body| doc.has_class(body, &self.class_name))
    }
}
