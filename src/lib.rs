//! Right-to-left direction marking for a chat document.
//!
//! The work lives in the member crates; this crate re-exports them under one
//! name and exposes the common entry points at the top level.

pub use rtl_config;
pub use rtl_core;
pub use rtl_dom;
pub use rtl_text;

pub use rtl_config::RtlConfig;
pub use rtl_core::{
    ConfiguredStore, JsonFileStore, MemoryStore, PumpReport, RtlSession, SessionState,
};
pub use rtl_dom::{Document, MutationRecord, NodeId};
pub use rtl_text::{Detection, is_rtl_dominant};
