//! Mutation-driven RTL direction decisions.
//!
//! Data flow: [`BootstrapObserver`] (one-shot) locates the target subtree,
//! a [`ContinuousObserver`] attaches to it, and every batch it receives goes
//! through the [`MutationRouter`], which either rechecks one editable
//! paragraph or runs [`scan`] over a subtree. Decisions are written with the
//! [`Marker`] class only; nothing else is stored.
//!
//! [`RtlSession`] wires these together the way the content script does,
//! including the global enabled flag and the toggle message.

pub mod bootstrap;
pub mod direction;
pub mod enabled;
pub mod error;
pub mod marker;
pub mod observer;
pub mod router;
pub mod scanner;
pub mod session;
pub mod shape;
pub mod store;

pub use bootstrap::{BootstrapObserver, BootstrapState, Locator, locate_by_tag};
pub use direction::DirectionPolicy;
pub use enabled::{EnabledStore, GlobalToggle, MemoryStore, ToggleMessage};
pub use error::StoreError;
pub use marker::Marker;
pub use observer::ContinuousObserver;
pub use router::{MutationRouter, Route, RouteReport};
pub use scanner::{ScanReport, scan};
pub use session::{PumpReport, RtlSession, SessionState};
pub use shape::{TextShape, own_text, shaped_owner};
pub use store::{ConfiguredStore, JsonFileStore};
