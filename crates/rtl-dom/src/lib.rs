//! Host document model for the RTL direction pipeline.
//!
//! - [`Document`]: arena element/text tree with stable [`NodeId`]s
//! - [`html`]: HTML import through `scraper`
//! - [`mutation`]: change records and the observer registry that queues them

pub mod document;
pub mod html;
pub mod mutation;

pub use document::{Document, DomNode, ElementData};
pub use ego_tree::{NodeId, NodeRef};
pub use html::{HtmlOptions, document_from_file, document_from_html};
pub use mutation::{MutationKind, MutationRecord, ObserveError, ObserverId, ObserverOptions};
