//! HTML import into [`Document`].

use std::path::Path;

use anyhow::{Context, Result};
use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node};
use tracing::debug;

use crate::document::Document;

#[derive(Debug, Clone, Default)]
pub struct HtmlOptions {
    /// Keep text nodes that contain only whitespace. Off by default: the
    /// indentation between tags carries no direction information.
    pub keep_whitespace_text: bool,
}

impl Document {
    /// Parse a full HTML document with default options.
    pub fn parse_html(html: &str) -> Document {
        document_from_html(html, &HtmlOptions::default())
    }
}

pub fn document_from_html(html: &str, options: &HtmlOptions) -> Document {
    let parsed = Html::parse_document(html);
    if !parsed.errors.is_empty() {
        debug!(errors = parsed.errors.len(), "html parsed with recoverable errors");
    }

    let mut document = Document::new();
    let root = document.root();
    for child in parsed.tree.root().children() {
        import_node(&mut document, root, child, options);
    }
    document
}

pub fn document_from_file(path: &Path) -> Result<Document> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read HTML file '{}'", path.display()))?;
    Ok(document_from_html(&html, &HtmlOptions::default()))
}

fn import_node(
    document: &mut Document,
    parent: NodeId,
    node: NodeRef<'_, Node>,
    options: &HtmlOptions,
) {
    match node.value() {
        Node::Element(element) => {
            let id = document.create_element(element.name());
            for (name, value) in element.attrs() {
                document.set_attribute(id, name, value);
            }
            document.append_child(parent, id);
            for child in node.children() {
                import_node(document, id, child, options);
            }
        }
        Node::Text(text) => {
            let data: &str = text;
            if !options.keep_whitespace_text && data.trim().is_empty() {
                return;
            }
            let id = document.create_text(data);
            document.append_child(parent, id);
        }
        Node::Fragment | Node::Document => {
            for child in node.children() {
                import_node(document, parent, child, options);
            }
        }
        Node::Comment(_) | Node::Doctype(_) | Node::ProcessingInstruction(_) => {}
    }
}
