use rtl_dom::{Document, DomNode, NodeId, NodeRef};

/// The closed set of structural roles that carry the marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextShape {
    Paragraph,
    OrderedList,
    UnorderedList,
    DefinitionList,
    /// A `div` that is a direct child of a `button`.
    ButtonLabel,
}

impl TextShape {
    pub fn of(doc: &Document, id: NodeId) -> Option<TextShape> {
        let element = doc.element(id)?;
        match element.tag() {
            "p" => Some(TextShape::Paragraph),
            "ol" => Some(TextShape::OrderedList),
            "ul" => Some(TextShape::UnorderedList),
            "dl" => Some(TextShape::DefinitionList),
            "div" => doc
                .parent(id)
                .filter(|parent| doc.is_element(*parent, "button"))
                .map(|_| TextShape::ButtonLabel),
            _ => None,
        }
    }

    pub fn matches(doc: &Document, id: NodeId) -> bool {
        Self::of(doc, id).is_some()
    }
}

/// Nearest shaped element at or above `id`: the element whose own text a
/// change at `id` can affect.
pub fn shaped_owner(doc: &Document, id: NodeId) -> Option<NodeId> {
    std::iter::once(id)
        .chain(doc.ancestors(id))
        .find(|candidate| TextShape::matches(doc, *candidate))
}

/// Text that belongs to `element` itself: every text node below it except
/// those inside nested shaped elements, which are judged on their own.
pub fn own_text(doc: &Document, element: NodeId) -> String {
    let mut out = String::new();
    if let Some(node) = doc.get(element) {
        collect_own_text(doc, node, &mut out);
    }
    out
}

fn collect_own_text(doc: &Document, node: NodeRef<'_, DomNode>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            DomNode::Text(text) => out.push_str(text),
            DomNode::Element(_) if !TextShape::matches(doc, child.id()) => {
                collect_own_text(doc, child, out)
            }
            _ => {}
        }
    }
}
