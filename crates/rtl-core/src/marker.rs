use rtl_dom::{Document, NodeId};

/// The presentation class that requests RTL rendering for one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    class_name: String,
}

impl Marker {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn is_set(&self, doc: &Document, element: NodeId) -> bool {
        doc.has_class(element, &self.class_name)
    }

    /// Bring the marker on `element` to `enabled`. Returns whether the
    /// document was written; an element already in the requested state, a
    /// text node or an unknown id is left alone.
    pub fn set(&self, doc: &mut Document, element: NodeId, enabled: bool) -> bool {
        if doc.element(element).is_none() || self.is_set(doc, element) == enabled {
            return false;
        }
        if enabled {
            doc.add_class(element, &self.class_name)
        } else {
            doc.remove_class(element, &self.class_name)
        }
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self::new("claude-rtl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph() -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.create_element("p");
        doc.append_child(root, p);
        (doc, p)
    }

    #[test]
    fn setting_twice_writes_once() {
        let (mut doc, p) = paragraph();
        let marker = Marker::default();
        assert!(marker.set(&mut doc, p, true));
        assert!(!marker.set(&mut doc, p, true));
        assert!(marker.is_set(&doc, p));
    }

    #[test]
    fn alternating_ends_with_single_class_entry() {
        let (mut doc, p) = paragraph();
        doc.add_class(p, "prose");
        let marker = Marker::default();
        marker.set(&mut doc, p, true);
        marker.set(&mut doc, p, false);
        marker.set(&mut doc, p, true);
        let classes: Vec<&str> = doc.element(p).map(|el| el.classes().collect()).unwrap_or_default();
        assert_eq!(classes, vec!["prose", "claude-rtl"]);
    }

    #[test]
    fn removing_absent_marker_is_a_no_op() {
        let (mut doc, p) = paragraph();
        assert!(!Marker::default().set(&mut doc, p, false));
    }

    #[test]
    fn text_nodes_are_never_marked() {
        let (mut doc, p) = paragraph();
        let text = doc.create_text("שלום");
        doc.append_child(p, text);
        assert!(!Marker::default().set(&mut doc, text, true));
    }
}
