use ego_tree::{NodeId, NodeRef, Tree};
use tracing::trace;

use crate::mutation::{
    MutationRecord, ObserveError, ObserverId, ObserverOptions, ObserverRegistry,
};

/// A node of the document arena.
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    /// The single document root.
    Document,
    Element(ElementData),
    Text(String),
}

impl DomNode {
    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            DomNode::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DomNode::Text(text) => Some(text),
            _ => None,
        }
    }

    fn accepts_children(&self) -> bool {
        !matches!(self, DomNode::Text(_))
    }
}

/// Element payload. Tag names are stored lowercase; the class list is kept
/// apart from the other attributes so class edits never duplicate tokens.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Attribute lookup, case-insensitive on the name. `class` is not stored
    /// here; use [`ElementData::classes`].
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn class_name(&self) -> String {
        self.classes.join(" ")
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case("class") {
            self.classes.clear();
            for token in value.split_ascii_whitespace() {
                self.push_class(token);
            }
            return;
        }
        match self
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self
                .attrs
                .push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    fn remove_attr(&mut self, name: &str) -> bool {
        if name.eq_ignore_ascii_case("class") {
            let had = !self.classes.is_empty();
            self.classes.clear();
            return had;
        }
        let before = self.attrs.len();
        self.attrs.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        before != self.attrs.len()
    }

    fn push_class(&mut self, class: &str) -> bool {
        if class.is_empty() || self.has_class(class) {
            return false;
        }
        self.classes.push(class.to_string());
        true
    }

    fn drop_class(&mut self, class: &str) -> bool {
        let before = self.classes.len();
        self.classes.retain(|c| c != class);
        before != self.classes.len()
    }
}

/// Live, editable document tree.
///
/// Every edit goes through a `Document` method so that observers registered
/// with [`Document::observe`] receive one [`MutationRecord`] per edit. Node
/// ids stay valid after removal; a removed node is simply disconnected, and
/// every query on it is answered rather than rejected.
///
/// Ids are never freed. Nodes detached by [`Document::remove`] or replaced
/// by [`Document::set_text_content`] stay in the arena for the life of the
/// document, so a long streaming session grows it by every replaced node.
#[derive(Debug)]
pub struct Document {
    tree: Tree<DomNode>,
    observers: ObserverRegistry,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            tree: Tree::new(DomNode::Document),
            observers: ObserverRegistry::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.tree.root().id()
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_, DomNode>> {
        self.tree.get(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.tree.get(id).map(|node| node.value())
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.node(id).and_then(DomNode::as_element)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(DomNode::as_text)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(ElementData::tag)
    }

    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.element(id).is_some_and(|el| el.is(tag))
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.parent().map(|parent| parent.id())
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.children().map(|child| child.id()).collect())
            .unwrap_or_default()
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.ancestors().map(|a| a.id()).collect())
            .unwrap_or_default()
    }

    /// `id` and every node below it, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.descendants().map(|d| d.id()).collect())
            .unwrap_or_default()
    }

    /// Nearest element, starting at `id` itself, that satisfies `predicate`.
    pub fn closest<F>(&self, id: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&ElementData) -> bool,
    {
        let node = self.tree.get(id)?;
        std::iter::once(node)
            .chain(node.ancestors())
            .find(|candidate| {
                candidate
                    .value()
                    .as_element()
                    .is_some_and(|el| predicate(el))
            })
            .map(|found| found.id())
    }

    /// Concatenated data of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        let mut out = String::new();
        for descendant in node.descendants() {
            if let DomNode::Text(text) = descendant.value() {
                out.push_str(text);
            }
        }
        out
    }

    /// Whether `id` is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let root = self.root();
        if id == root {
            return true;
        }
        self.tree
            .get(id)
            .is_some_and(|node| node.ancestors().any(|a| a.id() == root))
    }

    /// First element strictly below `root` whose tag is `tag`.
    pub fn find_first_by_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.tree
            .get(root)?
            .descendants()
            .skip(1)
            .find(|node| node.value().as_element().is_some_and(|el| el.is(tag)))
            .map(|node| node.id())
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find_first_by_tag(self.root(), "body")
    }

    /// Create a detached element. It joins the tree through
    /// [`Document::append_child`] or [`Document::insert_before`].
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.orphan(DomNode::Element(ElementData::new(tag))).id()
    }

    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.tree.orphan(DomNode::Text(data.to_string())).id()
    }

    /// Append `child` as the last child of `parent`, moving it out of its
    /// previous position. Refuses text parents and cycles.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.can_adopt(parent, child) {
            return false;
        }
        let previous = self.parent(child);
        let Some(mut parent_mut) = self.tree.get_mut(parent) else {
            return false;
        };
        parent_mut.append_id(child);
        if let Some(previous) = previous {
            self.notify(MutationRecord::child_list(previous));
        }
        self.notify(MutationRecord::child_list(parent));
        true
    }

    /// Insert `child` immediately before `reference`, which must be attached.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> bool {
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        if reference == child || !self.can_adopt(parent, child) {
            return false;
        }
        let previous = self.parent(child);
        let Some(mut reference_mut) = self.tree.get_mut(reference) else {
            return false;
        };
        reference_mut.insert_id_before(child);
        if let Some(previous) = previous {
            self.notify(MutationRecord::child_list(previous));
        }
        self.notify(MutationRecord::child_list(parent));
        true
    }

    /// Detach `id` from its parent. The subtree stays addressable.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        let Some(mut node) = self.tree.get_mut(id) else {
            return false;
        };
        node.detach();
        self.notify(MutationRecord::child_list(parent));
        true
    }

    /// Replace the data of a text node in place.
    pub fn set_text(&mut self, id: NodeId, data: &str) -> bool {
        let Some(mut node) = self.tree.get_mut(id) else {
            return false;
        };
        let DomNode::Text(text) = node.value() else {
            return false;
        };
        data.clone_into(text);
        self.notify(MutationRecord::character_data(id));
        true
    }

    /// Append to the data of a text node, the way streamed replies grow.
    pub fn append_data(&mut self, id: NodeId, data: &str) -> bool {
        let Some(mut node) = self.tree.get_mut(id) else {
            return false;
        };
        let DomNode::Text(text) = node.value() else {
            return false;
        };
        text.push_str(data);
        self.notify(MutationRecord::character_data(id));
        true
    }

    /// Replace all children of an element with a single text node (none when
    /// `data` is empty). Reported as one child-list record.
    pub fn set_text_content(&mut self, id: NodeId, data: &str) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        for child in self.children(id) {
            if let Some(mut node) = self.tree.get_mut(child) {
                node.detach();
            }
        }
        if !data.is_empty() {
            let text = self.create_text(data);
            if let Some(mut parent) = self.tree.get_mut(id) {
                parent.append_id(text);
            }
        }
        self.notify(MutationRecord::child_list(id));
        true
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        if self
            .with_element_mut(id, |el| el.set_attr(name, value))
            .is_none()
        {
            return false;
        }
        self.notify(MutationRecord::attributes(id));
        true
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let removed = self
            .with_element_mut(id, |el| el.remove_attr(name))
            .unwrap_or(false);
        if removed {
            self.notify(MutationRecord::attributes(id));
        }
        removed
    }

    /// Add `class` unless present. Returns whether the class list changed;
    /// an unchanged list produces no record.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        let added = self
            .with_element_mut(id, |el| el.push_class(class))
            .unwrap_or(false);
        if added {
            self.notify(MutationRecord::attributes(id));
        }
        added
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        let removed = self
            .with_element_mut(id, |el| el.drop_class(class))
            .unwrap_or(false);
        if removed {
            self.notify(MutationRecord::attributes(id));
        }
        removed
    }

    /// Subscribe to changes at `root` (and below it with `options.subtree`).
    pub fn observe(
        &mut self,
        root: NodeId,
        options: ObserverOptions,
    ) -> Result<ObserverId, ObserveError> {
        options.validate()?;
        if self.tree.get(root).is_none() {
            return Err(ObserveError::UnknownNode);
        }
        let id = self.observers.register(root, options);
        trace!(?id, ?options, "observer registered");
        Ok(id)
    }

    /// Unsubscribe. Undelivered records are discarded.
    pub fn disconnect(&mut self, observer: ObserverId) -> bool {
        let removed = self.observers.unregister(observer);
        if removed {
            trace!(?observer, "observer disconnected");
        }
        removed
    }

    pub fn is_observing(&self, observer: ObserverId) -> bool {
        self.observers.is_registered(observer)
    }

    /// Drain the records queued for `observer` as one batch.
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers.take(observer)
    }

    /// Observers that have undelivered records, in registration order.
    pub fn pending_observers(&self) -> Vec<ObserverId> {
        self.observers.pending()
    }

    /// Serialise `id` and its subtree as HTML. Intended for logs and tests.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.tree.get(id) {
            write_html(node, &mut out);
        }
        out
    }

    fn with_element_mut<R>(
        &mut self,
        id: NodeId,
        edit: impl FnOnce(&mut ElementData) -> R,
    ) -> Option<R> {
        let mut node = self.tree.get_mut(id)?;
        match node.value() {
            DomNode::Element(data) => Some(edit(data)),
            _ => None,
        }
    }

    fn can_adopt(&self, parent: NodeId, child: NodeId) -> bool {
        let Some(parent_node) = self.tree.get(parent) else {
            return false;
        };
        if !parent_node.value().accepts_children() || parent == child {
            return false;
        }
        if child == self.root() || self.tree.get(child).is_none() {
            return false;
        }
        !parent_node.ancestors().any(|a| a.id() == child)
    }

    fn notify(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        let mut chain = vec![record.target];
        chain.extend(self.ancestors(record.target));
        self.observers.enqueue(record, &chain);
    }
}

fn write_html(node: NodeRef<'_, DomNode>, out: &mut String) {
    match node.value() {
        DomNode::Document => {
            for child in node.children() {
                write_html(child, out);
            }
        }
        DomNode::Text(text) => escape_into(text, out),
        DomNode::Element(el) => {
            out.push('<');
            out.push_str(el.tag());
            if !el.classes.is_empty() {
                out.push_str(" class=\"");
                escape_into(&el.class_name(), out);
                out.push('"');
            }
            for (key, value) in el.attrs() {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                escape_into(value, out);
                out.push('"');
            }
            out.push('>');
            for child in node.children() {
                write_html(child, out);
            }
            out.push_str("</");
            out.push_str(el.tag());
            out.push('>');
        }
    }
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationKind;

    fn tree() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let root = doc.root();
        doc.append_child(root, body);
        let p = doc.create_element("P");
        doc.append_child(body, p);
        let text = doc.create_text("Hello");
        doc.append_child(p, text);
        (doc, body, p, text)
    }

    #[test]
    fn builds_and_reads_tree() {
        let (doc, body, p, text) = tree();
        assert_eq!(doc.tag(p), Some("p"));
        assert_eq!(doc.parent(text), Some(p));
        assert_eq!(doc.parent(p), Some(body));
        assert_eq!(doc.body(), Some(body));
        assert_eq!(doc.text_content(body), "Hello");
        assert_eq!(doc.outer_html(body), "<body><p>Hello</p></body>");
    }

    #[test]
    fn class_edits_are_idempotent() {
        let (mut doc, _, p, _) = tree();
        assert!(doc.add_class(p, "claude-rtl"));
        assert!(!doc.add_class(p, "claude-rtl"));
        assert_eq!(doc.element(p).map(|el| el.class_name()), Some("claude-rtl".to_string()));
        assert!(doc.remove_class(p, "claude-rtl"));
        assert!(!doc.remove_class(p, "claude-rtl"));
        assert!(!doc.has_class(p, "claude-rtl"));
    }

    #[test]
    fn class_attribute_splits_into_tokens() {
        let (mut doc, _, p, _) = tree();
        doc.set_attribute(p, "class", "a  b a");
        let classes: Vec<&str> = doc.element(p).map(|el| el.classes().collect()).unwrap_or_default();
        assert_eq!(classes, vec!["a", "b"]);
    }

    #[test]
    fn removed_nodes_are_disconnected_but_addressable() {
        let (mut doc, body, p, text) = tree();
        assert!(doc.remove(p));
        assert!(!doc.is_connected(p));
        assert!(!doc.is_connected(text));
        assert!(doc.is_connected(body));
        assert_eq!(doc.text(text), Some("Hello"));
        assert!(!doc.remove(p));
    }

    #[test]
    fn refuses_cycles_and_text_parents() {
        let (mut doc, body, p, text) = tree();
        assert!(!doc.append_child(p, body));
        assert!(!doc.append_child(text, body));
        assert!(!doc.append_child(p, p));
        assert_eq!(doc.parent(body), Some(doc.root()));
    }

    #[test]
    fn closest_includes_self() {
        let (mut doc, body, p, text) = tree();
        doc.set_attribute(body, "contenteditable", "true");
        let editable = |el: &ElementData| el.attr("contenteditable") == Some("true");
        assert_eq!(doc.closest(text, editable), Some(body));
        assert_eq!(doc.closest(body, editable), Some(body));
        assert_eq!(doc.closest(p, |el| el.is("p")), Some(p));
    }

    #[test]
    fn observer_receives_records_in_edit_order() {
        let (mut doc, body, p, text) = tree();
        let observer = doc
            .observe(body, ObserverOptions::text_and_structure())
            .expect("observe body");
        doc.set_text(text, "שלום");
        let li = doc.create_element("li");
        doc.append_child(p, li);
        doc.add_class(p, "claude-rtl");

        let records = doc.take_records(observer);
        assert_eq!(
            records,
            vec![
                MutationRecord::character_data(text),
                MutationRecord::child_list(p),
            ]
        );
        assert!(doc.take_records(observer).is_empty());
    }

    #[test]
    fn observer_without_subtree_only_sees_root() {
        let (mut doc, body, p, _) = tree();
        let options = ObserverOptions {
            child_list: true,
            ..ObserverOptions::default()
        };
        let observer = doc.observe(body, options).expect("observe body");
        let span = doc.create_element("span");
        doc.append_child(p, span);
        assert!(doc.pending_observers().is_empty());
        let div = doc.create_element("div");
        doc.append_child(body, div);
        assert_eq!(doc.take_records(observer), vec![MutationRecord::child_list(body)]);
    }

    #[test]
    fn attribute_observer_sees_class_writes() {
        let (mut doc, body, p, _) = tree();
        let options = ObserverOptions {
            attributes: true,
            subtree: true,
            ..ObserverOptions::default()
        };
        let observer = doc.observe(body, options).expect("observe body");
        doc.add_class(p, "x");
        let records = doc.take_records(observer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, MutationKind::Attributes);
    }

    #[test]
    fn disconnect_drops_pending_records() {
        let (mut doc, body, _, text) = tree();
        let observer = doc
            .observe(body, ObserverOptions::text_and_structure())
            .expect("observe body");
        doc.append_data(text, "!");
        assert_eq!(doc.pending_observers(), vec![observer]);
        assert!(doc.disconnect(observer));
        assert!(!doc.is_observing(observer));
        assert!(doc.take_records(observer).is_empty());
        assert_eq!(doc.text(text), Some("Hello!"));
    }

    #[test]
    fn moving_a_node_reports_both_parents() {
        let (mut doc, body, p, _) = tree();
        let observer = doc
            .observe(body, ObserverOptions::child_list_subtree())
            .expect("observe body");
        let div = doc.create_element("div");
        doc.append_child(body, div);
        doc.take_records(observer);
        doc.append_child(div, p);
        assert_eq!(
            doc.take_records(observer),
            vec![MutationRecord::child_list(body), MutationRecord::child_list(div)]
        );
    }

    #[test]
    fn set_text_content_replaces_children() {
        let (mut doc, body, p, text) = tree();
        assert!(doc.set_text_content(p, "مرحبا"));
        assert!(!doc.is_connected(text));
        assert_eq!(doc.text(text), Some("Hello"));
        assert_eq!(doc.text_content(body), "مرحبا");
        assert!(doc.set_text_content(p, ""));
        assert!(doc.children(p).is_empty());
    }
}
