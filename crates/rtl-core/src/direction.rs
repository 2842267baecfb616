use rtl_config::RtlConfig;
use rtl_dom::{Document, NodeId};
use rtl_text::Detection;
use tracing::trace;

use crate::{marker::Marker, shape::own_text};

/// Everything a direction decision needs: how to classify text, which
/// marker to write, and how editable regions are recognised.
#[derive(Debug, Clone)]
pub struct DirectionPolicy {
    marker: Marker,
    detection: Detection,
    editable_attribute: String,
}

impl Default for DirectionPolicy {
    fn default() -> Self {
        Self::from_config(&RtlConfig::default())
    }
}

impl DirectionPolicy {
    pub fn new(
        marker: Marker,
        detection: Detection,
        editable_attribute: impl Into<String>,
    ) -> Self {
        Self {
            marker,
            detection,
            editable_attribute: editable_attribute.into(),
        }
    }

    pub fn from_config(config: &RtlConfig) -> Self {
        Self::new(
            Marker::new(config.marker.class_name.clone()),
            config.detection.mode,
            config.observe.editable_attribute.clone(),
        )
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    pub fn detection(&self) -> Detection {
        self.detection
    }

    pub fn is_rtl(&self, text: &str) -> bool {
        self.detection.is_rtl(text)
    }

    /// `id` is an element whose editable attribute is exactly `"true"`.
    pub fn is_editable(&self, doc: &Document, id: NodeId) -> bool {
        doc.attribute(id, &self.editable_attribute) == Some("true")
    }

    /// `id` is an editable element or sits inside one.
    pub fn in_editable_region(&self, doc: &Document, id: NodeId) -> bool {
        doc.closest(id, |el| el.attr(&self.editable_attribute) == Some("true"))
            .is_some()
    }

    /// Classify the element's own text and bring its marker in line.
    /// Returns whether the document was written.
    pub fn evaluate(&self, doc: &mut Document, element: NodeId) -> bool {
        let rtl = self.is_rtl(&own_text(doc, element));
        let changed = self.marker.set(doc, element, rtl);
        if changed {
            trace!(?element, rtl, "marker updated");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editable_requires_literal_true() {
        let doc = Document::parse_html(
            r#"<html><body><div contenteditable="true"><p>a</p></div><div contenteditable="false"><p>b</p></div></body></html>"#,
        );
        let policy = DirectionPolicy::default();
        let body = doc.body().expect("body");
        let divs: Vec<NodeId> = doc.children(body);
        assert!(policy.is_editable(&doc, divs[0]));
        assert!(!policy.is_editable(&doc, divs[1]));

        let inner = doc.find_first_by_tag(divs[0], "p").expect("p");
        assert!(policy.in_editable_region(&doc, inner));
        let other = doc.find_first_by_tag(divs[1], "p").expect("p");
        assert!(!policy.in_editable_region(&doc, other));
    }

    #[test]
    fn evaluate_follows_text() {
        let mut doc = Document::parse_html("<html><body><p>שלום</p></body></html>");
        let p = doc.find_first_by_tag(doc.root(), "p").expect("p");
        let policy = DirectionPolicy::default();
        assert!(policy.evaluate(&mut doc, p));
        assert!(policy.marker().is_set(&doc, p));
        assert!(!policy.evaluate(&mut doc, p));

        let text = doc.children(p)[0];
        doc.set_text(text, "Hello");
        assert!(policy.evaluate(&mut doc, p));
        assert!(!policy.marker().is_set(&doc, p));
    }

    #[test]
    fn first_strong_policy_keeps_latin_led_text_ltr() {
        let mut doc = Document::parse_html("<html><body><p>OK שלום</p></body></html>");
        let p = doc.find_first_by_tag(doc.root(), "p").expect("p");
        let policy =
            DirectionPolicy::new(Marker::default(), Detection::FirstStrong, "contenteditable");
        assert!(!policy.evaluate(&mut doc, p));
        assert!(DirectionPolicy::default().evaluate(&mut doc, p));
    }
}
