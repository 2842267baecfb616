use rtl_dom::{Document, NodeId};
use tracing::trace;

use crate::{direction::DirectionPolicy, shape::TextShape};

/// Outcome of one subtree scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Shaped descendants that were evaluated.
    pub matched: usize,
    /// Of those, how many had their marker written.
    pub changed: usize,
}

/// Evaluate every shaped descendant of `root` (the root itself excluded).
///
/// Each match is judged on its own text, so visiting order does not matter
/// and a second pass over an unchanged subtree writes nothing. A
/// disconnected root is skipped.
pub fn scan(doc: &mut Document, root: NodeId, policy: &DirectionPolicy) -> ScanReport {
    if !doc.is_connected(root) {
        trace!(?root, "scan skipped: root is disconnected");
        return ScanReport::default();
    }

    let matches: Vec<NodeId> = doc
        .descendants(root)
        .into_iter()
        .skip(1)
        .filter(|id| TextShape::matches(doc, *id))
        .collect();

    let mut report = ScanReport {
        matched: matches.len(),
        changed: 0,
    };
    for element in matches {
        if policy.evaluate(doc, element) {
            report.changed += 1;
        }
    }
    trace!(?root, matched = report.matched, changed = report.changed, "subtree scanned");
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = r#"<html><body><main>
        <div class="message">
            <p>مرحبا بك</p>
            <p>Plain English</p>
            <ul><li>פריט</li><li>item</li></ul>
            <ol><li>one</li></ol>
            <span>שלום</span>
            <button><div>שלח</div></button>
        </div>
    </main></body></html>"#;

    fn marked(doc: &Document, policy: &DirectionPolicy) -> Vec<String> {
        doc.descendants(doc.root())
            .into_iter()
            .filter(|id| policy.marker().is_set(doc, *id))
            .map(|id| doc.outer_html(id))
            .collect()
    }

    #[test]
    fn marks_only_shaped_rtl_elements() {
        let mut doc = Document::parse_html(MESSAGE);
        let policy = DirectionPolicy::default();
        let main = doc.find_first_by_tag(doc.root(), "main").expect("main");

        let report = scan(&mut doc, main, &policy);
        assert_eq!(report.matched, 5);
        assert_eq!(report.changed, 3);

        let marked = marked(&doc, &policy);
        assert_eq!(marked.len(), 3);
        assert!(marked[0].starts_with("<p class=\"claude-rtl\">مرحبا"));
        assert!(marked[1].starts_with("<ul class=\"claude-rtl\">"));
        assert!(marked[2].starts_with("<div class=\"claude-rtl\">שלח"));

        let span = doc.find_first_by_tag(main, "span").expect("span");
        assert!(!policy.marker().is_set(&doc, span));
    }

    #[test]
    fn second_scan_writes_nothing() {
        let mut doc = Document::parse_html(MESSAGE);
        let policy = DirectionPolicy::default();
        let main = doc.find_first_by_tag(doc.root(), "main").expect("main");
        scan(&mut doc, main, &policy);
        let again = scan(&mut doc, main, &policy);
        assert_eq!(again.matched, 5);
        assert_eq!(again.changed, 0);
    }

    #[test]
    fn clears_stale_markers() {
        let mut doc = Document::parse_html(MESSAGE);
        let policy = DirectionPolicy::default();
        let main = doc.find_first_by_tag(doc.root(), "main").expect("main");
        scan(&mut doc, main, &policy);

        let p = doc.find_first_by_tag(main, "p").expect("p");
        doc.set_text_content(p, "now English");
        let report = scan(&mut doc, main, &policy);
        assert_eq!(report.changed, 1);
        assert!(!policy.marker().is_set(&doc, p));
    }

    #[test]
    fn root_without_matches_is_a_no_op() {
        let mut doc = Document::parse_html("<html><body><div><span>שלום</span></div></body></html>");
        let policy = DirectionPolicy::default();
        let div = doc.find_first_by_tag(doc.root(), "div").expect("div");
        assert_eq!(scan(&mut doc, div, &policy), ScanReport::default());
    }

    #[test]
    fn root_itself_is_not_evaluated() {
        let mut doc = Document::parse_html("<html><body><p>שלום</p></body></html>");
        let policy = DirectionPolicy::default();
        let p = doc.find_first_by_tag(doc.root(), "p").expect("p");
        assert_eq!(scan(&mut doc, p, &policy).matched, 0);
        assert!(!policy.marker().is_set(&doc, p));
    }

    #[test]
    fn disconnected_root_is_skipped() {
        let mut doc = Document::parse_html(MESSAGE);
        let policy = DirectionPolicy::default();
        let message = doc.find_first_by_tag(doc.root(), "div").expect("message");
        doc.remove(message);
        assert_eq!(scan(&mut doc, message, &policy), ScanReport::default());
    }
}
