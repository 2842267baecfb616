use rtl_dom::{Document, NodeId, ObserveError, ObserverId, ObserverOptions};

use crate::router::{MutationRouter, RouteReport};

/// Long-lived subscription over the target subtree.
///
/// Watches child-list and character-data changes only. Attribute records
/// are never requested, so the router's own class writes cannot come back
/// as new batches. Once the target leaves the document the subscription is
/// inert: records may still queue, but every one routes to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuousObserver {
    observer: ObserverId,
    target: NodeId,
}

impl ContinuousObserver {
    pub fn options() -> ObserverOptions {
        ObserverOptions::text_and_structure()
    }

    pub fn attach(doc: &mut Document, target: NodeId) -> Result<Self, ObserveError> {
        let observer = doc.observe(target, Self::options())?;
        Ok(Self { observer, target })
    }

    pub fn observer(&self) -> ObserverId {
        self.observer
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn is_inert(&self, doc: &Document) -> bool {
        !doc.is_connected(self.target)
    }

    /// Drain the pending batch and hand it to `router`. `None` when nothing
    /// was queued.
    pub fn deliver(&self, doc: &mut Document, router: &MutationRouter) -> Option<RouteReport> {
        let batch = doc.take_records(self.observer);
        if batch.is_empty() {
            return None;
        }
        Some(router.route(doc, &batch))
    }

    pub fn detach(self, doc: &mut Document) -> bool {
        doc.disconnect(self.observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_subscribes_to_attributes() {
        let options = ContinuousObserver::options();
        assert!(options.child_list && options.character_data && options.subtree);
        assert!(!options.attributes);
    }

    #[test]
    fn marker_writes_do_not_come_back() {
        let mut doc = Document::parse_html(
            r#"<html><body><main><div contenteditable="true"><p>Hello</p></div></main></body></html>"#,
        );
        let main = doc.find_first_by_tag(doc.root(), "main").expect("main");
        let p = doc.find_first_by_tag(main, "p").expect("p");
        let text = doc.children(p)[0];
        let router = MutationRouter::default();
        let observer = ContinuousObserver::attach(&mut doc, main).expect("attach");

        doc.set_text(text, "שלום");
        let report = observer.deliver(&mut doc, &router).expect("one batch");
        assert_eq!(report.changed, 1);
        assert!(router.policy().marker().is_set(&doc, p));

        // The class write above queued nothing for this observer.
        assert!(doc.pending_observers().is_empty());
        assert_eq!(observer.deliver(&mut doc, &router), None);
    }

    #[test]
    fn removed_target_makes_subscription_inert() {
        let mut doc = Document::parse_html("<html><body><main><div>x</div></main></body></html>");
        let main = doc.find_first_by_tag(doc.root(), "main").expect("main");
        let div = doc.find_first_by_tag(main, "div").expect("div");
        let router = MutationRouter::default();
        let observer = ContinuousObserver::attach(&mut doc, main).expect("attach");

        doc.remove(main);
        assert!(observer.is_inert(&doc));
        doc.set_text_content(div, "مرحبا");
        let report = observer.deliver(&mut doc, &router).expect("records still queue");
        assert_eq!(report.scans, 0);
        assert_eq!(report.changed, 0);
    }

    #[test]
    fn detach_stops_delivery() {
        let mut doc = Document::parse_html("<html><body><main></main></body></html>");
        let main = doc.find_first_by_tag(doc.root(), "main").expect("main");
        let observer = ContinuousObserver::attach(&mut doc, main).expect("attach");
        assert!(observer.detach(&mut doc));
        let p = doc.create_element("p");
        doc.append_child(main, p);
        assert!(doc.pending_observers().is_empty());
    }
}
