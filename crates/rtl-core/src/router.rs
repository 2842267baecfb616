//! Mutation Router - maps change records to re-evaluation work.
//!
//! Two paths only:
//! - character data inside an editable paragraph: recheck that paragraph
//! - child-list change outside editable regions whose text is RTL: scan it
//!
//! Everything else is dropped. Routes for a whole batch are planned first
//! and applied afterwards; marker writes never feed back as records because
//! the observers never subscribe to attributes.

use std::collections::HashSet;

use rtl_dom::{Document, MutationKind, MutationRecord, NodeId};
use tracing::{debug, trace};

use crate::{direction::DirectionPolicy, scanner::scan, shape::shaped_owner};

/// Work derived from one change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Re-evaluate a single paragraph of an editable region.
    Paragraph(NodeId),
    /// Re-evaluate the shaped element at or above this node, then scan
    /// every shaped element below it.
    Subtree(NodeId),
}

/// Summary of one routed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteReport {
    pub records: usize,
    pub rechecked: usize,
    pub scans: usize,
    /// Marker writes across rechecks and scans.
    pub changed: usize,
}

impl RouteReport {
    pub fn merge(&mut self, other: RouteReport) {
        self.records += other.records;
        self.rechecked += other.rechecked;
        self.scans += other.scans;
        self.changed += other.changed;
    }
}

#[derive(Debug, Clone, Default)]
pub struct MutationRouter {
    policy: DirectionPolicy,
}

impl MutationRouter {
    pub fn new(policy: DirectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DirectionPolicy {
        &self.policy
    }

    /// Decide the work for `batch` without touching the document. Duplicate
    /// routes collapse to their first occurrence.
    pub fn plan(&self, doc: &Document, batch: &[MutationRecord]) -> Vec<Route> {
        let mut seen = HashSet::new();
        batch
            .iter()
            .filter_map(|record| self.classify(doc, record))
            .filter(|route| seen.insert(*route))
            .collect()
    }

    /// Plan `batch`, then apply every route.
    pub fn route(&self, doc: &mut Document, batch: &[MutationRecord]) -> RouteReport {
        let plan = self.plan(doc, batch);
        let mut report = RouteReport {
            records: batch.len(),
            ..RouteReport::default()
        };
        for route in plan {
            match route {
                Route::Paragraph(paragraph) => {
                    report.rechecked += 1;
                    if self.policy.evaluate(doc, paragraph) {
                        report.changed += 1;
                    }
                }
                Route::Subtree(root) => {
                    // The scan skips `root`; its shaped owner (itself or an
                    // ancestor) also saw its own text change.
                    if let Some(owner) = shaped_owner(doc, root)
                        && self.policy.evaluate(doc, owner)
                    {
                        report.changed += 1;
                    }
                    report.scans += 1;
                    report.changed += scan(doc, root, &self.policy).changed;
                }
            }
        }
        debug!(
            records = report.records,
            rechecked = report.rechecked,
            scans = report.scans,
            changed = report.changed,
            "batch routed"
        );
        report
    }

    fn classify(&self, doc: &Document, record: &MutationRecord) -> Option<Route> {
        let target = record.target;
        if !doc.is_connected(target) {
            trace!(?target, kind = ?record.kind, "record ignored: target disconnected");
            return None;
        }
        match record.kind {
            MutationKind::CharacterData => {
                doc.text(target)?;
                let paragraph = doc.parent(target).filter(|p| doc.is_element(*p, "p"))?;
                let region = doc.parent(paragraph)?;
                if !self.policy.is_editable(doc, region) {
                    return None;
                }
                trace!(?paragraph, "route: editable paragraph");
                Some(Route::Paragraph(paragraph))
            }
            MutationKind::ChildList => {
                doc.element(target)?;
                // Editable content is owned by the character-data path.
                if self.policy.in_editable_region(doc, target) {
                    return None;
                }
                if !self.policy.is_rtl(&doc.text_content(target)) {
                    return None;
                }
                trace!(?target, "route: subtree scan");
                Some(Route::Subtree(target))
            }
            MutationKind::Attributes => None,
        }
    }
}
