//! Consistency check run once between conversion and rendering.
//!
//! Every problem is collected before failing, so one run reports all broken
//! references at once.

use crate::registry::{ReferenceIndex, ReferenceRegistry};
use crate::store::DocumentStore;
use scientia_types::{Namespace, QualifiedId};
use std::fmt;
use thiserror::Error;

/// Reserved last segment that only directory pages may use
pub const INDEX_SEGMENT: &str = "index";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Link,
    Knowl,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Link => write!(f, "link"),
            ReferenceKind::Knowl => write!(f, "knowl"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A module holds a document of another namespace
    #[error("document '{document}' is stored in module '{module}'")]
    NamespaceMismatch {
        module: Namespace,
        document: QualifiedId,
    },

    /// A childless document ends in `index`
    #[error(
        "document '{document}' ends in '{}' but has no documents below it",
        INDEX_SEGMENT
    )]
    IndexLeaf { document: QualifiedId },

    #[error(
        "illegal namespace '{}' in a {kind} to '{}' from {}",
        .target.namespace,
        .target.docid,
        join(.referrers)
    )]
    UnknownNamespace {
        kind: ReferenceKind,
        target: QualifiedId,
        referrers: Vec<QualifiedId>,
    },

    #[error(
        "unknown document '{}' in namespace '{}' in a {kind} from {}",
        .target.docid,
        .target.namespace,
        join(.referrers)
    )]
    UnknownDocument {
        kind: ReferenceKind,
        target: QualifiedId,
        referrers: Vec<QualifiedId>,
    },

    #[error("seealso entry '{target}' of '{document}' does not exist")]
    UnresolvedSeeAlso {
        document: QualifiedId,
        target: QualifiedId,
    },

    #[error("landing page '{landing_page}' of module '{module}' does not exist")]
    MissingLandingPage {
        module: Namespace,
        landing_page: String,
    },
}

fn join(ids: &[QualifiedId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// All violations found by one check
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{} consistency violation(s){}", .violations.len(), bullets(.violations))]
pub struct ConsistencyReport {
    violations: Vec<Violation>,
}

fn bullets(violations: &[Violation]) -> String {
    violations.iter().map(|v| format!("\n  - {v}")).collect()
}

impl ConsistencyReport {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }
}

/// Validate the tree structure and every registered reference.
pub fn check_consistency(
    store: &DocumentStore,
    registry: &ReferenceRegistry,
) -> Result<(), ConsistencyReport> {
    tracing::info!("checking consistency");
    let mut report = ConsistencyReport::default();

    for module in store.modules() {
        for (docid, document) in module.documents() {
            if document.namespace() != module.namespace() {
                report.push(Violation::NamespaceMismatch {
                    module: module.namespace().clone(),
                    document: document.id().clone(),
                });
            }

            let is_leaf = module
                .tree()
                .node_of(docid)
                .map_or(true, |node| node.children().is_empty());
            if is_leaf && docid.leaf() == INDEX_SEGMENT {
                report.push(Violation::IndexLeaf {
                    document: document.id().clone(),
                });
            }

            for target in document.meta().map(|m| m.seealso.as_slice()).unwrap_or(&[]) {
                if !store.contains(target) {
                    report.push(Violation::UnresolvedSeeAlso {
                        document: document.id().clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        if let Some(landing_page) = module.landing_page() {
            if !module.contains_str(landing_page) {
                report.push(Violation::MissingLandingPage {
                    module: module.namespace().clone(),
                    landing_page: landing_page.to_string(),
                });
            }
        }
    }

    check_references(store, registry.backlinks(), ReferenceKind::Link, &mut report);
    check_references(store, registry.knowls(), ReferenceKind::Knowl, &mut report);

    if report.is_empty() {
        Ok(())
    } else {
        Err(report)
    }
}

fn check_references(
    store: &DocumentStore,
    index: &ReferenceIndex,
    kind: ReferenceKind,
    report: &mut ConsistencyReport,
) {
    for (target, referrers) in index {
        let referrers: Vec<QualifiedId> = referrers.iter().cloned().collect();
        match store.module(&target.namespace) {
            None => report.push(Violation::UnknownNamespace {
                kind,
                target: target.clone(),
                referrers,
            }),
            Some(module) if !module.contains(&target.docid) => {
                report.push(Violation::UnknownDocument {
                    kind,
                    target: target.clone(),
                    referrers,
                })
            }
            Some(_) => {}
        }
    }
}

impl DocumentStore {
    /// See [`check_consistency`]
    pub fn check_consistency(&self, registry: &ReferenceRegistry) -> Result<(), ConsistencyReport> {
        check_consistency(self, registry)
    }
}
