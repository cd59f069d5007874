//! Namespace remapping and reference target resolution.
//!
//! Modules that are composed into one site may refer to a shared module under
//! a local alias. The [`Remapping`] table rewrites such aliases while the
//! referencing document is converted, so the store and registry only ever see
//! canonical namespaces.

use scientia_types::{DocId, IdError, Namespace, QualifiedId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("malformed reference target '{0}'")]
    Malformed(String),

    #[error("reference target '{raw}': {source}")]
    InvalidId {
        raw: String,
        #[source]
        source: IdError,
    },
}

/// origin namespace -> (requested namespace -> canonical namespace)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Remapping(HashMap<String, HashMap<String, String>>);

impl Remapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alias for documents of `origin`
    pub fn insert(
        &mut self,
        origin: impl Into<String>,
        alias: impl Into<String>,
        canonical: impl Into<String>,
    ) {
        self.0
            .entry(origin.into())
            .or_default()
            .insert(alias.into(), canonical.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical name for `target` as seen from a document in `origin`.
    ///
    /// Falls back to `target` unless both `origin` and `target` are present
    /// in the table.
    pub fn remap<'a>(&'a self, origin: &str, target: &'a str) -> &'a str {
        self.0
            .get(origin)
            .and_then(|aliases| aliases.get(target))
            .map(String::as_str)
            .unwrap_or(target)
    }
}

/// Resolve a raw `docid` or `ns/docid` reference written in a document of
/// namespace `origin`.
pub fn resolve_target(
    raw: &str,
    origin: &Namespace,
    remapping: &Remapping,
) -> Result<QualifiedId, TargetError> {
    let raw = raw.trim();
    let segments: Vec<&str> = raw.split('/').map(str::trim).collect();
    let (requested_ns, docid) = match segments.as_slice() {
        [docid] => (origin.as_str(), *docid),
        [ns, docid] => (*ns, *docid),
        _ => return Err(TargetError::Malformed(raw.to_string())),
    };

    let invalid = |source| TargetError::InvalidId {
        raw: raw.to_string(),
        source,
    };
    let namespace = Namespace::new(remapping.remap(origin.as_str(), requested_ns)).map_err(invalid)?;
    let docid = DocId::new(docid).map_err(invalid)?;

    Ok(QualifiedId::new(namespace, docid))
}
