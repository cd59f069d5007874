//! Content model structs for documents and their metadata.

use scientia_types::{DocId, Namespace, QualifiedId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of document; the first variant is the default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    #[default]
    Document,
    Tutorial,
    Example,
    Reference,
}

impl DocType {
    pub const ALL: [DocType; 4] = [
        DocType::Document,
        DocType::Tutorial,
        DocType::Example,
        DocType::Reference,
    ];

    /// Exact match against the lowercase name
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Document => "document",
            DocType::Tutorial => "tutorial",
            DocType::Example => "example",
            DocType::Reference => "reference",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated metadata of a converted document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: String,

    #[serde(default)]
    pub subtitle: Option<String>,

    #[serde(default)]
    pub r#abstract: Option<String>,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(rename = "type")]
    pub doc_type: DocType,

    /// Clustering key for index pages
    #[serde(default)]
    pub group: Option<String>,

    /// Tie-breaker among siblings, lower first
    #[serde(default)]
    pub sort: f64,

    /// Related documents, already resolved to canonical namespaces
    #[serde(default)]
    pub seealso: Vec<QualifiedId>,

    #[serde(default)]
    pub copyright: Option<String>,

    #[serde(default)]
    pub date: Option<String>,
}

impl DocumentMeta {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            r#abstract: None,
            authors: Vec::new(),
            tags: Vec::new(),
            doc_type: DocType::default(),
            group: None,
            sort: 0.0,
            seealso: Vec::new(),
            copyright: None,
            date: None,
        }
    }

    /// Stable textual form with sorted keys, folded into the build fingerprint
    pub fn canonical(&self) -> String {
        // serde_json maps are ordered by key, so this does not depend on
        // field declaration order
        serde_json::to_value(self)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }
}

/// One source Markdown file
#[derive(Debug, Clone)]
pub struct Document {
    id: QualifiedId,
    source_path: PathBuf,
    raw: String,
    meta: Option<DocumentMeta>,
    output: Option<String>,
    prev: Option<DocId>,
    next: Option<DocId>,
}

impl Document {
    pub fn new(
        namespace: Namespace,
        docid: DocId,
        raw: impl Into<String>,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: QualifiedId::new(namespace, docid),
            source_path: source_path.into(),
            raw: raw.into(),
            meta: None,
            output: None,
            prev: None,
            next: None,
        }
    }

    pub fn id(&self) -> &QualifiedId {
        &self.id
    }

    pub fn namespace(&self) -> &Namespace {
        &self.id.namespace
    }

    pub fn docid(&self) -> &DocId {
        &self.id.docid
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Unconverted source, front matter included
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn meta(&self) -> Option<&DocumentMeta> {
        self.meta.as_ref()
    }

    /// Rendered HTML, available once the document has been converted
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn is_converted(&self) -> bool {
        self.output.is_some()
    }

    /// Display title, falling back to the last id segment before conversion
    pub fn title(&self) -> String {
        match &self.meta {
            Some(meta) => meta.title.clone(),
            None => title_case(self.docid().leaf()),
        }
    }

    /// Sort key among siblings
    pub fn sort(&self) -> f64 {
        self.meta.as_ref().map(|m| m.sort).unwrap_or(0.0)
    }

    pub fn prev(&self) -> Option<&DocId> {
        self.prev.as_ref()
    }

    pub fn next(&self) -> Option<&DocId> {
        self.next.as_ref()
    }

    /// Attach conversion results; the output is written once
    pub(crate) fn attach(&mut self, output: String, meta: DocumentMeta) {
        debug_assert!(self.output.is_none(), "{} converted twice", self.id);
        self.output = Some(output);
        self.meta = Some(meta);
    }

    pub(crate) fn set_siblings(&mut self, prev: Option<DocId>, next: Option<DocId>) {
        self.prev = prev;
        self.next = next;
    }
}

/// One step of a breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub label: String,
    /// Dot-path up to and including this level
    pub path: String,
}

/// Upper-case the first character, leave the rest untouched (keeps camelCase)
pub fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_type_conversion() {
        assert_eq!(DocType::from_str("tutorial"), Some(DocType::Tutorial));
        assert_eq!(DocType::from_str("reference"), Some(DocType::Reference));
        assert_eq!(DocType::from_str("Tutorial"), None);
        assert_eq!(DocType::from_str("essay"), None);
        assert_eq!(DocType::default(), DocType::Document);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("install"), "Install");
        assert_eq!(title_case("camelCase"), "CamelCase");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_canonical_meta_is_stable() {
        let mut a = DocumentMeta::new("Intro");
        a.tags = vec!["x".into(), "y".into()];
        let b = a.clone();
        assert_eq!(a.canonical(), b.canonical());

        let mut c = a.clone();
        c.sort = 1.0;
        assert_ne!(a.canonical(), c.canonical());

        let canonical = a.canonical();
        let abstract_pos = canonical.find("\"abstract\"").unwrap();
        let title_pos = canonical.find("\"title\"").unwrap();
        assert!(abstract_pos < title_pos, "keys should be sorted");
    }

    #[test]
    fn test_document_title_fallback() {
        let mut doc = Document::new(
            Namespace::new("guide").unwrap(),
            DocId::new("setup.linux").unwrap(),
            "",
            "guide/setup/linux.md",
        );
        assert_eq!(doc.title(), "Linux");
        assert!(!doc.is_converted());

        doc.attach("<p>hi</p>".into(), DocumentMeta::new("Linux setup"));
        assert_eq!(doc.title(), "Linux setup");
        assert_eq!(doc.output(), Some("<p>hi</p>"));
        assert_eq!(doc.id().to_string(), "guide/setup.linux");
    }
}
