//! Shared identifier types for scientia
//!
//! Every document in a build is addressed by a [`Namespace`] (the module it
//! belongs to) and a [`DocId`] (its dot-separated path inside that module).
//! Both are validated on construction, so holding one means the string
//! already satisfies its grammar.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Identifier grammar violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid namespace '{0}'")]
    InvalidNamespace(String),

    #[error("invalid document id '{0}'")]
    InvalidDocId(String),
}

static NAMESPACE_REGEX: OnceLock<Regex> = OnceLock::new();
static DOCID_REGEX: OnceLock<Regex> = OnceLock::new();

fn namespace_regex() -> &'static Regex {
    NAMESPACE_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]+$").unwrap())
}

fn docid_regex() -> &'static Regex {
    DOCID_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.\-]+$").unwrap())
}

/// Check a string against the namespace grammar without allocating
pub fn is_valid_namespace(s: &str) -> bool {
    namespace_regex().is_match(s)
}

/// Check a string against the document id grammar without allocating
pub fn is_valid_docid(s: &str) -> bool {
    docid_regex().is_match(s)
}

/// Name of a documentation module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Result<Self, IdError> {
        let name = name.into();
        if is_valid_namespace(&name) {
            Ok(Self(name))
        } else {
            Err(IdError::InvalidNamespace(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Namespace {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document identifier, a dot-separated path such as `guide.install.linux`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocId(String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if is_valid_docid(&id) {
            Ok(Self(id))
        } else {
            Err(IdError::InvalidDocId(id))
        }
    }

    /// Build an id from path segments (directories, then the file stem)
    pub fn from_segments<I, S>(segments: I) -> Result<Self, IdError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(".");
        Self::new(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tree path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Last path segment
    pub fn leaf(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl TryFrom<String> for DocId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocId> for String {
    fn from(id: DocId) -> Self {
        id.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Global document key: namespace plus docid
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedId {
    pub namespace: Namespace,
    pub docid: DocId,
}

impl QualifiedId {
    pub fn new(namespace: Namespace, docid: DocId) -> Self {
        Self { namespace, docid }
    }

    /// Parse `ns/docid` notation
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        match raw.split_once('/') {
            Some((ns, id)) => Ok(Self::new(Namespace::new(ns)?, DocId::new(id)?)),
            None => Err(IdError::InvalidDocId(raw.to_string())),
        }
    }

    /// Output path of the rendered page relative to the site root
    pub fn html_path(&self) -> String {
        format!("{}/{}.html", self.namespace, self.docid)
    }
}

impl fmt::Display for QualifiedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.docid)
    }
}
