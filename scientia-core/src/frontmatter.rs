//! Front matter extraction and metadata validation.
//!
//! A document starts with a YAML block delimited by `---` lines. Only the keys
//! in [`ALLOWED_KEYS`] may appear and `title` is mandatory.

use crate::markdown::references::tag_regex;
use crate::models::{DocType, DocumentMeta};
use crate::namespace::{resolve_target, Remapping, TargetError};
use regex::Regex;
use scientia_types::QualifiedId;
use serde_yaml::{Mapping, Value};
use std::sync::OnceLock;
use thiserror::Error;

/// Keys accepted in a document's front matter
pub const ALLOWED_KEYS: &[&str] = &[
    "authors",
    "copyright",
    "title",
    "type",
    "tags",
    "subtitle",
    "abstract",
    "date",
    "seealso",
    "group",
    "sort",
];

/// Keys that must be present
pub const REQUIRED_KEYS: &[&str] = &["title"];

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("invalid YAML front matter in {docid}: {source}")]
    Yaml {
        docid: QualifiedId,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("front matter of {docid} is not a key-value mapping")]
    NotAMapping { docid: QualifiedId },

    #[error("metadata key '{key}' not allowed in {docid}")]
    DisallowedKey { key: String, docid: QualifiedId },

    #[error("metadata key '{key}' not set for {docid}")]
    MissingKey { key: String, docid: QualifiedId },

    #[error("'{value}' is not an allowed document type in {docid}")]
    InvalidType { value: String, docid: QualifiedId },

    #[error("invalid value for metadata key '{key}' in {docid}: {reason}")]
    InvalidValue {
        key: String,
        docid: QualifiedId,
        reason: String,
    },

    #[error("tag '{tag}' in {docid} is not a valid hashtag")]
    InvalidTag { tag: String, docid: QualifiedId },

    #[error("seealso entry in {docid}: {source}")]
    InvalidSeeAlso {
        docid: QualifiedId,
        #[source]
        source: TargetError,
    },
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)^---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n(.*))?$").unwrap()
    })
}

/// Split a document into its front matter (if any) and Markdown body
///
/// # Example
///
/// ```
/// use scientia_core::frontmatter::split_frontmatter;
///
/// let (yaml, body) = split_frontmatter("---\ntitle: Intro\n---\n# Hello\n");
/// assert_eq!(yaml, Some("title: Intro"));
/// assert_eq!(body, "# Hello\n");
/// ```
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    match frontmatter_regex().captures(content) {
        Some(captures) => {
            let yaml = captures.get(1).map(|m| m.as_str());
            let body = captures.get(2).map(|m| m.as_str()).unwrap_or("");
            (yaml, body)
        }
        None => (None, content),
    }
}

/// Validate front matter of `docid` into [`DocumentMeta`].
///
/// `seealso` entries are resolved like link targets, relative to the
/// document's own namespace and through `remapping`.
pub fn parse_metadata(
    yaml: Option<&str>,
    docid: &QualifiedId,
    remapping: &Remapping,
) -> Result<DocumentMeta, MetadataError> {
    let mapping = match yaml {
        Some(text) if !text.trim().is_empty() => {
            match serde_yaml::from_str::<Value>(text).map_err(|source| MetadataError::Yaml {
                docid: docid.clone(),
                source,
            })? {
                Value::Mapping(m) => m,
                Value::Null => Mapping::new(),
                _ => {
                    return Err(MetadataError::NotAMapping {
                        docid: docid.clone(),
                    })
                }
            }
        }
        _ => Mapping::new(),
    };

    let fields = Fields::new(mapping, docid)?;

    for key in REQUIRED_KEYS {
        if fields.scalar(key)?.is_none() {
            return Err(MetadataError::MissingKey {
                key: key.to_string(),
                docid: docid.clone(),
            });
        }
    }

    let doc_type = match fields.scalar("type")? {
        Some(value) => DocType::from_str(value.trim()).ok_or_else(|| MetadataError::InvalidType {
            value,
            docid: docid.clone(),
        })?,
        None => DocType::default(),
    };

    let mut seealso = Vec::new();
    for entry in fields.list("seealso")? {
        let target = resolve_target(&entry, &docid.namespace, remapping).map_err(|source| {
            MetadataError::InvalidSeeAlso {
                docid: docid.clone(),
                source,
            }
        })?;
        seealso.push(target);
    }

    let tags = fields.list("tags")?;
    if let Some(tag) = tags.iter().find(|tag| !tag_regex().is_match(tag)) {
        return Err(MetadataError::InvalidTag {
            tag: tag.clone(),
            docid: docid.clone(),
        });
    }

    Ok(DocumentMeta {
        title: fields.scalar("title")?.unwrap_or_default(),
        subtitle: fields.scalar("subtitle")?,
        r#abstract: fields.scalar("abstract")?,
        authors: fields.list("authors")?,
        tags,
        doc_type,
        group: fields.scalar("group")?,
        sort: fields.number("sort")?.unwrap_or(0.0),
        seealso,
        copyright: fields.scalar("copyright")?,
        date: fields.scalar("date")?,
    })
}

/// Allow-listed front matter entries
struct Fields<'a> {
    entries: Vec<(String, Value)>,
    docid: &'a QualifiedId,
}

impl<'a> Fields<'a> {
    fn new(mapping: Mapping, docid: &'a QualifiedId) -> Result<Self, MetadataError> {
        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let key = match key {
                Value::String(s) => s,
                other => scalar_text(&other).unwrap_or_default(),
            };
            if !ALLOWED_KEYS.contains(&key.as_str()) {
                return Err(MetadataError::DisallowedKey {
                    key,
                    docid: docid.clone(),
                });
            }
            entries.push((key, value));
        }
        Ok(Self { entries, docid })
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn invalid(&self, key: &str, reason: &str) -> MetadataError {
        MetadataError::InvalidValue {
            key: key.to_string(),
            docid: self.docid.clone(),
            reason: reason.to_string(),
        }
    }

    /// Single value; sequences are joined line by line
    fn scalar(&self, key: &str) -> Result<Option<String>, MetadataError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Sequence(items)) => {
                let lines = items
                    .iter()
                    .map(|item| scalar_text(item).ok_or_else(|| self.invalid(key, "nested value")))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(lines.join("\n")))
            }
            Some(value) => scalar_text(value)
                .map(Some)
                .ok_or_else(|| self.invalid(key, "expected a plain value")),
        }
    }

    /// Ordered values with empty entries dropped
    fn list(&self, key: &str) -> Result<Vec<String>, MetadataError> {
        let values = match self.get(key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Sequence(items)) => items
                .iter()
                .map(|item| scalar_text(item).ok_or_else(|| self.invalid(key, "nested value")))
                .collect::<Result<Vec<_>, _>>()?,
            Some(value) => vec![scalar_text(value)
                .ok_or_else(|| self.invalid(key, "expected a value or a list"))?],
        };
        Ok(values
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect())
    }

    fn number(&self, key: &str) -> Result<Option<f64>, MetadataError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "number out of range")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.invalid(key, "expected a number")),
            Some(_) => Err(self.invalid(key, "expected a number")),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
