//! Markdown conversion with cross-reference, math and code cell extensions.

pub mod cells;
pub mod math;
pub mod references;

use crate::fingerprint::BuildFingerprint;
use crate::frontmatter::{parse_metadata, split_frontmatter, MetadataError};
use crate::models::{Document, DocumentMeta};
use crate::namespace::{Remapping, TargetError};
use crate::registry::ReferenceRegistry;
use pulldown_cmark::{html, Event, Options, Parser};
use thiserror::Error;

pub use cells::{CellMode, CodeCellTransformer};
pub use math::MathShield;
pub use references::{Markup, ReferenceTransformer};

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("include '{0}' takes a target, an optional label and an optional limit")]
    MalformedInclude(String),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Rendered body and validated metadata of one document
#[derive(Debug, Clone)]
pub struct Converted {
    pub html: String,
    pub meta: DocumentMeta,
}

/// Converts documents one at a time and folds each result into the build
/// fingerprint
pub struct ContentConverter {
    options: Options,
    include_backlinks: bool,
    fingerprint: BuildFingerprint,
}

impl ContentConverter {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        // ENABLE_MATH stays off: math spans are shielded before parsing

        Self {
            options,
            include_backlinks: false,
            fingerprint: BuildFingerprint::new(),
        }
    }

    /// Let `include[..]` count as a backlink
    pub fn with_include_backlinks(mut self, include_backlinks: bool) -> Self {
        self.include_backlinks = include_backlinks;
        self
    }

    /// Convert one document, registering its references
    pub fn convert(
        &mut self,
        document: &Document,
        remapping: &Remapping,
        registry: &mut ReferenceRegistry,
    ) -> Result<Converted, ConvertError> {
        let (frontmatter, body) = split_frontmatter(document.raw());
        let meta = parse_metadata(frontmatter, document.id(), remapping)?;

        let (shielded, shield) = MathShield::protect(body);
        let events: Vec<Event> = Parser::new_ext(&shielded, self.options).collect();

        let mut cells = CodeCellTransformer::new();
        let events = cells.transform(events);

        let references = ReferenceTransformer::new(document.id(), remapping)
            .with_include_backlinks(self.include_backlinks);
        let events = references.transform(events, registry)?;

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        let html = shield.restore(&html_output);

        self.fingerprint.update(&html, &meta);
        tracing::debug!(
            document = %document.id(),
            math = shield.len(),
            cells = cells.cells(),
            "converted"
        );

        Ok(Converted { html, meta })
    }

    pub fn fingerprint(&self) -> &BuildFingerprint {
        &self.fingerprint
    }

    pub fn into_fingerprint(self) -> BuildFingerprint {
        self.fingerprint
    }
}

impl Default for ContentConverter {
    fn default() -> Self {
        Self::new()
    }
}
