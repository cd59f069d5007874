//! Cross-reference markup: `#tag`, `#[tag label]`, `link[..]`, `knowl[..]`
//! and `include[..]`.
//!
//! Every reference is resolved against the referencing document's namespace
//! and recorded in the [`ReferenceRegistry`] as it is rendered. Targets are
//! not required to exist yet.

use super::math::html_escape;
use super::ConvertError;
use crate::namespace::{resolve_target, Remapping, TargetError};
use crate::registry::ReferenceRegistry;
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use regex::{Captures, Regex};
use scientia_types::QualifiedId;
use std::sync::OnceLock;

static MARKUP_REGEX: OnceLock<Regex> = OnceLock::new();
static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn markup_regex() -> &'static Regex {
    MARKUP_REGEX.get_or_init(|| {
        Regex::new(concat!(
            r"(?P<kind>link|knowl)\[(?P<body>[^\]]+)\]",
            r"|include\[(?P<include>[^\]]+)\]",
            r"|#\[(?P<labeled>[^\]]+)\]",
            r"|#(?P<tag>[A-Za-z][A-Za-z0-9_-]+)\b",
        ))
        .unwrap()
    })
}

/// Hashtag grammar, shared with front-matter `tags`
pub(crate) fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]+$").unwrap())
}

/// One piece of reference markup found in running text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup<'t> {
    Hashtag {
        tag: &'t str,
        label: Option<&'t str>,
    },
    Link {
        target: &'t str,
        label: Option<String>,
    },
    Knowl {
        target: &'t str,
        label: Option<String>,
    },
    Include {
        target: &'t str,
        label: Option<&'t str>,
        limit: Option<&'t str>,
    },
}

impl<'t> Markup<'t> {
    /// Interpret a regex match. `Ok(None)` means the text is left as is.
    fn from_captures(captures: &Captures<'t>) -> Result<Option<Self>, ConvertError> {
        if let (Some(kind), Some(body)) = (captures.name("kind"), captures.name("body")) {
            let (target, label) = match body.as_str().split_once('|') {
                Some((target, rest)) => {
                    let label: String = rest.split('|').collect();
                    let label = label.trim().to_string();
                    (target, (!label.is_empty()).then_some(label))
                }
                None => (body.as_str(), None),
            };
            let markup = match kind.as_str() {
                "knowl" => Markup::Knowl { target, label },
                _ => Markup::Link { target, label },
            };
            return Ok(Some(markup));
        }

        if let Some(body) = captures.name("include") {
            let mut parts = body.as_str().split_whitespace();
            let target = parts
                .next()
                .ok_or_else(|| ConvertError::MalformedInclude(body.as_str().to_string()))?;
            let label = parts.next();
            let limit = parts.next();
            if parts.next().is_some() {
                return Err(ConvertError::MalformedInclude(body.as_str().to_string()));
            }
            return Ok(Some(Markup::Include {
                target,
                label,
                limit,
            }));
        }

        if let Some(body) = captures.name("labeled") {
            let body = body.as_str().trim();
            let (tag, label) = match body.split_once(char::is_whitespace) {
                Some((tag, label)) => (tag, Some(label.trim())),
                None => (body, None),
            };
            if !tag_regex().is_match(tag) {
                return Ok(None);
            }
            return Ok(Some(Markup::Hashtag { tag, label }));
        }

        Ok(captures
            .name("tag")
            .map(|tag| Markup::Hashtag {
                tag: tag.as_str(),
                label: None,
            }))
    }

    /// Raw target text; hashtags have none
    pub fn target(&self) -> Option<&'t str> {
        match self {
            Markup::Hashtag { .. } => None,
            Markup::Link { target, .. }
            | Markup::Knowl { target, .. }
            | Markup::Include { target, .. } => Some(*target),
        }
    }

    /// Canonical target as seen from a document `source`
    pub fn resolve(
        &self,
        source: &QualifiedId,
        remapping: &Remapping,
    ) -> Result<Option<QualifiedId>, TargetError> {
        self.target()
            .map(|raw| resolve_target(raw, &source.namespace, remapping))
            .transpose()
    }

    /// Record the reference for `source` and render it as HTML
    pub fn apply(
        &self,
        source: &QualifiedId,
        remapping: &Remapping,
        registry: &mut ReferenceRegistry,
        include_backlinks: bool,
    ) -> Result<String, ConvertError> {
        let resolve = |raw: &str| resolve_target(raw, &source.namespace, remapping);

        let html = match self {
            Markup::Hashtag { tag, label } => {
                registry.register_hashtag(tag, source);
                let text = match label {
                    Some(label) => html_escape(label),
                    None => format!("#{}", html_escape(tag)),
                };
                format!(
                    r#"<a href="../hashtag/{}.html">{text}</a>"#,
                    tag.to_lowercase()
                )
            }
            Markup::Link { target, label } => {
                let target = resolve(*target)?;
                registry.register_link(&target, source);
                let text = label.as_deref().unwrap_or(target.docid.as_str());
                format!(
                    r#"<a href="../{}">{}</a>"#,
                    target.html_path(),
                    html_escape(text)
                )
            }
            Markup::Knowl { target, label } => {
                let target = resolve(*target)?;
                registry.register_knowl(&target, source);
                let text = label.as_deref().unwrap_or(target.docid.as_str());
                format!(r#"<a knowl="{target}">{}</a>"#, html_escape(text))
            }
            Markup::Include {
                target,
                label,
                limit,
            } => {
                let target = resolve(*target)?;
                if include_backlinks {
                    registry.register_link(&target, source);
                }
                let mut html = format!(r#"<div class="include" include="{target}""#);
                if let Some(label) = label {
                    html.push_str(&format!(r#" label="{}""#, html_escape(label)));
                }
                if let Some(limit) = limit {
                    html.push_str(&format!(r#" limit="{}""#, html_escape(limit)));
                }
                html.push_str("></div>");
                html
            }
        };

        Ok(html)
    }
}

/// Rewrites reference markup in text events of one document
pub struct ReferenceTransformer<'c> {
    source: &'c QualifiedId,
    remapping: &'c Remapping,
    include_backlinks: bool,
}

impl<'c> ReferenceTransformer<'c> {
    pub fn new(source: &'c QualifiedId, remapping: &'c Remapping) -> Self {
        Self {
            source,
            remapping,
            include_backlinks: false,
        }
    }

    pub fn with_include_backlinks(mut self, include_backlinks: bool) -> Self {
        self.include_backlinks = include_backlinks;
        self
    }

    /// Transform events, registering every reference found
    pub fn transform<'a>(
        &self,
        events: Vec<Event<'a>>,
        registry: &mut ReferenceRegistry,
    ) -> Result<Vec<Event<'a>>, ConvertError> {
        let mut result = Vec::with_capacity(events.len());
        let mut in_code_block = false;
        let mut link_depth = 0usize;
        let mut events = events.into_iter().peekable();

        while let Some(event) = events.next() {
            match &event {
                Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
                Event::End(TagEnd::CodeBlock) => in_code_block = false,
                Event::Start(Tag::Link { .. }) | Event::Start(Tag::Image { .. }) => link_depth += 1,
                Event::End(TagEnd::Link) | Event::End(TagEnd::Image) => {
                    link_depth = link_depth.saturating_sub(1)
                }
                _ => {}
            }

            let Event::Text(text) = event else {
                result.push(event);
                continue;
            };
            if in_code_block || link_depth > 0 {
                result.push(Event::Text(text));
                continue;
            }

            // The parser splits text at brackets, so merge the whole run
            let mut merged = text.into_string();
            while let Some(Event::Text(next)) = events.peek() {
                merged.push_str(next);
                events.next();
            }

            self.process_text(&merged, registry, &mut result)?;
        }

        Ok(result)
    }

    fn process_text<'a>(
        &self,
        text: &str,
        registry: &mut ReferenceRegistry,
        out: &mut Vec<Event<'a>>,
    ) -> Result<(), ConvertError> {
        let mut copied = 0;
        let mut pos = 0;

        while let Some(captures) = markup_regex().captures_at(text, pos) {
            let Some(whole) = captures.get(0) else { break };

            let markup = if follows_word_char(text, whole.start()) {
                None
            } else {
                Markup::from_captures(&captures)?
            };
            let Some(markup) = markup else {
                // every alternative starts with an ASCII character
                pos = whole.start() + 1;
                continue;
            };

            if whole.start() > copied {
                out.push(text_event(&text[copied..whole.start()]));
            }
            let html = markup.apply(self.source, self.remapping, registry, self.include_backlinks)?;
            out.push(Event::InlineHtml(CowStr::Boxed(html.into_boxed_str())));
            copied = whole.end();
            pos = whole.end();
        }

        if copied < text.len() {
            out.push(text_event(&text[copied..]));
        }
        Ok(())
    }
}

fn follows_word_char(text: &str, at: usize) -> bool {
    text[..at]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

fn text_event<'a>(text: &str) -> Event<'a> {
    Event::Text(CowStr::Boxed(text.to_string().into_boxed_str()))
}
