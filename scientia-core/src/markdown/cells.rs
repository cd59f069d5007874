//! Code cells.
//!
//! A paragraph that only says `sage::` (or `python::`, `r::`, `plot::`,
//! `example::`) directly followed by a code block turns that block into a
//! cell. Executable cells carry their mode and a per-document id for the
//! client-side runner; the other modes render as plain code.

use super::math::html_escape;
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use regex::Regex;
use std::sync::OnceLock;

static MARKER_REGEX: OnceLock<Regex> = OnceLock::new();

fn marker_regex() -> &'static Regex {
    MARKER_REGEX.get_or_init(|| Regex::new(r"(?i)^(plot|example|python|sage|r)::\s*$").unwrap())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMode {
    Plot,
    Example,
    Python,
    Sage,
    R,
}

impl CellMode {
    pub fn from_marker(text: &str) -> Option<Self> {
        let captures = marker_regex().captures(text.trim())?;
        match captures[1].to_lowercase().as_str() {
            "plot" => Some(CellMode::Plot),
            "example" => Some(CellMode::Example),
            "python" => Some(CellMode::Python),
            "sage" => Some(CellMode::Sage),
            "r" => Some(CellMode::R),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CellMode::Plot => "plot",
            CellMode::Example => "example",
            CellMode::Python => "python",
            CellMode::Sage => "sage",
            CellMode::R => "r",
        }
    }

    /// Whether the block becomes a runnable cell
    pub fn is_executable(&self) -> bool {
        matches!(self, CellMode::Python | CellMode::Sage | CellMode::R)
    }
}

/// Rewrites marked code blocks; cell ids count up from zero per document
#[derive(Debug, Default)]
pub struct CodeCellTransformer {
    next_id: usize,
}

impl CodeCellTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of executable cells emitted so far
    pub fn cells(&self) -> usize {
        self.next_id
    }

    pub fn transform<'a>(&mut self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());
        let mut i = 0;

        while i < events.len() {
            if let Some((mode, code_start)) = marker_at(&events, i) {
                let mut code = String::new();
                let mut j = code_start + 1;
                while j < events.len() && !matches!(events[j], Event::End(TagEnd::CodeBlock)) {
                    if let Event::Text(text) = &events[j] {
                        code.push_str(text);
                    }
                    j += 1;
                }
                out.push(Event::Html(CowStr::Boxed(self.render(mode, &code).into_boxed_str())));
                i = j + 1;
                continue;
            }

            out.push(events[i].clone());
            i += 1;
        }

        out
    }

    fn render(&mut self, mode: CellMode, code: &str) -> String {
        let code = html_escape(code.trim_end_matches('\n'));
        if mode.is_executable() {
            let id = self.next_id;
            self.next_id += 1;
            format!(
                "<code class=\"cell\" mode=\"{}\" id=\"{id}\"><pre type=\"text/x-sage\">{code}\n</pre></code>\n",
                mode.as_str()
            )
        } else {
            if mode == CellMode::Plot {
                tracing::warn!("codeblock mode 'plot' not yet implemented");
            }
            format!("<pre><code>{code}\n</code></pre>\n")
        }
    }
}

/// Marker paragraph at `i` followed by a code block; returns the mode and
/// the index of the code block start
fn marker_at(events: &[Event<'_>], i: usize) -> Option<(CellMode, usize)> {
    if !matches!(events.get(i)?, Event::Start(Tag::Paragraph)) {
        return None;
    }

    let mut text = String::new();
    let mut j = i + 1;
    loop {
        match events.get(j)? {
            Event::Text(t) => text.push_str(t),
            Event::End(TagEnd::Paragraph) => break,
            _ => return None,
        }
        j += 1;
    }

    let mode = CellMode::from_marker(&text)?;
    match events.get(j + 1)? {
        Event::Start(Tag::CodeBlock(_)) => Some((mode, j + 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{html, Parser};

    fn render(markdown: &str) -> (String, usize) {
        let mut transformer = CodeCellTransformer::new();
        let events = transformer.transform(Parser::new(markdown).collect());
        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        (out, transformer.cells())
    }

    #[test]
    fn test_marker_detection() {
        assert_eq!(CellMode::from_marker("sage::"), Some(CellMode::Sage));
        assert_eq!(CellMode::from_marker("Python::  "), Some(CellMode::Python));
        assert_eq!(CellMode::from_marker("r::"), Some(CellMode::R));
        assert_eq!(CellMode::from_marker("ruby::"), None);
        assert_eq!(CellMode::from_marker("sage:: x"), None);
    }

    #[test]
    fn test_executable_cells_are_numbered() {
        let md = "sage::\n\n    1 + 1\n\ntext\n\npython::\n\n```\nprint(2)\n```\n";
        let (html, cells) = render(md);
        assert_eq!(cells, 2);
        assert!(html.contains(r#"<code class="cell" mode="sage" id="0">"#));
        assert!(html.contains(r#"<code class="cell" mode="python" id="1">"#));
        assert!(html.contains("print(2)"));
        assert!(!html.contains("sage::"));
    }

    #[test]
    fn test_example_is_plain_code() {
        let (html, cells) = render("example::\n\n    a < b\n");
        assert_eq!(cells, 0);
        assert!(html.contains("<pre><code>a &lt; b\n</code></pre>"));
        assert!(!html.contains("example::"));
    }

    #[test]
    fn test_unmarked_blocks_untouched() {
        let (html, cells) = render("just text\n\n    code\n");
        assert_eq!(cells, 0);
        assert!(html.contains("<p>just text</p>"));
        assert!(html.contains("<pre><code>code\n</code></pre>"));
    }

    #[test]
    fn test_marker_without_code_stays_paragraph() {
        let (html, _) = render("sage::\n\nno code here\n");
        assert!(html.contains("<p>sage::</p>"));
    }
}
