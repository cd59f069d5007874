//! Math passthrough.
//!
//! `$..$`, `$$..$$`, `\(..\)`, `\[..\]` and double-backtick ASCII-math spans
//! are cut out of the source before Markdown sees them, replaced by opaque
//! placeholders, and put back verbatim (HTML-escaped) into the rendered
//! output. A client-side renderer typesets them later.

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

/// Math spans removed from a source text
#[derive(Debug, Default)]
pub struct MathShield {
    spans: Vec<String>,
}

impl MathShield {
    /// Replace every math span in `source` with a placeholder.
    ///
    /// Fenced code, indented code and backtick code spans are copied
    /// through untouched.
    pub fn protect(source: &str) -> (String, MathShield) {
        let mut shield = MathShield::default();
        let mut out = String::with_capacity(source.len());
        let mut rest = source;
        let mut lines = LineState::default();
        let mut line_start = true;

        while let Some(c) = rest.chars().next() {
            if line_start {
                let line = &rest[..rest.find('\n').map_or(rest.len(), |i| i + 1)];
                if lines.is_code(line) {
                    out.push_str(line);
                    rest = &rest[line.len()..];
                    continue;
                }
                line_start = false;
            }

            if let Some(len) = math_span_len(rest, out.chars().next_back()) {
                let span = &rest[..len];
                out.push(OPEN);
                out.push_str(&shield.spans.len().to_string());
                out.push(CLOSE);
                shield.spans.push(span.to_string());
                rest = &rest[len..];
                continue;
            }

            let len = match c {
                '`' => code_span_len(rest),
                // `\$` never opens a span
                '\\' => rest.chars().take(2).map(char::len_utf8).sum(),
                _ => c.len_utf8(),
            };
            let copied = &rest[..len];
            out.push_str(copied);
            rest = &rest[len..];
            line_start = copied.ends_with('\n');
        }

        (out, shield)
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Put the math spans back into rendered HTML
    pub fn restore(&self, html: &str) -> String {
        if self.spans.is_empty() {
            return html.to_string();
        }

        let mut out = String::with_capacity(html.len());
        let mut rest = html;
        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let after = &rest[start + OPEN.len_utf8()..];
            let restored = after.find(CLOSE).and_then(|end| {
                let index: usize = after[..end].parse().ok()?;
                let span = self.spans.get(index)?;
                Some((span, end))
            });
            match restored {
                Some((span, end)) => {
                    out.push_str(&html_escape(span));
                    rest = &after[end + CLOSE.len_utf8()..];
                }
                None => {
                    out.push(OPEN);
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Length of the math span starting at the beginning of `text`, if any
fn math_span_len(text: &str, previous: Option<char>) -> Option<usize> {
    if let Some(body) = text.strip_prefix("$$") {
        return closing(body, "$$", false).map(|end| 2 + end + 2);
    }
    if let Some(body) = text.strip_prefix('$') {
        if body.starts_with('$') {
            return None;
        }
        return closing(body, "$", true).map(|end| 1 + end + 1);
    }
    if let Some(body) = text.strip_prefix("\\(") {
        return closing(body, "\\)", false).map(|end| 2 + end + 2);
    }
    if let Some(body) = text.strip_prefix("\\[") {
        return closing(body, "\\]", false).map(|end| 2 + end + 2);
    }
    if let Some(body) = text.strip_prefix("``") {
        if previous == Some('`') || body.starts_with('`') {
            return None;
        }
        return closing(body, "``", false).map(|end| 2 + end + 2);
    }
    None
}

/// Offset of the closing delimiter in `body`.
///
/// Spans are non-empty and never cross a blank line. Inline `$` spans stay
/// on one line and skip escaped delimiters.
fn closing(body: &str, delimiter: &str, inline: bool) -> Option<usize> {
    let limit = if inline {
        body.find('\n')
    } else {
        body.find("\n\n")
    }
    .unwrap_or(body.len());

    let mut from = 0;
    while let Some(pos) = body[from..limit].find(delimiter) {
        let at = from + pos;
        if inline && body[..at].ends_with('\\') {
            from = at + delimiter.len();
            continue;
        }
        return (at > 0).then_some(at);
    }
    None
}

/// Length of a backtick run plus, when it opens a code span, the span
/// itself. Runs of two are ASCII-math delimiters and never reach here
/// with a closing partner.
fn code_span_len(text: &str) -> usize {
    let run = text.chars().take_while(|&c| c == '`').count();
    if run == 2 {
        return run;
    }
    let body = &text[run..];
    let limit = body.find("\n\n").unwrap_or(body.len());

    let mut from = 0;
    while let Some(pos) = body[from..limit].find('`') {
        let at = from + pos;
        let closing = body[at..].chars().take_while(|&c| c == '`').count();
        if closing == run {
            return run + at + closing;
        }
        from = at + closing;
    }
    run
}

/// Tracks fenced and indented code blocks line by line
#[derive(Debug)]
struct LineState {
    fence: Option<Fence>,
    previous_blank: bool,
    indented: bool,
}

impl Default for LineState {
    fn default() -> Self {
        Self {
            fence: None,
            previous_blank: true,
            indented: false,
        }
    }
}

impl LineState {
    /// Whether `line` (with its newline) belongs to a code block
    fn is_code(&mut self, line: &str) -> bool {
        let blank = line.trim().is_empty();
        let code = if let Some(fence) = self.fence {
            if fence.closed_by(line) {
                self.fence = None;
            }
            self.indented = false;
            true
        } else if let Some(fence) = Fence::opened_by(line) {
            self.fence = Some(fence);
            self.indented = false;
            true
        } else {
            let indented = line.starts_with("    ") || line.starts_with('\t');
            self.indented = !blank && indented && (self.previous_blank || self.indented);
            self.indented
        };
        self.previous_blank = blank;
        code
    }
}

#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    fn opened_by(line: &str) -> Option<Fence> {
        let text = strip_fence_indent(line)?;
        let marker = text.chars().next().filter(|&c| c == '`' || c == '~')?;
        let len = text.chars().take_while(|&c| c == marker).count();
        if len < 3 || (marker == '`' && text[len..].contains('`')) {
            return None;
        }
        Some(Fence { marker, len })
    }

    fn closed_by(&self, line: &str) -> bool {
        let Some(text) = strip_fence_indent(line) else {
            return false;
        };
        let len = text.chars().take_while(|&c| c == self.marker).count();
        len >= self.len && text[len..].trim().is_empty()
    }
}

/// Fences may be indented by at most three spaces
fn strip_fence_indent(line: &str) -> Option<&str> {
    let text = line.trim_start_matches(' ');
    (line.len() - text.len() < 4).then_some(text)
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
