//! Small text helpers shared by the request helper and the shell.

/// Selections must be shorter than this many UTF-16 units, as the browser
/// counts them.
pub const MAX_SELECTION_LEN: usize = 30;

/// Strip a Markdown code fence around a JSON payload.
///
/// Models behind OpenAI-compatible gateways often answer with
/// ```` ```json { ... } ``` ```` even in JSON mode.
pub fn strip_json_fences(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest.trim_start();
    } else if let Some(rest) = cleaned.strip_prefix("```JSON") {
        cleaned = rest.trim_start();
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest.trim_start();
    } else {
        return cleaned;
    }
    cleaned.strip_suffix("```").unwrap_or(cleaned).trim()
}

/// Whether a text selection may be looked up and added to the word book:
/// a short run of English letters, spaces and hyphens.
pub fn is_addable_selection(text: &str) -> bool {
    let text = text.trim_matches(is_browser_whitespace);
    !text.is_empty()
        && text.encode_utf16().count() < MAX_SELECTION_LEN
        && text
            .chars()
            .all(|c| c.is_ascii_alphabetic() || is_browser_whitespace(c) || c == '-')
}

/// The characters a browser regex `\s` matches. Unicode `White_Space` plus
/// U+FEFF, minus U+0085.
fn is_browser_whitespace(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

/// Split a free-text answer into the paragraphs the shell renders, one per
/// non-blank line.
pub fn markdown_paragraphs(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect()
}
