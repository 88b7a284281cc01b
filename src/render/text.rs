//! Text extraction and cleanup for rendered elements
//!
//! `inner_text` approximates what a browser reports as an element's rendered
//! text: `<br>` and block-level boundaries become line breaks, script and
//! style content is skipped. [`sanitize_text`] then cleans the result.

use regex::Regex;
use scraper::node::Node;
use scraper::ElementRef;
use std::sync::LazyLock;

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

static MULTI_NEWLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Rendered text of an element, already sanitized
pub fn inner_text(element: ElementRef<'_>) -> String {
    let mut buffer = String::new();
    collect_text(element, &mut buffer);
    sanitize_text(&buffer)
}

fn collect_text(element: ElementRef<'_>, buffer: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buffer.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    buffer.push('\n');
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    buffer.push('\n');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, buffer);
                }
                if block {
                    buffer.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Sanitize extracted text content
///
/// 1. Remove zero-width characters
/// 2. Remove control characters (except newline/tab)
/// 3. Normalize runs of spaces and tabs
/// 4. Trim each line
/// 5. Collapse three or more newlines into a blank line
pub fn sanitize_text(text: &str) -> String {
    let result = remove_zero_width(text);
    let result = remove_control_chars(&result);
    let result = WHITESPACE_REGEX.replace_all(&result, " ");
    let result = trim_lines(&result);
    let result = MULTI_NEWLINE_REGEX.replace_all(&result, "\n\n");

    result.trim().to_string()
}

/// Remove zero-width spaces, directional marks and the BOM
pub fn remove_zero_width(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(*c,
                '\u{200B}'..='\u{200F}' |
                '\u{2028}'..='\u{202F}' |
                '\u{FEFF}'
            )
        })
        .collect()
}

/// Remove control characters except newline and tab
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Trim whitespace from each line
pub fn trim_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n")
}
