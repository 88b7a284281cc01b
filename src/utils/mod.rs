//! Common utilities and helper functions

pub mod error;
pub mod retry;

use regex::Regex;
use std::sync::OnceLock;

/// Sanitize filename by removing invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    static INVALID_CHARS: OnceLock<Regex> = OnceLock::new();

    let re =
        INVALID_CHARS.get_or_init(|| Regex::new(r#"[<>:"/\\|?*\s]"#).expect("Invalid regex pattern"));

    re.replace_all(filename, "_").to_string()
}

/// Truncate text to a maximum number of characters for log output
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
