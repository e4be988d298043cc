use lazy_static::lazy_static;
use regex::Regex;

/// Maximum characters forwarded to the completion endpoint.
///
/// A ~32K token context minus the system prompt and response budget leaves
/// roughly 29K tokens for input; at ~4 chars per token, 100K chars is a safe
/// ceiling. Anything beyond it is cut off with a note so the model knows it
/// is looking at a partial view.
pub const MAX_INPUT_CHARS: usize = 100_000;

/// Inputs shorter than this (after trimming) are rejected before any network
/// call is made.
pub const MIN_INPUT_CHARS: usize = 20;

/// Bounds the input to [`MAX_INPUT_CHARS`].
///
/// Returns the input unchanged when it fits. Otherwise returns the first
/// `MAX_INPUT_CHARS` characters followed by a truncation notice naming the
/// original and shown lengths. The notice is mandatory whenever truncation
/// happens.
pub fn bound_input(input: &str) -> String {
    let total = input.chars().count();
    if total <= MAX_INPUT_CHARS {
        return input.to_string();
    }

    let shown: String = input.chars().take(MAX_INPUT_CHARS).collect();
    format!(
        "{shown}\n\n[NOTE: Input was truncated to fit within the model's context window. \
         Original length: {total} chars, showing first {MAX_INPUT_CHARS}.]\n"
    )
}

lazy_static! {
    static ref RE_GITHUB_URL: Regex =
        Regex::new(r"^https?://(www\.)?github\.com/[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+").unwrap();
}

/// Basic check that a string looks like a real GitHub repository URL.
pub fn is_valid_github_url(url: &str) -> bool {
    RE_GITHUB_URL.is_match(url)
}
