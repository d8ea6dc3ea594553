//! Display formatting of assistant text
//!
//! Free-form model output is reshaped for a narrow fixed-width display:
//! markdown scaffolding becomes plain glyphs, newline runs are compacted
//! and pathological tokens are wrapped. The transform is total and
//! idempotent: formatting already-formatted text changes nothing.

use regex::Regex;

/// Longest whitespace-free token left unwrapped
const MAX_TOKEN_LEN: usize = 48;

const DIVIDER: &str = "────────";

/// Format raw assistant text for display
pub fn format_for_display(content: &str) -> String {
    let heading_pattern = Regex::new(r"(?m)^#{1,6}\s*").unwrap();
    let bullet_pattern = Regex::new(r"(?m)^[-*]\s+").unwrap();
    let equals_rule_pattern = Regex::new(r"(?m)^={3,}$").unwrap();
    let dash_rule_pattern = Regex::new(r"(?m)^-{3,}$").unwrap();
    let extra_newlines = Regex::new(r"\n{3,}").unwrap();
    let trailing_space = Regex::new(r"[ \t]+\n").unwrap();

    // Fence markers disappear, the enclosed text (language tag included)
    // stays.
    let without_fences = content.replace("```", "");

    let mut normalized = without_fences.replace("\r\n", "\n");
    normalized = heading_pattern.replace_all(&normalized, "").to_string();
    normalized = bullet_pattern.replace_all(&normalized, "• ").to_string();
    normalized = equals_rule_pattern
        .replace_all(&normalized, DIVIDER)
        .to_string();
    normalized = dash_rule_pattern
        .replace_all(&normalized, DIVIDER)
        .to_string();
    normalized = extra_newlines.replace_all(&normalized, "\n\n").to_string();
    normalized = trailing_space.replace_all(&normalized, "\n").to_string();

    wrap_long_tokens(normalized.trim())
}

/// Break any whitespace-free run longer than the limit into fixed-width
/// chunks so it cannot overflow horizontally. Chunking is by characters,
/// not bytes.
fn wrap_long_tokens(text: &str) -> String {
    let long_token = Regex::new(&format!(r"\S{{{},}}", MAX_TOKEN_LEN + 1)).unwrap();
    long_token
        .replace_all(text, |caps: &regex::Captures| {
            let chars: Vec<char> = caps[0].chars().collect();
            chars
                .chunks(MAX_TOKEN_LEN)
                .map(|chunk| chunk.iter().collect::<String>())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .into_owned()
}
