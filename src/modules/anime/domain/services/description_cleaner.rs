use regex::Regex;
use std::sync::OnceLock;

/// Longest description kept, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

fn markup_tag() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"\[/?\w+(=\w+)?[^\]]*\]").expect("markup pattern is valid"))
}

fn whitespace_run() -> &'static Regex {
    static WS: OnceLock<Regex> = OnceLock::new();
    WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Strip inline `[tag]`, `[tag=value ...]` and `[/tag]` markup, collapse
/// whitespace and trim.
pub fn clean_description(text: &str) -> String {
    let stripped = markup_tag().replace_all(text, "");
    whitespace_run()
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Cleaned and capped description; blank input becomes `None`.
pub fn normalize_description(text: Option<&str>) -> Option<String> {
    let cleaned = clean_description(text?);
    if cleaned.is_empty() {
        return None;
    }

    Some(match cleaned.char_indices().nth(MAX_DESCRIPTION_CHARS) {
        Some((cut, _)) => cleaned[..cut].trim_end().to_string(),
        None => cleaned,
    })
}
