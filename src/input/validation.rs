use once_cell::sync::Lazy;
use regex::Regex;

use crate::tag::slugify;

static YES_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[Yy]$").expect("yes regex is valid"));

/// Map a raw confirmation answer to a decision. Empty input takes the default;
/// only a lone `y`/`Y` (surrounding noise stripped) counts as yes.
pub fn interpret_answer(input: &str, default: bool) -> bool {
    if input.trim().is_empty() {
        return default;
    }
    match slugify(input) {
        Ok(normalized) => YES_REGEX.is_match(&normalized),
        Err(_) => false,
    }
}

/// Non-empty text that survives normalization into a tag slug.
pub fn validate_description(input: &str) -> Result<(), String> {
    slugify(input)
        .map(|_| ())
        .map_err(|_| "The description must contain at least one letter or digit".to_string())
}
