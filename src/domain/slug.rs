//! URL slugs for categories.
//!
//! Category slugs keep CJK ideographs verbatim so a name such as “台大資管生活”
//! stays readable in the address bar; everything outside ASCII word characters,
//! hyphens and the unified ideograph block is dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern must compile"));

static DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9_\-\x{4E00}-\x{9FA5}]").expect("slug filter pattern must compile")
});

/// Errors that can occur while deriving a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive a category slug from its display name.
///
/// The name is lowercased, each whitespace run becomes a single hyphen, and any
/// character outside `[A-Za-z0-9_-]` or `U+4E00..=U+9FA5` is removed.
pub fn derive_category_slug(name: &str) -> Result<String, SlugError> {
    if name.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let lowered = name.to_lowercase();
    let hyphenated = WHITESPACE_RUN.replace_all(&lowered, "-");
    let candidate = DISALLOWED.replace_all(&hyphenated, "").into_owned();

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: name.to_string(),
        });
    }

    Ok(candidate)
}

/// Pick the explicit slug when one was supplied, otherwise derive it from `name`.
pub fn resolve_category_slug(explicit: Option<&str>, name: &str) -> Result<String, SlugError> {
    match explicit.map(str::trim).filter(|value| !value.is_empty()) {
        Some(slug) => Ok(slug.to_string()),
        None => derive_category_slug(name),
    }
}
