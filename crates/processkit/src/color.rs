//! Color attribute codec.
//!
//! Declarations carry colors as `#RRGGBB`; the process endpoints want the
//! bare six hex digits. Conversion is purely textual and preserves case.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^#[0-9a-fA-F]{6}$").expect("hardcoded pattern"));

#[derive(Debug, Error)]
#[error("invalid color {0:?}: expected #RRGGBB")]
pub struct InvalidColor(pub String);

/// Validate a declared color attribute.
pub fn validate(color: &str) -> Result<(), InvalidColor> {
    if COLOR_RE.is_match(color) {
        Ok(())
    } else {
        Err(InvalidColor(color.to_string()))
    }
}

/// `#Abcdef` -> `Abcdef`.
pub fn to_api(color: &str) -> String {
    color.strip_prefix('#').unwrap_or(color).to_string()
}

/// `abcdef` -> `#abcdef`.
pub fn to_attr(color: &str) -> String {
    if color.starts_with('#') {
        color.to_string()
    } else {
        format!("#{color}")
    }
}
