//! Stat-name rules and the listener naming convention.

use crate::StatError;

/// Suffix a listener type carries after the capitalized stat name.
pub const LISTENER_SUFFIX: &str = "EventListener";

/// Older listener types used this suffix instead.
pub const LEGACY_LISTENER_SUFFIX: &str = "StatEvent";

/// Check that `name` can be used as a stat name.
///
/// Names are map keys and directory names, so they must be non-blank and
/// contain neither uppercase characters nor whitespace.
pub fn validate_stat_name(name: &str) -> Result<(), StatError> {
    if name.trim().is_empty() {
        return Err(StatError::BlankName);
    }
    if name.chars().any(char::is_uppercase) {
        return Err(StatError::UppercaseName(name.to_string()));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(StatError::WhitespaceName(name.to_string()));
    }
    Ok(())
}

/// Conventional listener type name for a stat: `strength` -> `StrengthEventListener`.
pub fn listener_type_name(stat: &str) -> String {
    let mut chars = stat.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("{capitalized}{LISTENER_SUFFIX}")
}

/// Stat name a listener type stands for: `StrengthEventListener` -> `strength`.
///
/// Returns `None` if the type name carries neither suffix or nothing precedes it.
pub fn stat_from_listener_type(type_name: &str) -> Option<String> {
    let stem = type_name
        .strip_suffix(LISTENER_SUFFIX)
        .or_else(|| type_name.strip_suffix(LEGACY_LISTENER_SUFFIX))?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_lowercase())
}
