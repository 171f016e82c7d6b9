//! Composite key encoding
//!
//! A composite key is `\0` + object type + `\0` + each attribute + `\0`.
//! The leading namespace byte keeps composite keys out of plain range scans.

use healchain_core::{HealchainError, HealchainResult};

pub const COMPOSITE_KEY_NAMESPACE: char = '\u{0}';
pub const MIN_UNICODE_RUNE: char = '\u{0}';
pub const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

fn validate_component(component: &str) -> HealchainResult<()> {
    if component.contains(MIN_UNICODE_RUNE) || component.contains(MAX_UNICODE_RUNE) {
        return Err(HealchainError::InvalidKey(format!(
            "composite key component {:?} contains a reserved character",
            component
        )));
    }
    Ok(())
}

/// Build a composite key from an object type and its attributes
pub fn create_composite_key(object_type: &str, attributes: &[&str]) -> HealchainResult<String> {
    validate_component(object_type)?;
    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    key.push(COMPOSITE_KEY_NAMESPACE);
    key.push_str(object_type);
    key.push(MIN_UNICODE_RUNE);
    for attribute in attributes {
        validate_component(attribute)?;
        key.push_str(attribute);
        key.push(MIN_UNICODE_RUNE);
    }
    Ok(key)
}

/// Split a composite key back into its object type and attributes
pub fn split_composite_key(key: &str) -> HealchainResult<(String, Vec<String>)> {
    let body = key
        .strip_prefix(COMPOSITE_KEY_NAMESPACE)
        .ok_or_else(|| HealchainError::InvalidKey(format!("{:?} is not a composite key", key)))?;
    let mut components: Vec<String> = body
        .split(MIN_UNICODE_RUNE)
        .map(str::to_string)
        .collect();
    // trailing separator leaves an empty final component
    if components.last().map(String::is_empty) != Some(true) || components.len() < 2 {
        return Err(HealchainError::InvalidKey(format!(
            "{:?} is not a composite key",
            key
        )));
    }
    components.pop();
    let object_type = components.remove(0);
    Ok((object_type, components))
}

pub fn is_composite_key(key: &str) -> bool {
    key.starts_with(COMPOSITE_KEY_NAMESPACE)
}
