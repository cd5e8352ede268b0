//! Identifier rules
//!
//! Identifiers are non-empty string tokens that must not look like numbers.
//! A separator character (`.` by default) addresses records inside a
//! mounted sub-container: `"db.connection"` asks the sub-container `db` for
//! `connection`.

use crate::{DiError, Result};

/// Default separator between a sub-container prefix and the rest of the id.
pub const DEFAULT_SEPARATOR: char = '.';

/// Check that `id` is usable as a record or container identifier.
pub fn validate(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(DiError::invalid_identifier(id, "identifier must not be empty"));
    }
    if is_numeric(id) {
        return Err(DiError::invalid_identifier(
            id,
            "identifier must not be numeric",
        ));
    }
    Ok(())
}

/// Check that `id` is usable as a sub-container prefix.
pub fn validate_prefix(id: &str, separator: char) -> Result<()> {
    validate(id)?;
    if id.contains(separator) {
        return Err(DiError::invalid_identifier(
            id,
            "sub-container identifier must not contain the separator",
        ));
    }
    Ok(())
}

/// Split `id` on the first separator into `(head, rest)`.
#[inline]
pub fn split(id: &str, separator: char) -> (&str, Option<&str>) {
    match id.split_once(separator) {
        Some((head, rest)) => (head, Some(rest)),
        None => (id, None),
    }
}

/// Check if `id` reads as a number: optional sign, digits with at most one
/// decimal point, and an optional exponent.
pub fn is_numeric(id: &str) -> bool {
    let s = id.trim();
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);

    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(at) => (&s[..at], Some(&s[at + 1..])),
        None => (s, None),
    };

    let mut digits = 0;
    let mut dots = 0;
    for c in mantissa.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    if digits == 0 || dots > 1 {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && exp.chars().all(|c| c.is_ascii_digit())
        }
    }
}
