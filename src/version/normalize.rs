//! Canonical version form for heterogeneous upstream version strings
//!
//! Upstream projects report versions as `2.5.0-rc1`, `3_2_12`, `1.0.1.Final`
//! or `3.0.0.M1`. This module rewrites them into a single comparable form in
//! which pre-release qualifiers are separated by `~` (which RPM-style
//! comparators sort before the bare release) and post-release service packs
//! keep a `.` separator.

use crate::version::error::InvalidVersionFormat;

/// Normalize a raw version string into its canonical form.
///
/// The steps, in order:
///
/// 1. Replace every `_` and `-` with `.` across the whole string.
/// 2. Split into the longest leading run of digits and dots ending in a
///    digit, and the trailing rest. No such run is an error.
/// 3. A trailing `.Final` is dropped entirely.
/// 4. A single trailing letter stays attached unchanged (`0.11b`).
/// 5. Any other qualifier loses its leading `.`/`~` separator and is
///    reattached with `.` when it is an `SP` service pack, with `~`
///    otherwise; `-` inside the qualifier becomes `.`.
///
/// Empty input is rejected; see [`normalize_or_empty`] for call sites where
/// an empty string legitimately means "no version".
pub fn normalize(raw: &str) -> Result<String, InvalidVersionFormat> {
    let substituted = raw.replace(['_', '-'], ".");

    let (leading, trailing) = split_leading_run(&substituted)
        .ok_or_else(|| InvalidVersionFormat(raw.to_string()))?;

    if trailing == ".Final" {
        return Ok(leading.to_string());
    }

    // A single letter is part of the release identifier, not a qualifier
    if trailing.len() == 1 && trailing.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(format!("{leading}{trailing}"));
    }

    let mut qualifier = trailing.to_string();
    if let Some(rest) = qualifier.strip_prefix(['.', '~']) {
        qualifier = rest.to_string();
    }
    if !qualifier.is_empty() {
        // Service pack is a post-release marker and must not sort before
        // the bare release
        if qualifier.starts_with("SP") {
            qualifier.insert(0, '.');
        } else {
            qualifier.insert(0, '~');
        }
    }
    let qualifier = qualifier.replace('-', ".");

    Ok(format!("{leading}{qualifier}"))
}

/// [`normalize`], except that an empty input maps to an empty canonical
/// string. Koji reports packages without builds as `""`; those pass through
/// here unchanged instead of being flagged as malformed.
pub fn normalize_or_empty(raw: &str) -> Result<String, InvalidVersionFormat> {
    if raw.is_empty() {
        return Ok(String::new());
    }
    normalize(raw)
}

/// Split off the longest leading run of digits and dots that ends in a
/// digit. Returns `None` when the string has no such run.
fn split_leading_run(s: &str) -> Option<(&str, &str)> {
    let run_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let end = s[..run_end].rfind(|c: char| c.is_ascii_digit())? + 1;
    Some(s.split_at(end))
}
