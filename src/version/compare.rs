//! RPM-style version comparison
//!
//! Orders two version strings with `rpmvercmp` semantics: alternating
//! numeric and alphabetic segments, numeric segments compared as numbers
//! with leading zeros ignored, `~` sorting before end of string and `^`
//! after it. This is the comparator the canonical form produced by
//! [`normalize`](crate::version::normalize::normalize) is designed for: a
//! `~`-qualified pre-release sorts below the bare release it qualifies.

use std::cmp::Ordering;

/// Compare two version strings as RPM version segments.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    if left == right {
        return Ordering::Equal;
    }

    let mut a = left;
    let mut b = right;

    // Runs of anything that is neither alphanumeric nor a special
    // separator only delimit segments and never affect the ordering
    let is_noise = |c: char| !c.is_ascii_alphanumeric() && c != '~' && c != '^';

    loop {
        a = a.trim_start_matches(is_noise);
        b = b.trim_start_matches(is_noise);

        // Tilde sorts before everything, including the end of the string
        match (a.strip_prefix('~'), b.strip_prefix('~')) {
            (Some(ra), Some(rb)) => {
                a = ra;
                b = rb;
                continue;
            }
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => {}
        }

        // Caret sorts after the end of the string but before any other
        // continuation
        match (a.strip_prefix('^'), b.strip_prefix('^')) {
            (Some(ra), Some(rb)) => {
                a = ra;
                b = rb;
                continue;
            }
            (Some(_), None) => {
                return if b.is_empty() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
            }
            (None, Some(_)) => {
                return if a.is_empty() {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
            }
            (None, None) => {}
        }

        if a.is_empty() || b.is_empty() {
            break;
        }

        let numeric = a.starts_with(|c: char| c.is_ascii_digit());
        let (seg_a, rest_a) = take_segment(a, numeric);
        let (seg_b, rest_b) = take_segment(b, numeric);

        // Segments of different kinds: the numeric one is newer
        if seg_b.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ordering = if numeric {
            // Compare as numbers without parsing: more digits wins once
            // leading zeros are gone, equal lengths compare lexically
            let seg_a = seg_a.trim_start_matches('0');
            let seg_b = seg_b.trim_start_matches('0');
            seg_a.len().cmp(&seg_b.len()).then_with(|| seg_a.cmp(seg_b))
        } else {
            seg_a.cmp(seg_b)
        };
        if ordering != Ordering::Equal {
            return ordering;
        }

        a = rest_a;
        b = rest_b;
    }

    // All segments compared equal; whichever side has content left wins
    a.len().cmp(&b.len())
}

/// Take the maximal all-numeric or all-alphabetic prefix. The returned
/// segment is empty when the string starts with a segment of the other kind.
fn take_segment(s: &str, numeric: bool) -> (&str, &str) {
    let end = s
        .find(|c: char| {
            if numeric {
                !c.is_ascii_digit()
            } else {
                !c.is_ascii_alphabetic()
            }
        })
        .unwrap_or(s.len());
    s.split_at(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.0", "1.0", Ordering::Equal)]
    #[case("1.0", "2.0", Ordering::Less)]
    #[case("2.0.1", "2.0", Ordering::Greater)]
    #[case("5.0.1", "5.0.1a", Ordering::Less)]
    #[case("10a2", "10b2", Ordering::Less)]
    #[case("6.5p2", "6.6p1", Ordering::Less)]
    #[case("6.5p1", "6.5p10", Ordering::Less)]
    #[case("abc.4", "2", Ordering::Less)]
    #[case("1.0a", "1.0aa", Ordering::Less)]
    #[case("4.999.9", "5.0", Ordering::Less)]
    #[case("4.999", "4.99.9", Ordering::Greater)]
    fn segments_compare_like_rpmvercmp(
        #[case] left: &str,
        #[case] right: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_versions(left, right), expected);
        assert_eq!(compare_versions(right, left), expected.reverse());
    }

    #[rstest]
    #[case("10.0001", "10.1", Ordering::Equal)]
    #[case("10.0001", "10.0039", Ordering::Less)]
    #[case("10.1111", "10.10001", Ordering::Less)]
    #[case("20240521", "20240522", Ordering::Less)]
    #[case("20240521", "202405210", Ordering::Less)]
    fn leading_zeros_are_ignored_but_embedded_zeros_are_not(
        #[case] left: &str,
        #[case] right: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_versions(left, right), expected);
    }

    // The property the normalizer relies on: a `~`-qualified pre-release
    // sorts below its bare release, an `SP` service pack above it.
    #[rstest]
    #[case("1.0~b3", "1.0", Ordering::Less)]
    #[case("3.0.0~M1", "3.0.0", Ordering::Less)]
    #[case("6.0~alpha.2", "6.0", Ordering::Less)]
    #[case("2.5.0~rc1", "2.5.0~rc2", Ordering::Less)]
    #[case("1.0~rc1~git123", "1.0~rc1", Ordering::Less)]
    #[case("2.0.SP1", "2.0", Ordering::Greater)]
    #[case("2.0.SP1", "2.0.SP2", Ordering::Less)]
    fn tilde_sorts_before_the_bare_release(
        #[case] left: &str,
        #[case] right: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_versions(left, right), expected);
        assert_eq!(compare_versions(right, left), expected.reverse());
    }

    #[rstest]
    #[case("1.0", "1.0^", Ordering::Less)]
    #[case("1.0^git1", "1.0^git2", Ordering::Less)]
    #[case("1.0^20240501", "1.0.1", Ordering::Less)]
    #[case("1.01", "1.0^git1", Ordering::Greater)]
    #[case("1.0^git1~pre", "1.0^git1", Ordering::Less)]
    fn caret_sorts_between_release_and_next_segment(
        #[case] left: &str,
        #[case] right: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_versions(left, right), expected);
    }

    #[rstest]
    #[case("4_0", "4.0")]
    #[case("b+", "b_")]
    #[case("1.1.Á.1", "1.1.1")]
    fn non_alphanumeric_runs_do_not_affect_ordering(#[case] left: &str, #[case] right: &str) {
        assert_eq!(compare_versions(left, right), Ordering::Equal);
    }
}
