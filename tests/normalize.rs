use std::cmp::Ordering;

use pkg_versions::version::{InvalidVersionFormat, compare_versions, normalize, normalize_or_empty};

#[test]
fn acceptance_fixtures() {
    for (raw, expected) in [
        ("1.0b3", "1.0~b3"),
        ("2.5.0-rc1", "2.5.0~rc1"),
        ("2.0b6", "2.0~b6"),
        ("2.0.SP1", "2.0.SP1"),
        ("3_2_12", "3.2.12"),
        ("1.0-20050927.133100", "1.0.20050927.133100"),
        ("3.0.1-b11", "3.0.1~b11"),
        ("5.0.1-b04", "5.0.1~b04"),
        ("0.11b", "0.11b"),
        ("1_6_2", "1.6.2"),
        ("1.0.1.Final", "1.0.1"),
        ("3.0.0.M1", "3.0.0~M1"),
        ("6.0-alpha-2", "6.0~alpha.2"),
        ("4.13-beta-1", "4.13~beta.1"),
        ("5.5.0-M1", "5.5.0~M1"),
        ("3.0.0-M2", "3.0.0~M2"),
        ("3.0.0-M1", "3.0.0~M1"),
        ("3.0.0-M3", "3.0.0~M3"),
        ("3.0.0-beta.1", "3.0.0~beta.1"),
        ("1.0-alpha-2.1", "1.0~alpha.2.1"),
        ("1.0-alpha-8", "1.0~alpha.8"),
        ("1.0-alpha-18", "1.0~alpha.18"),
        ("1.0-alpha-10", "1.0~alpha.10"),
        ("1.0-beta-7", "1.0~beta.7"),
        ("1.0-alpha-5", "1.0~alpha.5"),
        ("2.0-M10", "2.0~M10"),
        ("7.0.0-beta4", "7.0.0~beta4"),
    ] {
        assert_eq!(normalize(raw).unwrap(), expected, "normalize({raw:?})");
    }
}

#[test]
fn input_without_a_digit_is_rejected() {
    assert_eq!(
        normalize("not-a-version"),
        Err(InvalidVersionFormat("not-a-version".to_string()))
    );
}

#[test]
fn empty_input_policy_is_explicit() {
    assert!(normalize("").is_err());
    assert_eq!(normalize_or_empty("").unwrap(), "");
}

#[test]
fn final_suffix_is_stripped_after_substitution() {
    // `_`/`-` become dots before the suffix check, so `-Final` also counts
    assert_eq!(normalize("2.7.10-Final").unwrap(), "2.7.10");
    assert_eq!(normalize("2.7.10.Final").unwrap(), "2.7.10");
}

#[test]
fn single_trailing_letter_is_kept_without_separator() {
    assert_eq!(normalize("0.11b").unwrap(), "0.11b");
    assert_eq!(normalize("9.1a").unwrap(), "9.1a");
}

// The point of the canonical form: the qualifier placement decides how the
// version sorts against its bare release.
#[test]
fn canonical_forms_order_correctly() {
    let pre_release = normalize("2.5.0-rc1").unwrap();
    let release = normalize("2.5.0").unwrap();
    let service_pack = normalize("2.5.0.SP1").unwrap();

    assert_eq!(compare_versions(&pre_release, &release), Ordering::Less);
    assert_eq!(compare_versions(&service_pack, &release), Ordering::Greater);
    assert_eq!(
        compare_versions(&normalize("1.0-alpha-8").unwrap(), &normalize("1.0-alpha-10").unwrap()),
        Ordering::Less
    );
}
