use std::cmp::Ordering;

use semver::Version;

/// Parse a `v`-prefixed release tag into a semver::Version.
///
/// Partial versions like "v1" or "v1.2" are padded with zeros, following
/// the shorthand accepted by Go module tooling.
///
/// Examples:
/// - "v1" -> Version(1, 0, 0)
/// - "v1.2" -> Version(1, 2, 0)
/// - "v1.2.3-beta.1" -> Version(1, 2, 3, pre: beta.1)
/// - "1.2.3" -> None (missing prefix)
pub fn parse_version(tag: &str) -> Option<Version> {
    let version = tag.strip_prefix('v')?;

    // pre-release and build suffixes only attach to a full triple
    let (core, suffix) = match version.find(['-', '+']) {
        Some(idx) => version.split_at(idx),
        None => (version, ""),
    };

    let parts: Vec<&str> = core.split('.').collect();
    let normalized = match (parts.len(), suffix.is_empty()) {
        (1, true) => format!("{}.0.0", parts[0]),
        (2, true) => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Compare two release tags by semantic version precedence.
///
/// Build metadata is ignored. Tags that do not parse sort before every valid
/// tag, and two unparseable tags compare equal.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => a.cmp_precedence(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("v1", Some("1.0.0"))]
    #[case("v1.2", Some("1.2.0"))]
    #[case("v1.2.3", Some("1.2.3"))]
    #[case("v1.7.0-alpha.1", Some("1.7.0-alpha.1"))]
    #[case("v1.2-beta", None)] // suffix needs a full triple
    #[case("1.2.3", None)] // missing v prefix
    #[case("latest", None)]
    #[case("v01.2.3", None)] // leading zero
    #[case("", None)]
    fn parse_version_returns_expected(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            parse_version(input),
            expected.map(|v| Version::parse(v).unwrap())
        );
    }

    #[rstest]
    #[case("v1.2.3", "v1.2.3", Ordering::Equal)]
    #[case("v1.2.3", "v1.2.4", Ordering::Less)]
    #[case("v1.10.0", "v1.9.9", Ordering::Greater)] // numeric, not lexical
    #[case("v2.0.0", "v1.99.99", Ordering::Greater)]
    #[case("v1.7.0-alpha.0", "v1.7.0", Ordering::Less)]
    #[case("v1.7.0-alpha.2", "v1.7.0-alpha.10", Ordering::Less)]
    #[case("v1.7.0-alpha.1", "v1.7.0-beta.0", Ordering::Less)]
    #[case("v1.2.3+build.1", "v1.2.3+build.2", Ordering::Equal)]
    #[case("v1.2", "v1.2.0", Ordering::Equal)]
    #[case("garbage", "v0.0.1", Ordering::Less)]
    #[case("v0.0.1", "garbage", Ordering::Greater)]
    #[case("garbage", "rubbish", Ordering::Equal)]
    fn compare_versions_follows_semver_precedence(
        #[case] a: &str,
        #[case] b: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_versions(a, b), expected);
    }
}
