use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn url_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*://)?(?:[^/@]+@)?").unwrap())
}

/// Reduces a remote URL to a comparable key: protocol, credentials, and the
/// `.git` suffix are stripped, and scp-style `git@host:org/repo` collapses to
/// `host/org/repo`. Used for equality checks only, never for issuing
/// commands.
pub fn normalize_remote_url(url: &str) -> String {
    let trimmed = url.trim();
    let stripped = url_prefix_re().replace(trimmed, "");
    // scp-style remotes separate host and path with ':'
    let stripped = stripped.replacen(':', "/", 1);
    stripped
        .trim_end_matches('/')
        .trim_end_matches(".git")
        .to_ascii_lowercase()
}

/// Strips the display prefix, either case, so `v1.2.0`, `V1.2.0`, and
/// `1.2.0` compare equal.
pub fn normalize_version(version: &str) -> String {
    let trimmed = version.trim();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Ensures a tag carries the `v` prefix used by upstream releases. A tag
/// already prefixed in either case is a real ref name and passes through
/// untouched.
pub fn normalize_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    if trimmed.starts_with('v') || trimmed.starts_with('V') {
        trimmed.to_string()
    } else {
        format!("v{trimmed}")
    }
}

/// Reads the `version` field out of a package manifest. Parse failures are
/// an absent result, never an error.
pub fn manifest_version(manifest_json: &str) -> Option<String> {
    let value: Value = serde_json::from_str(manifest_json).ok()?;
    value
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn remote_urls_compare_equal_across_protocols() {
        let https = normalize_remote_url("https://github.com/acme/astro-theme.git");
        let ssh = normalize_remote_url("git@github.com:acme/astro-theme");
        let token = normalize_remote_url("https://x-access-token@github.com/acme/astro-theme");
        assert_eq!(https, "github.com/acme/astro-theme");
        assert_eq!(ssh, https);
        assert_eq!(token, https);
    }

    #[test]
    fn remote_url_comparison_is_case_insensitive() {
        assert_eq!(
            normalize_remote_url("https://GitHub.com/Acme/Theme"),
            normalize_remote_url("git@github.com:acme/theme.git"),
        );
    }

    #[test]
    fn version_prefix_is_stripped_for_comparison_only() {
        assert_eq!(normalize_version("v1.2.0"), "1.2.0");
        assert_eq!(normalize_version("V1.2.0"), "1.2.0");
        assert_eq!(normalize_version("1.2.0"), "1.2.0");
        assert_eq!(normalize_version("  v2.0.0 "), "2.0.0");
    }

    #[test]
    fn tag_normalization_adds_missing_prefix() {
        assert_eq!(normalize_tag("1.4.0"), "v1.4.0");
        assert_eq!(normalize_tag("v1.4.0"), "v1.4.0");
        // An uppercase prefix names an existing ref; never rewrite it.
        assert_eq!(normalize_tag("V2.0.0"), "V2.0.0");
    }

    #[test]
    fn manifest_version_tolerates_garbage() {
        assert_eq!(
            manifest_version(r#"{"name":"theme","version":"3.1.4"}"#),
            Some("3.1.4".to_string())
        );
        assert_eq!(manifest_version("not json"), None);
        assert_eq!(manifest_version(r#"{"version":7}"#), None);
        assert_eq!(manifest_version(r#"{"name":"theme"}"#), None);
    }
}
