use std::time::Duration;

use serde_json::Value;
use themesync_core::normalize::normalize_remote_url;
use themesync_core::normalize::normalize_tag;

pub const NO_RELEASE_NOTES: &str = "no information available";
const RELEASE_NOTES_TIMEOUT: Duration = Duration::from_secs(3);

/// Fetches the changelog body for a release tag from the GitHub API.
/// Cosmetic preview data only: every failure, timeout included, degrades to
/// `NO_RELEASE_NOTES` and never gates the state machine.
pub fn fetch_release_notes(upstream_url: &str, version: &str) -> String {
    release_notes_endpoint(upstream_url, version)
        .and_then(|endpoint| request_body(&endpoint))
        .unwrap_or_else(|| NO_RELEASE_NOTES.to_string())
}

fn release_notes_endpoint(upstream_url: &str, version: &str) -> Option<String> {
    let normalized = normalize_remote_url(upstream_url);
    let rest = normalized.strip_prefix("github.com/")?;
    let mut parts = rest.splitn(2, '/');
    let org = parts.next()?;
    let repo = parts.next()?;
    if org.is_empty() || repo.is_empty() {
        return None;
    }
    let tag = normalize_tag(version);
    Some(format!(
        "https://api.github.com/repos/{org}/{repo}/releases/tags/{tag}"
    ))
}

fn request_body(endpoint: &str) -> Option<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(RELEASE_NOTES_TIMEOUT)
        .user_agent("themesync")
        .build()
        .ok()?;
    let response = client.get(endpoint).send().ok()?;
    if !response.status().is_success() {
        return None;
    }
    let value: Value = response.json().ok()?;
    let body = value.get("body")?.as_str()?.trim();
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}
