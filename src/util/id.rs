//! Identifier generation.
//!
//! Saved requests and history entries get content-derived keys so that
//! re-importing the same file lands on the same documents. Everything without
//! a natural key gets a random v4 UUID.

use crate::util::time::{day_start, now_millis};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use uuid::Uuid;

// Same unreserved set as JavaScript's encodeURIComponent.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode one path component.
#[must_use]
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Random identifier for entities without a natural key.
#[must_use]
pub fn random_id() -> String {
    Uuid::new_v4().to_string()
}

/// Deterministic key of a saved request.
///
/// `enc(name)/enc(url)/method[/project]`, lowercased. Missing parts fall back
/// to `unknown name`, `https://` and `GET`.
#[must_use]
pub fn generate_request_id(
    name: Option<&str>,
    url: Option<&str>,
    method: Option<&str>,
    project_id: Option<&str>,
) -> String {
    let name = non_empty(name).unwrap_or("unknown name").to_lowercase();
    let url = non_empty(url).unwrap_or("https://").to_lowercase();
    let method = non_empty(method).unwrap_or("GET").to_lowercase();

    let mut id = format!("{}/{}/{}", encode_component(&name), encode_component(&url), method);
    if let Some(project) = non_empty(project_id) {
        id.push('/');
        id.push_str(project);
    }
    id
}

/// Deterministic key of a history entry.
///
/// Bucketed by UTC day, so the same URL and method on the same day collapse
/// to one key. An unusable timestamp buckets into today.
#[must_use]
pub fn generate_history_id(timestamp: Option<i64>, url: &str, method: &str) -> String {
    let day = timestamp
        .and_then(day_start)
        .or_else(|| day_start(now_millis()))
        .unwrap_or_default();
    format!(
        "{day}/{}/{}",
        encode_component(&url.to_lowercase()),
        method.to_lowercase()
    )
}
