//! Helpers shared by every transformer.
//!
//! Project/request cross-references are maintained exclusively through
//! [`add_project_reference`] and [`add_request_reference`], always as a pair
//! (see [`link`]), so that a project lists a request if and only if the
//! request lists the project.

use crate::model::{ProjectRecord, RequestRecord};
use serde_json::{Map, Value};

/// Record `project_id` on the request. No-op if already present.
pub fn add_project_reference(request: &mut RequestRecord, project_id: &str) {
    if !request.projects.iter().any(|id| id == project_id) {
        request.projects.push(project_id.to_string());
    }
}

/// Record `request_id` on the project. No-op if already present.
pub fn add_request_reference(project: &mut ProjectRecord, request_id: &str) {
    if !project.requests.iter().any(|id| id == request_id) {
        project.requests.push(request_id.to_string());
    }
}

/// Make `request` and `project` point at each other.
pub fn link(request: &mut RequestRecord, project: &mut ProjectRecord) {
    add_project_reference(request, &project.id);
    add_request_reference(project, &request.id);
}

/// Non-empty string field of a JSON object.
pub(crate) fn text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub(crate) fn text_or(value: &Value, key: &str, default: &str) -> String {
    text(value, key).unwrap_or(default).to_string()
}

/// Array field of a JSON object, empty when absent or not an array.
pub(crate) fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

/// Render a scalar the way a form field would show it.
pub(crate) fn scalar_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Loose truthiness of a source flag.
pub(crate) fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Take the object out of a value, or an empty map for anything else.
pub(crate) fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Remove a field and return it as a non-empty string key.
pub(crate) fn take_key(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Remove a field and return it as a string, `""` when absent or null.
pub(crate) fn take_text(map: &mut Map<String, Value>, key: &str) -> String {
    scalar_text(map.remove(key).as_ref())
}
