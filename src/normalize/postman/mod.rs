//! Postman exports: full backups, v1 and v2 collections, environments.
//!
//! Postman writes variables as `{{name}}`; the canonical form is `${name}`,
//! with the three dynamic variables mapped onto their function equivalents.

pub mod backup;
pub mod environment;
pub mod v1;
pub mod v2;

use crate::model::{MultipartItem, ParamItem};
use crate::normalize::base::{array, scalar_text, truthy};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("valid variable pattern"));

/// Rewrite `{{var}}` placeholders into `${var}`.
#[must_use]
pub fn ensure_variables_syntax(input: &str) -> String {
    if !input.contains("{{") {
        return input.to_string();
    }
    VARIABLE
        .replace_all(input, |caps: &Captures<'_>| {
            let name = match &caps[1] {
                "$randomInt" => "random()",
                "$guid" => "uuid()",
                "$timestamp" => "now()",
                other => other,
            };
            format!("${{{name}}}")
        })
        .into_owned()
}

/// Rewrite placeholders in every string nested anywhere in `value`.
pub fn ensure_variables_deep(value: &mut Value) {
    match value {
        Value::String(s) => {
            if s.contains("{{") {
                *s = ensure_variables_syntax(s);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(ensure_variables_deep),
        Value::Object(map) => map.values_mut().for_each(ensure_variables_deep),
        _ => {}
    }
}

/// Rewritten copy of an array field, empty when absent.
pub(crate) fn rewritten_array(value: &Value, key: &str) -> Vec<Value> {
    let mut items = array(value, key).to_vec();
    items.iter_mut().for_each(ensure_variables_deep);
    items
}

/// Whether a Postman row is switched on. Rows use either `enabled` or
/// `disabled`; with neither present the row is on.
pub(crate) fn row_enabled(row: &Value) -> bool {
    match row.get("enabled") {
        Some(flag) => truthy(Some(flag)),
        None => !truthy(row.get("disabled")),
    }
}

/// `{key, value}` rows into the canonical `{name, value, enabled}` model.
#[must_use]
pub fn compute_simple_model(rows: &[Value]) -> Vec<ParamItem> {
    rows.iter()
        .map(|row| ParamItem {
            name: scalar_text(row.get("key")),
            value: scalar_text(row.get("value")),
            enabled: row_enabled(row),
        })
        .collect()
}

/// Form rows into multipart fields. File rows keep no value.
pub(crate) fn compute_multipart(rows: &[Value]) -> Vec<MultipartItem> {
    rows.iter()
        .map(|row| {
            let is_file = row.get("type").and_then(Value::as_str) == Some("file");
            MultipartItem {
                name: scalar_text(row.get("key")),
                value: if is_file { String::new() } else { scalar_text(row.get("value")) },
                enabled: row_enabled(row),
                is_file,
            }
        })
        .collect()
}

/// Trimmed text of a form parameter.
pub(crate) fn param_value(value: Option<&Value>) -> String {
    scalar_text(value).trim().to_string()
}

/// Body of a v1 / backup request.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct LegacyBody {
    pub payload: String,
    pub multipart: Option<Vec<MultipartItem>>,
}

/// Resolve a v1 request body from `data` and `dataMode`.
pub(crate) fn compute_body_old(item: &Value) -> LegacyBody {
    let data = item.get("data");
    if let Some(Value::String(raw)) = data {
        return LegacyBody {
            payload: raw.clone(),
            multipart: None,
        };
    }
    let rows = data.and_then(Value::as_array).map_or(&[][..], Vec::as_slice);
    if rows.is_empty() {
        return LegacyBody::default();
    }
    match item.get("dataMode").and_then(Value::as_str) {
        Some("params") => LegacyBody {
            payload: String::new(),
            multipart: Some(compute_multipart(rows)),
        },
        Some("urlencoded") => LegacyBody {
            payload: rows
                .iter()
                .map(|row| {
                    let name = row.get("key").or_else(|| row.get("name"));
                    format!("{}={}", param_value(name), param_value(row.get("value")))
                })
                .collect::<Vec<_>>()
                .join("&"),
            multipart: None,
        },
        _ => LegacyBody::default(),
    }
}

/// Shared by the backup and v1 layouts: request ids in the order the
/// collection lists them, then each folder's list in folder order. Ids that
/// resolve to no request are dropped.
pub(crate) fn ordered_requests(collection: &Value) -> Vec<&Value> {
    let requests = array(collection, "requests");
    let folders = array(collection, "folders");
    let folder_order = array(collection, "folders_order");

    let ordered_folders: Vec<&Value> = if folder_order.is_empty() {
        folders.iter().collect()
    } else {
        folder_order
            .iter()
            .filter_map(|id| folders.iter().find(|f| f.get("id") == Some(id)))
            .collect()
    };

    let mut ids: Vec<&Value> = array(collection, "order").iter().collect();
    for folder in ordered_folders {
        ids.extend(array(folder, "order"));
    }
    ids.into_iter()
        .filter_map(|id| requests.iter().find(|r| r.get("id") == Some(id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rewrites_placeholders() {
        assert_eq!(
            ensure_variables_syntax("{{host}}/x?{{q}}=1"),
            "${host}/x?${q}=1"
        );
        assert_eq!(ensure_variables_syntax("{{$randomInt}}"), "${random()}");
        assert_eq!(ensure_variables_syntax("{{$guid}}"), "${uuid()}");
        assert_eq!(ensure_variables_syntax("{{$timestamp}}"), "${now()}");
        assert_eq!(ensure_variables_syntax("plain"), "plain");
        assert_eq!(ensure_variables_syntax("{{unclosed"), "{{unclosed");
    }

    #[test]
    fn rewrites_nested_values() {
        let mut value = json!({"a": ["{{x}}", 1, {"b": "{{y}}"}], "c": null});
        ensure_variables_deep(&mut value);
        assert_eq!(value, json!({"a": ["${x}", 1, {"b": "${y}"}], "c": null}));
    }

    #[test]
    fn simple_model_defaults_enabled() {
        let rows = json!([
            {"key": "a", "value": "1"},
            {"key": "b", "value": 2, "enabled": false},
            {"key": "c", "value": "3", "disabled": true}
        ]);
        let model = compute_simple_model(rows.as_array().unwrap());
        assert_eq!(model.len(), 3);
        assert!(model[0].enabled);
        assert_eq!(model[1].value, "2");
        assert!(!model[1].enabled);
        assert!(!model[2].enabled);
    }

    #[test]
    fn old_body_modes() {
        assert_eq!(compute_body_old(&json!({"data": "raw"})).payload, "raw");
        assert_eq!(compute_body_old(&json!({"data": []})), LegacyBody::default());

        let form = compute_body_old(&json!({
            "dataMode": "params",
            "data": [{"key": "f", "type": "file", "value": "x"}, {"key": "t", "type": "text", "value": "v"}]
        }));
        assert_eq!(form.payload, "");
        let multipart = form.multipart.unwrap();
        assert!(multipart[0].is_file);
        assert_eq!(multipart[0].value, "");
        assert_eq!(multipart[1].value, "v");

        let encoded = compute_body_old(&json!({
            "dataMode": "urlencoded",
            "data": [{"key": " a ", "value": "1"}, {"key": "b", "value": null}]
        }));
        assert_eq!(encoded.payload, "a=1&b=");

        let binary = compute_body_old(&json!({"dataMode": "binary", "data": [{"x": 1}]}));
        assert_eq!(binary, LegacyBody::default());
    }

    #[test]
    fn order_follows_lists_and_drops_strays() {
        let collection = json!({
            "order": ["r3"],
            "folders_order": ["f2", "f1", "missing"],
            "folders": [
                {"id": "f1", "order": ["r1"]},
                {"id": "f2", "order": ["r2", "gone"]}
            ],
            "requests": [{"id": "r1"}, {"id": "r2"}, {"id": "r3"}, {"id": "r4"}]
        });
        let ids: Vec<_> = ordered_requests(&collection)
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["r3", "r2", "r1"]);
    }
}
