//! Postman collection, v2.0 / v2.1 layout: a recursive `item` tree where
//! folders carry their own `item` arrays and leaves carry a `request`.

use crate::model::{
    DEFAULT_METHOD, DEFAULT_NAME, DEFAULT_URL, ImportBundle, ParamItem, ProjectRecord,
    RequestRecord,
};
use crate::normalize::base::{array, link, scalar_text, text};
use crate::normalize::chunked::ChunkedTraversal;
use crate::normalize::postman::{
    compute_multipart, compute_simple_model, ensure_variables_syntax, param_value,
    rewritten_array, row_enabled,
};
use crate::util::{generate_request_id, random_id};
use serde_json::{Value, json};
use tracing::debug;

pub const VERSION: &str = "postman-collection-v2";

pub async fn transform(data: &Value, traversal: &mut ChunkedTraversal, now: i64) -> ImportBundle {
    let info = data.get("info").unwrap_or(&Value::Null);
    let mut project = ProjectRecord::new(
        text(info, "_postman_id").map_or_else(random_id, str::to_string),
        text(info, "name").unwrap_or(DEFAULT_NAME),
        now,
    );
    project.description = description(info.get("description"));

    let mut position = 0usize;
    let project_id = project.id.clone();
    let mut requests = traversal
        .walk_tree(array(data, "item"), folder_items, |leaf| {
            let request = v2_request(leaf, &project_id, position, now);
            position += 1;
            request
        })
        .await;
    for request in &mut requests {
        link(request, &mut project);
    }
    debug!(requests = requests.len(), "transformed postman v2 collection");

    let mut bundle = ImportBundle::new(VERSION);
    bundle.requests = requests;
    bundle.projects.push(project);
    bundle
}

fn folder_items(node: &Value) -> Option<&[Value]> {
    node.get("item").and_then(Value::as_array).map(Vec::as_slice)
}

// Descriptions are either plain text or `{content, type}`.
fn description(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Object(map) => scalar_text(map.get("content")),
        other => scalar_text(Some(other)),
    };
    Some(text).filter(|t| !t.is_empty())
}

fn v2_request(item: &Value, project_id: &str, position: usize, now: i64) -> RequestRecord {
    // A request may be given as a bare URL string.
    let source = item.get("request").unwrap_or(&Value::Null);
    let url_field = match source {
        Value::String(_) => Some(source),
        _ => source.get("url"),
    };
    let raw_url = match url_field {
        Some(Value::String(url)) if !url.is_empty() => url.as_str(),
        Some(url) => text(url, "raw").unwrap_or(DEFAULT_URL),
        None => DEFAULT_URL,
    };

    let name = text(item, "name").unwrap_or(DEFAULT_NAME);
    let url = ensure_variables_syntax(raw_url);
    let method = ensure_variables_syntax(text(source, "method").unwrap_or(DEFAULT_METHOD));
    let id = generate_request_id(Some(name), Some(&url), Some(&method), Some(project_id));

    let header = rewritten_array(source, "header");
    let query = url_field.map(|u| rewritten_array(u, "query")).unwrap_or_default();

    let mut request = RequestRecord::new(id, now);
    request.name = name.to_string();
    request.url = url;
    request.method = method;
    request.headers = header
        .iter()
        .filter(|h| row_enabled(h))
        .map(|h| format!("{}: {}", scalar_text(h.get("key")), scalar_text(h.get("value"))))
        .collect::<Vec<_>>()
        .join("\n");
    request.headers_model = Some(compute_simple_model(&header));
    request.query_model = Some(compute_simple_model(&query));
    request.description = description(source.get("description"));
    request.extra.insert("projectOrder".to_string(), json!(position));
    apply_body(&mut request, source.get("body"));
    request
}

fn apply_body(request: &mut RequestRecord, body: Option<&Value>) {
    let Some(body) = body else {
        return;
    };
    let Some(mode) = body.get("mode").and_then(Value::as_str) else {
        return;
    };
    if body.get(mode).is_none_or(Value::is_null) {
        return;
    }
    match mode {
        "raw" => request.payload = ensure_variables_syntax(&scalar_text(body.get("raw"))),
        "formdata" => {
            let rows = rewritten_array(body, "formdata");
            if !rows.is_empty() {
                request.multipart = Some(compute_multipart(&rows));
            }
        }
        "urlencoded" => {
            let rows = rewritten_array(body, "urlencoded");
            if rows.is_empty() {
                return;
            }
            let model: Vec<ParamItem> = rows
                .iter()
                .map(|row| ParamItem {
                    name: param_value(row.get("key")),
                    value: param_value(row.get("value")),
                    enabled: row_enabled(row),
                })
                .collect();
            request.payload = model
                .iter()
                .filter(|p| p.enabled)
                .map(|p| format!("{}={}", p.name, p.value))
                .collect::<Vec<_>>()
                .join("&");
            request.url_encoded_model = Some(model);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::detect::{SourceFormat, detect};

    fn leaf(name: &str) -> Value {
        json!({"name": name, "request": {"url": format!("http://x/{name}"), "method": "GET"}})
    }

    #[tokio::test]
    async fn one_folder_with_five_requests() {
        let data = json!({
            "info": {
                "_postman_id": "col-1",
                "name": "Collection",
                "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
            },
            "item": [{"name": "Folder", "item": [leaf("a"), leaf("b"), leaf("c"), leaf("d"), leaf("e")]}]
        });
        assert_eq!(detect(&data), Some(SourceFormat::CollectionV2));
        let bundle = transform(&data, &mut ChunkedTraversal::default(), 1).await;
        assert_eq!(bundle.requests.len(), 5);
        assert_eq!(bundle.projects.len(), 1);
        let project = &bundle.projects[0];
        assert_eq!(project.id, "col-1");
        assert_eq!(project.requests.len(), 5);
        assert_eq!(bundle.requests[4].name, "e");
        assert_eq!(bundle.requests[4].extra["projectOrder"], 4);
        assert!(bundle.requests.iter().all(|r| r.projects == ["col-1"]));
    }

    #[tokio::test]
    async fn deep_nesting_is_flattened_in_order() {
        let mut tree = json!([leaf("deep")]);
        for depth in 0..50 {
            tree = json!([{"name": format!("f{depth}"), "item": tree}, leaf(&format!("after{depth}"))]);
        }
        let data = json!({"info": {"_postman_id": "p"}, "item": tree});
        let bundle = transform(&data, &mut ChunkedTraversal::new(7), 1).await;
        assert_eq!(bundle.requests.len(), 51);
        assert_eq!(bundle.requests[0].name, "deep");
        assert_eq!(bundle.requests[1].name, "after0");
        assert_eq!(bundle.requests[50].name, "after49");
    }

    #[tokio::test]
    async fn body_modes_and_headers() {
        let data = json!({
            "info": {"_postman_id": "p", "description": {"content": "about"}},
            "item": [
                {"name": "raw", "request": {
                    "url": {"raw": "{{host}}/raw", "query": [{"key": "q", "value": "{{v}}"}]},
                    "method": "POST",
                    "header": [
                        {"key": "a", "value": "{{x}}"},
                        {"key": "b", "value": "2", "disabled": true}
                    ],
                    "body": {"mode": "raw", "raw": "{{payload}}"}
                }},
                {"name": "form", "request": {"url": "http://f", "method": "POST",
                    "body": {"mode": "formdata", "formdata": [
                        {"key": "file", "type": "file", "src": "/tmp/x"},
                        {"key": "t", "value": "{{v}}", "type": "text", "disabled": true}
                    ]}}},
                {"name": "encoded", "request": {"url": "http://e", "method": "POST",
                    "body": {"mode": "urlencoded", "urlencoded": [
                        {"key": " a ", "value": "1"},
                        {"key": "b", "value": "2", "disabled": true}
                    ]}}},
                {"name": "file", "request": {"url": "http://b", "method": "PUT",
                    "body": {"mode": "file", "file": {"src": "x"}}}},
                {"name": "bare", "request": "http://bare"}
            ]
        });
        let bundle = transform(&data, &mut ChunkedTraversal::default(), 1).await;
        assert_eq!(bundle.projects[0].description.as_deref(), Some("about"));

        let raw = &bundle.requests[0];
        assert_eq!(raw.url, "${host}/raw");
        assert_eq!(raw.payload, "${payload}");
        assert_eq!(raw.headers, "a: ${x}");
        assert_eq!(raw.headers_model.as_ref().unwrap().len(), 2);
        assert_eq!(raw.query_model.as_ref().unwrap()[0].value, "${v}");

        let form = &bundle.requests[1];
        assert_eq!(form.payload, "");
        let multipart = form.multipart.as_ref().unwrap();
        assert!(multipart[0].is_file);
        assert_eq!(multipart[1].value, "${v}");
        assert!(!multipart[1].enabled);

        let encoded = &bundle.requests[2];
        assert_eq!(encoded.payload, "a=1");
        assert_eq!(encoded.url_encoded_model.as_ref().unwrap().len(), 2);

        assert_eq!(bundle.requests[3].payload, "");
        assert_eq!(bundle.requests[4].url, "http://bare");
        assert_eq!(bundle.requests[4].method, "GET");
    }
}
