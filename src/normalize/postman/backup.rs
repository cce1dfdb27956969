//! Postman full backup: collections, header presets, globals and
//! environments in one file.

use crate::model::{
    DEFAULT_METHOD, DEFAULT_NAME, DEFAULT_URL, HeaderSetRecord, ImportBundle, ProjectRecord,
    RequestRecord, VariableRecord,
};
use crate::normalize::base::{array, link, scalar_text, text};
use crate::normalize::postman::{
    compute_body_old, compute_simple_model, ensure_variables_syntax, ordered_requests,
    rewritten_array,
};
use crate::util::{coerce_millis, generate_request_id, random_id};
use serde_json::{Map, Value, json};
use tracing::debug;

pub const VERSION: &str = "postman-backup";

pub fn transform(data: &Value, now: i64) -> ImportBundle {
    let mut bundle = ImportBundle::new(VERSION);
    for (index, collection) in array(data, "collections").iter().enumerate() {
        let mut project = collection_project(collection, index, now);
        for (position, item) in ordered_requests(collection).into_iter().enumerate() {
            let mut request = backup_request(item, &project.id, position, now);
            link(&mut request, &mut project);
            bundle.requests.push(request);
        }
        bundle.projects.push(project);
    }
    bundle.header_sets = array(data, "headerPresets")
        .iter()
        .map(|preset| header_set(preset, now))
        .collect();
    bundle.variables = variables(data);

    debug!(counts = ?bundle.counts(), "transformed postman backup");
    bundle
}

fn collection_project(collection: &Value, index: usize, now: i64) -> ProjectRecord {
    let id = text(collection, "id").map_or_else(random_id, str::to_string);
    let mut project = ProjectRecord::new(id, text(collection, "name").unwrap_or(DEFAULT_NAME), now);
    project.description = text(collection, "description").map(str::to_string);
    project.order = i64::try_from(index).unwrap_or(i64::MAX);
    project.created = collection.get("createdAt").and_then(coerce_millis).unwrap_or(now);
    project.updated = collection.get("updatedAt").and_then(coerce_millis).unwrap_or(now);
    project
}

fn backup_request(item: &Value, project_id: &str, position: usize, now: i64) -> RequestRecord {
    let name = text(item, "name").unwrap_or(DEFAULT_NAME);
    let raw_url = text(item, "url");
    let raw_method = text(item, "method");
    let id = generate_request_id(Some(name), raw_url, raw_method, Some(project_id));

    let body = compute_body_old(item);
    let mut request = RequestRecord::new(id, now);
    request.name = name.to_string();
    request.url = ensure_variables_syntax(raw_url.unwrap_or(DEFAULT_URL));
    request.method = ensure_variables_syntax(raw_method.unwrap_or(DEFAULT_METHOD));
    request.headers = ensure_variables_syntax(&scalar_text(item.get("headers")));
    request.payload = ensure_variables_syntax(&body.payload);
    request.multipart = body.multipart;
    request.headers_model = Some(compute_simple_model(&rewritten_array(item, "headerData")));
    request.query_model = Some(compute_simple_model(&rewritten_array(item, "queryParams")));
    request.created = item.get("time").and_then(coerce_millis).unwrap_or(now);
    request.description = text(item, "description").map(str::to_string);
    request.extra.insert("projectOrder".to_string(), json!(position));
    request
}

fn header_set(preset: &Value, now: i64) -> HeaderSetRecord {
    let created = preset
        .get("created")
        .and_then(coerce_millis)
        .or_else(|| preset.get("timestamp").and_then(coerce_millis))
        .unwrap_or(now);
    let headers = array(preset, "headers")
        .iter()
        .map(|h| format!("{}: {}", scalar_text(h.get("key")), scalar_text(h.get("value"))))
        .collect::<Vec<_>>()
        .join("\n");
    HeaderSetRecord {
        id: random_id(),
        rev: None,
        name: text(preset, "name").unwrap_or("Unnamed set").to_string(),
        headers,
        created,
        updated: now,
        extra: Map::new(),
    }
}

// Backup variables have no stable identity: every import inserts them anew.
fn variables(data: &Value) -> Vec<VariableRecord> {
    let globals = array(data, "globals")
        .iter()
        .map(|item| variable(item, "default"));
    let environments = array(data, "environments").iter().flat_map(|env| {
        let name = text(env, "name").unwrap_or("Unnamed").to_string();
        array(env, "values")
            .iter()
            .map(move |item| variable(item, &name))
    });
    globals.chain(environments).collect()
}

fn variable(item: &Value, environment: &str) -> VariableRecord {
    VariableRecord {
        id: random_id(),
        rev: None,
        environment: environment.to_string(),
        variable: scalar_text(item.get("key")),
        value: ensure_variables_syntax(&scalar_text(item.get("value"))),
        enabled: item.get("enabled").and_then(Value::as_bool).unwrap_or(true),
        extra: Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backup() -> Value {
        json!({
            "version": 1,
            "collections": [{
                "id": "c1",
                "name": "Collection",
                "createdAt": 1_500_000_000_000_i64,
                "order": ["r1"],
                "folders_order": ["f1"],
                "folders": [{"id": "f1", "order": ["r2"]}],
                "requests": [
                    {"id": "r1", "name": "one", "url": "{{host}}/a", "method": "POST",
                     "headers": "x: {{token}}", "dataMode": "raw", "data": "{\"a\":\"{{v}}\"}",
                     "headerData": [{"key": "x", "value": "{{token}}"}], "time": 7},
                    {"id": "r2", "name": "two", "url": "http://b"},
                    {"id": "r3", "name": "orphan", "url": "http://c"}
                ]
            }, {
                "name": "Second",
                "requests": [{"id": "x"}]
            }],
            "headerPresets": [{"name": "Auth", "headers": [{"key": "a", "value": "b"}, {"key": "c", "value": "d"}], "timestamp": 5}],
            "globals": [{"key": "g", "value": "1"}],
            "environments": [
                {"name": "Env", "values": [{"key": "e", "value": "{{g}}", "enabled": false}]},
                {"values": [{"key": "u", "value": "2"}]},
                {"name": "Empty", "values": []}
            ]
        })
    }

    #[test]
    fn flattens_collections_in_declared_order() {
        let bundle = transform(&backup(), 100);
        assert_eq!(bundle.version, VERSION);
        assert_eq!(bundle.projects.len(), 2);
        assert_eq!(bundle.requests.len(), 2);

        let project = &bundle.projects[0];
        assert_eq!(project.id, "c1");
        assert_eq!(project.order, 0);
        assert_eq!(project.created, 1_500_000_000_000);
        assert_eq!(project.requests, [bundle.requests[0].id.clone(), bundle.requests[1].id.clone()]);

        assert_eq!(bundle.projects[1].order, 1);
        assert!(bundle.projects[1].requests.is_empty());

        let first = &bundle.requests[0];
        assert_eq!(first.name, "one");
        assert_eq!(first.url, "${host}/a");
        assert_eq!(first.headers, "x: ${token}");
        assert_eq!(first.payload, "{\"a\":\"${v}\"}");
        assert_eq!(first.headers_model.as_ref().unwrap()[0].value, "${token}");
        assert_eq!(first.created, 7);
        assert_eq!(first.projects, ["c1"]);
        assert!(first.id.ends_with("/post/c1"));
        assert_eq!(bundle.requests[1].method, "GET");
    }

    #[test]
    fn header_presets_become_sets() {
        let bundle = transform(&backup(), 100);
        let set = &bundle.header_sets[0];
        assert_eq!(set.name, "Auth");
        assert_eq!(set.headers, "a: b\nc: d");
        assert_eq!(set.created, 5);
        assert_eq!(set.updated, 100);
    }

    #[test]
    fn variables_from_globals_and_environments() {
        let bundle = transform(&backup(), 100);
        let vars = &bundle.variables;
        assert_eq!(vars.len(), 3);
        assert_eq!(vars[0].environment, "default");
        assert_eq!(vars[1].environment, "Env");
        assert_eq!(vars[1].value, "${g}");
        assert!(!vars[1].enabled);
        assert_eq!(vars[2].environment, "Unnamed");
        assert!(vars[2].enabled);
    }

    #[test]
    fn disabled_backup_variable_stays_disabled() {
        let data = json!({
            "environments": [{"name": "Env", "values": [
                {"key": "off", "value": "1", "enabled": false},
                {"key": "on", "value": "2", "enabled": true},
                {"key": "unset", "value": "3"}
            ]}]
        });
        let bundle = transform(&data, 1);
        let flags: Vec<_> = bundle.variables.iter().map(|v| (v.variable.as_str(), v.enabled)).collect();
        assert_eq!(flags, [("off", false), ("on", true), ("unset", true)]);
    }

    #[test]
    fn variable_ids_are_fresh_each_run() {
        let a = transform(&backup(), 1);
        let b = transform(&backup(), 1);
        assert_ne!(a.variables[0].id, b.variables[0].id);
        assert_eq!(a.requests[0].id, b.requests[0].id);
    }
}
