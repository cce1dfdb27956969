//! Native export of the document-store generation.
//!
//! These files are already close to the canonical shape. Records are moved
//! onto canonical keys, timestamps are back-filled and every request/history
//! item gets defaults for url, method, headers and payload. Fields the
//! canonical model does not know are carried through untouched.

use crate::model::{
    DEFAULT_METHOD, DEFAULT_NAME, DEFAULT_URL, HeaderSetRecord, HistoryRecord, ImportBundle,
    ParamItem, ProjectRecord, RequestRecord, RequestType, SimpleRecord, VariableRecord,
};
use crate::normalize::base::{into_object, link, scalar_text, take_key, take_text, truthy};
use crate::util::{Timings, coerce_millis, generate_history_id, generate_request_id, random_id};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

const VERSION: &str = "unknown";

/// Fields that never survive into a canonical record.
const STRIPPED: [&str; 3] = ["kind", "_rev", "rev"];

type Object = Map<String, Value>;

pub fn transform(data: Value, now: i64) -> ImportBundle {
    let mut root = into_object(data);
    let mut bundle = ImportBundle::new(VERSION);
    if let Some(version) = root.get("version").and_then(Value::as_str).filter(|v| !v.is_empty()) {
        bundle.version = version.to_string();
    }
    if let Some(created) = root.get("createdAt").and_then(Value::as_str).filter(|v| !v.is_empty()) {
        bundle.created_at = created.to_string();
    }
    bundle.load_to_workspace = truthy(root.get("loadToWorkspace"));

    bundle.projects = take_list(&mut root, &["projects"])
        .into_iter()
        .map(|item| project(item, now))
        .collect();
    let requests = take_list(&mut root, &["requests"]);
    bundle.requests = requests
        .into_iter()
        .map(|item| request(item, &mut bundle.projects, now))
        .collect();
    bundle.history = take_list(&mut root, &["history"])
        .into_iter()
        .map(|item| history(item, now))
        .collect();
    bundle.websocket_url_history = simple_list(&mut root, &["websocket-url-history", "websocketUrlHistory"]);
    bundle.url_history = simple_list(&mut root, &["url-history", "urlHistory"]);
    bundle.variables = take_list(&mut root, &["variables"])
        .into_iter()
        .map(variable)
        .collect();
    bundle.header_sets = take_list(&mut root, &["headers-sets", "headerSets"])
        .into_iter()
        .map(|item| header_set(item, now))
        .collect();
    bundle.auth_data = simple_list(&mut root, &["auth-data", "authData"]);
    bundle.cookies = simple_list(&mut root, &["cookies"]);
    bundle.host_rules = simple_list(&mut root, &["host-rules", "hostRules"]);

    debug!(counts = ?bundle.counts(), "transformed document-store export");
    bundle
}

fn take_list(root: &mut Object, keys: &[&str]) -> Vec<Object> {
    keys.iter()
        .find_map(|key| match root.remove(*key) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        })
        .unwrap_or_default()
        .into_iter()
        .filter(Value::is_object)
        .map(into_object)
        .collect()
}

fn strip(map: &mut Object) {
    for key in STRIPPED {
        map.remove(key);
    }
}

/// Store key of an exported record: `_referenceId`, then `key`, then the
/// record's own `_id` / `id`.
fn take_store_key(map: &mut Object) -> Option<String> {
    let reference = take_key(map, "_referenceId");
    let key = take_key(map, "key");
    let own = take_key(map, "_id");
    let plain = take_key(map, "id");
    reference.or(key).or(own).or(plain)
}

fn take_timings(map: &mut Object, now: i64) -> Timings {
    let created = map.remove("created");
    let updated = map.remove("updated");
    Timings::backfill(created.as_ref(), updated.as_ref(), now)
}

fn take_as<T: DeserializeOwned>(map: &mut Object, key: &str) -> Option<T> {
    map.remove(key).and_then(|v| serde_json::from_value(v).ok())
}

fn take_non_empty(map: &mut Object, key: &str, default: &str) -> String {
    let value = take_text(map, key);
    if value.is_empty() { default.to_string() } else { value }
}

fn take_optional(map: &mut Object, key: &str) -> Option<String> {
    Some(take_text(map, key)).filter(|s| !s.is_empty())
}

fn project(mut map: Object, now: i64) -> ProjectRecord {
    strip(&mut map);
    let id = take_store_key(&mut map).unwrap_or_else(random_id);
    let timings = take_timings(&mut map, now);
    let mut record = ProjectRecord::new(id, take_non_empty(&mut map, "name", DEFAULT_NAME), now);
    record.created = timings.created;
    record.updated = timings.updated;
    record.description = take_optional(&mut map, "description");
    record.order = map.remove("order").as_ref().and_then(coerce_millis).unwrap_or(0);
    record.requests = take_as::<Vec<String>>(&mut map, "requests").unwrap_or_default();
    record.extra = map;
    record
}

fn request(mut map: Object, projects: &mut [ProjectRecord], now: i64) -> RequestRecord {
    strip(&mut map);
    let key = take_key(&mut map, "key");
    let own = take_key(&mut map, "_id");
    let plain = take_key(&mut map, "id");
    let legacy = take_key(&mut map, "_referenceLegacyProject");
    let pointer = take_key(&mut map, "legacyProject");
    let project_ref = legacy.or(pointer);

    let name = take_non_empty(&mut map, "name", DEFAULT_NAME);
    let url = take_non_empty(&mut map, "url", DEFAULT_URL);
    let method = take_non_empty(&mut map, "method", DEFAULT_METHOD);
    let id = key.or(own).or(plain).unwrap_or_else(|| {
        generate_request_id(Some(&name), Some(&url), Some(&method), project_ref.as_deref())
    });
    let timings = take_timings(&mut map, now);

    let mut record = RequestRecord::new(id, now);
    record.name = name;
    record.url = url;
    record.method = method;
    record.headers = take_text(&mut map, "headers");
    record.payload = take_text(&mut map, "payload");
    record.created = timings.created;
    record.updated = timings.updated;
    record.request_type = map
        .remove("type")
        .as_ref()
        .and_then(Value::as_str)
        .map_or(RequestType::Saved, RequestType::from_tag);
    record.projects = take_as::<Vec<String>>(&mut map, "projects").unwrap_or_default();
    record.headers_model = take_as::<Vec<ParamItem>>(&mut map, "headersModel");
    record.query_model = take_as::<Vec<ParamItem>>(&mut map, "queryModel");
    record.url_encoded_model = take_as::<Vec<ParamItem>>(&mut map, "urlEncodedModel");
    record.multipart = take_as(&mut map, "multipart");
    record.description = take_optional(&mut map, "description");
    record.drive_id = take_optional(&mut map, "driveId");
    record.extra = map;

    let target = project_ref.as_deref();
    if let Some(project) = projects.iter_mut().find(|p| target == Some(p.id.as_str())) {
        link(&mut record, project);
    }
    record
}

fn history(mut map: Object, now: i64) -> HistoryRecord {
    strip(&mut map);
    let timings = take_timings(&mut map, now);
    let url = take_non_empty(&mut map, "url", DEFAULT_URL);
    let method = take_non_empty(&mut map, "method", DEFAULT_METHOD);
    let id = take_store_key(&mut map)
        .unwrap_or_else(|| generate_history_id(Some(timings.created), &url, &method));
    HistoryRecord {
        id,
        rev: None,
        url,
        method,
        headers: take_text(&mut map, "headers"),
        payload: take_text(&mut map, "payload"),
        created: timings.created,
        updated: timings.updated,
        extra: map,
    }
}

fn variable(mut map: Object) -> VariableRecord {
    strip(&mut map);
    let id = take_store_key(&mut map).unwrap_or_else(random_id);
    let enabled = map.remove("enabled").is_none_or(|v| truthy(Some(&v)));
    VariableRecord {
        id,
        rev: None,
        environment: take_non_empty(&mut map, "environment", "default"),
        variable: take_text(&mut map, "variable"),
        value: scalar_text(map.remove("value").as_ref()),
        enabled,
        extra: map,
    }
}

fn header_set(mut map: Object, now: i64) -> HeaderSetRecord {
    strip(&mut map);
    // Header sets never had stable keys; they are always stored as new.
    take_store_key(&mut map);
    let timings = take_timings(&mut map, now);
    HeaderSetRecord {
        id: random_id(),
        rev: None,
        name: take_non_empty(&mut map, "name", "Unnamed set"),
        headers: take_text(&mut map, "headers"),
        created: timings.created,
        updated: timings.updated,
        extra: map,
    }
}

fn simple_list(root: &mut Object, keys: &[&str]) -> Vec<SimpleRecord> {
    take_list(root, keys)
        .into_iter()
        .map(|mut map| {
            strip(&mut map);
            let own = take_key(&mut map, "_id");
            let plain = take_key(&mut map, "id");
            // `key` is only consumed when it becomes the id.
            let id = own
                .or(plain)
                .or_else(|| take_key(&mut map, "key"))
                .unwrap_or_else(random_id);
            SimpleRecord {
                id,
                rev: None,
                fields: map,
            }
        })
        .collect()
}
