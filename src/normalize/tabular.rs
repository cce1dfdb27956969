//! Native export of the intermediate table store.
//!
//! Saved, Drive and history requests arrive mixed in one `requests` array,
//! each tagged with a `type`. Projects do not carry request ids of the new
//! generation; they list the *old* request ids in `requestIds`, which are
//! resolved against the saved requests once the whole array has been read.

use crate::model::{
    DEFAULT_METHOD, DEFAULT_NAME, DEFAULT_URL, HistoryRecord, ImportBundle, ProjectRecord,
    RequestRecord, RequestType,
};
use crate::normalize::base::{array, link, scalar_text, text};
use crate::normalize::chunked::ChunkedTraversal;
use crate::util::{coerce_millis, generate_history_id, generate_request_id, random_id};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

const VERSION: &str = "unknown";

/// Item tagged with the id it had in the source table.
struct Origin<T> {
    origin: Option<Value>,
    record: T,
}

/// Project with the old ids of the requests it owned.
struct PendingProject {
    request_ids: Vec<Value>,
    record: ProjectRecord,
}

enum Parsed {
    Saved(Origin<RequestRecord>),
    History(Origin<HistoryRecord>),
    Skipped,
}

pub async fn transform(data: &Value, traversal: &mut ChunkedTraversal, now: i64) -> ImportBundle {
    let parsed = traversal
        .map(array(data, "requests"), |item| parse_item(item, now))
        .await;

    let mut saved = Vec::new();
    let mut history = Vec::new();
    let mut seen = HashSet::new();
    let mut skipped = 0usize;
    for item in parsed {
        match item {
            Parsed::Saved(entry) => saved.push(entry),
            // First occurrence of a derived history id wins.
            Parsed::History(entry) => {
                if seen.insert(entry.record.id.clone()) {
                    history.push(entry.record);
                }
            }
            Parsed::Skipped => skipped += 1,
        }
    }

    let mut projects = array(data, "projects")
        .iter()
        .filter_map(|item| parse_project(item, now))
        .collect::<Vec<_>>();
    associate(&mut projects, &mut saved);

    debug!(
        saved = saved.len(),
        history = history.len(),
        projects = projects.len(),
        skipped,
        "transformed table-store export"
    );

    let mut bundle = ImportBundle::new(VERSION);
    bundle.requests = saved.into_iter().map(|s| s.record).collect();
    bundle.projects = projects.into_iter().map(|p| p.record).collect();
    bundle.history = history;
    bundle
}

fn parse_item(item: &Value, now: i64) -> Parsed {
    let origin = item.get("id").filter(|v| !v.is_null()).cloned();
    match item.get("type").and_then(Value::as_str) {
        Some("history") => Parsed::History(Origin {
            origin,
            record: parse_history(item, now),
        }),
        Some("saved") => Parsed::Saved(Origin {
            origin,
            record: parse_saved(item, now),
        }),
        Some("drive") => {
            let mut record = parse_saved(item, now);
            record.request_type = RequestType::GoogleDrive;
            record.drive_id = text(item, "driveId").map(str::to_string);
            Parsed::Saved(Origin { origin, record })
        }
        _ => Parsed::Skipped,
    }
}

/// Request fields recovered from a HAR entry.
struct HarRequest {
    headers: String,
    payload: String,
    started: Option<i64>,
}

fn har_entries(item: &Value) -> &[Value] {
    let har = item
        .get("_har")
        .filter(|v| v.is_object())
        .or_else(|| item.get("har"));
    har.map_or(&[], |har| array(har, "entries"))
}

fn read_har_entry(entry: &Value) -> HarRequest {
    let request = entry.get("request").unwrap_or(&Value::Null);
    let headers = array(request, "headers")
        .iter()
        .map(|h| format!("{}: {}", scalar_text(h.get("name")), scalar_text(h.get("value"))))
        .collect::<Vec<_>>()
        .join("\n");
    let payload = scalar_text(request.get("postData").and_then(|p| p.get("text")));
    HarRequest {
        headers,
        payload,
        started: entry.get("startedDateTime").and_then(coerce_millis),
    }
}

fn parse_history(item: &Value, now: i64) -> HistoryRecord {
    let url = text(item, "url").unwrap_or(DEFAULT_URL).to_string();
    let method = text(item, "method").unwrap_or(DEFAULT_METHOD).to_string();
    let update_time = item.get("updateTime").and_then(coerce_millis).unwrap_or(now);
    let id = generate_history_id(Some(update_time), &url, &method);

    // History keeps the most recent exchange.
    let entry = har_entries(item).last().map(read_har_entry);
    let (headers, payload, created) = match entry {
        Some(har) => (har.headers, har.payload, har.started.unwrap_or(now)),
        None => (String::new(), String::new(), update_time),
    };

    HistoryRecord {
        id,
        rev: None,
        url,
        method,
        headers,
        payload,
        created,
        updated: now,
        extra: Map::new(),
    }
}

fn parse_saved(item: &Value, now: i64) -> RequestRecord {
    let name = text(item, "name").or_else(|| text(item, "_name"));
    // Leading underscore marked unsaved names in the table store.
    let key_name = name.map(|n| n.strip_prefix('_').unwrap_or(n));
    let url = text(item, "url").unwrap_or(DEFAULT_URL);
    let method = text(item, "method").unwrap_or(DEFAULT_METHOD);
    let id = generate_request_id(key_name, Some(url), Some(method), None);

    let mut request = RequestRecord::new(id, now);
    request.name = name.unwrap_or(DEFAULT_NAME).to_string();
    request.url = url.to_string();
    request.method = method.to_string();
    request.headers_model = Some(Vec::new());
    request.query_model = Some(Vec::new());

    let index = item
        .get("referenceEntry")
        .and_then(Value::as_u64)
        .and_then(|i| usize::try_from(i).ok())
        .unwrap_or(0);
    if let Some(har) = har_entries(item).get(index).map(read_har_entry) {
        request.headers = har.headers;
        request.payload = har.payload;
        request.created = har.started.unwrap_or(now);
    }
    request
}

fn parse_project(item: &Value, now: i64) -> Option<PendingProject> {
    let request_ids = array(item, "requestIds");
    if request_ids.is_empty() {
        return None;
    }
    let mut record = ProjectRecord::new(random_id(), text(item, "name").unwrap_or(DEFAULT_NAME), now);
    record.order = item.get("order").and_then(coerce_millis).unwrap_or(0);
    record.updated = item.get("updateTime").and_then(coerce_millis).unwrap_or(now);
    record.created = item.get("created").and_then(coerce_millis).unwrap_or(record.updated);
    Some(PendingProject {
        request_ids: request_ids.to_vec(),
        record,
    })
}

// Each listed old id is matched against the first saved request that had it.
// A request taken into its first project gets that project's id appended to
// its key, matching the key layout of requests created inside a project.
fn associate(projects: &mut [PendingProject], saved: &mut [Origin<RequestRecord>]) {
    for project in projects.iter_mut() {
        for old_id in &project.request_ids {
            let Some(entry) = saved.iter_mut().find(|s| s.origin.as_ref() == Some(old_id)) else {
                continue;
            };
            if entry.record.projects.is_empty() {
                entry.record.id = format!("{}/{}", entry.record.id, project.record.id);
            }
            link(&mut entry.record, &mut project.record);
        }
    }
}
