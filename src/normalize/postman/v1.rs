//! Postman collection, v1 layout: one collection with `folders` and a flat
//! `requests` list.

use crate::model::{
    DEFAULT_METHOD, DEFAULT_NAME, DEFAULT_URL, ImportBundle, ProjectRecord, RequestRecord,
};
use crate::normalize::base::{array, link, scalar_text, text};
use crate::normalize::postman::{compute_body_old, compute_simple_model, ordered_requests};
use crate::util::{coerce_millis, generate_request_id, random_id};
use serde_json::{Value, json};

pub const VERSION: &str = "postman-collection-v1";

pub fn transform(data: &Value, now: i64) -> ImportBundle {
    let mut project = collection_project(data, now);
    let mut bundle = ImportBundle::new(VERSION);
    for item in ordered_requests(data) {
        let mut request = v1_request(item, &project.id, now);
        link(&mut request, &mut project);
        bundle.requests.push(request);
    }
    bundle.projects.push(project);
    bundle
}

fn collection_project(data: &Value, now: i64) -> ProjectRecord {
    let id = text(data, "id").map_or_else(random_id, str::to_string);
    let time = data.get("timestamp").and_then(coerce_millis).unwrap_or(now);
    let mut project = ProjectRecord::new(id, text(data, "name").unwrap_or(DEFAULT_NAME), time);
    project.description = text(data, "description").map(str::to_string);
    project
}

fn v1_request(item: &Value, project_id: &str, now: i64) -> RequestRecord {
    let name = text(item, "name").unwrap_or(DEFAULT_NAME);
    let url = text(item, "url").unwrap_or(DEFAULT_URL);
    let method = text(item, "method").unwrap_or(DEFAULT_METHOD);
    let id = generate_request_id(Some(name), Some(url), Some(method), Some(project_id));

    let body = compute_body_old(item);
    let mut request = RequestRecord::new(id, now);
    request.name = name.to_string();
    request.url = url.to_string();
    request.method = method.to_string();
    request.headers = scalar_text(item.get("headers"));
    request.payload = body.payload;
    request.multipart = body.multipart;
    request.headers_model = Some(compute_simple_model(array(item, "headerData")));
    request.query_model = Some(compute_simple_model(array(item, "queryParams")));
    request.created = item.get("time").and_then(coerce_millis).unwrap_or(now);
    request.description = text(item, "description").map(str::to_string);
    request.extra.insert("projectOrder".to_string(), json!(0));
    request
}
