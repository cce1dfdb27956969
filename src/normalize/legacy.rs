//! Oldest native export: a bare request object, or `projects` + `requests`
//! lists where each request points back at its project by the project's old
//! id.

use crate::model::{
    DEFAULT_METHOD, DEFAULT_NAME, DEFAULT_URL, ImportBundle, ProjectRecord, RequestRecord,
};
use crate::normalize::base::{add_project_reference, add_request_reference, array, scalar_text, text};
use crate::util::{coerce_millis, generate_request_id, random_id};
use serde_json::Value;
use tracing::debug;

const VERSION: &str = "unknown";

/// Project under construction, remembering the id it had in the file.
struct LegacyProject {
    record: ProjectRecord,
    old_id: Option<Value>,
}

pub fn transform_single(data: &Value, now: i64) -> ImportBundle {
    let mut bundle = ImportBundle::new(VERSION);
    bundle.requests.push(transform_request(data, None, now));
    bundle
}

pub fn transform_multi(data: &Value, now: i64) -> ImportBundle {
    let mut projects: Vec<LegacyProject> = array(data, "projects")
        .iter()
        .map(|item| transform_project(item, now))
        .collect();

    let requests = array(data, "requests")
        .iter()
        .map(|item| {
            let project = find_project(item.get("project"), &mut projects);
            transform_request(item, project, now)
        })
        .collect::<Vec<_>>();

    debug!(
        projects = projects.len(),
        requests = requests.len(),
        "transformed legacy export"
    );

    let mut bundle = ImportBundle::new(VERSION);
    bundle.requests = requests;
    // Old ids are only needed to resolve request pointers.
    bundle.projects = projects.into_iter().map(|p| p.record).collect();
    bundle
}

fn transform_project(item: &Value, now: i64) -> LegacyProject {
    let created = item.get("created").and_then(coerce_millis).unwrap_or(now);
    let mut record = ProjectRecord::new(
        random_id(),
        text(item, "name").unwrap_or(DEFAULT_NAME),
        now,
    );
    record.created = created;
    LegacyProject {
        record,
        old_id: item.get("id").filter(|v| !v.is_null()).cloned(),
    }
}

fn find_project<'a>(
    pointer: Option<&Value>,
    projects: &'a mut [LegacyProject],
) -> Option<&'a mut ProjectRecord> {
    let pointer = pointer.filter(|v| !v.is_null() && v.as_str() != Some(""))?;
    projects
        .iter_mut()
        .find(|p| p.old_id.as_ref() == Some(pointer))
        .map(|p| &mut p.record)
}

fn transform_request(
    item: &Value,
    project: Option<&mut ProjectRecord>,
    now: i64,
) -> RequestRecord {
    let name = text(item, "name").unwrap_or(DEFAULT_NAME);
    let url = text(item, "url").unwrap_or(DEFAULT_URL);
    let method = text(item, "method").unwrap_or(DEFAULT_METHOD);
    let project_id = project.as_ref().map(|p| p.id.clone());
    let id = generate_request_id(Some(name), Some(url), Some(method), project_id.as_deref());

    let mut request = RequestRecord::new(id, now);
    request.name = name.to_string();
    request.url = url.to_string();
    request.method = method.to_string();
    request.headers = scalar_text(item.get("headers"));
    request.payload = scalar_text(item.get("payload"));
    request.created = item.get("time").and_then(coerce_millis).unwrap_or(now);
    request.headers_model = Some(Vec::new());
    request.query_model = Some(Vec::new());
    request.drive_id = text(item, "driveId").map(str::to_string);

    if let Some(project) = project {
        add_project_reference(&mut request, &project.id);
        add_request_reference(project, &request.id);
    }
    request
}
