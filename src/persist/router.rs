//! Collection routing: which bundle key lands in which store collection, and
//! which collections feed the URL index.

use crate::error::Result;
use crate::model::{EnvironmentRecord, ImportBundle, RequestType, VariableRecord};
use crate::storage::{Collection, Document};
use crate::util::{now_millis, random_id};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Entry of the URL search index, produced for every stored saved or history
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlIndexEntry {
    pub id: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: RequestType,
}

/// Documents bound for one collection.
#[derive(Debug, Clone)]
pub struct Batch {
    pub collection: Collection,
    pub docs: Vec<Document>,
}

/// Index flavour produced by a collection, if any.
#[must_use]
pub const fn index_type(collection: Collection) -> Option<RequestType> {
    match collection {
        Collection::SavedRequests => Some(RequestType::Saved),
        Collection::HistoryRequests => Some(RequestType::History),
        _ => None,
    }
}

/// Index entry for a written document, when its collection is indexed.
#[must_use]
pub fn index_entry(collection: Collection, doc: &Document) -> Option<UrlIndexEntry> {
    let kind = index_type(collection)?;
    let url = doc.body.get("url").and_then(Value::as_str).unwrap_or_default();
    Some(UrlIndexEntry {
        id: doc.id.clone(),
        url: url.to_string(),
        kind,
    })
}

/// Documents for every populated collection of `bundle` that maps directly
/// onto a store collection. Derived environments are not part of the bundle
/// and are never returned here.
pub fn route(bundle: &ImportBundle) -> Result<Vec<Batch>> {
    let mut batches = Vec::new();
    for collection in Collection::IMPORT_ORDER {
        let docs = match collection {
            Collection::SavedRequests => documents(&bundle.requests)?,
            Collection::LegacyProjects => documents(&bundle.projects)?,
            Collection::HistoryRequests => documents(&bundle.history)?,
            Collection::WebsocketUrlHistory => documents(&bundle.websocket_url_history)?,
            Collection::UrlHistory => documents(&bundle.url_history)?,
            Collection::Cookies => documents(&bundle.cookies)?,
            Collection::AuthData => documents(&bundle.auth_data)?,
            Collection::HeadersSets => documents(&bundle.header_sets)?,
            Collection::Variables => documents(&bundle.variables)?,
            Collection::HostRules => documents(&bundle.host_rules)?,
            Collection::VariablesEnvironments => Vec::new(),
        };
        if !docs.is_empty() {
            batches.push(Batch { collection, docs });
        }
    }
    Ok(batches)
}

fn documents<T: Serialize>(records: &[T]) -> Result<Vec<Document>> {
    records
        .iter()
        .map(|record| {
            let body = match serde_json::to_value(record)? {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            Ok(Document::from_record(body))
        })
        .collect()
}

/// Environment names used by `variables`, lowercased and deduplicated in
/// first-seen order. The implicit `default` environment is left out.
#[must_use]
pub fn user_environments(variables: &[VariableRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    variables
        .iter()
        .map(|v| v.environment.to_lowercase())
        .filter(|name| !name.is_empty() && name != "default")
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Environment documents for the names in `wanted` not already present in
/// `existing` (compared case-insensitively).
pub fn new_environments(wanted: Vec<String>, existing: &[Document]) -> Result<Vec<Document>> {
    let known: HashSet<String> = existing
        .iter()
        .filter_map(|doc| doc.body.get("name").and_then(Value::as_str))
        .map(str::to_lowercase)
        .collect();
    let created = now_millis();
    let records: Vec<EnvironmentRecord> = wanted
        .into_iter()
        .filter(|name| !known.contains(name))
        .map(|name| EnvironmentRecord {
            id: random_id(),
            rev: None,
            name,
            created,
        })
        .collect();
    documents(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProjectRecord, RequestRecord};
    use serde_json::json;

    fn variable(environment: &str) -> VariableRecord {
        VariableRecord {
            id: random_id(),
            rev: None,
            environment: environment.to_string(),
            variable: "v".to_string(),
            value: String::new(),
            enabled: true,
            extra: Map::new(),
        }
    }

    #[test]
    fn routes_in_import_order() {
        let mut bundle = ImportBundle::new("test");
        bundle.projects.push(ProjectRecord::new("p1", "P", 1));
        bundle.requests.push(RequestRecord::new("r1", 1));
        bundle.variables.push(variable("default"));

        let batches = route(&bundle).unwrap();
        let order: Vec<_> = batches.iter().map(|b| b.collection).collect();
        assert_eq!(
            order,
            [Collection::SavedRequests, Collection::LegacyProjects, Collection::Variables]
        );
        let request = &batches[0].docs[0];
        assert_eq!(request.id, "r1");
        assert!(request.rev.is_none());
        assert!(!request.body.contains_key("id"));
        assert_eq!(request.body["type"], "saved");
    }

    #[test]
    fn records_with_rev_carry_it() {
        let mut bundle = ImportBundle::new("test");
        let mut project = ProjectRecord::new("p1", "P", 1);
        project.rev = Some("3-abc".to_string());
        bundle.projects.push(project);
        let batches = route(&bundle).unwrap();
        assert_eq!(batches[0].docs[0].rev.as_deref(), Some("3-abc"));
    }

    #[test]
    fn index_entries_only_for_request_collections() {
        let doc = Document::from_record(
            json!({"id": "h1", "url": "http://x"}).as_object().cloned().unwrap(),
        );
        let entry = index_entry(Collection::HistoryRequests, &doc).unwrap();
        assert_eq!(entry.kind, RequestType::History);
        assert_eq!(entry.url, "http://x");
        assert_eq!(serde_json::to_value(&entry).unwrap()["type"], "history");
        assert!(index_entry(Collection::Cookies, &doc).is_none());
    }

    #[test]
    fn environments_are_lowercased_and_deduplicated() {
        let vars = [variable("Prod"), variable("prod"), variable("default"), variable("Stage")];
        assert_eq!(user_environments(&vars), ["prod", "stage"]);
    }

    #[test]
    fn existing_environments_are_skipped() {
        let existing = [Document::from_record(
            json!({"id": "e1", "name": "PROD"}).as_object().cloned().unwrap(),
        )];
        let docs = new_environments(vec!["prod".into(), "stage".into()], &existing).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].body["name"], "stage");
        assert!(!docs[0].id.is_empty());
    }
}
