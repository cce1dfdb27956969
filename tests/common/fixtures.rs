#![allow(dead_code)]

use serde_json::{Value, json};

/// Document-store export: 2 projects, 4 requests, 2 of them inside a project.
pub fn native_export() -> Value {
    json!({
        "kind": "ARC#AllDataExport",
        "createdAt": "2019-02-02T21:58:25.467Z",
        "version": "13.0.0",
        "projects": [
            {"kind": "ARC#ProjectData", "_referenceId": "p1", "name": "Billing", "order": 0},
            {"kind": "ARC#ProjectData", "_referenceId": "p2", "name": "Search", "order": 1}
        ],
        "requests": [
            {"kind": "ARC#RequestData", "key": "r1", "name": "invoice", "url": "http://api/invoice",
             "method": "GET", "_referenceLegacyProject": "p1"},
            {"kind": "ARC#RequestData", "key": "r2", "name": "query", "url": "http://api/search",
             "method": "POST", "_referenceLegacyProject": "p2"},
            {"kind": "ARC#RequestData", "key": "r3", "name": "health", "url": "http://api/health",
             "method": "GET"},
            {"kind": "ARC#RequestData", "name": "login", "url": "http://api/login", "method": "POST"}
        ],
        "history": [
            {"url": "http://api/health", "method": "GET", "created": 1_549_144_705_467_i64,
             "updated": 1_549_144_705_467_i64}
        ]
    })
}

fn leaf(name: &str) -> Value {
    json!({"name": name, "request": {"url": format!("http://x/{name}"), "method": "GET"}})
}

/// Postman v2.1 collection with one folder holding 5 requests.
pub fn postman_v2_collection() -> Value {
    json!({
        "info": {
            "_postman_id": "col-1",
            "name": "Collection",
            "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
        },
        "item": [{"name": "Folder", "item": [leaf("a"), leaf("b"), leaf("c"), leaf("d"), leaf("e")]}]
    })
}

/// Postman backup with one global and two environment variables.
pub fn postman_backup() -> Value {
    json!({
        "version": 1,
        "collections": [{
            "id": "c1",
            "name": "Collection",
            "order": ["r1"],
            "requests": [{"id": "r1", "name": "one", "url": "{{host}}/a", "method": "GET"}]
        }],
        "globals": [{"key": "host", "value": "http://localhost"}],
        "environments": [
            {"name": "Staging", "values": [
                {"key": "host", "value": "http://staging"},
                {"key": "token", "value": "abc"}
            ]}
        ]
    })
}

/// Oldest native shape: a bare request.
pub fn legacy_single_request() -> Value {
    json!({"headers": "a", "url": "b", "method": "c"})
}

/// Table-store export with saved and history entries.
pub fn tabular_export() -> Value {
    json!({
        "kind": "ARC#requestsDataExport",
        "requests": [
            {"type": "saved", "name": "saved", "url": "http://s", "method": "GET"},
            {"type": "history", "url": "http://h", "method": "GET", "updateTime": 1_500_000_000_000_i64}
        ]
    })
}
