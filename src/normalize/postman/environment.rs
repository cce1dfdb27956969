//! Postman environment export: a flat list of key/value pairs.

use crate::model::{ImportBundle, VariableRecord};
use crate::normalize::base::{array, scalar_text, text, truthy};
use crate::normalize::postman::ensure_variables_syntax;
use crate::util::encode_component;
use serde_json::{Map, Value};

pub const VERSION: &str = "postman-environment";

pub fn transform(data: &Value) -> ImportBundle {
    let environment = text(data, "name").unwrap_or("default");
    let mut bundle = ImportBundle::new(VERSION);
    bundle.variables = array(data, "values")
        .iter()
        .map(|item| {
            let variable = scalar_text(item.get("key"));
            VariableRecord {
                id: variable_id(environment, &variable),
                rev: None,
                environment: environment.to_string(),
                value: ensure_variables_syntax(&scalar_text(item.get("value"))),
                enabled: truthy(item.get("enabled")),
                variable,
                extra: Map::new(),
            }
        })
        .collect();
    bundle
}

/// Stable key, so re-importing an environment updates it in place.
fn variable_id(environment: &str, variable: &str) -> String {
    format!(
        "postman-var-{}/{}",
        encode_component(environment),
        encode_component(variable)
    )
}
