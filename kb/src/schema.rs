//! Structural checks on raw knowledge base JSON.
//!
//! Running these before typed decoding gives field-level messages
//! ("'name' is not provided in 'info'") instead of serde's generic ones.

use serde_json::Value;

use crate::error::{KnowledgeBaseError, Result};

const REQUIRED_FIELDS: [&str; 2] = ["info", "qna"];
const FALLBACK_FIELDS: [&str; 2] = ["idk_answers", "no_answer"];

/// Check that a JSON document has the knowledge base shape.
pub fn check_schema(data: &Value) -> Result<()> {
    let root = data
        .as_object()
        .ok_or_else(|| KnowledgeBaseError::schema("knowledge base must be a JSON object"))?;

    for key in REQUIRED_FIELDS {
        if !root.contains_key(key) {
            return Err(KnowledgeBaseError::schema(format!(
                "Knowledge base must have an '{key}' field"
            )));
        }
    }

    let fallback_key = FALLBACK_FIELDS
        .into_iter()
        .find(|key| root.contains_key(*key))
        .ok_or_else(|| {
            KnowledgeBaseError::schema("Knowledge base must have an 'idk_answers' field")
        })?;

    check_info(&root["info"])?;
    check_string_list(fallback_key, &root[fallback_key])?;

    let qna = root["qna"]
        .as_array()
        .ok_or_else(|| KnowledgeBaseError::schema("'qna' must be a list"))?;

    for (id, entry) in qna.iter().enumerate() {
        let entry = entry
            .as_object()
            .ok_or_else(|| KnowledgeBaseError::schema(format!("qna[{id}] must be an object")))?;

        for key in ["q", "a"] {
            let field = entry.get(key).ok_or_else(|| {
                KnowledgeBaseError::schema(format!("qna[{id}] must have a '{key}' field"))
            })?;
            check_string_list(&format!("qna[{id}].{key}"), field)?;
        }
    }

    Ok(())
}

fn check_info(info: &Value) -> Result<()> {
    let info = info
        .as_object()
        .ok_or_else(|| KnowledgeBaseError::schema("'info' must be an object"))?;

    if !info.contains_key("name") {
        return Err(KnowledgeBaseError::schema("'name' is not provided in 'info'"));
    }

    for (key, value) in info {
        let optional = key != "name";
        if !(value.is_string() || (optional && value.is_null())) {
            return Err(KnowledgeBaseError::schema(format!(
                "{key} must be of type str, {} was given instead",
                json_type_name(value)
            )));
        }
    }

    Ok(())
}

fn check_string_list(name: &str, value: &Value) -> Result<()> {
    let items = value.as_array().ok_or_else(|| {
        KnowledgeBaseError::schema(format!(
            "{name} must be of type list, {} was given instead",
            json_type_name(value)
        ))
    })?;

    if items.is_empty() {
        return Err(KnowledgeBaseError::schema(format!(
            "{name} must not be empty"
        )));
    }

    if let Some(bad) = items.iter().find(|v| !v.is_string()) {
        return Err(KnowledgeBaseError::schema(format!(
            "{name} must only contain str items, found {}",
            json_type_name(bad)
        )));
    }

    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
