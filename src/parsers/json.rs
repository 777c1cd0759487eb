//! Structured-object (JSON) parser: dot-path root resolution, field-by-field
//! mapping with one level of nesting per field.

use serde_json::Value;

use super::{parse_script_config, ParseIssue, ParseOutcome, ScriptParser};
use crate::config::{ScriptConfig, SectionMapping};
use crate::error::Result;
use crate::types::{Category, Item, Script};

pub struct JsonParser;

/// Walk each dot-separated segment into nested values. Array segments accept
/// numeric indexes. Returns None as soon as a segment does not resolve into
/// a traversable container.
fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(list) => list.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Resolve a field path against one record. Empty or unresolved paths yield
/// None; required fields default to "" at the call site instead of aborting
/// the record.
fn field_value(record: &Value, path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    resolve_path(record, path).map(value_text)
}

fn opt_field(record: &Value, path: &Option<String>) -> Option<String> {
    path.as_deref().and_then(|p| field_value(record, p))
}

/// Coerce the resolved root node to a record list: a single record is a
/// one-element list.
fn as_record_list(node: &Value) -> Vec<&Value> {
    match node {
        Value::Array(list) => list.iter().collect(),
        other => vec![other],
    }
}

fn resolve_root<'a, T>(
    raw: &str,
    mapping: &SectionMapping,
    parsed: &'a mut Option<Value>,
) -> std::result::Result<Vec<&'a Value>, ParseOutcome<T>> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return Err(ParseOutcome::failed(format!("malformed payload: {e}"))),
    };
    *parsed = Some(value);
    let root = parsed.as_ref().unwrap();
    match resolve_path(root, &mapping.root_path) {
        Some(node) => Ok(as_record_list(node)),
        None => Err(ParseOutcome::failed(format!(
            "root path {:?} did not resolve",
            mapping.root_path
        ))),
    }
}

impl ScriptParser for JsonParser {
    fn parse_items(
        &self,
        raw: &str,
        mapping: &SectionMapping,
        script_id: &str,
    ) -> ParseOutcome<Item> {
        let mut parsed = None;
        let records = match resolve_root(raw, mapping, &mut parsed) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };

        let mut outcome = ParseOutcome::empty();
        for record in records {
            outcome.rows.push(Item {
                id: field_value(record, &mapping.id_field).unwrap_or_default(),
                title: field_value(record, &mapping.title_field).unwrap_or_default(),
                pic: opt_field(record, &mapping.pic_field),
                content: opt_field(record, &mapping.content_field),
                category_id: opt_field(record, &mapping.category_id_field),
                tags: opt_field(record, &mapping.tags_field),
                source_url: opt_field(record, &mapping.source_url_field),
                script_id: script_id.to_string(),
            });
        }
        outcome
    }

    fn parse_categories(
        &self,
        raw: &str,
        mapping: &SectionMapping,
        script_id: &str,
    ) -> ParseOutcome<Category> {
        let mut parsed = None;
        let records = match resolve_root(raw, mapping, &mut parsed) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };

        let mut outcome = ParseOutcome::empty();
        for record in records {
            outcome.rows.push(Category {
                id: field_value(record, &mapping.id_field).unwrap_or_default(),
                title: field_value(record, &mapping.title_field).unwrap_or_default(),
                parent_id: opt_field(record, &mapping.parent_id_field),
                script_id: script_id.to_string(),
            });
        }
        outcome
    }

    fn derive_mapping(&self, script: &Script) -> Result<ScriptConfig> {
        parse_script_config(script)
    }
}
