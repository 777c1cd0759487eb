//! Schema inference: propose draft mapping configs from a sample payload.
//!
//! A depth-first scan records the dot-path of every list-valued node as a
//! candidate root path. Discovered lists are not recursed into, so nested
//! lists inside a candidate do not become additional roots. Each candidate
//! becomes one draft BasicsConfig whose fields config describes the shape of
//! the list's first record; id/title assignments are left for the user.

use serde_json::Value;

use crate::config::{BasicsConfig, FieldsConfig, MetasConfig};
use crate::error::{EngineError, Result};

/// Scan a raw payload and propose one draft config per discovered list.
/// Pure and deterministic up to the payload parser's key ordering; multiple
/// lists yield independent drafts with no de-duplication.
pub fn infer_configs(raw: &str, source_url: &str) -> Result<Vec<BasicsConfig>> {
    let root: Value = serde_json::from_str(raw)
        .map_err(|e| EngineError::Parse(format!("sample payload is not parseable: {e}")))?;

    let mut candidates = Vec::new();
    discover_lists(&root, &mut Vec::new(), &mut candidates);

    let configs = candidates
        .into_iter()
        .map(|path| draft_config(&root, &path, source_url))
        .collect();
    Ok(configs)
}

/// Depth-first walk collecting dot paths of list-valued nodes.
fn discover_lists(node: &Value, path: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    match node {
        Value::Array(_) => {
            // Candidate root; do not look for further roots inside it.
            out.push(path.clone());
        }
        Value::Object(map) => {
            for (key, child) in map {
                path.push(key.clone());
                discover_lists(child, path, out);
                path.pop();
            }
        }
        _ => {}
    }
}

fn draft_config(root: &Value, path: &[String], source_url: &str) -> BasicsConfig {
    let mut cfg = BasicsConfig::new("", source_url);
    cfg.root_path = path.join(".");

    // Root-level siblings off the candidate's ancestor chain become
    // auxiliary facts (e.g. a "meta" or "pagination" object).
    if let Value::Object(map) = root {
        let on_chain = path.first().map(|s| s.as_str());
        let mut metas = Vec::new();
        for (key, value) in map {
            if Some(key.as_str()) == on_chain {
                continue;
            }
            metas.push(shape_meta(&cfg.basic_id, key, value));
        }
        if !metas.is_empty() {
            cfg.meta_list = Some(metas);
        }
    }

    // Describe the record shape from the list's first element, if it is a
    // structured record.
    if let Some(Value::Array(list)) = resolve(root, path) {
        if let Some(Value::Object(record)) = list.first() {
            let mut fields = FieldsConfig::new(&cfg.basic_id);
            let metas: Vec<MetasConfig> = record
                .iter()
                .map(|(key, value)| shape_meta(&fields.field_id, key, value))
                .collect();
            if !metas.is_empty() {
                fields.meta_list = Some(metas);
            }
            cfg.fields = Some(fields);
        }
    }

    cfg
}

/// One inferred meta per key: value defaults to the key name itself, nested
/// containers recurse into child metas.
fn shape_meta(quote_id: &str, key: &str, value: &Value) -> MetasConfig {
    let meta = MetasConfig::entry(quote_id, key, key);
    match value {
        Value::Object(map) => meta.with_children(
            map.iter()
                .map(|(k, v)| shape_meta(quote_id, k, v))
                .collect(),
        ),
        Value::Array(list) => match list.first() {
            Some(Value::Object(map)) => meta.with_children(
                map.iter()
                    .map(|(k, v)| shape_meta(quote_id, k, v))
                    .collect(),
            ),
            _ => meta,
        },
        _ => meta,
    }
}

fn resolve<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(metas: &Option<Vec<MetasConfig>>) -> Vec<String> {
        metas
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|m| m.meta_key.clone())
            .collect()
    }

    #[test]
    fn discovers_list_with_siblings_and_record_shape() {
        let raw = r#"{"data":{"items":[{"id":1,"title":"x"}]},"meta":{"total":1}}"#;
        let configs = infer_configs(raw, "https://api.example.com").unwrap();
        assert_eq!(configs.len(), 1);

        let cfg = &configs[0];
        assert_eq!(cfg.root_path, "data.items");
        assert_eq!(cfg.api_url, "https://api.example.com");
        assert_eq!(keys(&cfg.meta_list), vec!["meta"]);

        let fields = cfg.fields.as_ref().expect("record shape inferred");
        let mut field_keys = keys(&fields.meta_list);
        field_keys.sort();
        assert_eq!(field_keys, vec!["id", "title"]);
        // Assignments are left for manual completion.
        assert!(fields.id_field.is_empty());
        assert!(fields.title_field.is_empty());
    }

    #[test]
    fn inferred_meta_values_default_to_key_names() {
        let raw = r#"{"items":[{"id":1}]}"#;
        let configs = infer_configs(raw, "u").unwrap();
        let fields = configs[0].fields.as_ref().unwrap();
        let meta = &fields.meta_list.as_ref().unwrap()[0];
        assert_eq!(meta.meta_key.as_deref(), Some("id"));
        assert_eq!(meta.meta_value.as_deref(), Some("id"));
    }

    #[test]
    fn nested_lists_are_not_independent_roots() {
        let raw = r#"{"items":[{"tags":["a","b"],"title":"x"}]}"#;
        let configs = infer_configs(raw, "u").unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].root_path, "items");
    }

    #[test]
    fn multiple_lists_yield_independent_drafts() {
        let raw = r#"{"posts":[{"id":1}],"users":[{"name":"a"}]}"#;
        let mut roots: Vec<String> = infer_configs(raw, "u")
            .unwrap()
            .iter()
            .map(|c| c.root_path.clone())
            .collect();
        roots.sort();
        assert_eq!(roots, vec!["posts", "users"]);
    }

    #[test]
    fn nested_record_children_recurse() {
        let raw = r#"{"items":[{"author":{"name":"a","avatar":"b"},"title":"x"}]}"#;
        let configs = infer_configs(raw, "u").unwrap();
        let fields = configs[0].fields.as_ref().unwrap();
        let author = fields
            .meta_list
            .as_ref()
            .unwrap()
            .iter()
            .find(|m| m.meta_key.as_deref() == Some("author"))
            .unwrap();
        let mut child_keys: Vec<_> = author
            .meta_list
            .as_ref()
            .unwrap()
            .iter()
            .filter_map(|m| m.meta_key.clone())
            .collect();
        child_keys.sort();
        assert_eq!(child_keys, vec!["avatar", "name"]);
    }

    #[test]
    fn scalar_list_has_no_record_shape() {
        let raw = r#"{"items":["a","b"]}"#;
        let configs = infer_configs(raw, "u").unwrap();
        assert!(configs[0].fields.is_none());
    }

    #[test]
    fn unparseable_payload_is_an_error() {
        assert!(infer_configs("nope", "u").is_err());
    }

    #[test]
    fn top_level_list_payload() {
        let raw = r#"[{"id":1,"title":"x"}]"#;
        let configs = infer_configs(raw, "u").unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].root_path, "");
        assert!(configs[0].fields.is_some());
    }
}
