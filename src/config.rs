use serde::{Deserialize, Deserializer, Serialize};

/// Response-format discriminator stored on scripts and mapping configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlType {
    /// Structured-object payloads (JSON-like). The default.
    Json,
    /// Streaming-markup payloads (XML/RSS-like).
    Rss,
}

impl UrlType {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => UrlType::Rss,
            _ => UrlType::Json,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            UrlType::Json => 0,
            UrlType::Rss => 1,
        }
    }
}

/// Generic self-referential key/value tree node. Persisted flat with a
/// parent-id column; hydrated into `meta_list` on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetasConfig {
    pub meta_id: String,
    /// Id of the BasicsConfig or FieldsConfig this node belongs to. Children
    /// share their parent's quote_id.
    pub quote_id: String,
    #[serde(default)]
    pub meta_typed: i64,
    pub meta_key: Option<String>,
    pub meta_value: Option<String>,
    pub meta_list: Option<Vec<MetasConfig>>,
}

impl MetasConfig {
    pub fn entry(
        quote_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            meta_id: uuid::Uuid::new_v4().to_string(),
            quote_id: quote_id.into(),
            meta_typed: 0,
            meta_key: Some(key.into()),
            meta_value: Some(value.into()),
            meta_list: None,
        }
    }

    pub fn with_children(mut self, children: Vec<MetasConfig>) -> Self {
        self.meta_list = if children.is_empty() { None } else { Some(children) };
        self
    }
}

/// Per-record field mapping for one BasicsConfig.
///
/// `id_field`/`title_field` are required; an empty string marks a draft whose
/// assignment is still pending (schema inference leaves them unassigned).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldsConfig {
    pub field_id: String,
    /// Owning BasicsConfig id.
    pub quote_id: String,
    pub id_field: String,
    pub title_field: String,
    pub pic_field: Option<String>,
    pub content_field: Option<String>,
    pub tags_field: Option<String>,
    pub source_url_field: Option<String>,
    /// Custom or nested field mappings beyond the fixed set.
    pub meta_list: Option<Vec<MetasConfig>>,
}

impl FieldsConfig {
    pub fn new(quote_id: impl Into<String>) -> Self {
        Self {
            field_id: uuid::Uuid::new_v4().to_string(),
            quote_id: quote_id.into(),
            id_field: String::new(),
            title_field: String::new(),
            pic_field: None,
            content_field: None,
            tags_field: None,
            source_url_field: None,
            meta_list: None,
        }
    }
}

/// Script-level mapping unit: where the record list lives in the payload and
/// how to reach it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BasicsConfig {
    pub basic_id: String,
    /// Owning script id.
    pub scripts_id: String,
    pub api_url: String,
    pub url_params: Option<String>,
    #[serde(default)]
    pub url_type: i64,
    /// Dot-separated path to the list of records within the payload.
    pub root_path: String,
    /// Auxiliary key/value facts not covered by the fixed fields.
    pub meta_list: Option<Vec<MetasConfig>>,
    pub fields: Option<FieldsConfig>,
}

impl BasicsConfig {
    pub fn new(scripts_id: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            basic_id: uuid::Uuid::new_v4().to_string(),
            scripts_id: scripts_id.into(),
            api_url: api_url.into(),
            url_params: None,
            url_type: 0,
            root_path: String::new(),
            meta_list: None,
            fields: None,
        }
    }

    /// Resolve this config into the flat mapping a parser consumes. Missing
    /// field assignments come through as empty strings, which the parsers
    /// treat as unmapped.
    pub fn to_section_mapping(&self) -> SectionMapping {
        let fields = self.fields.as_ref();
        SectionMapping {
            root_path: self.root_path.clone(),
            id_field: fields.map(|f| f.id_field.clone()).unwrap_or_default(),
            title_field: fields.map(|f| f.title_field.clone()).unwrap_or_default(),
            pic_field: fields.and_then(|f| f.pic_field.clone()),
            content_field: fields.and_then(|f| f.content_field.clone()),
            category_id_field: None,
            tags_field: fields.and_then(|f| f.tags_field.clone()),
            parent_id_field: None,
            source_url_field: fields.and_then(|f| f.source_url_field.clone()),
            url_type: self.url_type,
            api_url: self.api_url.clone(),
        }
    }
}

/// Synthetic meta keys used to persist the fixed scalar fields of
/// BasicsConfig and FieldsConfig alongside the user meta trees.
pub(crate) mod fixed_keys {
    pub const SCRIPTS_ID: &str = "scriptsId";
    pub const URL_PARAMS: &str = "urlParams";
    pub const ROOT_PATH: &str = "rootPath";
    pub const ID_FIELD: &str = "idField";
    pub const TITLE_FIELD: &str = "titleField";
    pub const PIC_FIELD: &str = "picField";
    pub const CONTENT_FIELD: &str = "contentField";
    pub const TAGS_FIELD: &str = "tagsField";
    pub const SOURCE_URL_FIELD: &str = "sourceUrlField";

    pub const BASIC: &[&str] = &[SCRIPTS_ID, URL_PARAMS, ROOT_PATH];
    pub const FIELDS: &[&str] = &[
        ID_FIELD,
        TITLE_FIELD,
        PIC_FIELD,
        CONTENT_FIELD,
        TAGS_FIELD,
        SOURCE_URL_FIELD,
    ];
}

/// Resolved mapping for one section (items or categories) of a script,
/// as consumed by the parsers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionMapping {
    #[serde(default)]
    pub root_path: String,
    #[serde(default)]
    pub id_field: String,
    #[serde(default)]
    pub title_field: String,
    pub pic_field: Option<String>,
    pub content_field: Option<String>,
    pub category_id_field: Option<String>,
    pub tags_field: Option<String>,
    pub parent_id_field: Option<String>,
    pub source_url_field: Option<String>,
    #[serde(rename = "urlTypeField", default)]
    pub url_type: i64,
    #[serde(rename = "apiUrlField", default)]
    pub api_url: String,
}

/// Serialized mapping config embedded in a script record (the wire format
/// consumed by `derive_mapping`). Absent optional keys are null, not errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptConfig {
    #[serde(default, deserialize_with = "bool_like")]
    pub items_state: bool,
    #[serde(default, deserialize_with = "bool_like")]
    pub categories_state: bool,
    pub items_mapping: Option<SectionMapping>,
    pub categories_mapping: Option<SectionMapping>,
}

/// Accept `true`/`false`, 0/1 integers, or their string spellings; script
/// configs in the wild carry all three.
fn bool_like<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolLike {
        Bool(bool),
        Int(i64),
        Str(String),
    }

    Ok(match BoolLike::deserialize(deserializer)? {
        BoolLike::Bool(b) => b,
        BoolLike::Int(n) => n != 0,
        BoolLike::Str(s) => matches!(s.as_str(), "1" | "true" | "True"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_config_accepts_bool_like_flags() {
        let raw = r#"{"itemsState": 1, "categoriesState": false, "itemsMapping": {"rootPath": "data.items", "idField": "id", "titleField": "title"}}"#;
        let cfg: ScriptConfig = serde_json::from_str(raw).unwrap();
        assert!(cfg.items_state);
        assert!(!cfg.categories_state);
        let items = cfg.items_mapping.unwrap();
        assert_eq!(items.root_path, "data.items");
        assert_eq!(items.id_field, "id");
        assert!(items.pic_field.is_none());
    }

    #[test]
    fn script_config_tolerates_absent_keys() {
        let cfg: ScriptConfig = serde_json::from_str("{}").unwrap();
        assert!(!cfg.items_state);
        assert!(cfg.items_mapping.is_none());
    }

    #[test]
    fn section_mapping_reads_wire_field_names() {
        let raw = r#"{"rootPath": "rss.channel.item", "idField": "guid", "titleField": "title", "picField": "enclosure@url", "urlTypeField": 1, "apiUrlField": "https://example.com/feed"}"#;
        let m: SectionMapping = serde_json::from_str(raw).unwrap();
        assert_eq!(m.url_type, 1);
        assert_eq!(m.pic_field.as_deref(), Some("enclosure@url"));
        assert_eq!(m.api_url, "https://example.com/feed");
    }
}
