use serde::{Deserialize, Serialize};

/// Normalized content record produced by a parser and written to a script store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub pic: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<String>,
    pub tags: Option<String>,
    pub source_url: Option<String>,
    pub script_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub parent_id: Option<String>,
    pub script_id: String,
}

/// A registered external content source. Owns a serialized mapping config,
/// an isolated store database name, and an optional password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub id: String,
    pub title: String,
    pub api_url: String,
    /// Response-format discriminator; selects the parser implementation.
    pub url_type: i64,
    /// Serialized `ScriptConfig` JSON, when the mapping travels with the script.
    pub config: Option<String>,
    /// Database file name for the script's isolated store.
    pub db_name: String,
    /// Stored password value (`base64(salt):base64(key)`); locked iff non-null.
    pub password: Option<String>,
    pub last_run_at: Option<i64>,
    pub next_run_at: Option<i64>,
}

impl Script {
    pub fn new(title: impl Into<String>, api_url: impl Into<String>, url_type: i64) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let db_name = format!("script_{}.db", &id[..8]);
        Self {
            id,
            title: title.into(),
            api_url: api_url.into(),
            url_type,
            config: None,
            db_name,
            password: None,
            last_run_at: None,
            next_run_at: None,
        }
    }

    pub fn locked(&self) -> bool {
        self.password.is_some()
    }
}
