pub mod config;
pub mod dao;
pub mod db;
pub mod error;
pub mod fetch;
pub mod infer;
pub mod lock;
pub mod parsers;
pub mod store;
pub mod types;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::{BasicsConfig, FieldsConfig, MetasConfig, ScriptConfig, SectionMapping, UrlType};
    pub use crate::error::EngineError;
    pub use crate::parsers::{parser_for, ParseIssue, ParseOutcome, ScriptParser};
    pub use crate::store::{OpenMode, ScriptStore};
    pub use crate::types::{Category, Item, Script};
    pub use crate::{RefreshSummary, ScriptEngine};
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use crate::config::{BasicsConfig, ScriptConfig, SectionMapping, UrlType};
use crate::db::Database;
use crate::error::EngineError;
use crate::fetch::Fetcher;
use crate::parsers::{parser_for, ParseOutcome};
use crate::store::{OpenMode, ScriptStore};
use crate::types::{Category, Item, Script};

/// Result of one fetch → parse → persist cycle for a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub script_id: String,
    pub items_saved: u64,
    pub categories_saved: u64,
    /// Non-fatal parse problems; an empty result with issues is a failed
    /// parse, not an empty feed.
    pub issue_count: usize,
}

/// Async library entry point. Owns the central config database; per-script
/// stores are opened on demand.
pub struct ScriptEngine {
    db: Database,
    store_private_dir: Option<PathBuf>,
    store_export_dir: Option<PathBuf>,
}

impl ScriptEngine {
    /// Initialize database and (optionally) run migrations. Does not start any internal runtimes.
    pub async fn connect(database_url: Option<&str>, run_migrations: bool) -> Result<Self> {
        let db = Database::connect(database_url).await?;
        if run_migrations {
            db.run_migrations().await?;
        }
        Ok(Self {
            db,
            store_private_dir: None,
            store_export_dir: None,
        })
    }

    /// Override the per-script store locations (platform defaults otherwise).
    pub fn with_store_dirs(mut self, private_dir: impl Into<PathBuf>, export_dir: impl Into<PathBuf>) -> Self {
        self.store_private_dir = Some(private_dir.into());
        self.store_export_dir = Some(export_dir.into());
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // --- script records ---

    pub async fn add_script(&self, script: &Script) -> Result<()> {
        dao::upsert_script(self.db.pool(), script).await.map_err(Into::into)
    }

    pub async fn get_script(&self, id: &str) -> Result<Option<Script>> {
        dao::get_script(self.db.pool(), id).await.map_err(Into::into)
    }

    pub async fn list_scripts(&self) -> Result<Vec<Script>> {
        dao::list_scripts(self.db.pool()).await.map_err(Into::into)
    }

    /// Remove a script, its mapping configs, and (best-effort) its store file.
    pub async fn delete_script(&self, id: &str) -> Result<u64> {
        let script = self.get_script(id).await?;
        let affected = dao::delete_script(self.db.pool(), id).await?;
        if let Some(script) = script {
            if let Ok(store) = self.store_for(&script, OpenMode::ReadWrite) {
                let _ = std::fs::remove_file(store.export_path());
            }
        }
        Ok(affected)
    }

    // --- mapping configs ---

    /// Save a mapping config. Failures are reported, not raised: callers
    /// surface a flat "unable to save configuration".
    pub async fn save_config(&self, cfg: &BasicsConfig) -> bool {
        match dao::save_basic_config(self.db.pool(), cfg).await {
            Ok(()) => true,
            Err(e) => {
                warn!(basic_id = %cfg.basic_id, error = %e, "unable to save configuration");
                false
            }
        }
    }

    /// Replace a mapping config. Returns rows affected; 0 with a logged
    /// warning when the write fails.
    pub async fn update_config(&self, cfg: &BasicsConfig) -> u64 {
        match dao::update_basic_config(self.db.pool(), cfg).await {
            Ok(n) => n,
            Err(e) => {
                warn!(basic_id = %cfg.basic_id, error = %e, "unable to save configuration");
                0
            }
        }
    }

    pub async fn delete_config(&self, basic_id: &str) -> u64 {
        match dao::delete_basic_config(self.db.pool(), basic_id).await {
            Ok(n) => n,
            Err(e) => {
                warn!(%basic_id, error = %e, "unable to delete configuration");
                0
            }
        }
    }

    pub async fn load_config(&self, basic_id: &str) -> Result<Option<BasicsConfig>> {
        dao::load_basic_config(self.db.pool(), basic_id).await.map_err(Into::into)
    }

    pub async fn load_all_configs(&self) -> Result<Vec<BasicsConfig>> {
        dao::load_all_basic_configs(self.db.pool()).await.map_err(Into::into)
    }

    /// Propose draft configs from a sample payload (see `infer`).
    pub fn infer_configs(&self, raw: &str, source_url: &str) -> Result<Vec<BasicsConfig>> {
        infer::infer_configs(raw, source_url).map_err(Into::into)
    }

    // --- parsing ---

    /// Parse items with an explicit mapping; issues stay in the outcome.
    pub fn parse_items(&self, raw: &str, mapping: &SectionMapping, script_id: &str) -> ParseOutcome<Item> {
        parser_for(UrlType::from_code(mapping.url_type)).parse_items(raw, mapping, script_id)
    }

    pub fn parse_categories(&self, raw: &str, mapping: &SectionMapping, script_id: &str) -> ParseOutcome<Category> {
        parser_for(UrlType::from_code(mapping.url_type)).parse_categories(raw, mapping, script_id)
    }

    /// Resolve a script's mapping config: prefer the config embedded in the
    /// script record, fall back to mapping configs in the persistence store.
    pub async fn resolve_mapping(&self, script: &Script) -> Result<ScriptConfig> {
        let parser = parser_for(UrlType::from_code(script.url_type));
        match parser.derive_mapping(script) {
            Ok(cfg) => Ok(cfg),
            Err(derive_err) => {
                for basic_id in dao::config_ids_for_script(self.db.pool(), &script.id).await? {
                    if let Some(basics) = dao::load_basic_config(self.db.pool(), &basic_id).await? {
                        return Ok(ScriptConfig {
                            items_state: true,
                            categories_state: false,
                            items_mapping: Some(basics.to_section_mapping()),
                            categories_mapping: None,
                        });
                    }
                }
                Err(EngineError::ConfigNotFound(format!(
                    "script {}: {derive_err}",
                    script.id
                ))
                .into())
            }
        }
    }

    /// One parse → persist cycle over an already-fetched payload. Parser
    /// failures are logged and partial results persisted; one bad payload
    /// never aborts a batch covering other scripts.
    pub async fn refresh_script(&self, script_id: &str, raw: &str) -> Result<RefreshSummary> {
        let script = self
            .get_script(script_id)
            .await?
            .ok_or_else(|| EngineError::ConfigNotFound(format!("script {script_id}")))?;
        let parser = parser_for(UrlType::from_code(script.url_type));
        let mapping = self.resolve_mapping(&script).await?;

        let mut issue_count = 0;
        let mut items = Vec::new();
        if mapping.items_state {
            if let Some(m) = &mapping.items_mapping {
                let outcome = parser.parse_items(raw, m, &script.id);
                for issue in &outcome.issues {
                    warn!(script_id = %script.id, section = "items", message = %issue.message, "parse issue");
                }
                issue_count += outcome.issues.len();
                items = outcome.rows;
            }
        }

        let mut categories = Vec::new();
        if mapping.categories_state {
            if let Some(m) = &mapping.categories_mapping {
                let outcome = parser.parse_categories(raw, m, &script.id);
                for issue in &outcome.issues {
                    warn!(script_id = %script.id, section = "categories", message = %issue.message, "parse issue");
                }
                issue_count += outcome.issues.len();
                categories = outcome.rows;
            }
        }

        let mut store = self.store_for(&script, OpenMode::ReadWrite)?;
        let items_saved = store.save_items(&items).await?;
        let categories_saved = store.save_categories(&categories).await?;
        store.close().await;

        dao::touch_script_run(self.db.pool(), &script.id, current_epoch(), None).await?;

        Ok(RefreshSummary {
            script_id: script.id,
            items_saved,
            categories_saved,
            issue_count,
        })
    }

    /// Fetch the script's API and run a refresh cycle over the response.
    pub async fn refresh_script_via(&self, fetcher: &dyn Fetcher, script_id: &str) -> Result<RefreshSummary> {
        let script = self
            .get_script(script_id)
            .await?
            .ok_or_else(|| EngineError::ConfigNotFound(format!("script {script_id}")))?;
        let raw = fetcher
            .fetch(&script.api_url)
            .await
            .with_context(|| format!("fetching {}", script.api_url))?;
        self.refresh_script(script_id, &raw).await
    }

    /// Open the isolated store for a script.
    pub fn store_for(&self, script: &Script, mode: OpenMode) -> Result<ScriptStore> {
        match (&self.store_private_dir, &self.store_export_dir) {
            (Some(private), Some(export)) => Ok(ScriptStore::new(
                &script.id,
                &script.db_name,
                private,
                export,
                mode,
            )),
            _ => ScriptStore::with_default_dirs(&script.id, &script.db_name, mode).map_err(Into::into),
        }
    }

    // --- access control ---

    /// Lock a script behind a password.
    pub async fn lock_script(&self, id: &str, password: &str) -> Result<()> {
        let stored = lock::set_password(password);
        dao::set_script_password(self.db.pool(), id, Some(&stored)).await?;
        Ok(())
    }

    /// Remove the lock. No attempt counter, no lockout.
    pub async fn unlock_script(&self, id: &str) -> Result<()> {
        dao::set_script_password(self.db.pool(), id, None).await?;
        Ok(())
    }

    /// True when the entered password opens the script. Unlocked scripts
    /// always verify.
    pub fn verify_script_password(&self, script: &Script, entered: &str) -> bool {
        match &script.password {
            Some(stored) => lock::verify(entered, stored),
            None => true,
        }
    }
}

fn current_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldsConfig;

    async fn test_engine() -> (ScriptEngine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("config.db");
        let url = crate::db::sqlite_url_for(&db_path, "rwc");
        let engine = ScriptEngine::connect(Some(&url), true)
            .await
            .unwrap()
            .with_store_dirs(dir.path().join("private"), dir.path().join("export"));
        (engine, dir)
    }

    #[tokio::test]
    async fn refresh_persists_items_from_embedded_config() {
        let (engine, _dir) = test_engine().await;
        let mut script = Script::new("Posts", "https://api.example.com/posts", 0);
        script.config = Some(
            r#"{"itemsState":true,"itemsMapping":{"rootPath":"data.items","idField":"id","titleField":"title"}}"#
                .to_string(),
        );
        engine.add_script(&script).await.unwrap();

        let raw = r#"{"data":{"items":[{"id":"1","title":"A"},{"id":"2","title":"B"}]}}"#;
        let summary = engine.refresh_script(&script.id, raw).await.unwrap();
        assert_eq!(summary.items_saved, 2);
        assert_eq!(summary.issue_count, 0);

        let mut store = engine.store_for(&script, OpenMode::ReadOnly).unwrap();
        let items = store.list_items(&script.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "A");

        let loaded = engine.get_script(&script.id).await.unwrap().unwrap();
        assert!(loaded.last_run_at.is_some());
    }

    #[tokio::test]
    async fn refresh_falls_back_to_persisted_mapping_config() {
        let (engine, _dir) = test_engine().await;
        let script = Script::new("Posts", "https://api.example.com/posts", 0);
        engine.add_script(&script).await.unwrap();

        let mut cfg = BasicsConfig::new(&script.id, &script.api_url);
        cfg.root_path = "posts".to_string();
        let mut fields = FieldsConfig::new(&cfg.basic_id);
        fields.id_field = "id".to_string();
        fields.title_field = "name".to_string();
        cfg.fields = Some(fields);
        assert!(engine.save_config(&cfg).await);

        let raw = r#"{"posts":[{"id":"p1","name":"hello"}]}"#;
        let summary = engine.refresh_script(&script.id, raw).await.unwrap();
        assert_eq!(summary.items_saved, 1);
    }

    #[tokio::test]
    async fn bad_payload_yields_summary_with_issues_not_error() {
        let (engine, _dir) = test_engine().await;
        let mut script = Script::new("Posts", "https://api.example.com/posts", 0);
        script.config = Some(
            r#"{"itemsState":true,"itemsMapping":{"rootPath":"data.items","idField":"id","titleField":"title"}}"#
                .to_string(),
        );
        engine.add_script(&script).await.unwrap();

        let summary = engine.refresh_script(&script.id, "{broken").await.unwrap();
        assert_eq!(summary.items_saved, 0);
        assert_eq!(summary.issue_count, 1);
    }

    #[tokio::test]
    async fn rss_script_refreshes_with_default_feed_mapping() {
        let (engine, _dir) = test_engine().await;
        let script = Script::new("Feed", "https://example.com/feed", 1);
        engine.add_script(&script).await.unwrap();

        let raw = r#"<rss><channel><item><guid>g1</guid><title>T</title></item></channel></rss>"#;
        let summary = engine.refresh_script(&script.id, raw).await.unwrap();
        assert_eq!(summary.items_saved, 1);
        assert_eq!(summary.categories_saved, 0);
    }

    #[tokio::test]
    async fn lock_and_verify_round_trip() {
        let (engine, _dir) = test_engine().await;
        let script = Script::new("Locked", "https://x", 0);
        engine.add_script(&script).await.unwrap();

        engine.lock_script(&script.id, "secret").await.unwrap();
        let locked = engine.get_script(&script.id).await.unwrap().unwrap();
        assert!(locked.locked());
        assert!(engine.verify_script_password(&locked, "secret"));
        assert!(!engine.verify_script_password(&locked, "wrong"));

        engine.unlock_script(&script.id).await.unwrap();
        let unlocked = engine.get_script(&script.id).await.unwrap().unwrap();
        assert!(!unlocked.locked());
        assert!(engine.verify_script_password(&unlocked, "anything"));
    }

    struct StaticFetcher(&'static str);

    #[async_trait::async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn refresh_via_fetcher_uses_the_script_api_url() {
        let (engine, _dir) = test_engine().await;
        let script = Script::new("Feed", "https://example.com/feed", 1);
        engine.add_script(&script).await.unwrap();

        let fetcher =
            StaticFetcher(r#"<rss><channel><item><guid>g1</guid><title>T</title></item></channel></rss>"#);
        let summary = engine.refresh_script_via(&fetcher, &script.id).await.unwrap();
        assert_eq!(summary.items_saved, 1);
    }

    #[tokio::test]
    async fn missing_script_is_a_config_not_found() {
        let (engine, _dir) = test_engine().await;
        let err = engine.refresh_script("ghost", "{}").await.unwrap_err();
        let engine_err = err.downcast_ref::<EngineError>().unwrap();
        assert!(engine_err.is_not_found());
    }
}
