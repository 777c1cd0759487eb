//! Per-script isolated data store.
//!
//! Each script owns one SQLite file named by the script's configured db name,
//! namespaced under a script-id subdirectory in an exportable location so the
//! file can be inspected or copied out independently. Provisioning runs the
//! schema against a private-sandbox copy first, then byte-copies it to the
//! export location; all later reads and writes go straight to the exportable
//! file, with no schema upgrade path for that copy.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::{ProjectDirs, UserDirs};
use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::{AnyPool, ConnectOptions};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::types::{Category, Item};

const ITEMS_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS items (\n    id TEXT NOT NULL,\n    title TEXT NOT NULL,\n    pic TEXT,\n    content TEXT,\n    category_id TEXT,\n    tags TEXT,\n    source_api_id TEXT,\n    script_id TEXT NOT NULL,\n    PRIMARY KEY (id, script_id)\n)";

const CATEGORIES_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS categories (\n    id TEXT NOT NULL,\n    title TEXT NOT NULL,\n    parent_id TEXT,\n    script_id TEXT NOT NULL,\n    PRIMARY KEY (id, script_id)\n)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

impl OpenMode {
    fn uri_mode(self) -> &'static str {
        match self {
            OpenMode::ReadOnly => "ro",
            OpenMode::ReadWrite => "rw",
        }
    }
}

/// Cached handle state. Reopen-on-stale is an explicit transition from
/// Closed back to Open inside `acquire`.
enum Handle {
    Closed,
    Open(AnyPool),
}

/// One script's isolated store. Not safe for concurrent callers; a single
/// logical owner per instance is assumed.
pub struct ScriptStore {
    script_id: String,
    db_name: String,
    private_dir: PathBuf,
    export_dir: PathBuf,
    mode: OpenMode,
    handle: Handle,
}

impl ScriptStore {
    pub fn new(
        script_id: impl Into<String>,
        db_name: impl Into<String>,
        private_dir: impl Into<PathBuf>,
        export_dir: impl Into<PathBuf>,
        mode: OpenMode,
    ) -> Self {
        Self {
            script_id: script_id.into(),
            db_name: db_name.into(),
            private_dir: private_dir.into(),
            export_dir: export_dir.into(),
            mode,
            handle: Handle::Closed,
        }
    }

    /// Store with platform-default directories: the app data dir as the
    /// private sandbox, the user's documents dir (or home) as the exportable
    /// area.
    pub fn with_default_dirs(
        script_id: impl Into<String>,
        db_name: impl Into<String>,
        mode: OpenMode,
    ) -> Result<Self> {
        let proj = ProjectDirs::from("dev", "scriptfeed", "scriptfeed").ok_or_else(|| {
            EngineError::provisioning("", "unable to determine application directories")
        })?;
        let private_dir = proj.data_dir().join("stores");
        let export_dir = UserDirs::new()
            .and_then(|u| u.document_dir().map(Path::to_path_buf).or_else(|| Some(u.home_dir().to_path_buf())))
            .ok_or_else(|| EngineError::provisioning("", "unable to determine home directory"))?
            .join("scriptfeed");
        Ok(Self::new(script_id, db_name, private_dir, export_dir, mode))
    }

    pub fn export_path(&self) -> PathBuf {
        self.export_dir.join(&self.script_id).join(&self.db_name)
    }

    fn private_path(&self) -> PathBuf {
        self.private_dir.join(&self.script_id).join(&self.db_name)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.handle, Handle::Open(_))
    }

    /// First-access provisioning: run schema creation against the private
    /// copy, then byte-copy it to the export location if nothing is there
    /// yet. Failures here are fatal for the store.
    pub async fn provision(&self) -> Result<PathBuf> {
        let export = self.export_path();
        if export.exists() {
            return Ok(export);
        }

        let private = self.private_path();
        let parent = private
            .parent()
            .ok_or_else(|| EngineError::provisioning(&private, "store path has no parent"))?;
        std::fs::create_dir_all(parent)
            .map_err(|e| EngineError::provisioning(parent, e.to_string()))?;
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(&private)
            .map_err(|e| EngineError::provisioning(&private, e.to_string()))?;

        let pool = open_pool(&private, "rwc")
            .await
            .map_err(|e| EngineError::provisioning(&private, e.to_string()))?;
        sqlx::query(ITEMS_SCHEMA).execute(&pool).await?;
        sqlx::query(CATEGORIES_SCHEMA).execute(&pool).await?;
        pool.close().await;

        let export_parent = export
            .parent()
            .ok_or_else(|| EngineError::provisioning(&export, "export path has no parent"))?;
        std::fs::create_dir_all(export_parent)
            .map_err(|e| EngineError::provisioning(export_parent, e.to_string()))?;
        std::fs::copy(&private, &export)
            .map_err(|e| EngineError::provisioning(&export, e.to_string()))?;

        debug!(script_id = %self.script_id, path = %export.display(), "provisioned script store");
        Ok(export)
    }

    /// Lazily (re)open the cached handle from the exportable path, in the
    /// caller-requested mode.
    pub async fn acquire(&mut self) -> Result<&AnyPool> {
        if !self.is_open() {
            let export = self.provision().await?;
            let pool = open_pool(&export, self.mode.uri_mode()).await?;
            self.handle = Handle::Open(pool);
        }
        match &self.handle {
            Handle::Open(pool) => Ok(pool),
            Handle::Closed => unreachable!("acquire just opened the handle"),
        }
    }

    /// Release the cached handle. The next operation reopens it.
    pub async fn close(&mut self) {
        if let Handle::Open(pool) = std::mem::replace(&mut self.handle, Handle::Closed) {
            pool.close().await;
        }
    }

    pub async fn save_items(&mut self, items: &[Item]) -> Result<u64> {
        let pool = self.acquire().await?.clone();
        let mut tx = pool.begin().await?;
        let mut affected = 0;
        for item in items {
            let res = sqlx::query(
                "INSERT INTO items(id, title, pic, content, category_id, tags, source_api_id, script_id)\n                 VALUES(?, ?, ?, ?, ?, ?, ?, ?)\n                 ON CONFLICT(id, script_id) DO UPDATE SET\n                   title=excluded.title, pic=excluded.pic, content=excluded.content,\n                   category_id=excluded.category_id, tags=excluded.tags,\n                   source_api_id=excluded.source_api_id",
            )
            .bind(&item.id)
            .bind(&item.title)
            .bind(&item.pic)
            .bind(&item.content)
            .bind(&item.category_id)
            .bind(&item.tags)
            .bind(&item.source_url)
            .bind(&item.script_id)
            .execute(&mut *tx)
            .await?;
            affected += res.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    pub async fn save_categories(&mut self, categories: &[Category]) -> Result<u64> {
        let pool = self.acquire().await?.clone();
        let mut tx = pool.begin().await?;
        let mut affected = 0;
        for category in categories {
            let res = sqlx::query(
                "INSERT INTO categories(id, title, parent_id, script_id) VALUES(?, ?, ?, ?)\n                 ON CONFLICT(id, script_id) DO UPDATE SET\n                   title=excluded.title, parent_id=excluded.parent_id",
            )
            .bind(&category.id)
            .bind(&category.title)
            .bind(&category.parent_id)
            .bind(&category.script_id)
            .execute(&mut *tx)
            .await?;
            affected += res.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    pub async fn list_items(&mut self, script_id: &str) -> Result<Vec<Item>> {
        let pool = self.acquire().await?;
        let rows: Vec<(String, String, Option<String>, Option<String>, Option<String>, Option<String>, Option<String>, String)> =
            sqlx::query_as(
                "SELECT id, title, pic, content, category_id, tags, source_api_id, script_id\n                 FROM items WHERE script_id = ? ORDER BY id",
            )
            .bind(script_id)
            .fetch_all(pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(
                |(id, title, pic, content, category_id, tags, source_url, script_id)| Item {
                    id,
                    title,
                    pic,
                    content,
                    category_id,
                    tags,
                    source_url,
                    script_id,
                },
            )
            .collect())
    }

    pub async fn list_categories(&mut self, script_id: &str) -> Result<Vec<Category>> {
        let pool = self.acquire().await?;
        let rows: Vec<(String, String, Option<String>, String)> = sqlx::query_as(
            "SELECT id, title, parent_id, script_id FROM categories WHERE script_id = ? ORDER BY id",
        )
        .bind(script_id)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, title, parent_id, script_id)| Category {
                id,
                title,
                parent_id,
                script_id,
            })
            .collect())
    }

    pub async fn count_items(&mut self, script_id: &str) -> Result<i64> {
        let pool = self.acquire().await?;
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE script_id = ?")
            .bind(script_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Remove every row belonging to a script from this store file.
    pub async fn delete_script_rows(&mut self, script_id: &str) -> Result<u64> {
        let pool = self.acquire().await?.clone();
        let mut tx = pool.begin().await?;
        let items = sqlx::query("DELETE FROM items WHERE script_id = ?")
            .bind(script_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let categories = sqlx::query("DELETE FROM categories WHERE script_id = ?")
            .bind(script_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(items + categories)
    }
}

async fn open_pool(path: &Path, mode: &str) -> Result<AnyPool> {
    crate::db::install_drivers();
    let url = crate::db::sqlite_url_for(path, mode);
    let opts = AnyConnectOptions::from_str(&url)?.disable_statement_logging();
    // Single cached handle semantics: one connection per store.
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await?;
    Ok(pool)
}
