use anyhow::{Context, Result};
use directories::ProjectDirs;
use sqlx::any::AnyPoolOptions;
use sqlx::{any::AnyConnectOptions, migrate::Migrator, AnyPool, ConnectOptions};
use std::sync::Once;
use std::{path::PathBuf, str::FromStr};

// Ensure drivers are installed exactly once for sqlx::any
static INSTALL_DRIVERS: Once = Once::new();

// Embed SQL migrations from the migrations/ directory
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Central config database: scripts and their mapping configs. Per-script
/// item stores live elsewhere (see `store`).
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    // Create a connection pool. If database_url is None, use a sensible default
    // (SQLite file in the user's data directory).
    pub async fn connect(database_url: Option<&str>) -> Result<Self> {
        // Register compiled-in drivers for sqlx::any
        INSTALL_DRIVERS.call_once(|| sqlx::any::install_default_drivers());

        let url = match database_url {
            Some(u) if !u.trim().is_empty() => u.to_string(),
            _ => default_sqlite_url()?,
        };

        // Parse options to tweak connection settings (e.g., logging)
        let opts = AnyConnectOptions::from_str(&url)
            .with_context(|| format!("invalid database URL: {url}"))?;
        // Quiet by default; callers can enable SQLX_LOG if they want
        let opts = opts.disable_statement_logging();

        let pool = AnyPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .with_context(|| format!("failed to connect to database: {url}"))?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        match MIGRATOR.run(&self.pool).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let msg = e.to_string();
                let looks_modified = msg.contains("was previously applied but has been modified");
                let duplicate_version =
                    msg.contains("UNIQUE constraint failed: _sqlx_migrations.version");
                if looks_modified || duplicate_version {
                    let _ = sqlx::query("DELETE FROM _sqlx_migrations")
                        .execute(&self.pool)
                        .await;
                    MIGRATOR
                        .run(&self.pool)
                        .await
                        .context("running migrations after ledger reset")
                } else {
                    Err(e).context("running migrations")
                }
            }
        }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

/// Register the compiled-in sqlx drivers. Shared with the per-script stores,
/// which open pools outside `Database::connect`.
pub(crate) fn install_drivers() {
    INSTALL_DRIVERS.call_once(|| sqlx::any::install_default_drivers());
}

fn default_sqlite_url() -> Result<String> {
    let proj = ProjectDirs::from("dev", "scriptfeed", "scriptfeed")
        .context("unable to determine data directory for default sqlite path")?;
    let mut path: PathBuf = proj.data_dir().to_path_buf();
    std::fs::create_dir_all(&path)
        .with_context(|| format!("creating data dir: {}", path.display()))?;
    path.push("scriptfeed.db");

    // Ensure parent directory exists (double safety)
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating db parent dir: {}", parent.display()))?;
    }

    // Ensure the file exists so SQLite can open it in rw mode
    let _ = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&path);

    // Encode spaces in the path for a valid sqlite URL
    let mut path_str = path.to_string_lossy().to_string();
    if path_str.contains(' ') {
        path_str = path_str.replace(' ', "%20");
    }
    Ok(format!("sqlite:///{path_str}?mode=rwc"))
}

/// Build a sqlite URL for an arbitrary on-disk file.
pub(crate) fn sqlite_url_for(path: &std::path::Path, mode: &str) -> String {
    let mut path_str = path.to_string_lossy().to_string();
    if path_str.contains(' ') {
        path_str = path_str.replace(' ', "%20");
    }
    format!("sqlite:///{path_str}?mode={mode}")
}
