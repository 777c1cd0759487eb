mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use scriptfeed::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let engine = ScriptEngine::connect(cli.database_url.as_deref(), true).await?;

    match cli.command {
        Commands::Scripts => {
            for script in engine.list_scripts().await? {
                let lock = if script.locked() { " [locked]" } else { "" };
                println!("{}  {}  {}{}", script.id, script.title, script.api_url, lock);
            }
        }
        Commands::Add { title, url, url_type } => {
            let script = Script::new(title, url, url_type);
            engine.add_script(&script).await?;
            println!("registered script {}", script.id);
        }
        Commands::Infer { file, url } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading sample payload: {file}"))?;
            let drafts = engine.infer_configs(&raw, &url)?;
            if drafts.is_empty() {
                println!("no record lists discovered");
            }
            for draft in drafts {
                println!("{}", serde_json::to_string_pretty(&draft)?);
            }
        }
        Commands::Run { script_id, file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading payload: {file}"))?;
            let summary = engine.refresh_script(&script_id, &raw).await?;
            println!(
                "saved {} items, {} categories ({} parse issues)",
                summary.items_saved, summary.categories_saved, summary.issue_count
            );
        }
        Commands::Items { script_id } => {
            let script = engine
                .get_script(&script_id)
                .await?
                .context("script not found")?;
            let mut store = engine.store_for(&script, OpenMode::ReadOnly)?;
            for item in store.list_items(&script.id).await? {
                println!("{}  {}", item.id, item.title);
            }
            store.close().await;
        }
        Commands::Lock { script_id, password } => {
            engine.lock_script(&script_id, &password).await?;
            println!("script {script_id} locked");
        }
        Commands::Unlock { script_id } => {
            engine.unlock_script(&script_id).await?;
            println!("script {script_id} unlocked");
        }
    }

    Ok(())
}
