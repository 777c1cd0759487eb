use clap::{Parser, Subcommand};

/// Extensible CLI for debugging and development
#[derive(Parser)]
#[command(name = "scriptfeed")]
#[command(about = "A CLI tool for managing scripts and their mapping configs", long_about = None)]
pub struct Cli {
    /// Database URL (defaults to a SQLite file in the user data dir)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered scripts
    Scripts,
    /// Register a new script
    Add {
        /// Display title
        title: String,
        /// API or feed URL
        url: String,
        /// Response format: 0 = structured object (JSON), 1 = markup feed (RSS)
        #[arg(long, default_value_t = 0)]
        url_type: i64,
    },
    /// Propose draft mapping configs from a sample payload file
    Infer {
        /// Path to a sample payload
        file: String,
        /// Source URL to record on the drafts
        #[arg(long, default_value = "")]
        url: String,
    },
    /// Parse a payload file with a script's mapping and persist the results
    Run {
        /// Script id
        script_id: String,
        /// Path to the raw payload
        file: String,
    },
    /// List items persisted in a script's store
    Items {
        /// Script id
        script_id: String,
    },
    /// Lock a script behind a password
    Lock {
        script_id: String,
        password: String,
    },
    /// Remove a script's lock
    Unlock {
        script_id: String,
    },
}
