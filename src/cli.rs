use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "actionsql")]
#[command(
    about = "Database-independent schema changes and changelog history for MySQL and PostgreSQL",
    long_about = None
)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Log output format (text|json)
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Live connection settings shared by every command.
#[derive(Args, Debug)]
pub struct Connection {
    /// Database URL (mysql:// or postgres://)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Environment variable containing the database URL
    #[arg(long)]
    pub url_env: Option<String>,

    /// Database provider (mysql|postgres)
    #[arg(long, default_value = "postgres", value_parser = ["mysql", "postgres"])]
    pub provider: String,
}

/// Where the changelog history table lives.
#[derive(Args, Debug)]
pub struct HistoryTable {
    /// Name of the history table
    #[arg(long, default_value = "DATABASECHANGELOG")]
    pub changelog_table: String,

    /// Schema of the history table (defaults to the current schema)
    #[arg(long)]
    pub changelog_schema: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print database structure as JSON
    Snapshot {
        #[command(flatten)]
        connection: Connection,

        /// Replay a stored snapshot (.json or .json.gz) instead of connecting
        #[arg(long, requires = "offline")]
        snapshot_file: Option<String>,

        /// Dialect of the stored snapshot (mysql|postgres|sqlite|generic)
        #[arg(long)]
        offline: Option<String>,

        /// Schema to read (defaults to the current schema)
        #[arg(long)]
        schema: Option<String>,

        /// Only objects of this table
        #[arg(long)]
        table: Option<String>,

        /// Object type to snapshot
        #[arg(
            long = "type",
            default_value = "tables",
            value_parser = ["tables", "columns", "foreign-keys", "primary-keys"]
        )]
        object_type: String,
    },

    /// Create the changelog history table, or write its DDL offline
    InitChangelog {
        #[command(flatten)]
        connection: Connection,

        #[command(flatten)]
        history: HistoryTable,

        /// Generate SQL for this dialect instead of connecting (mysql|postgres|sqlite|generic)
        #[arg(long)]
        offline: Option<String>,

        /// Output file for offline SQL (.sql or .sql.gz); stdout when omitted
        #[arg(short, long, requires = "offline")]
        output: Option<String>,
    },

    /// List change sets recorded in the history table
    History {
        #[command(flatten)]
        connection: Connection,

        #[command(flatten)]
        history: HistoryTable,
    },
}

impl Commands {
    /// Get database URL from either direct argument or environment variable
    pub fn get_url(direct: &Option<String>, env_var: &Option<String>) -> anyhow::Result<String> {
        if let Some(url) = direct {
            Ok(url.clone())
        } else if let Some(env) = env_var {
            std::env::var(env)
                .map_err(|_| anyhow::anyhow!("Environment variable {} not found", env))
        } else {
            Err(anyhow::anyhow!("Either --url or --url-env must be provided"))
        }
    }

    /// Redact password from URL for logging
    pub fn redact_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(colon_pos) = url[..at_pos].rfind(':') {
                let mut redacted = url.to_string();
                redacted.replace_range(colon_pos + 1..at_pos, "***");
                return redacted;
            }
        }
        url.to_string()
    }
}
