mod cli;

use actionsql::action::{Action, CreateChangeLogTableAction};
use actionsql::engine::offline::OfflineSession;
use actionsql::scope::{CHANGELOG_SCHEMA_NAME, CHANGELOG_TABLE_NAME};
use actionsql::util::dialects::dialect_by_name;
use actionsql::{
    create_engine, snapshot, ActionLogicRegistry, ChangeLogHistory, Database, ObjectName,
    ObjectReference, ObjectType, Scope,
};
use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, Connection, HistoryTable};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn connect(connection: &Connection) -> Result<Database> {
    let url = Commands::get_url(&connection.url, &connection.url_env)?;
    info!(url = %Commands::redact_url(&url), provider = %connection.provider, "Connecting");
    let engine = create_engine(&connection.provider)?;
    Database::connect(&*engine, &url)
        .await
        .with_context(|| format!("Failed to connect to {}", Commands::redact_url(&url)))
}

fn offline_database(dialect: &str) -> Result<Database> {
    let dialect = dialect_by_name(dialect)
        .with_context(|| format!("Unknown offline dialect: {}", dialect))?;
    Ok(Database::new(dialect))
}

fn scope_for(database: Database, history: Option<&HistoryTable>) -> Scope {
    let mut scope = Scope::new(
        Arc::new(database),
        Arc::new(ActionLogicRegistry::with_builtins()),
    );
    if let Some(history) = history {
        scope = scope.with_value(CHANGELOG_TABLE_NAME, history.changelog_table.clone());
        if let Some(schema) = &history.changelog_schema {
            scope = scope.with_value(CHANGELOG_SCHEMA_NAME, schema.clone());
        }
    }
    scope
}

fn snapshot_type(name: &str) -> ObjectType {
    match name {
        "columns" => ObjectType::Column,
        "foreign-keys" => ObjectType::ForeignKey,
        "primary-keys" => ObjectType::PrimaryKey,
        _ => ObjectType::Table,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    match cli.command {
        Commands::Snapshot {
            connection,
            snapshot_file,
            offline,
            schema,
            table,
            object_type,
        } => {
            let database = match (&offline, &snapshot_file) {
                (Some(dialect), Some(path)) => {
                    let mut database = offline_database(dialect)?;
                    let session = OfflineSession::new()
                        .load_snapshot(Path::new(path))
                        .with_context(|| format!("Failed to load snapshot {}", path))?;
                    database.set_session(Box::new(session)).await?;
                    database
                }
                (Some(_), None) => anyhow::bail!("--offline snapshots need --snapshot-file"),
                _ => connect(&connection).await?,
            };
            let scope = scope_for(database, None);

            let related = match table {
                Some(table) => ObjectReference::table(ObjectName::from_parts([schema, Some(table)])),
                None => ObjectReference::schema(ObjectName::from_parts([schema])),
            };
            let objects = snapshot::snapshot(&scope, snapshot_type(&object_type), related)
                .await
                .context("Snapshot failed")?;
            info!(objects = objects.len(), "Snapshot complete");
            println!("{}", serde_json::to_string_pretty(&objects)?);
        }

        Commands::InitChangelog {
            connection,
            history,
            offline,
            output,
        } => match offline {
            Some(dialect) => {
                let mut database = offline_database(&dialect)?;
                match &output {
                    Some(path) => {
                        let session = OfflineSession::new()
                            .with_output(Path::new(path))
                            .with_context(|| format!("Failed to create {}", path))?;
                        database.set_session(Box::new(session)).await?;
                        let scope = scope_for(database, Some(&history));
                        ChangeLogHistory::new().ensure_table(&scope).await?;
                        scope.database().finish().await?;
                        info!(output = %path, "Wrote history table DDL");
                    }
                    None => {
                        let scope = scope_for(database, Some(&history));
                        let action: Action = CreateChangeLogTableAction {
                            table: scope.changelog_table(),
                        }
                        .into();
                        for sql in scope.registry().plan_sql(&action, &scope).await? {
                            println!("{};", sql);
                        }
                    }
                }
            }
            None => {
                let scope = scope_for(connect(&connection).await?, Some(&history));
                let created = ChangeLogHistory::new()
                    .ensure_table(&scope)
                    .await
                    .context("Failed to initialise the history table")?;
                if created {
                    println!("Created {}", scope.changelog_table());
                } else {
                    println!("{} already exists", scope.changelog_table());
                }
            }
        },

        Commands::History {
            connection,
            history,
        } => {
            let scope = scope_for(connect(&connection).await?, Some(&history));
            let ran = ChangeLogHistory::new()
                .ran_change_sets(&scope)
                .await
                .context("Failed to read the history table")?;
            for change_set in &ran {
                println!(
                    "{}\t{}\t{}\t{}::{}::{}",
                    change_set.order_executed.map(|o| o.to_string()).unwrap_or_default(),
                    change_set
                        .date_executed
                        .map(|d| d.to_string())
                        .unwrap_or_default(),
                    change_set.exec_type,
                    change_set.file_path,
                    change_set.id,
                    change_set.author,
                );
            }
            info!(change_sets = ran.len(), "Read history");
        }
    }

    Ok(())
}
