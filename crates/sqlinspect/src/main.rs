//! sqlinspect CLI
//!
//! Command-line tool for auditing MySQL statements and printing their
//! rollback.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use sqlinspect::prelude::*;

/// Audit MySQL statements and generate their rollback.
#[derive(Parser)]
#[command(name = "sqlinspect")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// MySQL connection URL; without one the analysis runs offline.
    #[arg(short, long, env = "DATABASE_URL")]
    database: Option<String>,

    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Default schema, as if `USE schema` preceded the input.
    #[arg(short, long)]
    schema: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Input {
    /// File containing the statements.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Statements given inline.
    #[arg(long)]
    sql: Option<String>,
}

impl Input {
    fn read(self) -> Result<String> {
        match (self.sql, self.file) {
            (Some(sql), _) => Ok(sql),
            (None, Some(path)) => {
                std::fs::read_to_string(&path).map_err(|source| InspectError::Io { path, source })
            }
            (None, None) => Ok(String::new()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Audit each statement.
    Audit {
        #[command(flatten)]
        input: Input,

        /// Print a JSON report.
        #[arg(long)]
        json: bool,
    },

    /// Print the statements undoing the input.
    Rollback {
        #[command(flatten)]
        input: Input,

        /// Print a JSON report.
        #[arg(long)]
        json: bool,
    },

    /// Audit each statement and print its rollback.
    Inspect {
        #[command(flatten)]
        input: Input,

        /// Print a JSON report.
        #[arg(long)]
        json: bool,
    },

    /// List the rules with their effective settings.
    Rules,
}

/// A JSON report.
#[derive(Serialize)]
struct Report<T> {
    generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<String>,
    result: T,
}

impl<T: Serialize> Report<T> {
    fn print(database: Option<&str>, result: T) -> anyhow::Result<()> {
        let report = Self {
            generated_at: Utc::now(),
            database: database.map(ToString::to_string),
            result,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}

#[derive(Serialize)]
struct AuditReport {
    sql: String,
    kind: &'static str,
    audit: AuditResult,
}

fn print_audit(sql: &str, audit: &AuditResult) {
    println!("{sql};");
    if audit.is_empty() {
        println!("  [{}]ok", Level::Normal);
    }
    for message in audit.messages() {
        println!("  {message}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => InspectConfig::load(path)?,
        None => InspectConfig::default(),
    };
    let rules = Arc::new(RuleCatalog::from_config(&config)?);

    if matches!(cli.command, Commands::Rules) {
        for rule in rules.iter() {
            println!(
                "{:<40} {:<7} offline={:<5} {}",
                rule.name(),
                rule.level(),
                rule.rule().allow_offline(),
                serde_json::Value::Object(rule.params().clone())
            );
            println!("    {}", rule.rule().description());
        }
        return Ok(());
    }

    // Connect to database
    let connection: Option<Arc<dyn Connection>> = match &cli.database {
        Some(url) => {
            let connection = MySqlConnection::connect(url, config.query_timeout()).await?;
            info!("Connected, analyzing against the live server.");
            Some(Arc::new(connection))
        }
        None => {
            warn!("No database given, analyzing offline.");
            None
        }
    };

    let mut session = Session::new(connection, rules, Arc::new(config));
    if let Some(schema) = &cli.schema {
        session.use_schema(schema).await?;
    }
    let database = cli.database.as_deref();

    match cli.command {
        Commands::Audit { input, json } => {
            let text = input.read()?;
            let results = session.audit_batch(&text).await?;
            if json {
                let reports: Vec<AuditReport> = results
                    .into_iter()
                    .map(|(parsed, audit)| AuditReport {
                        kind: parsed.statement.kind(),
                        sql: parsed.text,
                        audit,
                    })
                    .collect();
                Report::print(database, reports)?;
            } else {
                for (parsed, audit) in &results {
                    print_audit(&parsed.text, audit);
                }
            }
        }

        Commands::Rollback { input, json } => {
            let text = input.read()?;
            let rollback = session.generate_rollback(&text).await?;
            if json {
                Report::print(database, rollback)?;
            } else {
                println!("{rollback}");
            }
        }

        Commands::Inspect { input, json } => {
            let text = input.read()?;
            let inspections = session.inspect_batch(&text).await?;
            if json {
                Report::print(database, inspections)?;
            } else {
                for inspection in &inspections {
                    print_audit(&inspection.sql, &inspection.audit);
                    if !inspection.rollback.is_empty() {
                        for line in inspection.rollback.to_string().lines() {
                            println!("  {line}");
                        }
                    }
                }
            }
        }

        Commands::Rules => {}
    }

    Ok(())
}
