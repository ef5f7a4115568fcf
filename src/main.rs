mod cli;

use chardb::{config, demo};
use chardb_common::CharacterId;
use chardb_db::models::Character;
use chardb_db::pool::{self, get_conn};
use chardb_db::{migrations, queries, SchemaRegistry};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};

fn open_database(config: &config::Config) -> Result<pool::DbPool> {
    let db = &config.database;
    tracing::info!("Initializing database at {}", db.path);
    pool::initialize_with(&db.path, &SchemaRegistry::standard(), db.diagnostics)
        .with_context(|| format!("Failed to initialize database {}", db.path))
}

fn run_demo(config: &config::Config) -> Result<()> {
    let pool = open_database(config)?;
    let report = demo::run_demo(&pool).context("Demo session failed")?;

    println!("Class:     #{}", report.class_id);
    println!("Character: #{}", report.character_id);
    for id in &report.bulk_ids {
        println!("Bulk:      #{}", id);
    }
    println!(
        "Updated:   #{} {} (level {})",
        report.character_id, report.updated_name, report.updated_level
    );
    Ok(())
}

fn migrate(config: &config::Config) -> Result<()> {
    let db = &config.database;
    let pool = pool::open(&db.path, db.diagnostics)
        .with_context(|| format!("Failed to open database {}", db.path))?;
    let conn = get_conn(&pool)?;

    let report = migrations::run_migrations(&conn, &SchemaRegistry::standard())
        .context("Schema migration failed")?;
    if report.is_empty() {
        println!("Schema is up to date");
    } else {
        println!(
            "Applied {} changes: {} tables, {} columns, {} indexes",
            report.total(),
            report.tables_created,
            report.columns_added,
            report.indexes_created
        );
    }
    println!(
        "Schema version: {}",
        migrations::current_version(&conn)?
    );
    Ok(())
}

fn show_character(config: &config::Config, id: i64) -> Result<()> {
    let pool = open_database(config)?;
    let conn = get_conn(&pool)?;

    let character: Character = queries::characters::get_character(&conn, CharacterId::from(id))
        .with_context(|| format!("Failed to load character {}", id))?;
    println!("{}", serde_json::to_string_pretty(&character)?);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Version) = cli.command {
        println!("chardb {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = config::load_config_or_default(cli.config.as_deref())?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }
    config::validate_config(&config)?;

    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => run_demo(&config),
        Commands::Migrate => migrate(&config),
        Commands::Show { id } => show_character(&config, id),
        Commands::Version => Ok(()),
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "chardb=trace,chardb_db=debug,chardb_common=debug".to_string()
        } else {
            "chardb=debug,chardb_db=info".to_string()
        }
    });

    // Identifiers go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}
