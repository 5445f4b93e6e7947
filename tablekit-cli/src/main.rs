//! Tablekit CLI
//!
//! Loads a synthetic price grid, runs live mutations against it for a while,
//! then prints the engine metrics and optionally a SQL query over the mirror.

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};
use tablekit_lib::live::LiveMutationConfig;
use tablekit_lib::live::LiveMutationEngine;
use tablekit_lib::live::MutationMode;
use tablekit_lib::model::ColumnDef;
use tablekit_lib::model::Row;
use tablekit_lib::plugin::PluginSpec;
use tablekit_lib::plugin::builtin::SQL_QUERY;
use tablekit_lib::plugin::builtin::SqlQueryPlugin;
use tablekit_lib::{Grid, GridConfig};

const SECTORS: [&str; 5] = ["Energy", "Finance", "Health", "Retail", "Tech"];

/// Run live mutations against a synthetic grid
#[derive(Parser, Debug)]
#[command(name = "tablekit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Number of rows to generate
    #[arg(long, default_value_t = 1000)]
    rows: usize,

    /// How long to run the engine, in seconds
    #[arg(long, default_value_t = 3)]
    seconds: u64,

    /// Tick interval in milliseconds
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    /// Rows mutated per tick
    #[arg(long, default_value_t = 10)]
    rows_per_tick: usize,

    /// Row selection mode: random, sequential or batch
    #[arg(long, default_value = "random")]
    mode: MutationMode,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// SQL to run against the mirrored table after the run
    #[arg(long, short)]
    query: Option<String>,

    /// Log file
    #[arg(long, default_value = "tablekit.log")]
    log_file: PathBuf,
}

fn sample_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            Row::new()
                .set("id", i as i64)
                .set("symbol", format!("SYM{:04}", i))
                .set("sector", SECTORS[i % SECTORS.len()])
                .set("price", 10.0 + (i % 490) as f64)
                .set("volume", 1_000 + (i as i64 * 37) % 9_000)
        })
        .collect()
}

fn sample_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::field("id").with_header("ID").with_width(80),
        ColumnDef::field("symbol").with_header("Symbol"),
        ColumnDef::field("sector").with_header("Sector"),
        ColumnDef::field("price").with_header("Price"),
        ColumnDef::field("volume").with_header("Volume"),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = File::create(&cli.log_file)
        .with_context(|| format!("Failed to create log file {}", cli.log_file.display()))?;
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)
        .context("Failed to initialize logger")?;

    let mut grid = Grid::new(GridConfig::default());
    grid.set_columns(sample_columns())?;
    grid.set_rows(sample_rows(cli.rows))?;

    let report = grid.attach([
        PluginSpec::new("sorting"),
        PluginSpec::new("filtering"),
        PluginSpec::with_options("pagination", serde_json::json!({ "pageSize": 25 })),
        PluginSpec::new(SQL_QUERY),
    ]);
    for error in &report.failed {
        eprintln!("Warning: {}", error);
    }
    info!("attached plugins: {:?}", report.attached);

    let mut config = LiveMutationConfig::default()
        .with_interval(Duration::from_millis(cli.interval_ms))
        .with_rows_per_tick(cli.rows_per_tick)
        .with_mode(cli.mode)
        .with_update_fields(["price", "volume"]);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let grid = grid.into_shared();
    let mut engine = LiveMutationEngine::new(grid.clone(), config);
    if !engine.start() {
        anyhow::bail!("Live mutation engine failed to start");
    }
    tokio::time::sleep(Duration::from_secs(cli.seconds)).await;
    engine.stop().await;

    println!("{}", serde_json::to_string_pretty(&engine.metrics())?);

    if let Some(sql) = cli.query {
        let (sync, query) = {
            let grid = grid.lock().await;
            let plugin = grid.plugin::<SqlQueryPlugin>(SQL_QUERY)?;
            (plugin.sync_now(grid.state()), plugin.execute_query(sql))
        };
        let synced = sync.await?;
        info!("mirrored {} rows", synced);

        let result = query.await;
        println!("{}", serde_json::to_string_pretty(&result)?);
        if let Some(error) = result.error {
            anyhow::bail!("Query failed: {}", error);
        }
    }

    Ok(())
}
