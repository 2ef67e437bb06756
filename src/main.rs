mod aggregator;
mod args;
mod classifier;
mod output;
mod parsers;
mod pipeline;
mod records;
mod tables;
mod tests;

use std::sync::Arc;
use std::time::Instant;

use args::{Cli, Config, ConfigFile};
use clap::Parser;
use log::{debug, error, info};
use output::write_reports;
use pipeline::{process_flow_log_file, process_flow_log_file_sharded};
use tables::ReferenceTables;

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();

    // If a config file is provided, it replaces the table, output and thread options
    let config = if let Some(config_path) = cli.config_file.clone() {
        match confy::load_path::<ConfigFile>(&config_path) {
            Ok(cfg_file) => Config::from_file(cli.flow_log, cfg_file),
            Err(e) => {
                error!("Error loading configuration file: {:?}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::from_cli(cli)
    };

    if let Err(e) = run_with_config(config).await {
        error!("Error: {:?}", e);
        std::process::exit(1);
    }
}

async fn run_with_config(config: Config) -> anyhow::Result<()> {
    debug!("Running with {:?}", config);
    let start = Instant::now();

    let tables = ReferenceTables::load(&config.tables.protocols, &config.tables.lookup)?;

    let (aggregator, summary) = match config.shard_count() {
        Some(num_shards) => {
            process_flow_log_file_sharded(&config.flow_log, Arc::new(tables), num_shards).await?
        }
        None => process_flow_log_file(&config.flow_log, &tables)?,
    };

    info!(
        "Processed {} flow records from {} lines ({} skipped)",
        summary.records_processed, summary.lines_read, summary.skipped_lines
    );
    info!(
        "Unique port/protocol combinations: {}, distinct tags: {}",
        aggregator.port_protocol_counts().len(),
        aggregator.tag_counts().len()
    );

    write_reports(&aggregator, &config.output)?;

    info!(
        "Duration: {:.4} seconds",
        Instant::now().duration_since(start).as_secs_f64()
    );
    Ok(())
}
