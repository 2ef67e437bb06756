use std::path::{Path, PathBuf};

use clap::{Args, Parser};
use serde::{Deserialize, Serialize};

use crate::output::ReportKind;

#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub struct Cli {
    /// The flow log to classify
    pub flow_log: PathBuf,

    /// Load table, output and thread options from a TOML configuration file
    #[clap(long)]
    pub config_file: Option<PathBuf>,

    /// Reference tables used for classification
    #[clap(flatten)]
    pub tables: TableConfig,

    /// Report output
    #[clap(flatten)]
    pub output: OutputConfig,

    /// Number of shards used to classify flows. Runs sequentially when absent or 1,
    /// 0 uses the number of logical CPUs
    #[clap(short, long)]
    pub threads: Option<u8>,
}

/// Options read from `--config-file`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ConfigFile {
    pub threads: Option<u8>,
    pub tables: TableConfig,
    pub output: OutputConfig,
}

#[derive(Args, Serialize, Deserialize, Debug, Clone)]
pub struct TableConfig {
    /// Protocol number to name table (`number,name`)
    #[clap(long, default_value = "protocol.csv")]
    pub protocols: PathBuf,

    /// Port/protocol to tag lookup table (`dstport,protocol,tag`)
    #[clap(long, default_value = "lookup.csv")]
    pub lookup: PathBuf,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            protocols: PathBuf::from("protocol.csv"),
            lookup: PathBuf::from("lookup.csv"),
        }
    }
}

#[derive(Args, Serialize, Deserialize, Debug, Clone)]
pub struct OutputConfig {
    /// Output method
    #[clap(short, long, value_enum, default_value_t = ExportMethodType::Csv)]
    pub output: ExportMethodType,

    /// File path for the tag count report (used if method is Csv)
    #[clap(long, default_value = "tag_counts.csv")]
    pub tag_report: PathBuf,

    /// File path for the port/protocol count report (used if method is Csv)
    #[clap(long, default_value = "port_protocol_counts.csv")]
    pub port_report: PathBuf,
}

impl OutputConfig {
    pub fn path_for(&self, kind: ReportKind) -> &Path {
        match kind {
            ReportKind::TagCounts => &self.tag_report,
            ReportKind::PortProtocolCounts => &self.port_report,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            output: ExportMethodType::Csv,
            tag_report: PathBuf::from("tag_counts.csv"),
            port_report: PathBuf::from("port_protocol_counts.csv"),
        }
    }
}

#[derive(clap::ValueEnum, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportMethodType {
    /// The reports will be printed to the console
    Print,

    /// The reports will be written to CSV files
    Csv,
}

/// Effective settings for one run, from the command line or a configuration file.
#[derive(Debug, Clone)]
pub struct Config {
    pub flow_log: PathBuf,
    pub tables: TableConfig,
    pub output: OutputConfig,
    pub threads: Option<u8>,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Self {
        Config {
            flow_log: cli.flow_log,
            tables: cli.tables,
            output: cli.output,
            threads: cli.threads,
        }
    }

    pub fn from_file(flow_log: PathBuf, file: ConfigFile) -> Self {
        Config {
            flow_log,
            tables: file.tables,
            output: file.output,
            threads: file.threads,
        }
    }

    /// Number of shards to use, or `None` for the sequential pipeline.
    pub fn shard_count(&self) -> Option<u8> {
        match self.threads {
            None | Some(1) => None,
            Some(0) => Some(num_cpus::get().clamp(1, u8::MAX as usize) as u8).filter(|&n| n > 1),
            Some(n) => Some(n),
        }
    }
}
