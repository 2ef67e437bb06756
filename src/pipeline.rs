use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use log::{debug, error};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::aggregator::Aggregator;
use crate::classifier::Classifier;
use crate::parsers::flow_log_parser::{FlowLogParser, FlowRecords};
use crate::records::flow_record::FlowRecord;
use crate::tables::ReferenceTables;

/// Line accounting for one pass over a flow log.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub lines_read: u64,
    pub records_processed: u64,
    pub skipped_lines: u64,
}

impl RunSummary {
    fn from_records<R: BufRead>(records: &FlowRecords<R>, records_processed: u64) -> Self {
        RunSummary {
            lines_read: records.lines_read(),
            records_processed,
            skipped_lines: records.skipped_lines(),
        }
    }
}

/// Classifies every record of `reader` on the calling thread.
pub fn process_flow_log<R: BufRead>(
    reader: R,
    tables: &ReferenceTables,
) -> anyhow::Result<(Aggregator, RunSummary)> {
    classify_records(FlowLogParser::parse(reader), tables)
}

pub fn process_flow_log_file(
    path: &Path,
    tables: &ReferenceTables,
) -> anyhow::Result<(Aggregator, RunSummary)> {
    let records = FlowLogParser::parse_file(path)
        .with_context(|| format!("failed to open flow log {:?}", path))?;
    debug!("Reading the flow log: {:?} ...", path);
    let result = classify_records(records, tables)
        .with_context(|| format!("failed to process flow log {:?}", path))?;
    debug!("Finished reading the flow log: {:?}", path);
    Ok(result)
}

fn classify_records<R: BufRead>(
    mut records: FlowRecords<R>,
    tables: &ReferenceTables,
) -> anyhow::Result<(Aggregator, RunSummary)> {
    let classifier = Classifier::new(tables);
    let mut aggregator = Aggregator::new();
    let mut processed = 0u64;

    for record in records.by_ref() {
        let record = record.context("failed to read flow log")?;
        aggregator.record(&classifier.classify(&record));
        processed += 1;
    }

    Ok((aggregator, RunSummary::from_records(&records, processed)))
}

/// Classifies records of `reader` across `num_shards` tasks and merges their counts.
///
/// Records are routed by hashing their port and protocol number, each shard
/// owns its own [`Aggregator`]. Counts are identical to [`process_flow_log`].
pub async fn process_flow_log_sharded<R: BufRead + Send + 'static>(
    reader: R,
    tables: Arc<ReferenceTables>,
    num_shards: u8,
) -> anyhow::Result<(Aggregator, RunSummary)> {
    classify_records_sharded(FlowLogParser::parse(reader), tables, num_shards).await
}

pub async fn process_flow_log_file_sharded(
    path: &Path,
    tables: Arc<ReferenceTables>,
    num_shards: u8,
) -> anyhow::Result<(Aggregator, RunSummary)> {
    let records = FlowLogParser::parse_file(path)
        .with_context(|| format!("failed to open flow log {:?}", path))?;
    debug!("Reading the flow log: {:?} with {} shards ...", path, num_shards);
    let result = classify_records_sharded(records, tables, num_shards)
        .await
        .with_context(|| format!("failed to process flow log {:?}", path))?;
    debug!("Finished reading the flow log: {:?}", path);
    Ok(result)
}

async fn classify_records_sharded<R: BufRead + Send + 'static>(
    records: FlowRecords<R>,
    tables: Arc<ReferenceTables>,
    num_shards: u8,
) -> anyhow::Result<(Aggregator, RunSummary)> {
    let num_shards = num_shards.max(1);
    let buffer_num_records = 10_000;
    let (shard_senders, shard_handles) =
        create_shard_senders(num_shards, buffer_num_records, tables);

    // The senders move into the reader, the shards finish once it returns.
    let reader_handle =
        tokio::task::spawn_blocking(move || route_records(records, shard_senders, num_shards));

    let mut aggregator = Aggregator::new();
    for (index, handle) in shard_handles.into_iter().enumerate() {
        let shard = handle
            .await
            .with_context(|| format!("shard {} failed", index))?;
        aggregator.merge(shard);
    }

    let summary = reader_handle.await.context("flow log reader failed")??;
    Ok((aggregator, summary))
}

/// Reads every record on a blocking thread and sends it to its shard.
fn route_records<R: BufRead>(
    mut records: FlowRecords<R>,
    shard_senders: Vec<mpsc::Sender<FlowRecord>>,
    num_shards: u8,
) -> anyhow::Result<RunSummary> {
    let mut processed = 0u64;
    for record in records.by_ref() {
        let record = record.context("failed to read flow log")?;
        let shard_index = compute_shard_index(&record, num_shards);
        if let Err(e) = shard_senders[shard_index].blocking_send(record) {
            error!("Failed to send record to shard {}: {}", shard_index, e);
            anyhow::bail!("shard {} stopped accepting records", shard_index);
        }
        processed += 1;
    }
    Ok(RunSummary::from_records(&records, processed))
}

fn compute_shard_index(record: &FlowRecord, num_shards: u8) -> usize {
    let mut hasher = DefaultHasher::new();
    record.hash(&mut hasher);
    let hash = hasher.finish();
    (hash % num_shards as u64) as usize
}

/// Creates shard channels and spawns one classifying task per shard.
fn create_shard_senders(
    num_shards: u8,
    buffer_num_records: usize,
    tables: Arc<ReferenceTables>,
) -> (Vec<mpsc::Sender<FlowRecord>>, Vec<JoinHandle<Aggregator>>) {
    debug!("Creating {} shards...", num_shards);
    let mut shard_senders = Vec::with_capacity(num_shards as usize);
    let mut shard_handles = Vec::with_capacity(num_shards as usize);
    for _ in 0..num_shards {
        let (tx, mut rx) = mpsc::channel::<FlowRecord>(buffer_num_records);
        let tables = Arc::clone(&tables);

        shard_handles.push(tokio::spawn(async move {
            let classifier = Classifier::new(&tables);
            let mut aggregator = Aggregator::new();
            while let Some(record) = rx.recv().await {
                aggregator.record(&classifier.classify(&record));
            }
            aggregator
        }));
        shard_senders.push(tx);
    }
    debug!("Shards created");

    (shard_senders, shard_handles)
}
