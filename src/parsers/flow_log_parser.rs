use super::parser::ReadError;
use crate::records::flow_record::FlowRecord;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Extracts the destination port and protocol number from one flow log line.
///
/// Returns `None` for blank lines and for lines that do not split into
/// exactly [`FlowRecord::FIELD_COUNT`] whitespace separated fields.
pub fn parse_line(line: &str) -> Option<FlowRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != FlowRecord::FIELD_COUNT {
        return None;
    }

    Some(FlowRecord::new(
        fields[FlowRecord::DESTINATION_PORT_INDEX],
        fields[FlowRecord::PROTOCOL_INDEX],
    ))
}

pub struct FlowLogParser;

impl FlowLogParser {
    pub fn parse_file(path: &Path) -> Result<FlowRecords<BufReader<File>>, ReadError> {
        debug!("Opening the flow log: {:?} ...", path);
        let file = File::open(path)?;
        Ok(FlowRecords::new(BufReader::new(file)))
    }

    pub fn parse<R: BufRead>(reader: R) -> FlowRecords<R> {
        FlowRecords::new(reader)
    }
}

/// Streams flow records out of a line oriented source, one line at a time.
///
/// Malformed lines are counted and skipped. Only I/O failures are yielded as errors.
pub struct FlowRecords<R> {
    reader: R,
    buffer: Vec<u8>,
    lines_read: u64,
    skipped_lines: u64,
}

impl<R: BufRead> FlowRecords<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            lines_read: 0,
            skipped_lines: 0,
        }
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }
}

impl<R: BufRead> Iterator for FlowRecords<R> {
    type Item = Result<FlowRecord, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    self.lines_read += 1;
                    let record = std::str::from_utf8(&self.buffer)
                        .ok()
                        .and_then(parse_line);
                    match record {
                        Some(record) => return Some(Ok(record)),
                        None => {
                            debug!("Skipping malformed flow log line {}", self.lines_read);
                            self.skipped_lines += 1;
                        }
                    }
                }
                Err(e) => return Some(Err(ReadError::Io(e))),
            }
        }
    }
}
