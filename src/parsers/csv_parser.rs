use super::parser::ReadError;
use crate::tables::normalize;
use csv::{ByteRecord, ReaderBuilder, Trim};
use log::debug;
use std::io::{BufRead, BufReader, Read};

/// Reads comma separated reference tables with a fixed column count.
///
/// The first line is a header and is dropped without looking at it. Rows
/// with a different number of fields, blank rows and rows that are not
/// valid UTF-8 are skipped. Every kept field is trimmed and lower-cased.
pub struct CsvParser {
    columns: usize,
}

impl CsvParser {
    pub fn new(columns: usize) -> Self {
        Self { columns }
    }

    pub fn parse<R: Read>(&self, reader: R) -> Result<Vec<Vec<String>>, ReadError> {
        let mut reader = BufReader::new(reader);

        // Consumed here rather than by the csv reader, which would skip a blank header line.
        let mut header = Vec::new();
        reader.read_until(b'\n', &mut header)?;
        debug!(
            "Skipping reference table header: {:?}",
            String::from_utf8_lossy(&header).trim()
        );

        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        // Flexible byte records only fail on I/O.
        for result in rdr.byte_records() {
            let record = result?;
            match self.normalize_record(&record) {
                Some(row) => rows.push(row),
                None => skipped += 1,
            }
        }

        debug!(
            "Parsed {} reference rows ({} columns), skipped {}",
            rows.len(),
            self.columns,
            skipped
        );
        Ok(rows)
    }

    fn normalize_record(&self, record: &ByteRecord) -> Option<Vec<String>> {
        if record.len() != self.columns {
            return None;
        }

        record
            .iter()
            .map(|field| std::str::from_utf8(field).ok().map(normalize))
            .collect()
    }
}
