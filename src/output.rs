mod ordering;

pub use ordering::{sorted_port_protocol_counts, sorted_tag_counts, PortOrder};

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use log::{debug, info};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::{
    aggregator::{Aggregator, FrequencyTable},
    args::{ExportMethodType, OutputConfig},
    tables::{PortProtocol, Tag},
};

/// The two reports produced from an aggregated flow log, in the order they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ReportKind {
    #[strum(to_string = "tag count")]
    TagCounts,
    #[strum(to_string = "port/protocol count")]
    PortProtocolCounts,
}

impl ReportKind {
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            ReportKind::TagCounts => &["Tag", "Count"],
            ReportKind::PortProtocolCounts => &["Port", "Protocol", "Count"],
        }
    }
}

/// Renders frequency tables as comma separated reports with a header row.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl ReportWriter<BufWriter<Box<dyn Write + Send>>> {
    /// Opens the destination for a report. CSV output truncates any existing file.
    pub fn create(export_type: &ExportMethodType, file_path: Option<&Path>) -> io::Result<Self> {
        let writer: Box<dyn Write + Send> = match (export_type, file_path) {
            (ExportMethodType::Csv, Some(path)) => Box::new(File::create(path)?),
            (ExportMethodType::Csv, None) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "file path required for CSV output",
                ))
            }
            (ExportMethodType::Print, _) => Box::new(io::stdout()),
        };

        Ok(Self::new(BufWriter::new(writer)))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W) -> Self {
        // Header and rows differ in length when reports share a destination.
        // Fields are written verbatim, tables are read without quote handling.
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(writer);
        Self { writer }
    }

    pub fn write_report(&mut self, kind: ReportKind, aggregator: &Aggregator) -> csv::Result<()> {
        debug!("Writing {} report", kind);
        match kind {
            ReportKind::TagCounts => self.write_tag_report(aggregator.tag_counts()),
            ReportKind::PortProtocolCounts => {
                self.write_port_protocol_report(aggregator.port_protocol_counts())
            }
        }
    }

    pub fn write_tag_report(&mut self, table: &FrequencyTable<Tag>) -> csv::Result<()> {
        self.writer.write_record(ReportKind::TagCounts.header())?;
        for (tag, count) in sorted_tag_counts(table) {
            let count = count.to_string();
            self.writer.write_record([tag.as_str(), count.as_str()])?;
        }
        Ok(())
    }

    pub fn write_port_protocol_report(
        &mut self,
        table: &FrequencyTable<PortProtocol>,
    ) -> csv::Result<()> {
        self.writer
            .write_record(ReportKind::PortProtocolCounts.header())?;
        for (key, count) in sorted_port_protocol_counts(table) {
            let count = count.to_string();
            self.writer
                .write_record([key.port.as_str(), key.protocol.as_str(), count.as_str()])?;
        }
        Ok(())
    }

    /// Flushes everything written so far to the destination.
    pub fn flush_and_close(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

/// Writes both reports to their configured destinations, tag counts first.
///
/// A failure aborts immediately, leaving any report that was already written in place.
pub fn write_reports(aggregator: &Aggregator, output: &OutputConfig) -> anyhow::Result<()> {
    if output.output == ExportMethodType::Print {
        let mut stdout = BufWriter::new(io::stdout().lock());
        print_reports(aggregator, &mut stdout)?;
        stdout.flush().context("failed to flush reports to stdout")?;
        info!("Printed {} reports to stdout", ReportKind::iter().count());
        return Ok(());
    }

    for kind in ReportKind::iter() {
        let path = output.path_for(kind);
        let mut writer = ReportWriter::create(&output.output, Some(path))
            .with_context(|| format!("failed to open {} report {:?}", kind, path))?;
        writer
            .write_report(kind, aggregator)
            .with_context(|| format!("failed to write {} report {:?}", kind, path))?;
        writer
            .flush_and_close()
            .with_context(|| format!("failed to flush {} report {:?}", kind, path))?;

        info!("Wrote {} report to {:?}", kind, path);
    }
    Ok(())
}

/// Writes both reports to a single destination, separated by a blank line.
pub fn print_reports<W: Write>(aggregator: &Aggregator, out: &mut W) -> anyhow::Result<()> {
    for (index, kind) in ReportKind::iter().enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        let mut writer = ReportWriter::new(&mut *out);
        writer
            .write_report(kind, aggregator)
            .with_context(|| format!("failed to write {} report to stdout", kind))?;
        writer
            .flush_and_close()
            .with_context(|| format!("failed to flush {} report to stdout", kind))?;
    }
    Ok(())
}
