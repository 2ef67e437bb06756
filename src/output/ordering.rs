use std::cmp::Ordering;

use crate::aggregator::FrequencyTable;
use crate::tables::{PortProtocol, Tag};

/// Sort position of a destination port in the port/protocol report.
///
/// All-digit ports sort by value. Anything else, including digit strings too
/// long for a `u64`, sorts after every numeric port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PortOrder {
    Numeric(u64),
    NonNumeric,
}

impl PortOrder {
    pub fn of(port: &str) -> Self {
        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return PortOrder::NonNumeric;
        }
        port.parse()
            .map(PortOrder::Numeric)
            .unwrap_or(PortOrder::NonNumeric)
    }
}

/// Tag rows by count descending. Equal counts order by tag text.
pub fn sorted_tag_counts(table: &FrequencyTable<Tag>) -> Vec<(&Tag, u64)> {
    let mut rows: Vec<_> = table.iter().collect();
    rows.sort_by(|(tag_a, count_a), (tag_b, count_b)| {
        count_b
            .cmp(count_a)
            .then_with(|| tag_a.as_str().cmp(tag_b.as_str()))
            .then_with(|| is_untagged(tag_a).cmp(&is_untagged(tag_b)))
    });
    rows
}

fn is_untagged(tag: &Tag) -> bool {
    matches!(tag, Tag::Untagged)
}

/// Port/protocol rows by numeric port, then protocol name, then port text.
pub fn sorted_port_protocol_counts(
    table: &FrequencyTable<PortProtocol>,
) -> Vec<(&PortProtocol, u64)> {
    let mut rows: Vec<_> = table.iter().collect();
    rows.sort_by(|(a, _), (b, _)| compare_port_protocol(a, b));
    rows
}

fn compare_port_protocol(a: &PortProtocol, b: &PortProtocol) -> Ordering {
    PortOrder::of(&a.port)
        .cmp(&PortOrder::of(&b.port))
        .then_with(|| a.protocol.cmp(&b.protocol))
        .then_with(|| a.port.cmp(&b.port))
}
