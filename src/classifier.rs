use crate::records::flow_record::FlowRecord;
use crate::tables::{normalize, PortProtocol, ReferenceTables, Tag, UNKNOWN_PROTOCOL};

static UNTAGGED: [Tag; 1] = [Tag::Untagged];

/// Result of classifying one flow record.
///
/// `tags` is never empty: flows without a matching lookup row carry [`Tag::Untagged`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<'a> {
    pub key: PortProtocol,
    pub tags: &'a [Tag],
}

/// Resolves protocol names and tags for flow records against the loaded reference tables.
pub struct Classifier<'a> {
    tables: &'a ReferenceTables,
}

impl<'a> Classifier<'a> {
    pub fn new(tables: &'a ReferenceTables) -> Self {
        Self { tables }
    }

    pub fn classify(&self, record: &FlowRecord) -> Classification<'a> {
        self.classify_fields(&record.destination_port, &record.protocol_number)
    }

    pub fn classify_fields(
        &self,
        destination_port: &str,
        protocol_number: &str,
    ) -> Classification<'a> {
        let protocol = self
            .tables
            .protocols
            .get(protocol_number.trim())
            .unwrap_or(UNKNOWN_PROTOCOL);

        // Port matching is textual: "080" does not hit a lookup row for "80".
        let key = PortProtocol::new(normalize(destination_port), protocol);
        let tags = self.tables.tags.get(&key).unwrap_or(&UNTAGGED[..]);

        Classification { key, tags }
    }
}
