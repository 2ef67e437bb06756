/// The two fields of a flow log line that drive classification.
///
/// Flow log lines follow the version 2 VPC flow log layout:
///
/// `version account-id interface-id srcaddr dstaddr srcport dstport protocol packets bytes start end action log-status`
///
/// Values are kept as written. Nothing checks that the port or the protocol
/// number is numeric; unexpected values simply miss in the lookup tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowRecord {
    pub destination_port: String,
    pub protocol_number: String,
}

impl FlowRecord {
    /// Number of whitespace separated fields in a well-formed line.
    pub const FIELD_COUNT: usize = 14;
    pub const DESTINATION_PORT_INDEX: usize = 6;
    pub const PROTOCOL_INDEX: usize = 7;

    pub fn new(destination_port: impl Into<String>, protocol_number: impl Into<String>) -> Self {
        Self {
            destination_port: destination_port.into(),
            protocol_number: protocol_number.into(),
        }
    }
}
