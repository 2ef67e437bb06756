use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use log::{debug, info};

use crate::parsers::{csv_parser::CsvParser, parser::ReadError};

/// Protocol name used when a flow's protocol number is not in the protocol table.
pub const UNKNOWN_PROTOCOL: &str = "unknown";

/// Label rendered for flows that match no row of the tag table.
pub const UNTAGGED_LABEL: &str = "Untagged";

/// Trims surrounding whitespace and lower-cases a reference or flow field.
pub fn normalize(field: &str) -> String {
    field.trim().to_lowercase()
}

/// Composite lookup and aggregation key: destination port and protocol name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortProtocol {
    pub port: String,
    pub protocol: String,
}

impl PortProtocol {
    pub fn new(port: impl Into<String>, protocol: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            protocol: protocol.into(),
        }
    }
}

/// A classification label attached to a flow.
///
/// `Untagged` is kept apart from user supplied tags, so a lookup row tagged
/// `untagged` never merges with flows that matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Named(String),
    Untagged,
}

impl Tag {
    pub fn as_str(&self) -> &str {
        match self {
            Tag::Named(name) => name,
            Tag::Untagged => UNTAGGED_LABEL,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps protocol numbers (compared as text) to lower-cased protocol names.
#[derive(Debug, Default, Clone)]
pub struct ProtocolTable {
    names: HashMap<String, String>,
}

impl ProtocolTable {
    pub const COLUMNS: usize = 2;

    pub fn load(path: &Path) -> Result<Self, ReadError> {
        debug!("Loading protocol table from {:?}", path);
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReadError> {
        let rows = CsvParser::new(Self::COLUMNS).parse(reader)?;
        Ok(Self::from_rows(rows))
    }

    /// Builds the table from normalized `number,name` rows. Later rows overwrite earlier ones.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut names = HashMap::new();
        for row in rows {
            let Ok([number, name]) = <[String; 2]>::try_from(row) else {
                continue;
            };
            names.insert(number, name);
        }
        Self { names }
    }

    pub fn get(&self, number: &str) -> Option<&str> {
        self.names.get(number).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Maps a (port, protocol) pair to every tag listed for it, in file order.
#[derive(Debug, Default, Clone)]
pub struct TagTable {
    tags: HashMap<PortProtocol, Vec<Tag>>,
}

impl TagTable {
    pub const COLUMNS: usize = 3;

    pub fn load(path: &Path) -> Result<Self, ReadError> {
        debug!("Loading tag lookup table from {:?}", path);
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReadError> {
        let rows = CsvParser::new(Self::COLUMNS).parse(reader)?;
        Ok(Self::from_rows(rows))
    }

    /// Builds the table from normalized `dstport,protocol,tag` rows. Rows sharing a key accumulate.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut tags: HashMap<PortProtocol, Vec<Tag>> = HashMap::new();
        for row in rows {
            let Ok([port, protocol, tag]) = <[String; 3]>::try_from(row) else {
                continue;
            };
            tags.entry(PortProtocol::new(port, protocol))
                .or_default()
                .push(Tag::Named(tag));
        }
        Self { tags }
    }

    pub fn get(&self, key: &PortProtocol) -> Option<&[Tag]> {
        self.tags
            .get(key)
            .map(Vec::as_slice)
            .filter(|tags| !tags.is_empty())
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Both lookup tables, loaded once before any flow record is read.
#[derive(Debug, Default, Clone)]
pub struct ReferenceTables {
    pub protocols: ProtocolTable,
    pub tags: TagTable,
}

impl ReferenceTables {
    pub fn new(protocols: ProtocolTable, tags: TagTable) -> Self {
        Self { protocols, tags }
    }

    pub fn load(protocols_path: &Path, lookup_path: &Path) -> anyhow::Result<Self> {
        let protocols = ProtocolTable::load(protocols_path)
            .with_context(|| format!("failed to read protocol table {:?}", protocols_path))?;
        let tags = TagTable::load(lookup_path)
            .with_context(|| format!("failed to read tag lookup table {:?}", lookup_path))?;

        info!(
            "Loaded {} protocols and {} tagged port/protocol pairs",
            protocols.len(),
            tags.len()
        );
        Ok(Self::new(protocols, tags))
    }
}
