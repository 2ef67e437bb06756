#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::{self, Cursor, Read};
    use std::path::Path;

    use crate::{
        parsers::parser::ReadError,
        tables::{PortProtocol, ProtocolTable, ReferenceTables, Tag, TagTable},
    };

    fn tag(name: &str) -> Tag {
        Tag::Named(name.to_string())
    }

    #[test]
    fn test_read_protocol_table() {
        let table =
            ProtocolTable::from_reader(Cursor::new("number,name\n6,tcp\n17,udp\n1,icmp")).unwrap();

        assert_eq!(table.get("6"), Some("tcp"));
        assert_eq!(table.get("17"), Some("udp"));
        assert_eq!(table.get("1"), Some("icmp"));
        assert_eq!(table.get("99"), None);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_read_tag_table() {
        let table = TagTable::from_reader(Cursor::new(
            "dstport,protocol,tag\n80,tcp,web_traffic\n443,tcp,secure_web\n53,udp,dns_traffic\n",
        ))
        .unwrap();

        assert_eq!(
            table.get(&PortProtocol::new("80", "tcp")),
            Some(&[tag("web_traffic")][..])
        );
        assert_eq!(
            table.get(&PortProtocol::new("443", "tcp")),
            Some(&[tag("secure_web")][..])
        );
        assert_eq!(
            table.get(&PortProtocol::new("53", "udp")),
            Some(&[tag("dns_traffic")][..])
        );
        assert_eq!(table.get(&PortProtocol::new("53", "tcp")), None);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_protocol_duplicates_last_row_wins() {
        let table =
            ProtocolTable::from_reader(Cursor::new("number,name\n6,tcp\n17,udp\n6,TCP-alt\n"))
                .unwrap();

        assert_eq!(table.get("6"), Some("tcp-alt"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_tag_duplicates_accumulate_in_file_order() {
        let table = TagTable::from_reader(Cursor::new(
            "dstport,protocol,tag\n80,tcp,web\n443,tcp,secure\n80,tcp,http\n80,tcp,web\n",
        ))
        .unwrap();

        assert_eq!(
            table.get(&PortProtocol::new("80", "tcp")),
            Some(&[tag("web"), tag("http"), tag("web")][..])
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_malformed_and_blank_rows_are_skipped() {
        let table = ProtocolTable::from_reader(Cursor::new(
            "number,name\n6,tcp,extra\n\n   \n17\n17,udp\n\n",
        ))
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("17"), Some("udp"));
        assert_eq!(table.get("6"), None);
    }

    #[test]
    fn test_fields_are_trimmed_and_lower_cased() {
        let table = TagTable::from_reader(Cursor::new(
            "dstport,protocol,tag\r\n  80 , TCP , Web_Traffic \r\n",
        ))
        .unwrap();

        assert_eq!(
            table.get(&PortProtocol::new("80", "tcp")),
            Some(&[tag("web_traffic")][..])
        );
    }

    #[test]
    fn test_first_line_is_always_discarded() {
        let table = ProtocolTable::from_reader(Cursor::new("6,tcp\n17,udp\n")).unwrap();
        assert_eq!(table.get("6"), None);
        assert_eq!(table.get("17"), Some("udp"));

        // A blank first line is still the header
        let table = ProtocolTable::from_reader(Cursor::new("\n6,tcp\n17,udp\n")).unwrap();
        assert_eq!(table.get("6"), Some("tcp"));
        assert_eq!(table.get("17"), Some("udp"));
    }

    #[test]
    fn test_quotes_are_not_interpreted() {
        let table = TagTable::from_reader(Cursor::new(
            "dstport,protocol,tag\n80,tcp,\"a,b\"\n443,tcp,\"secure\"\n",
        ))
        .unwrap();

        assert_eq!(table.get(&PortProtocol::new("80", "tcp")), None);
        assert_eq!(
            table.get(&PortProtocol::new("443", "tcp")),
            Some(&[tag("\"secure\"")][..])
        );
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped() {
        let content: &[u8] = b"number,name\n6,tcp\n7,\xff\xfe\n17,udp\n";
        let table = ProtocolTable::from_reader(Cursor::new(content)).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("7"), None);
    }

    #[test]
    fn test_empty_source_gives_empty_tables() {
        assert!(ProtocolTable::from_reader(Cursor::new("")).unwrap().is_empty());
        assert!(TagTable::from_reader(Cursor::new("dstport,protocol,tag\n"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_loading_is_idempotent() {
        let content = "dstport,protocol,tag\n80,tcp,web\n80,tcp,http\n53,udp,dns\n";
        let first = TagTable::from_reader(Cursor::new(content)).unwrap();
        let second = TagTable::from_reader(Cursor::new(content)).unwrap();

        for key in [
            PortProtocol::new("80", "tcp"),
            PortProtocol::new("53", "udp"),
            PortProtocol::new("22", "tcp"),
        ] {
            assert_eq!(first.get(&key), second.get(&key));
        }
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let protocols = dir.path().join("protocol.csv");
        let lookup = dir.path().join("lookup.csv");
        fs::write(&protocols, "number,name\n6,tcp\n17,udp\n").unwrap();
        fs::write(&lookup, "dstport,protocol,tag\n53,udp,dns\n").unwrap();

        let tables = ReferenceTables::load(&protocols, &lookup).unwrap();
        assert_eq!(tables.protocols.get("17"), Some("udp"));
        assert_eq!(
            tables.tags.get(&PortProtocol::new("53", "udp")),
            Some(&[tag("dns")][..])
        );
    }

    #[test]
    fn test_missing_table_is_an_io_error() {
        let result = ProtocolTable::load(Path::new("/nonexistent/flowtag/protocol.csv"));
        assert!(matches!(result, Err(ReadError::Io(_))));

        let dir = tempfile::tempdir().unwrap();
        let protocols = dir.path().join("protocol.csv");
        fs::write(&protocols, "number,name\n6,tcp\n").unwrap();
        let err = ReferenceTables::load(&protocols, &dir.path().join("missing.csv")).unwrap_err();
        assert!(err.to_string().contains("failed to read tag lookup table"));
    }

    /// Yields its data, then fails every later read.
    struct FailingReader(Cursor<Vec<u8>>);

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::Other, "disk gone")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_read_failure_mid_table_is_an_io_error() {
        let reader = FailingReader(Cursor::new(b"number,name\n6,tcp\n17,udp\n".to_vec()));
        match ProtocolTable::from_reader(reader) {
            Err(ReadError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::Other),
            other => panic!("expected an I/O error, got {:?}", other.map(|t| t.len())),
        }
    }
}
