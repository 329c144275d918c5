//! Stream line parser
//!
//! Line format: `<relative_ms>;<name1>;<value1>;<name2>;<value2>;...`

use contracts::StreamEvent;
use tracing::warn;

/// Field delimiter within a stream line
pub const FIELD_DELIMITER: char = ';';

/// Parse result for one stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedStream {
    /// Events in file order
    pub events: Vec<StreamEvent>,
    /// Non-blank lines rejected because field 0 is not a time offset
    pub skipped: usize,
}

/// Parse the content of one stream file
///
/// `source` only labels log output. A line whose first field is not a
/// non-negative integer is logged and skipped; parsing continues with the
/// next line. A trailing name without a value is dropped.
pub fn parse_stream(source: &str, content: &str) -> ParsedStream {
    let mut parsed = ParsedStream::default();

    for (idx, line) in content.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(line) {
            Some(event) => parsed.events.push(event),
            None => {
                warn!(
                    source,
                    line_number = idx + 1,
                    line,
                    "invalid relative time, line skipped"
                );
                parsed.skipped += 1;
            }
        }
    }

    parsed
}

fn parse_line(line: &str) -> Option<StreamEvent> {
    let mut parts = line.split(FIELD_DELIMITER);
    let relative_time = parts.next()?.trim().parse::<u64>().ok()?;

    let rest: Vec<&str> = parts.collect();
    let fields = rest
        .chunks_exact(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect();

    Some(StreamEvent::new(relative_time, fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let parsed = parse_stream("test", "10;name1;v1;name2;v2\nNOTANUMBER;x;y\n20;name1;v3");

        assert_eq!(parsed.events.len(), 2);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.events[0].relative_time, 10);
        assert_eq!(
            parsed.events[0].fields,
            vec![field("name1", "v1"), field("name2", "v2")]
        );
        assert_eq!(parsed.events[1].relative_time, 20);
        assert_eq!(parsed.events[1].fields, vec![field("name1", "v3")]);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let parsed = parse_stream("test", "5;a;1\r\n\r\n   \n7;b;2\r\n");

        assert_eq!(parsed.skipped, 0);
        let times: Vec<u64> = parsed.events.iter().map(|e| e.relative_time).collect();
        assert_eq!(times, vec![5, 7]);
        assert_eq!(parsed.events[1].fields, vec![field("b", "2")]);
    }

    #[test]
    fn test_file_order_preserved() {
        let parsed = parse_stream("test", "30;a;1\n10;a;2\n20;a;3\n10;a;4");

        let times: Vec<u64> = parsed.events.iter().map(|e| e.relative_time).collect();
        assert_eq!(times, vec![30, 10, 20, 10]);
        assert_eq!(parsed.events[3].fields, vec![field("a", "4")]);
    }

    #[test]
    fn test_unpaired_trailing_field_dropped() {
        let parsed = parse_stream("test", "0;temp;5;orphan");
        assert_eq!(parsed.events[0].fields, vec![field("temp", "5")]);
    }

    #[test]
    fn test_time_only_line() {
        let parsed = parse_stream("test", "42");
        assert_eq!(parsed.events.len(), 1);
        assert!(parsed.events[0].fields.is_empty());
    }

    #[test]
    fn test_negative_and_fractional_time_rejected() {
        let parsed = parse_stream("test", "-5;a;1\n1.5;a;2\n 8 ;a;3");
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].relative_time, 8);
    }

    #[test]
    fn test_duplicate_names_kept_in_order() {
        let parsed = parse_stream("test", "1;a;x;a;y");
        assert_eq!(parsed.events[0].fields, vec![field("a", "x"), field("a", "y")]);
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(parse_stream("test", ""), ParsedStream::default());
    }
}
