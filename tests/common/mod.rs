//! Shared helpers for the integration tests: a scripted scanner and match
//! builders.

use uuid::Uuid;

use sample_collector::error::CollectionError;
use sample_collector::models::{
    AttrKind, FileTimes, Match, MatchedAttribute, MatchedName, ParentRef,
};
use sample_collector::scan::{MatchCallback, Scanner};
use sample_collector::stream::{shared, MemoryStream};

/// A scanner that replays a prepared list of matches.
///
/// When `raise_stop_after` is set, the scanner raises the stop flag after
/// delivering that many matches; with `keep_calling_after_stop` it then
/// misbehaves and keeps calling, which the collector must ignore.
pub struct MockScanner {
    matches: Vec<Match>,
    pub raise_stop_after: Option<usize>,
    pub keep_calling_after_stop: bool,
}

impl MockScanner {
    pub fn new(matches: Vec<Match>) -> Self {
        MockScanner {
            matches,
            raise_stop_after: None,
            keep_calling_after_stop: false,
        }
    }
}

impl Scanner for MockScanner {
    fn find(&mut self, on_match: &mut MatchCallback) -> Result<(), CollectionError> {
        let mut stop = false;
        for (i, m) in self.matches.drain(..).enumerate() {
            on_match(m, &mut stop);
            if self.raise_stop_after == Some(i + 1) {
                stop = true;
            }
            if stop && !self.keep_calling_after_stop {
                return Ok(());
            }
        }
        Ok(())
    }
}

/// Build a match with one name and one default data attribute.
pub fn make_match(term: &str, frn: u64, file_name: &str, data: &[u8]) -> Match {
    let times = FileTimes {
        creation: 1_600_000_000,
        modification: 1_600_000_100,
        access: 1_600_000_200,
        change: 1_600_000_300,
    };
    Match {
        term: term.to_string(),
        description: term.to_string(),
        frn,
        volume_serial: 0xC0FFEE,
        snapshot_id: Uuid::nil(),
        names: vec![MatchedName {
            parent: ParentRef {
                sequence: 1,
                segment_high: 0,
                segment_low: 5,
            },
            file_name: file_name.to_string(),
            full_path: format!("\\volume\\{}", file_name),
            times,
        }],
        attributes: vec![MatchedAttribute {
            kind: AttrKind::Data,
            name: String::new(),
            instance_id: 0,
            data_stream: shared(MemoryStream::from_vec(data.to_vec())),
            raw_stream: None,
        }],
        std_info: times,
        yara_rules: None,
    }
}

/// Add another path alias to a match.
pub fn with_extra_name(mut m: Match, file_name: &str) -> Match {
    let times = m.names[0].times;
    m.names.push(MatchedName {
        parent: ParentRef {
            sequence: 1,
            segment_high: 0,
            segment_low: 6,
        },
        file_name: file_name.to_string(),
        full_path: format!("\\volume\\{}", file_name),
        times,
    });
    m
}

/// Split one CSV line on commas outside quotes.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                cell.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut cell));
            }
            _ => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}

/// Data rows of an index file (the header is dropped).
pub fn csv_rows(content: &str) -> Vec<Vec<String>> {
    content
        .lines()
        .skip(1)
        .filter(|l| !l.is_empty())
        .map(split_csv_line)
        .collect()
}

// Column offsets in the index schema.
pub const COL_FULL_NAME: usize = 4;
pub const COL_SAMPLE_NAME: usize = 5;
pub const COL_SIZE: usize = 6;
pub const COL_MD5: usize = 7;
pub const COL_CONTENT_TYPE: usize = 10;
pub const COL_SHA256: usize = 24;
