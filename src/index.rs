//! Sample metadata table.
//!
//! A small typed-cell CSV writer plus the per-sample row emission: one row
//! per `(match, name)` pair of every sample in the registry, columns in a
//! fixed order.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::error::CollectionError;
use crate::models::{AttrKind, ContentType};
use crate::registry::SampleRef;
use crate::stream::{ByteStream, SharedStream};

/// Fixed column order of the sample index.
pub const SCHEMA: [&str; 28] = [
    "ComputerName",
    "VolumeID",
    "ParentFRN",
    "FRN",
    "FullName",
    "SampleName",
    "SizeInBytes",
    "MD5",
    "SHA1",
    "FindMatch",
    "ContentType",
    "SampleCollectionDate",
    "CreationDate",
    "LastModificationDate",
    "LastAccessDate",
    "LastAttrChangeDate",
    "FileNameCreationDate",
    "FileNameLastModificationDate",
    "FileNameLastAccessDate",
    "FileNameLastAttrModificationDate",
    "AttributeType",
    "AttributeName",
    "InstanceID",
    "SnapshotID",
    "SHA256",
    "SSDeep",
    "TLSH",
    "YaraRules",
];

/// Typed-cell writer producing RFC 4180 CSV rows onto a byte stream.
///
/// Cells accumulate until `write_end_of_line` seals the row; the stream
/// only ever sees whole lines.
pub struct TableWriter {
    stream: SharedStream,
    row: Vec<String>,
    rows_written: u64,
}

impl TableWriter {
    pub fn new(stream: SharedStream) -> Self {
        TableWriter {
            stream,
            row: Vec::new(),
            rows_written: 0,
        }
    }

    /// Write the header row. Call once, before any cells.
    pub fn set_schema(&mut self, columns: &[&str]) -> Result<(), CollectionError> {
        for column in columns {
            self.write_string(column);
        }
        self.write_end_of_line()?;
        self.rows_written = 0;
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) {
        self.row.push(value.to_string());
    }

    pub fn write_integer(&mut self, value: u64) {
        self.row.push(value.to_string());
    }

    pub fn write_file_size(&mut self, value: u64) {
        self.row.push(value.to_string());
    }

    /// Binary digest as lowercase hex; an empty buffer becomes an empty
    /// cell.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.row.push(to_hex(value));
    }

    /// Unix seconds rendered as ISO 8601 UTC.
    pub fn write_file_time(&mut self, secs: i64) {
        self.row.push(format_file_time(secs));
    }

    /// Canonical hyphenated GUID text.
    pub fn write_guid(&mut self, value: &Uuid) {
        self.row.push(value.to_string());
    }

    /// Symbolic attribute-kind flag.
    pub fn write_flags(&mut self, kind: AttrKind) {
        self.row.push(kind.as_str().to_string());
    }

    pub fn write_nothing(&mut self) {
        self.row.push(String::new());
    }

    /// Seal the current row and write it out.
    pub fn write_end_of_line(&mut self) -> Result<(), CollectionError> {
        let line = self
            .row
            .iter()
            .map(|cell| quote(cell))
            .collect::<Vec<_>>()
            .join(",");
        self.row.clear();
        let mut stream = self.stream.borrow_mut();
        stream.write_all(line.as_bytes())?;
        stream.write_all(b"\r\n")?;
        self.rows_written += 1;
        Ok(())
    }

    /// Ensure all sealed rows reached the stream. Cells of an unfinished
    /// row are discarded.
    pub fn flush(&mut self) -> Result<(), CollectionError> {
        self.row.clear();
        Ok(())
    }

    /// Data rows sealed so far (the header is not counted).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

/// Emit the index rows for one sample: one per `(match, name)` pair.
pub fn write_sample_rows(
    table: &mut TableWriter,
    sample: &SampleRef,
    computer_name: &str,
) -> Result<(), CollectionError> {
    for m in &sample.matches {
        let attribute = m.attributes.get(sample.id.attribute_index);
        for name in &m.names {
            table.write_string(computer_name);
            table.write_integer(m.volume_serial);
            table.write_integer(name.parent.as_u64());
            table.write_integer(m.frn);
            table.write_string(&name.full_path);

            if sample.off_limits {
                table.write_nothing();
            } else {
                table.write_string(&sample.sample_name);
            }

            table.write_file_size(sample.sample_size);
            table.write_bytes(&sample.md5);
            table.write_bytes(&sample.sha1);
            table.write_string(&m.description);

            match sample.content.kind {
                ContentType::Data => table.write_string("data"),
                ContentType::Strings => table.write_string("strings"),
                ContentType::Raw => table.write_nothing(),
            }

            table.write_file_time(sample.collection_date);

            table.write_file_time(m.std_info.creation);
            table.write_file_time(m.std_info.modification);
            table.write_file_time(m.std_info.access);
            table.write_file_time(m.std_info.change);

            table.write_file_time(name.times.creation);
            table.write_file_time(name.times.modification);
            table.write_file_time(name.times.access);
            table.write_file_time(name.times.change);

            match attribute {
                Some(attr) => {
                    table.write_flags(attr.kind);
                    table.write_string(&attr.name);
                }
                None => {
                    table.write_nothing();
                    table.write_nothing();
                }
            }

            table.write_integer(sample.id.instance_id as u64);
            table.write_guid(&sample.id.snapshot_id);
            table.write_bytes(&sample.sha256);
            table.write_string(&sample.ssdeep);
            table.write_string(&sample.tlsh);

            match &m.yara_rules {
                Some(rules) => table.write_string(&rules.join("; ")),
                None => table.write_nothing(),
            }

            table.write_end_of_line()?;
        }
    }
    Ok(())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn format_file_time(secs: i64) -> String {
    match Utc.timestamp_opt(secs, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        _ => "0000-00-00T00:00:00Z".to_string(),
    }
}

fn quote(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{shared, ByteStream, MemoryStream};
    use std::io::SeekFrom;
    use std::rc::Rc;

    fn contents(stream: &SharedStream) -> String {
        let mut s = stream.borrow_mut();
        s.seek(SeekFrom::Start(0)).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 256];
        loop {
            let n = s.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_cells_are_joined_and_quoted() {
        let stream = shared(MemoryStream::new());
        let mut table = TableWriter::new(Rc::clone(&stream));
        table.write_string("plain");
        table.write_string("with,comma");
        table.write_string("with\"quote");
        table.write_integer(42);
        table.write_nothing();
        table.write_end_of_line().unwrap();

        assert_eq!(
            contents(&stream),
            "plain,\"with,comma\",\"with\"\"quote\",42,\r\n"
        );
    }

    #[test]
    fn test_file_time_renders_iso8601_utc() {
        let stream = shared(MemoryStream::new());
        let mut table = TableWriter::new(Rc::clone(&stream));
        table.write_file_time(0);
        table.write_end_of_line().unwrap();
        assert_eq!(contents(&stream), "1970-01-01T00:00:00Z\r\n");
    }

    #[test]
    fn test_bytes_render_lowercase_hex_or_empty() {
        let stream = shared(MemoryStream::new());
        let mut table = TableWriter::new(Rc::clone(&stream));
        table.write_bytes(&[0xAB, 0x01]);
        table.write_bytes(&[]);
        table.write_guid(&Uuid::nil());
        table.write_end_of_line().unwrap();
        assert_eq!(
            contents(&stream),
            "ab01,,00000000-0000-0000-0000-000000000000\r\n"
        );
    }

    #[test]
    fn test_schema_row_is_not_counted() {
        let stream = shared(MemoryStream::new());
        let mut table = TableWriter::new(Rc::clone(&stream));
        table.set_schema(&SCHEMA).unwrap();
        assert_eq!(table.rows_written(), 0);
        table.write_string("x");
        table.write_end_of_line().unwrap();
        assert_eq!(table.rows_written(), 1);
        assert!(contents(&stream).starts_with("ComputerName,VolumeID,ParentFRN,FRN,"));
    }
}
