//! Core data model: content directives, sample specs, and the match
//! records produced by a scanner.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::limits::Limits;
use crate::stream::SharedStream;

/// How a matched attribute's bytes are rendered into a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// The attribute's primary data stream, verbatim.
    #[default]
    Data,
    /// Printable strings extracted from the data stream.
    Strings,
    /// The attribute's raw underlying bytes.
    Raw,
}

impl ContentType {
    /// Tag appended to sample names and reported in the index.
    pub fn tag(self) -> &'static str {
        match self {
            ContentType::Data => "data",
            ContentType::Strings => "strings",
            ContentType::Raw => "raw",
        }
    }
}

/// A content directive; for `Strings`, zero char bounds inherit the global
/// defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSpec {
    #[serde(rename = "type", default)]
    pub kind: ContentType,
    #[serde(default)]
    pub min_chars: u32,
    #[serde(default)]
    pub max_chars: u32,
}

impl ContentSpec {
    pub fn data() -> Self {
        ContentSpec::default()
    }

    pub fn strings(min_chars: u32, max_chars: u32) -> Self {
        ContentSpec {
            kind: ContentType::Strings,
            min_chars,
            max_chars,
        }
    }

    pub fn raw() -> Self {
        ContentSpec {
            kind: ContentType::Raw,
            ..ContentSpec::default()
        }
    }
}

/// A user-level directive binding scanner terms to a content rendering, an
/// in-archive subfolder, and a per-spec budget.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleSpec {
    /// Subfolder prefixed to every sample this spec admits; empty for none.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: ContentSpec,
    /// Scanner terms this spec covers; a match's originating term selects
    /// its spec by membership here.
    pub terms: Vec<String>,
    #[serde(default)]
    pub per_sample_limits: Limits,
}

/// File timestamps as 64-bit Unix seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileTimes {
    pub creation: i64,
    pub modification: i64,
    pub access: i64,
    pub change: i64,
}

/// Reference to a parent directory record, as carried by a file-name
/// record: a sequence number plus a segment number split high/low.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParentRef {
    pub sequence: u16,
    pub segment_high: u16,
    pub segment_low: u32,
}

impl ParentRef {
    /// The packed 64-bit form reported in the index.
    pub fn as_u64(&self) -> u64 {
        ((self.sequence as u64) << 48) | ((self.segment_high as u64) << 32) | self.segment_low as u64
    }

    /// Split a 64-bit record reference back into its parts.
    pub fn from_u64(value: u64) -> Self {
        ParentRef {
            sequence: (value >> 48) as u16,
            segment_high: (value >> 32) as u16,
            segment_low: value as u32,
        }
    }
}

/// One path alias of a matched file.
#[derive(Debug, Clone, Default)]
pub struct MatchedName {
    pub parent: ParentRef,
    pub file_name: String,
    pub full_path: String,
    pub times: FileTimes,
}

/// Kind tag of a matched attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttrKind {
    #[default]
    Data,
    IndexRoot,
    IndexAllocation,
    Bitmap,
    ReparsePoint,
    ExtendedAttr,
    LoggedUtilityStream,
}

impl AttrKind {
    /// Symbolic form used in the index.
    pub fn as_str(self) -> &'static str {
        match self {
            AttrKind::Data => "$DATA",
            AttrKind::IndexRoot => "$INDEX_ROOT",
            AttrKind::IndexAllocation => "$INDEX_ALLOCATION",
            AttrKind::Bitmap => "$BITMAP",
            AttrKind::ReparsePoint => "$REPARSE_POINT",
            AttrKind::ExtendedAttr => "$EA",
            AttrKind::LoggedUtilityStream => "$LOGGED_UTILITY_STREAM",
        }
    }
}

/// A matching attribute: a named byte stream on the matched file, already
/// opened by the scanner.
pub struct MatchedAttribute {
    pub kind: AttrKind,
    /// Attribute (data-stream) name; empty for the default stream.
    pub name: String,
    pub instance_id: u16,
    pub data_stream: SharedStream,
    /// Unstructured underlying bytes, when the volume reader can provide
    /// them.
    pub raw_stream: Option<SharedStream>,
}

/// A scanner-produced record linking a file and its matching attributes to
/// the term that found it.
pub struct Match {
    /// The originating term; used to select the covering [`SampleSpec`].
    pub term: String,
    /// Human-readable rule description for the index.
    pub description: String,
    pub frn: u64,
    pub volume_serial: u64,
    /// Snapshot identity of the providing volume; nil when the volume is
    /// not a snapshot.
    pub snapshot_id: Uuid,
    pub names: Vec<MatchedName>,
    pub attributes: Vec<MatchedAttribute>,
    pub std_info: FileTimes,
    pub yara_rules: Option<Vec<String>>,
}

impl Match {
    /// Display name of a match: the primary path plus the attribute name
    /// when the attribute is not the default stream.
    pub fn full_name(&self, attribute_index: usize) -> String {
        let path = self
            .names
            .first()
            .map(|n| n.full_path.as_str())
            .unwrap_or("<unnamed>");
        match self.attributes.get(attribute_index) {
            Some(attr) if !attr.name.is_empty() => format!("{}:{}", path, attr.name),
            _ => path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_ref_packs_and_unpacks() {
        let parent = ParentRef {
            sequence: 0x0004,
            segment_high: 0x0001,
            segment_low: 0x0000_2A51,
        };
        let packed = parent.as_u64();
        assert_eq!(packed, 0x0004_0001_0000_2A51);
        assert_eq!(ParentRef::from_u64(packed), parent);
    }

    #[test]
    fn test_content_type_tags() {
        assert_eq!(ContentType::Data.tag(), "data");
        assert_eq!(ContentType::Strings.tag(), "strings");
        assert_eq!(ContentType::Raw.tag(), "raw");
    }
}
