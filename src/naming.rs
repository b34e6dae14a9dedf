//! Deterministic, filesystem-safe sample names.

use crate::models::{ContentType, ParentRef};

/// Format the base name for a sample.
///
/// Layout: `<seq><segHigh><segLow>` in zero-padded uppercase hex, then the
/// file name, then the data-stream name when present (a double underscore
/// marks its absence), then the disambiguation index when non-zero, then
/// the content tag. Whitespace, `:` and `#` are replaced by `_` so the
/// result is safe both as an archive entry and as a file name.
pub fn sample_base_name(
    kind: ContentType,
    parent: &ParentRef,
    file_name: &str,
    data_name: &str,
    idx: u32,
) -> String {
    let tag = kind.tag();
    let prefix = format!(
        "{:04X}{:04X}{:08X}",
        parent.sequence, parent.segment_high, parent.segment_low
    );
    let name = match (data_name.is_empty(), idx) {
        (false, 0) => format!("{prefix}_{file_name}_{data_name}_{tag}"),
        (false, _) => format!("{prefix}_{file_name}_{data_name}_{idx}_{tag}"),
        (true, 0) => format!("{prefix}__{file_name}_{tag}"),
        (true, _) => format!("{prefix}__{file_name}_{idx}_{tag}"),
    };
    sanitize(&name)
}

/// Replace characters that are unsafe in archive entries or file names.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_whitespace() || c == ':' || c == '#' {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent() -> ParentRef {
        ParentRef {
            sequence: 0x0001,
            segment_high: 0x0000,
            segment_low: 0x2A,
        }
    }

    #[test]
    fn test_plain_data_name_without_stream() {
        let name = sample_base_name(ContentType::Data, &parent(), "cmd.exe", "", 0);
        assert_eq!(name, "000100000000002A__cmd.exe_data");
    }

    #[test]
    fn test_named_stream_uses_single_separator() {
        let name = sample_base_name(ContentType::Data, &parent(), "doc.txt", "Zone.Identifier", 0);
        assert_eq!(name, "000100000000002A_doc.txt_Zone.Identifier_data");
    }

    #[test]
    fn test_index_is_inserted_before_tag() {
        let name = sample_base_name(ContentType::Strings, &parent(), "app.dll", "", 3);
        assert_eq!(name, "000100000000002A__app.dll_3_strings");

        let name = sample_base_name(ContentType::Raw, &parent(), "app.dll", "ads", 2);
        assert_eq!(name, "000100000000002A_app.dll_ads_2_raw");
    }

    #[test]
    fn test_zero_index_is_unsuffixed() {
        let with = sample_base_name(ContentType::Data, &parent(), "f", "", 1);
        let without = sample_base_name(ContentType::Data, &parent(), "f", "", 0);
        assert!(with.contains("_1_data"));
        assert!(!without.contains("_0_"));
    }

    #[test]
    fn test_unsafe_characters_are_replaced() {
        let name = sample_base_name(ContentType::Data, &parent(), "my file:ads #1", "", 0);
        assert!(!name.contains(' '));
        assert!(!name.contains(':'));
        assert!(!name.contains('#'));
        assert!(name.contains("my_file_ads__1"));
    }

    #[test]
    fn test_hex_prefix_is_fixed_width() {
        let small = ParentRef {
            sequence: 1,
            segment_high: 0,
            segment_low: 5,
        };
        let name = sample_base_name(ContentType::Data, &small, "x", "", 0);
        assert!(name.starts_with("0001000000000005"));
    }
}
