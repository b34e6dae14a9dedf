//! Global constants for the sample-collection engine.
//!
//! This module centralizes hardcoded values so tuning and review stay in
//! one place.

// Buffer sizes
/// Chunk size used when copying byte streams (64KB)
pub const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Bytes a temporary stream keeps in memory before spilling to disk (5MB)
pub const TEMP_STREAM_SPILL_THRESHOLD: usize = 5 * 1024 * 1024;

// String extraction defaults
/// Minimum printable-run length when a spec leaves MinChars unset
pub const DEFAULT_MIN_CHARS: u32 = 3;

/// Maximum printable-run length when a spec leaves MaxChars unset
pub const DEFAULT_MAX_CHARS: u32 = 1024;

// Output entry names
/// In-container name of the sample metadata table
pub const INDEX_FILE_NAME: &str = "GetThis.csv";

/// In-container name of the collection transcript
pub const LOG_FILE_NAME: &str = "GetThis.log";

/// Separator between a spec subfolder and a sample name inside the container
pub const SAMPLE_PATH_SEPARATOR: char = '\\';

// Archive defaults
/// Default deflate level for the archive sink
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 6;
