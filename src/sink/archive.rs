//! Compressed archive sink.

use std::fs::File;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use log::{error, info};
use zip::unstable::write::FileOptionsExt;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{OnEntryDone, OutputSink};
use crate::constants::{INDEX_FILE_NAME, LOG_FILE_NAME};
use crate::error::CollectionError;
use crate::stream::{drain_to_writer, ByteStream, SharedStream};

/// Writes samples into a zip container, then appends `GetThis.csv` and
/// `GetThis.log` on close.
///
/// Entries are sealed in `accept` order; the completion callback fires
/// after the entry's bytes are in the compressor, which keeps index rows
/// co-ordered with archived entries.
pub struct ArchiveSink {
    path: PathBuf,
    compression_level: i32,
    password: Option<String>,
    writer: Option<ZipWriter<File>>,
}

impl ArchiveSink {
    pub fn new(path: &Path, compression_level: i32, password: Option<String>) -> Self {
        ArchiveSink {
            path: path.to_path_buf(),
            compression_level,
            password,
            writer: None,
        }
    }

    fn entry_options(&self) -> FileOptions {
        let mut options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.compression_level))
            .unix_permissions(0o644);
        if let Some(password) = &self.password {
            options = options.with_deprecated_encryption(password.as_bytes());
        }
        options
    }

    fn writer_mut(&mut self) -> Result<&mut ZipWriter<File>, CollectionError> {
        self.writer
            .as_mut()
            .ok_or_else(|| CollectionError::Sink("archive sink is not initialized".into()))
    }

    fn append_stream(
        writer: &mut ZipWriter<File>,
        compression_level: i32,
        entry_name: &str,
        stream: &SharedStream,
    ) -> Result<(), CollectionError> {
        {
            let mut s = stream.borrow_mut();
            if s.size()? == 0 {
                return Ok(());
            }
            s.seek(SeekFrom::Start(0))?;
        }
        // Never under the archive password, so the table stays readable
        // without it.
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level))
            .unix_permissions(0o644);
        writer
            .start_file(entry_name, options)
            .map_err(|e| CollectionError::Sink(format!("failed to start '{}': {}", entry_name, e)))?;
        drain_to_writer(stream, writer)?;
        Ok(())
    }
}

impl OutputSink for ArchiveSink {
    fn init(&mut self) -> Result<(), CollectionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&self.path)?;
        self.writer = Some(ZipWriter::new(file));
        info!("created archive '{}'", self.path.display());
        Ok(())
    }

    fn accept(
        &mut self,
        sample_name: &str,
        source_name: &str,
        stream: &SharedStream,
        on_done: &mut OnEntryDone,
    ) -> Result<(), CollectionError> {
        let options = self.entry_options();
        let writer = self.writer_mut()?;
        writer
            .start_file(sample_name, options)
            .map_err(|e| {
                CollectionError::Sink(format!("failed to start '{}': {}", sample_name, e))
            })?;
        let written = drain_to_writer(stream, writer)?;
        info!("\t{} ({} bytes, from {})", sample_name, written, source_name);
        on_done()
    }

    fn close(
        &mut self,
        index: &SharedStream,
        transcript: &SharedStream,
    ) -> Result<(), CollectionError> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| CollectionError::Sink("archive sink is not initialized".into()))?;

        let level = self.compression_level;
        if let Err(e) = Self::append_stream(&mut writer, level, INDEX_FILE_NAME, index) {
            error!("failed to add {}: {}", INDEX_FILE_NAME, e);
        }
        if let Err(e) = Self::append_stream(&mut writer, level, LOG_FILE_NAME, transcript) {
            error!("failed to add {}: {}", LOG_FILE_NAME, e);
        }

        writer
            .finish()
            .map_err(|e| CollectionError::Sink(format!("failed to finalize archive: {}", e)))?;
        info!("archive '{}' complete", self.path.display());
        Ok(())
    }
}
