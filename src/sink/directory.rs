//! Directory tree sink.

use std::fs::{self, File};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use log::info;

use super::{OnEntryDone, OutputSink};
use crate::constants::{INDEX_FILE_NAME, SAMPLE_PATH_SEPARATOR};
use crate::error::CollectionError;
use crate::stream::{drain_to_writer, ByteStream, SharedStream};

/// Writes each sample as a file under a target directory and persists
/// `GetThis.csv` next to them on close.
///
/// Sample names use `\` as the subfolder separator regardless of host;
/// the sink normalizes to the host separator when materializing paths.
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: &Path) -> Self {
        DirectorySink {
            root: root.to_path_buf(),
        }
    }

    fn sample_path(&self, sample_name: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in sample_name.split(SAMPLE_PATH_SEPARATOR) {
            path.push(part);
        }
        path
    }
}

impl OutputSink for DirectorySink {
    fn init(&mut self) -> Result<(), CollectionError> {
        fs::create_dir_all(&self.root)?;
        info!("created output directory '{}'", self.root.display());
        Ok(())
    }

    fn accept(
        &mut self,
        sample_name: &str,
        source_name: &str,
        stream: &SharedStream,
        on_done: &mut OnEntryDone,
    ) -> Result<(), CollectionError> {
        let path = self.sample_path(sample_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&path)?;
        let written = drain_to_writer(stream, &mut file)?;
        info!("\t{} ({} bytes, from {})", sample_name, written, source_name);
        on_done()
    }

    fn close(
        &mut self,
        index: &SharedStream,
        _transcript: &SharedStream,
    ) -> Result<(), CollectionError> {
        {
            let mut s = index.borrow_mut();
            s.seek(SeekFrom::Start(0))?;
        }
        let mut file = File::create(self.root.join(INDEX_FILE_NAME))?;
        drain_to_writer(index, &mut file)?;
        info!("directory output '{}' complete", self.root.display());
        Ok(())
    }
}
