//! Filesystem scanner.
//!
//! Walks configured locations and matches file names against term
//! regexes. File reference numbers and volume serials are synthesized
//! from inode and device identifiers where the platform exposes them, so
//! sample identities stay stable across runs on the same volume.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use regex::Regex;
use uuid::Uuid;
use walkdir::WalkDir;

use super::{MatchCallback, Scanner};
use crate::error::CollectionError;
use crate::models::{
    AttrKind, FileTimes, Match, MatchedAttribute, MatchedName, ParentRef,
};
use crate::stream::{shared, FileStream};

/// Scanner over mounted directories, with file-name regex terms.
pub struct FsScanner {
    locations: Vec<PathBuf>,
    terms: Vec<(String, Regex)>,
    recurse: bool,
}

impl FsScanner {
    /// Compile `term_patterns` and prepare a scan of `locations`.
    pub fn new(
        locations: Vec<PathBuf>,
        term_patterns: &[String],
        recurse: bool,
    ) -> Result<Self, CollectionError> {
        let mut terms = Vec::with_capacity(term_patterns.len());
        for pattern in term_patterns {
            let regex = Regex::new(pattern).map_err(|e| {
                CollectionError::Config(format!("invalid term pattern '{}': {}", pattern, e))
            })?;
            terms.push((pattern.clone(), regex));
        }
        Ok(FsScanner {
            locations,
            terms,
            recurse,
        })
    }
}

impl Scanner for FsScanner {
    fn find(&mut self, on_match: &mut MatchCallback) -> Result<(), CollectionError> {
        let mut stop = false;
        for location in &self.locations {
            let walker = WalkDir::new(location)
                .follow_links(false)
                .max_depth(if self.recurse { usize::MAX } else { 1 });
            for entry in walker {
                if stop {
                    return Ok(());
                }
                let entry = match entry {
                    Ok(entry) => entry,
                    // A location that cannot be walked at all fails the
                    // scan; unreadable entries below it are skipped.
                    Err(e) if e.depth() == 0 => {
                        return Err(CollectionError::Scanner(format!(
                            "cannot walk '{}': {}",
                            location.display(),
                            e
                        )));
                    }
                    Err(e) => {
                        warn!(
                            "skipping unreadable entry under '{}': {}",
                            location.display(),
                            e
                        );
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let file_name = entry.file_name().to_string_lossy();
                let Some((term, _)) = self
                    .terms
                    .iter()
                    .find(|(_, regex)| regex.is_match(&file_name))
                else {
                    continue;
                };
                match build_match(entry.path(), term) {
                    Ok(m) => on_match(m, &mut stop),
                    Err(e) => warn!("skipping '{}': {}", entry.path().display(), e),
                }
            }
        }
        Ok(())
    }
}

fn build_match(path: &Path, term: &str) -> Result<Match, CollectionError> {
    let metadata = fs::metadata(path)?;
    let (frn, volume_serial, change) = file_identity(path, &metadata);
    let parent_frn = path
        .parent()
        .and_then(|p| fs::metadata(p).ok().map(|m| file_identity(p, &m).0))
        .unwrap_or(0);

    let times = FileTimes {
        creation: system_time_secs(metadata.created().ok()),
        modification: system_time_secs(metadata.modified().ok()),
        access: system_time_secs(metadata.accessed().ok()),
        change,
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let data_stream = shared(FileStream::open(path)?);

    Ok(Match {
        term: term.to_string(),
        description: term.to_string(),
        frn,
        volume_serial,
        snapshot_id: Uuid::nil(),
        names: vec![MatchedName {
            parent: ParentRef::from_u64(parent_frn),
            file_name,
            full_path: path.to_string_lossy().into_owned(),
            times,
        }],
        attributes: vec![MatchedAttribute {
            kind: AttrKind::Data,
            name: String::new(),
            instance_id: 0,
            data_stream,
            raw_stream: None,
        }],
        std_info: times,
        yara_rules: None,
    })
}

#[cfg(unix)]
fn file_identity(_path: &Path, metadata: &fs::Metadata) -> (u64, u64, i64) {
    use std::os::unix::fs::MetadataExt;
    (metadata.ino(), metadata.dev(), metadata.ctime())
}

#[cfg(not(unix))]
fn file_identity(path: &Path, metadata: &fs::Metadata) -> (u64, u64, i64) {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    (
        hasher.finish(),
        0,
        system_time_secs(metadata.modified().ok()),
    )
}

fn system_time_secs(time: Option<SystemTime>) -> i64 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
