//! Sample registry: deduplication by identity and unique name allocation.

use std::cell::RefCell;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use uuid::Uuid;

use crate::constants::SAMPLE_PATH_SEPARATOR;
use crate::limits::LimitStatus;
use crate::models::{ContentSpec, Match};
use crate::stream::{CryptoHashStream, FuzzyHashStream, SharedStream};

/// Identity of one collectable sample. Two samples with an equal identity
/// are the same sample, whatever their payloads say.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleId {
    pub frn: u64,
    pub volume_serial: u64,
    pub snapshot_id: Uuid,
    pub instance_id: u16,
    pub attribute_index: usize,
}

/// One unit of collection work: an identity plus the mutable payload the
/// collector and the stream assembler fill in.
pub struct SampleRef {
    pub id: SampleId,
    /// Matches covered by this sample; the first is the primary.
    pub matches: Vec<Rc<Match>>,
    pub content: ContentSpec,
    /// Unique in-archive path, including the spec subfolder when any.
    pub sample_name: String,
    /// Size reported by the top of the read pipeline at assembly time.
    pub sample_size: u64,
    /// Scan timestamp, Unix seconds; identical across the whole run.
    pub collection_date: i64,
    /// Admitted into the index but not persisted as payload.
    pub off_limits: bool,
    /// The arbiter's verdict, kept for reporting.
    pub limit_status: LimitStatus,

    /// Top of the read pipeline.
    pub copy_stream: Option<SharedStream>,
    /// Crypto tap handle, kept to harvest digests after consumption.
    pub hash_stream: Option<Rc<RefCell<CryptoHashStream>>>,
    /// Fuzzy tap handle.
    pub fuzzy_hash_stream: Option<Rc<RefCell<FuzzyHashStream>>>,

    // Finalized digests; empty until FinalizeHashes, immutable after.
    pub md5: Vec<u8>,
    pub sha1: Vec<u8>,
    pub sha256: Vec<u8>,
    pub ssdeep: String,
    pub tlsh: String,
}

impl SampleRef {
    /// A fresh sample for `id`, covering `primary`.
    pub fn new(id: SampleId, primary: Rc<Match>) -> Self {
        SampleRef {
            id,
            matches: vec![primary],
            content: ContentSpec::default(),
            sample_name: String::new(),
            sample_size: 0,
            collection_date: 0,
            off_limits: false,
            limit_status: LimitStatus::SampleWithinLimits,
            copy_stream: None,
            hash_stream: None,
            fuzzy_hash_stream: None,
            md5: Vec::new(),
            sha1: Vec::new(),
            sha256: Vec::new(),
            ssdeep: String::new(),
            tlsh: String::new(),
        }
    }

    /// Display name of the sample's primary match.
    pub fn full_name(&self) -> String {
        self.matches
            .first()
            .map(|m| m.full_name(self.id.attribute_index))
            .unwrap_or_else(|| self.sample_name.clone())
    }
}

/// Outcome of [`SampleRegistry::insert_or_find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

/// The set of samples for one scan, keyed by identity, plus the set of
/// allocated in-archive names.
///
/// Iteration follows identity order, which fixes the index row order and
/// the archive entry order.
#[derive(Default)]
pub struct SampleRegistry {
    samples: BTreeMap<SampleId, SampleRef>,
    used_names: HashSet<String>,
}

impl SampleRegistry {
    pub fn new() -> Self {
        SampleRegistry::default()
    }

    /// True when `id` was inserted before.
    pub fn contains(&self, id: &SampleId) -> bool {
        self.samples.contains_key(id)
    }

    /// Insert `sample` unless its identity is already present; the
    /// incoming ref is discarded on duplicate.
    pub fn insert_or_find(&mut self, sample: SampleRef) -> InsertOutcome {
        match self.samples.entry(sample.id.clone()) {
            Entry::Occupied(_) => InsertOutcome::Duplicate,
            Entry::Vacant(slot) => {
                slot.insert(sample);
                InsertOutcome::Inserted
            }
        }
    }

    /// Allocate a unique in-archive path.
    ///
    /// `base` formats a candidate for a given disambiguation index; the
    /// unsuffixed `idx == 0` form is tried first, then `_1`, `_2`, … until
    /// the full path (subfolder included) is unused. The winning name is
    /// recorded and returned.
    pub fn allocate_name(&mut self, subfolder: &str, mut base: impl FnMut(u32) -> String) -> String {
        let mut idx = 0u32;
        loop {
            let candidate = base(idx);
            let full = if subfolder.is_empty() {
                candidate
            } else {
                format!("{}{}{}", subfolder, SAMPLE_PATH_SEPARATOR, candidate)
            };
            if !self.used_names.contains(&full) {
                self.used_names.insert(full.clone());
                return full;
            }
            idx += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &SampleRef> {
        self.samples.values()
    }

    /// Mutable iteration in identity order; identities stay fixed, only
    /// payloads may change.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SampleRef> {
        self.samples.values_mut()
    }
}
