//! Scan orchestration: drive the scanner, admit samples against budgets,
//! copy admitted streams into the sink, and finalize digests.

use std::rc::Rc;

use chrono::Utc;
use log::{error, info, warn};

use crate::error::CollectionError;
use crate::index::{write_sample_rows, TableWriter, SCHEMA};
use crate::limits::{sample_limit_status, LimitStatus, Limits};
use crate::models::{Match, SampleSpec};
use crate::naming;
use crate::pipeline::{configure_sample_streams, PipelineConfig};
use crate::registry::{InsertOutcome, SampleId, SampleRef, SampleRegistry};
use crate::scan::Scanner;
use crate::sink::OutputSink;
use crate::stream::{
    shared, ByteStream, CryptoHashAlgs, DevNullStream, FuzzyHashAlgs, SharedStream,
    TemporaryStream,
};

/// Knobs of a collection run that are not budgets or specs.
#[derive(Debug, Clone, Default)]
pub struct CollectorOptions {
    /// Index off-limits samples with digests by draining their pipelines.
    pub report_all: bool,
    pub crypto: CryptoHashAlgs,
    pub fuzzy: FuzzyHashAlgs,
    /// Defaults inherited by string extraction when a spec leaves both
    /// bounds zero.
    pub default_min_chars: u32,
    pub default_max_chars: u32,
    /// Reported in the index; detected from the host when empty.
    pub computer_name: String,
    /// Fixed scan timestamp (Unix seconds); wall clock when `None`.
    /// Identical timestamps make re-runs byte-comparable.
    pub collection_date: Option<i64>,
}

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct CollectionSummary {
    pub matches_seen: u64,
    pub samples_admitted: u64,
    pub samples_off_limits: u64,
    pub duplicates: u64,
    pub bytes_admitted: u64,
    pub entries_archived: u64,
    pub rows_written: u64,
}

/// Mirror of the run's informational lines; becomes `GetThis.log` in
/// archive mode.
pub(crate) struct Transcript {
    stream: SharedStream,
}

impl Transcript {
    fn new(stream: SharedStream) -> Self {
        Transcript { stream }
    }

    fn line(&mut self, message: &str) {
        info!("{}", message);
        let mut stream = self.stream.borrow_mut();
        let _ = stream.write_all(message.as_bytes());
        let _ = stream.write_all(b"\r\n");
    }
}

/// The collection engine for one scan.
pub struct Collector {
    global_limits: Limits,
    specs: Vec<SampleSpec>,
    registry: SampleRegistry,
    options: CollectorOptions,
    pipeline: PipelineConfig,
    collection_date: i64,
    summary: CollectionSummary,
}

impl Collector {
    pub fn new(global_limits: Limits, specs: Vec<SampleSpec>, mut options: CollectorOptions) -> Self {
        if options.computer_name.is_empty() {
            options.computer_name = detect_computer_name();
        }
        let pipeline = PipelineConfig {
            crypto: options.crypto,
            fuzzy: options.fuzzy,
            default_min_chars: options.default_min_chars,
            default_max_chars: options.default_max_chars,
        };
        Collector {
            global_limits,
            specs,
            registry: SampleRegistry::new(),
            options,
            pipeline,
            collection_date: 0,
            summary: CollectionSummary::default(),
        }
    }

    /// Run one scan: stamp the collection date, initialize the sink, drive
    /// the scanner, copy every admitted sample, and close the sink.
    pub fn run(
        &mut self,
        scanner: &mut dyn Scanner,
        sink: &mut dyn OutputSink,
    ) -> Result<CollectionSummary, CollectionError> {
        self.collection_date = self
            .options
            .collection_date
            .unwrap_or_else(|| Utc::now().timestamp());
        self.summary = CollectionSummary::default();

        sink.init()?;

        let index_stream = shared(TemporaryStream::new());
        let transcript_stream = shared(TemporaryStream::new());
        let mut table = TableWriter::new(Rc::clone(&index_stream));
        table.set_schema(&SCHEMA)?;
        let mut transcript = Transcript::new(Rc::clone(&transcript_stream));

        let scan_result =
            scanner.find(&mut |m, stop| self.handle_match(m, stop, &mut transcript));
        if let Err(e) = scan_result {
            // The registry still holds everything admitted before the
            // failure; collect what we have.
            error!("scanner failed: {}", e);
        }

        self.collect_samples(sink, &mut table, &mut transcript)?;

        table.flush()?;
        self.summary.rows_written = table.rows_written();
        sink.close(&index_stream, &transcript_stream)?;

        info!(
            "collection complete: {} admitted ({} bytes), {} off-limits, {} duplicates, {} index rows",
            self.summary.samples_admitted,
            self.summary.bytes_admitted,
            self.summary.samples_off_limits,
            self.summary.duplicates,
            self.summary.rows_written
        );
        Ok(self.summary.clone())
    }

    /// Samples registered so far.
    pub fn registry(&self) -> &SampleRegistry {
        &self.registry
    }

    pub fn global_limits(&self) -> &Limits {
        &self.global_limits
    }

    pub fn specs(&self) -> &[SampleSpec] {
        &self.specs
    }

    /// Per-match callback, executed in the scanner's calling context. A
    /// raised stop flag means the scanner is terminating; nothing is
    /// mutated for matches delivered after it.
    fn handle_match(&mut self, m: Match, stop: &mut bool, transcript: &mut Transcript) {
        if *stop {
            return;
        }
        self.summary.matches_seen += 1;

        if m.attributes.is_empty() {
            warn!(
                "'{}' matched '{}' but no data attribute was associated",
                m.full_name(0),
                m.term
            );
            return;
        }
        if m.names.is_empty() {
            warn!("match for '{}' carries no name, skipping", m.term);
            return;
        }
        let Some(spec_index) = self.specs.iter().position(|s| s.terms.contains(&m.term)) else {
            error!("could not find sample spec for match '{}'", m.term);
            return;
        };

        let m = Rc::new(m);
        for attribute_index in 0..m.attributes.len() {
            let attribute = &m.attributes[attribute_index];
            let full_name = m.full_name(attribute_index);

            let (status, data_size) = match attribute.data_stream.borrow().size() {
                Ok(size) => (
                    sample_limit_status(
                        &self.global_limits,
                        &self.specs[spec_index].per_sample_limits,
                        size,
                    ),
                    size,
                ),
                Err(e) => {
                    let limit_err = CollectionError::LimitCompute(full_name.clone());
                    warn!("{}: {}", limit_err, e);
                    (LimitStatus::FailedToComputeLimits, 0)
                }
            };

            let id = SampleId {
                frn: m.frn,
                volume_serial: m.volume_serial,
                snapshot_id: m.snapshot_id,
                instance_id: attribute.instance_id,
                attribute_index,
            };
            if self.registry.contains(&id) {
                let info = CollectionError::AlreadyCollected(full_name.clone());
                transcript.line(&format!("\t{}", info));
                self.summary.duplicates += 1;
                continue;
            }

            let mut sample = SampleRef::new(id, Rc::clone(&m));
            sample.content = self.specs[spec_index].content;
            sample.collection_date = self.collection_date;
            sample.limit_status = status;
            sample.off_limits = !status.is_within();

            let primary = &m.names[0];
            let content_kind = sample.content.kind;
            let parent = primary.parent;
            let file_name = primary.file_name.clone();
            let data_name = attribute.name.clone();
            sample.sample_name =
                self.registry
                    .allocate_name(&self.specs[spec_index].name, |idx| {
                        naming::sample_base_name(content_kind, &parent, &file_name, &data_name, idx)
                    });

            if let Err(e) = configure_sample_streams(&mut sample, &self.pipeline) {
                error!(
                    "failed to configure sample streams for '{}': {}",
                    full_name, e
                );
                continue;
            }

            let outcome = self.registry.insert_or_find(sample);
            debug_assert_eq!(outcome, InsertOutcome::Inserted);

            if status.is_within() {
                transcript.line(&format!("\t{} matched ({} bytes)", full_name, data_size));
                self.specs[spec_index]
                    .per_sample_limits
                    .accumulate(data_size);
                self.global_limits.accumulate(data_size);
                self.summary.samples_admitted += 1;
                self.summary.bytes_admitted += data_size;
            } else {
                self.summary.samples_off_limits += 1;
                self.note_off_limits(status, spec_index, &full_name, transcript);
            }
        }
    }

    /// Record which ceiling turned a sample away: set the sticky flag on
    /// the offending budget and say so, with the configured value.
    fn note_off_limits(
        &mut self,
        status: LimitStatus,
        spec_index: usize,
        full_name: &str,
        transcript: &mut Transcript,
    ) {
        match status {
            LimitStatus::GlobalSampleCountLimitReached => {
                self.global_limits.max_sample_count_reached = true;
                transcript.line(&format!(
                    "\t{}: global sample count reached ({})",
                    full_name,
                    ceiling(self.global_limits.max_sample_count)
                ));
            }
            LimitStatus::GlobalMaxBytesPerSample => {
                self.global_limits.max_bytes_per_sample_reached = true;
                transcript.line(&format!(
                    "\t{}: exceeds global per-sample size limit ({})",
                    full_name,
                    ceiling(self.global_limits.max_bytes_per_sample)
                ));
            }
            LimitStatus::GlobalMaxBytesTotal => {
                self.global_limits.max_bytes_total_reached = true;
                transcript.line(&format!(
                    "\t{}: global total sample size limit reached ({})",
                    full_name,
                    ceiling(self.global_limits.max_bytes_total)
                ));
            }
            LimitStatus::LocalSampleCountLimitReached => {
                let limits = &mut self.specs[spec_index].per_sample_limits;
                limits.max_sample_count_reached = true;
                let value = ceiling(limits.max_sample_count);
                transcript.line(&format!(
                    "\t{}: sample count reached ({})",
                    full_name, value
                ));
            }
            LimitStatus::LocalMaxBytesPerSample => {
                let limits = &mut self.specs[spec_index].per_sample_limits;
                limits.max_bytes_per_sample_reached = true;
                let value = ceiling(limits.max_bytes_per_sample);
                transcript.line(&format!(
                    "\t{}: exceeds per-sample size limit ({})",
                    full_name, value
                ));
            }
            LimitStatus::LocalMaxBytesTotal => {
                let limits = &mut self.specs[spec_index].per_sample_limits;
                limits.max_bytes_total_reached = true;
                let value = ceiling(limits.max_bytes_total);
                transcript.line(&format!(
                    "\t{}: total sample size limit reached ({})",
                    full_name, value
                ));
            }
            LimitStatus::FailedToComputeLimits => {
                transcript.line(&format!("\t{}: failed to compute limit status", full_name));
            }
            LimitStatus::NoLimits | LimitStatus::SampleWithinLimits => {}
        }
    }

    /// Post-scan copy: walk the registry in identity order, hand admitted
    /// streams to the sink, and index every sample. Per-sample failures
    /// log and advance.
    fn collect_samples(
        &mut self,
        sink: &mut dyn OutputSink,
        table: &mut TableWriter,
        transcript: &mut Transcript,
    ) -> Result<(), CollectionError> {
        info!("adding matching samples to the output");
        let options = &self.options;
        let summary = &mut self.summary;

        for sample in self.registry.iter_mut() {
            if sample.off_limits {
                finalize_hashes(sample, options);
                if let Err(e) = write_sample_rows(table, sample, &options.computer_name) {
                    error!(
                        "failed to add '{}' metadata to the index: {}",
                        sample.full_name(),
                        e
                    );
                }
                continue;
            }

            let Some(copy) = sample.copy_stream.clone() else {
                error!("no stream configured for '{}', skipping", sample.full_name());
                continue;
            };
            let sample_name = sample.sample_name.clone();
            let source_name = sample.full_name();

            let result = sink.accept(&sample_name, &source_name, &copy, &mut || {
                finalize_hashes(sample, options);
                write_sample_rows(table, sample, &options.computer_name)
            });
            match result {
                Ok(()) => {
                    summary.entries_archived += 1;
                    transcript.line(&format!(
                        "\t{} copied ({} bytes)",
                        sample_name, sample.sample_size
                    ));
                }
                Err(e) => error!("failed to write sample '{}': {}", sample_name, e),
            }
        }
        Ok(())
    }
}

/// Harvest digests from a sample's tap handles.
///
/// Off-limits samples were never copied; with report-all and crypto
/// hashing enabled their pipeline is drained into a discard sink here, the
/// single place discarded bytes are consumed. Off-limits samples without
/// report-all keep empty digests.
fn finalize_hashes(sample: &mut SampleRef, options: &CollectorOptions) {
    if sample.off_limits {
        if !(options.report_all && options.crypto.any()) {
            return;
        }
        if let Some(copy) = sample.copy_stream.clone() {
            let mut devnull = DevNullStream::new();
            if let Err(e) = copy.borrow_mut().copy_to(&mut devnull) {
                error!(
                    "failed while computing digests of '{}': {}",
                    sample.full_name(),
                    e
                );
            }
            let _ = copy.borrow_mut().close();
        }
    }

    if let Some(tap) = &sample.hash_stream {
        let digests = tap.borrow().digests();
        sample.md5 = digests.md5.unwrap_or_default();
        sample.sha1 = digests.sha1.unwrap_or_default();
        sample.sha256 = digests.sha256.unwrap_or_default();
    }
    if let Some(tap) = &sample.fuzzy_hash_stream {
        let digests = tap.borrow_mut().digests();
        sample.ssdeep = digests.ssdeep.unwrap_or_default();
        sample.tlsh = digests.tlsh.unwrap_or_default();
    }
}

/// Host name reported in the index.
pub fn detect_computer_name() -> String {
    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "[unknown]".to_string())
}

fn ceiling(value: Option<u64>) -> u64 {
    value.unwrap_or(0)
}
