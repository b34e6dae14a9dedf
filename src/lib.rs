//! # sample-collector
//!
//! A forensic sample-collection engine. Given a set of match
//! specifications and a set of mounted locations, it locates matching
//! files, reads their bytes through a configurable pipeline that hashes
//! and optionally transforms them, enforces hierarchical size and count
//! budgets, and emits the samples plus a per-sample metadata table into a
//! compressed archive or a directory tree.
//!
//! ## Overview
//!
//! The engine is a single-threaded cooperative pipeline:
//!
//! ```text
//! Scanner -> Collector -> Limit Arbiter
//!                      -> Sample Registry (dedup + names)
//!                      -> Stream Assembler (content -> hash taps)
//!                      -> Output Sink (archive | directory)
//!                      -> Index Writer (GetThis.csv)
//! ```
//!
//! A scanner yields [`models::Match`] records synchronously. For each
//! match the collector consults the limit arbiter, registers a sample
//! (deduplicating by `(frn, volume, snapshot, instance, attribute)`
//! identity), and assembles its read pipeline. After the scan, every
//! registered sample is copied into the sink; digests are finalized as
//! each entry completes, and one index row is written per `(match, name)`
//! pair. Samples that exceed a budget are still indexed, without payload.
//!
//! ## Usage
//!
//! ```no_run
//! use sample_collector::collector::{Collector, CollectorOptions};
//! use sample_collector::limits::Limits;
//! use sample_collector::models::SampleSpec;
//! use sample_collector::scan::FsScanner;
//! use sample_collector::sink::ArchiveSink;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let spec = SampleSpec {
//!     name: "logs".into(),
//!     terms: vec![r"\.log$".into()],
//!     ..SampleSpec::default()
//! };
//! let mut scanner = FsScanner::new(vec!["/var/log".into()], &spec.terms.clone(), true)?;
//! let mut sink = ArchiveSink::new(Path::new("samples.zip"), 6, None);
//! let mut collector =
//!     Collector::new(Limits::unlimited(), vec![spec], CollectorOptions::default());
//!
//! let summary = collector.run(&mut scanner, &mut sink)?;
//! println!("collected {} samples", summary.samples_admitted);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`collector`]: scan orchestration and the per-match callback
//! - [`limits`]: hierarchical budgets and the limit arbiter
//! - [`registry`]: sample identity, deduplication, and name allocation
//! - [`pipeline`]: per-sample read-pipeline assembly
//! - [`stream`]: composable byte streams, hash taps, string extraction
//! - [`sink`]: archive and directory output targets
//! - [`index`]: the per-sample metadata table
//! - [`scan`]: the scanner contract and a filesystem scanner
//! - [`naming`]: deterministic, filesystem-safe sample names
//! - [`config`]: YAML configuration loading
//! - [`models`]: core data model shared by all of the above

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Scan orchestration: drive the scanner, admit, copy, finalize
pub mod collector;

/// Configuration management
pub mod config;

/// Application-wide constants
pub mod constants;

/// Error taxonomy
pub mod error;

/// Sample metadata table writer
pub mod index;

/// Hierarchical budgets and the limit arbiter
pub mod limits;

/// Core data model
pub mod models;

/// Deterministic sample naming
pub mod naming;

/// Per-sample stream pipeline assembly
pub mod pipeline;

/// Sample registry: deduplication and name allocation
pub mod registry;

/// Scanner contract and the bundled filesystem scanner
pub mod scan;

/// Output sinks: archive and directory targets
pub mod sink;

/// Composable byte streams and hash taps
pub mod stream;
