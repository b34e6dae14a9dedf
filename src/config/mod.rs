//! Configuration management for collection runs.

mod collection_config;

pub use collection_config::{
    load_or_default_config, CollectionConfig, ContentDefaults, FuzzyHashKind, HashKind,
    OutputConfig, OutputFormat,
};
