//! YAML configuration for a collection run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COMPRESSION_LEVEL, DEFAULT_MAX_CHARS, DEFAULT_MIN_CHARS};
use crate::limits::Limits;
use crate::models::SampleSpec;
use crate::stream::{CryptoHashAlgs, FuzzyHashAlgs};

/// Output container kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Archive,
    Directory,
}

/// Where and how the run persists its results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_compression")]
    pub compression: i32,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_compression() -> i32 {
    DEFAULT_COMPRESSION_LEVEL
}

/// Global bounds for string extraction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContentDefaults {
    #[serde(default = "default_min_chars")]
    pub min_chars: u32,
    #[serde(default = "default_max_chars")]
    pub max_chars: u32,
}

impl Default for ContentDefaults {
    fn default() -> Self {
        ContentDefaults {
            min_chars: DEFAULT_MIN_CHARS,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

fn default_min_chars() -> u32 {
    DEFAULT_MIN_CHARS
}

fn default_max_chars() -> u32 {
    DEFAULT_MAX_CHARS
}

/// Crypto digest selector, as spelled in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    Md5,
    Sha1,
    Sha256,
}

/// Fuzzy digest selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuzzyHashKind {
    Ssdeep,
    Tlsh,
}

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(default)]
    pub description: String,
    /// Mounted locations the scanner walks.
    pub locations: Vec<PathBuf>,
    pub output: OutputConfig,
    /// Global budget; per-spec budgets live on each sample spec.
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub content: ContentDefaults,
    #[serde(default = "default_hashes")]
    pub hashes: Vec<HashKind>,
    #[serde(default)]
    pub fuzzy_hashes: Vec<FuzzyHashKind>,
    /// Index off-limits samples with digests.
    #[serde(default)]
    pub report_all: bool,
    pub samples: Vec<SampleSpec>,
}

fn default_hashes() -> Vec<HashKind> {
    vec![HashKind::Md5, HashKind::Sha1, HashKind::Sha256]
}

impl CollectionConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        let config: CollectionConfig =
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;
        fs::write(path, yaml).context(format!("Failed to write config to {}", path.display()))?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Write a starter configuration file.
    pub fn create_default_config_file(path: &Path) -> Result<()> {
        CollectionConfig::default().save_to_yaml_file(path)
    }

    /// Every term across all sample specs, for scanner construction.
    pub fn all_terms(&self) -> Vec<String> {
        self.samples
            .iter()
            .flat_map(|spec| spec.terms.iter().cloned())
            .collect()
    }

    /// Crypto digest selection as the pipeline understands it.
    pub fn crypto_algs(&self) -> CryptoHashAlgs {
        CryptoHashAlgs {
            md5: self.hashes.contains(&HashKind::Md5),
            sha1: self.hashes.contains(&HashKind::Sha1),
            sha256: self.hashes.contains(&HashKind::Sha256),
        }
    }

    /// Fuzzy digest selection.
    pub fn fuzzy_algs(&self) -> FuzzyHashAlgs {
        FuzzyHashAlgs {
            ssdeep: self.fuzzy_hashes.contains(&FuzzyHashKind::Ssdeep),
            tlsh: self.fuzzy_hashes.contains(&FuzzyHashKind::Tlsh),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        CollectionConfig {
            description: "Collect executables from the temp directory".to_string(),
            locations: vec![std::env::temp_dir()],
            output: OutputConfig {
                path: PathBuf::from("samples.zip"),
                format: OutputFormat::Archive,
                compression: DEFAULT_COMPRESSION_LEVEL,
                password: None,
            },
            limits: Limits {
                max_bytes_per_sample: Some(64 * 1024 * 1024),
                ..Limits::default()
            },
            content: ContentDefaults::default(),
            hashes: default_hashes(),
            fuzzy_hashes: Vec::new(),
            report_all: false,
            samples: vec![SampleSpec {
                name: "executables".to_string(),
                terms: vec![r"\.(exe|dll|sys)$".to_string()],
                ..SampleSpec::default()
            }],
        }
    }
}

/// Load the given config, or fall back to the built-in default when no
/// path was supplied.
pub fn load_or_default_config(path: Option<&Path>) -> Result<CollectionConfig> {
    match path {
        Some(path) => CollectionConfig::from_yaml_file(path),
        None => {
            info!("No configuration file supplied, using built-in defaults");
            Ok(CollectionConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let config = CollectionConfig::default();
        config.save_to_yaml_file(&path).unwrap();

        let loaded = CollectionConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.samples.len(), config.samples.len());
        assert_eq!(loaded.output.format, OutputFormat::Archive);
        assert_eq!(loaded.output.compression, DEFAULT_COMPRESSION_LEVEL);
    }

    #[test]
    fn test_minimal_yaml_fills_defaults() {
        let yaml = r#"
locations: ["/evidence"]
output:
  path: out.zip
samples:
  - name: logs
    terms: ["\\.log$"]
"#;
        let config: CollectionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.content.min_chars, DEFAULT_MIN_CHARS);
        assert!(config.crypto_algs().any());
        assert!(!config.fuzzy_algs().any());
        assert!(config.limits.max_sample_count.is_none());
        assert_eq!(config.samples[0].name, "logs");
    }

    #[test]
    fn test_spec_limits_and_content_parse() {
        let yaml = r#"
locations: ["/evidence"]
output:
  path: out
  format: directory
fuzzy_hashes: [ssdeep, tlsh]
samples:
  - name: strings
    content:
      type: strings
      min_chars: 6
    terms: ["\\.bin$"]
    per_sample_limits:
      max_sample_count: 10
      max_bytes_total: 1000
"#;
        let config: CollectionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.output.format, OutputFormat::Directory);
        assert!(config.fuzzy_algs().ssdeep);
        assert!(config.fuzzy_algs().tlsh);
        let spec = &config.samples[0];
        assert_eq!(spec.content.min_chars, 6);
        assert_eq!(spec.per_sample_limits.max_sample_count, Some(10));
        assert_eq!(spec.per_sample_limits.max_bytes_total, Some(1000));
    }
}
