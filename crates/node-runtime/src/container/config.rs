//! # Node Configuration
//!
//! Unified configuration for the store, the scheduler and the runtime.
//!
//! ## Environment Variables
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `KG_LOD_PREFIX`, `KG_BNODE_REWRITE`, `KG_DELETE_ARCHIVE_NANOPUBS`, `KG_LOAD_DIR` | Store, see `ManagerConfig` |
//! | `KG_WORKERS`, `KG_IMPORT_MAX_RETRIES` | Scheduler, see `SchedulerConfig` |
//! | `KG_FILE_ARCHIVE` | Blob directory; in-memory blobs when unset |
//! | `KG_RENAME_RULES` | `antecedent=>consequent` pairs, comma separated |
//! | `KG_LOG_LEVEL` / `RUST_LOG`, `KG_JSON_LOGS` | Logging |

use std::env;
use std::path::PathBuf;

use kg_01_nanopub_store::domain::config::env_flag;
use kg_01_nanopub_store::ManagerConfig;
use kg_02_update_scheduler::SchedulerConfig;
use shared_types::Iri;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Nanopublication store configuration.
    pub manager: ManagerConfig,
    /// Update scheduler configuration.
    pub scheduler: SchedulerConfig,
    /// Blob storage configuration.
    pub storage: StorageConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Rename rules registered as unit inferencers.
    pub rules: Vec<RenameRule>,
}

impl NodeConfig {
    /// Load every section from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let rules = match env::var("KG_RENAME_RULES") {
            Ok(value) => parse_rules(&value)?,
            Err(_) => Vec::new(),
        };
        Ok(Self {
            manager: ManagerConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
            storage: StorageConfig::from_env(),
            logging: LoggingConfig::from_env(),
            rules,
        })
    }

    /// Reject configurations the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.manager.lod_prefix;
        if !(prefix.starts_with("http://") || prefix.starts_with("https://")) {
            return Err(ConfigError::InvalidLodPrefix(prefix.clone()));
        }
        if self.scheduler.worker_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Identifiers must be minted under an http(s) prefix.
    #[error("KG_LOD_PREFIX must be an http(s) IRI, got {0:?}")]
    InvalidLodPrefix(String),

    /// The worker pool would never drain the queue.
    #[error("KG_WORKERS must be at least 1")]
    NoWorkers,

    /// A `KG_RENAME_RULES` entry is not `antecedent=>consequent`.
    #[error("Malformed rename rule: {0:?}")]
    MalformedRule(String),
}

/// Blob storage configuration.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Directory for uploaded and extracted files.
    pub file_archive: Option<PathBuf>,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            file_archive: env::var("KG_FILE_ARCHIVE").ok().map(PathBuf::from),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit one JSON object per event.
    pub json_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: env::var("KG_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logs: env_flag("KG_JSON_LOGS").unwrap_or(defaults.json_logs),
        }
    }
}

/// `?s antecedent ?o ==> ?s consequent ?o`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRule {
    pub antecedent: Iri,
    pub consequent: Iri,
}

/// Parse `a=>b, c=>d`. Empty entries are ignored. Each side is a bare IRI
/// or one wrapped in angle brackets.
pub fn parse_rules(value: &str) -> Result<Vec<RenameRule>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let malformed = || ConfigError::MalformedRule(entry.to_string());
            let (antecedent, consequent) = entry.split_once("=>").ok_or_else(malformed)?;
            Ok(RenameRule {
                antecedent: rule_iri(antecedent).ok_or_else(malformed)?,
                consequent: rule_iri(consequent).ok_or_else(malformed)?,
            })
        })
        .collect()
}

fn rule_iri(text: &str) -> Option<Iri> {
    let text = text.trim();
    let bare = text
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(text);
    let valid = !bare.is_empty()
        && !bare.chars().any(|c| c.is_whitespace() || c == '<' || c == '>');
    valid.then(|| Iri::new(bare))
}
