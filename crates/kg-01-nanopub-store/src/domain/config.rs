//! # Manager Configuration
//!
//! Settings for the nanopublication manager, read from the environment by
//! the node runtime.

use std::env;
use std::path::PathBuf;

/// Default prefix for minted identifiers.
pub const DEFAULT_LOD_PREFIX: &str = "http://localhost";

/// Configuration for the nanopublication manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Base for minted IRIs; units become `<lod_prefix>/pub/<id>`.
    pub lod_prefix: String,

    /// Rewrite blank nodes to `bnode:` IRIs before bulk load and back on read.
    pub bnode_rewrite: bool,

    /// When false, units typed `whyis:FRIRNanopublication` survive cascading
    /// retirement.
    pub delete_archive_nanopubs: bool,

    /// Directory for staging artifacts. `None` uses a temporary file that is
    /// removed after the load.
    pub load_dir: Option<PathBuf>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            lod_prefix: DEFAULT_LOD_PREFIX.to_string(),
            bnode_rewrite: false,
            delete_archive_nanopubs: true,
            load_dir: None,
        }
    }
}

impl ManagerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KG_LOD_PREFIX`: Identifier prefix (default: http://localhost)
    /// - `KG_BNODE_REWRITE`: Skolemize blank nodes (default: false)
    /// - `KG_DELETE_ARCHIVE_NANOPUBS`: Cascade into archive units (default: true)
    /// - `KG_LOAD_DIR`: Staging directory (default: temporary files)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lod_prefix: env::var("KG_LOD_PREFIX")
                .map(|p| p.trim_end_matches('/').to_string())
                .unwrap_or(defaults.lod_prefix),
            bnode_rewrite: env_flag("KG_BNODE_REWRITE").unwrap_or(defaults.bnode_rewrite),
            delete_archive_nanopubs: env_flag("KG_DELETE_ARCHIVE_NANOPUBS")
                .unwrap_or(defaults.delete_archive_nanopubs),
            load_dir: env::var("KG_LOAD_DIR").ok().map(PathBuf::from),
        }
    }

    /// Prefix under which nanopublication identifiers are minted.
    pub fn pub_prefix(&self) -> String {
        format!("{}/pub/", self.lod_prefix.trim_end_matches('/'))
    }
}

/// Parse a boolean environment variable (`true`/`1`/`yes`, case-insensitive).
pub fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|v| {
        let v = v.to_ascii_lowercase();
        v == "true" || v == "1" || v == "yes"
    })
}
