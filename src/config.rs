//! Optional TOML configuration.
//!
//! ```toml
//! root = "/data/runs"
//! variant = "with_component_map"
//! sparsity = "reject"
//! ```
//!
//! Every key is optional; command-line flags override file values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::codec::{DecodeOptions, TopologyVariant};
use crate::error::{NnsError, Result};
use crate::run::SessionOptions;
use crate::state::SparsityPolicy;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base folder holding the `device_{id}` folders.
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub variant: TopologyVariant,
    #[serde(default)]
    pub sparsity: SparsityPolicy,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| NnsError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            NnsError::Config(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            decode: DecodeOptions {
                variant: self.variant,
                ..DecodeOptions::default()
            },
            sparsity: self.sparsity,
        }
    }
}
