use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use avlindex_core::SnapshotKey;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Overrides `snapshot_key` when set.
pub const SNAPSHOT_KEY_ENV: &str = "AVLINDEX_SNAPSHOT_KEY";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub audit_log: PathBuf,
    pub snapshot_path: PathBuf,
    /// Hex-encoded 32-byte key. When absent the built-in demo key is used.
    pub snapshot_key: Option<String>,
    pub bench: BenchConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub sizes: Vec<usize>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            audit_log: PathBuf::from("system_audit.log"),
            snapshot_path: PathBuf::from("data.bin"),
            snapshot_key: None,
            bench: BenchConfig::default(),
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sizes: vec![10_000, 100_000],
        }
    }
}

impl RegistryConfig {
    /// Reads `path` if given (defaults otherwise), then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_snapshot_key_override(env::var(SNAPSHOT_KEY_ENV).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RegistryError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RegistryError::Config(format!("invalid TOML: {e}")))
    }

    pub fn apply_snapshot_key_override(&mut self, value: Option<String>) {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.snapshot_key = Some(value.trim().to_string());
        }
    }

    pub fn snapshot_key(&self) -> Result<SnapshotKey> {
        match &self.snapshot_key {
            Some(hex) => Ok(SnapshotKey::from_hex(hex)?),
            None => {
                tracing::warn!(
                    "no snapshot key configured; falling back to the demo key (set {SNAPSHOT_KEY_ENV})"
                );
                Ok(SnapshotKey::LEGACY_DEMO)
            }
        }
    }
}
