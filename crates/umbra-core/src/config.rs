//! Drive configuration: the shape consumed by the provider registry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DriveError, DriveResult};

/// Configuration for a single drive, possibly composite.
///
/// `provider` selects the constructor in the registry. `children` is only
/// meaningful to composite providers such as the cache coordinator; every
/// other field is interpreted by the selected provider itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Registered provider name, e.g. "memory", "local", "cache".
    pub provider: String,

    /// Whether fan-out writes target this drive. Read-only mirrors set this
    /// to false and are still queried on reads and lists.
    #[serde(default)]
    pub write: bool,

    /// Root directory for disk-backed providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Provider-specific string options.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,

    /// Child drive configurations, for composite providers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DriveConfig>,
}

impl DriveConfig {
    /// Creates a config naming only a provider.
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }

    /// Marks this drive as a write target.
    pub fn writable(mut self) -> Self {
        self.write = true;
        self
    }

    /// Sets the root directory for disk-backed providers.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Sets a provider-specific option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Adds a child config, for composite providers.
    pub fn with_child(mut self, child: DriveConfig) -> Self {
        self.children.push(child);
        self
    }

    /// Loads a config from a `.json` or `.toml` file.
    pub fn from_file(path: &Path) -> DriveResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext.to_lowercase().as_str() {
            "json" => Ok(serde_json::from_str(&contents)?),
            "toml" => toml::from_str(&contents)
                .map_err(|e| DriveError::Config(format!("{}: {}", path.display(), e))),
            _ => Err(DriveError::Config(format!(
                "unsupported config file extension: {:?}",
                ext
            ))),
        }
    }
}
