//! Provider registry: maps provider names to drive constructors.
//!
//! Each backend crate registers its constructors into a `Registry` owned by
//! the bootstrap layer; the coordinator and CLI only ever see the resulting
//! `Client` values. Constructors receive the registry so composite providers
//! can instantiate their own children.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::client::Client;
use crate::config::DriveConfig;
use crate::error::{DriveError, DriveResult};

/// Constructor signature registered per provider name.
pub type Constructor = fn(&Registry, &DriveConfig) -> DriveResult<Arc<dyn Client>>;

/// Name → constructor table for drive providers.
#[derive(Default)]
pub struct Registry {
    providers: HashMap<String, Constructor>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor under a provider name, replacing any
    /// previous registration for that name.
    pub fn register(&mut self, name: impl Into<String>, ctor: Constructor) {
        let name = name.into();
        debug!(provider = %name, "registered drive provider");
        self.providers.insert(name, ctor);
    }

    /// Returns the registered provider names, sorted.
    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiates a drive from its configuration.
    ///
    /// Unknown provider names are a configuration error, fatal at startup.
    pub fn instantiate(&self, config: &DriveConfig) -> DriveResult<Arc<dyn Client>> {
        let ctor = self.providers.get(&config.provider).ok_or_else(|| {
            DriveError::Config(format!("unknown drive provider {:?}", config.provider))
        })?;
        ctor(self, config)
    }
}
