#![warn(missing_docs)]

//! Umbra drive backends: in-memory, local disk, fault-injection
//!
//! Each backend implements the `umbra_core::Client` contract and registers
//! a constructor in the provider registry. The `testsuite` module exports
//! the generic round-trip checks used by every backend's tests and by the
//! cache coordinator's.

pub mod fail;
pub mod local;
pub mod memory;
pub mod testsuite;

pub use fail::FailClient;
pub use local::LocalClient;
pub use memory::MemoryClient;

use umbra_core::Registry;

/// Registers the built-in backend providers.
pub fn register(registry: &mut Registry) {
    registry.register("memory", memory::from_config);
    registry.register("local", local::from_config);
    registry.register("fail", fail::from_config);
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::DriveConfig;

    #[test]
    fn test_register_builtin_providers() {
        let mut registry = Registry::new();
        register(&mut registry);
        assert_eq!(registry.provider_names(), vec!["fail", "local", "memory"]);
    }

    #[test]
    fn test_instantiate_memory_via_registry() {
        let mut registry = Registry::new();
        register(&mut registry);
        let client = registry.instantiate(&DriveConfig::new("memory")).unwrap();
        assert!(client.local());
        assert!(!client.persistent());
    }

    #[test]
    fn test_local_without_root_is_config_error() {
        let mut registry = Registry::new();
        register(&mut registry);
        assert!(registry.instantiate(&DriveConfig::new("local")).is_err());
    }
}
