use std::collections::HashMap;

use anyhow::{anyhow, Result};

use super::backend::{EngineConfig, Tracker};
use super::backends::StubTracker;

/// Builds a tracker from the engine configuration.
pub type TrackerFactory = fn(&EngineConfig) -> Result<Box<dyn Tracker>>;

/// Name-keyed registry of tracking engines.
pub struct TrackerRegistry {
    factories: HashMap<String, TrackerFactory>,
    default_name: Option<String>,
}

impl TrackerRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            default_name: None,
        }
    }

    /// Registry holding the engines compiled into this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(StubTracker::NAME, StubTracker::factory);
        registry
    }

    /// Register an engine. The first registered engine becomes the default.
    pub fn register(&mut self, name: &str, factory: TrackerFactory) {
        if self.default_name.is_none() {
            self.default_name = Some(name.to_string());
        }
        self.factories.insert(name.to_string(), factory);
    }

    /// Set default engine by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.factories.contains_key(name) {
            return Err(anyhow!("tracker '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// Registered engine names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build the named engine, or the default one when `name` is `None`.
    pub fn build(&self, name: Option<&str>, config: &EngineConfig) -> Result<Box<dyn Tracker>> {
        let name = name
            .or(self.default_name.as_deref())
            .ok_or_else(|| anyhow!("no tracker registered"))?;
        let factory = self.factories.get(name).ok_or_else(|| {
            anyhow!(
                "tracker '{}' not registered (available: {})",
                name,
                self.list().join(", ")
            )
        })?;
        let tracker = factory(config)?;
        log::info!(
            "tracker '{}' ready (vocabulary={}, settings={}, viewer={})",
            tracker.name(),
            config.vocabulary.display(),
            config.settings.display(),
            config.viewer
        );
        Ok(tracker)
    }
}

impl Default for TrackerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn engine_config() -> EngineConfig {
        EngineConfig {
            vocabulary: PathBuf::from("ORBvoc.txt"),
            settings: PathBuf::from("zed.yaml"),
            viewer: false,
        }
    }

    #[test]
    fn builtin_registry_defaults_to_stub() {
        let registry = TrackerRegistry::with_builtin();
        assert_eq!(registry.default_name(), Some("stub"));
        let tracker = registry.build(None, &engine_config()).unwrap();
        assert_eq!(tracker.name(), "stub");
    }

    #[test]
    fn unknown_tracker_is_rejected() {
        let registry = TrackerRegistry::with_builtin();
        let err = registry
            .build(Some("orb-slam"), &engine_config())
            .err()
            .expect("unknown tracker must fail");
        assert!(err.to_string().contains("orb-slam"));
        assert!(err.to_string().contains("stub"));
    }

    #[test]
    fn empty_registry_has_no_default() {
        let registry = TrackerRegistry::new();
        assert!(registry.build(None, &engine_config()).is_err());
    }

    #[test]
    fn set_default_requires_registration() {
        let mut registry = TrackerRegistry::with_builtin();
        assert!(registry.set_default("missing").is_err());
        registry.register("other", StubTracker::factory);
        registry.set_default("other").unwrap();
        assert_eq!(registry.default_name(), Some("other"));
        assert_eq!(registry.list(), vec!["other".to_string(), "stub".to_string()]);
    }
}
