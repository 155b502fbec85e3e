use crate::registry::TypeRegistry;
use crate::types::ValueType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a record store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HutConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,

    /// Enable WAL mode
    /// Default: true
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// SQLite synchronous mode
    #[serde(default)]
    pub synchronous: SynchronousMode,

    /// SQLite cache size (in pages, negative = KB)
    /// Default: -64000 (64MB)
    #[serde(default = "default_cache_size")]
    pub cache_size: i32,

    /// Value categories allowed to become columns.
    ///
    /// Defaults to every scalar category. Narrowing the list makes schema
    /// evolution reject the excluded categories with a schema error.
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<ValueType>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SynchronousMode {
    /// Full fsync (safest, slowest)
    Full,
    /// fsync at critical moments (good balance)
    #[default]
    Normal,
    /// No fsync (fastest, least safe)
    Off,
}

impl SynchronousMode {
    pub fn pragma_value(self) -> &'static str {
        match self {
            SynchronousMode::Full => "FULL",
            SynchronousMode::Normal => "NORMAL",
            SynchronousMode::Off => "OFF",
        }
    }
}

fn default_wal_mode() -> bool {
    true
}

fn default_cache_size() -> i32 {
    -64000 // 64MB
}

fn default_allowed_types() -> Vec<ValueType> {
    ValueType::SCALARS.to_vec()
}

impl HutConfig {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            wal_mode: default_wal_mode(),
            synchronous: SynchronousMode::default(),
            cache_size: default_cache_size(),
            allowed_types: default_allowed_types(),
        }
    }

    /// Store named `name`, backed by `./<name>.db` in the working directory.
    pub fn for_name(name: &str) -> Self {
        Self::new(PathBuf::from(format!("{}.db", name)))
    }

    pub fn with_synchronous(mut self, synchronous: SynchronousMode) -> Self {
        self.synchronous = synchronous;
        self
    }

    pub fn with_wal_mode(mut self, wal_mode: bool) -> Self {
        self.wal_mode = wal_mode;
        self
    }

    pub fn with_cache_size(mut self, cache_size: i32) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Restrict the categories schema evolution accepts
    pub fn with_allowed_types(mut self, allowed: impl IntoIterator<Item = ValueType>) -> Self {
        self.allowed_types = allowed.into_iter().collect();
        self
    }

    pub fn registry(&self) -> TypeRegistry {
        TypeRegistry::new(self.allowed_types.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_name() {
        let cfg = HutConfig::for_name("weather");
        assert_eq!(cfg.path, PathBuf::from("weather.db"));
        assert!(cfg.wal_mode);
        assert_eq!(cfg.synchronous, SynchronousMode::Normal);
    }

    #[test]
    fn test_serde_defaults() {
        let cfg: HutConfig = serde_json::from_str(r#"{"path": "/tmp/x.db"}"#).unwrap();
        assert_eq!(cfg.cache_size, -64000);
        assert_eq!(cfg.allowed_types.len(), ValueType::SCALARS.len());
    }

    #[test]
    fn test_narrowed_registry() {
        let cfg = HutConfig::for_name("lol").with_allowed_types([ValueType::Text]);
        let registry = cfg.registry();
        assert!(registry.is_supported(ValueType::Text));
        assert!(!registry.is_supported(ValueType::Integer));
    }
}
