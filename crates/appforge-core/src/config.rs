use crate::error::Result;
use crate::types::{SortField, SortSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("collections.redb")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// ListingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_sort_field")]
    pub sort_field: SortField,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_sort_field() -> SortField {
    SortField::Name
}

fn default_ascending() -> bool {
    true
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            sort_field: default_sort_field(),
            ascending: default_ascending(),
        }
    }
}

impl ListingConfig {
    pub fn sort_spec(&self) -> SortSpec {
        SortSpec {
            field: self.sort_field,
            ascending: self.ascending,
        }
    }
}

// ---------------------------------------------------------------------------
// CoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

impl CoreConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: CoreConfig = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    /// Missing config file means defaults; a present but malformed file is
    /// still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CoreConfig::load_or_default(&dir.path().join("none.yaml")).unwrap();
        assert_eq!(config.store.path, PathBuf::from("collections.redb"));
        assert_eq!(config.listing.sort_spec(), SortSpec::by(SortField::Name));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("core.yaml");
        std::fs::write(&path, "store:\n  path: /tmp/custom.redb\n").unwrap();

        let config = CoreConfig::load_or_default(&path).unwrap();
        assert_eq!(config.store.path, PathBuf::from("/tmp/custom.redb"));
        assert!(config.listing.ascending);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("core.yaml");
        std::fs::write(&path, "store: [not, a, map]\n").unwrap();
        assert!(CoreConfig::load_or_default(&path).is_err());
    }
}
