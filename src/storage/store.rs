// Store - durable JSON state files
//
// Provides typed access for persisting:
// - Ledger state (ledger.json)
// - Identity registry (identity.json)
// - Skill marketplace (skills.json)
//
// One writer per data directory. Every save writes the full state to a
// temp file and renames it into place, so readers never observe a torn
// file.

use crate::ledger::LedgerState;
use crate::market::MarketState;
use crate::registry::RegistryState;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LEDGER_FILE: &str = "ledger.json";
const IDENTITY_FILE: &str = "identity.json";
const SKILLS_FILE: &str = "skills.json";

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open data directory {path}: {message}")]
    OpenFailed { path: String, message: String },

    #[error("Failed to write {file}: {message}")]
    WriteFailed { file: String, message: String },

    #[error("Failed to read {file}: {message}")]
    ReadFailed { file: String, message: String },

    #[error("Corrupt state file {file}: {message}")]
    Corrupt { file: String, message: String },
}

/// Typed JSON-file store rooted at one data directory
#[derive(Clone, Debug)]
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    /// Open (creating if needed) a store at the given directory
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|e| StoreError::OpenFailed {
            path: data_dir.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn save_ledger(&self, state: &LedgerState) -> Result<(), StoreError> {
        self.write_json(LEDGER_FILE, state)
    }

    pub fn load_ledger(&self) -> Result<Option<LedgerState>, StoreError> {
        self.read_json(LEDGER_FILE)
    }

    pub fn save_registry(&self, state: &RegistryState) -> Result<(), StoreError> {
        self.write_json(IDENTITY_FILE, state)
    }

    pub fn load_registry(&self) -> Result<Option<RegistryState>, StoreError> {
        self.read_json(IDENTITY_FILE)
    }

    pub fn save_market(&self, state: &MarketState) -> Result<(), StoreError> {
        self.write_json(SKILLS_FILE, state)
    }

    pub fn load_market(&self) -> Result<Option<MarketState>, StoreError> {
        self.read_json(SKILLS_FILE)
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::WriteFailed {
            file: file.to_string(),
            message: e.to_string(),
        })?;

        let path = self.data_dir.join(file);
        let tmp = self.data_dir.join(format!("{file}.tmp"));
        fs::write(&tmp, json).map_err(|e| StoreError::WriteFailed {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::WriteFailed {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StoreError> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|e| StoreError::ReadFailed {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        let value = serde_json::from_str(&json).map_err(|e| StoreError::Corrupt {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_read_as_none() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        assert!(store.load_ledger().unwrap().is_none());
        assert!(store.load_registry().unwrap().is_none());
        assert!(store.load_market().unwrap().is_none());
    }

    #[test]
    fn test_ledger_state_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let mut state = LedgerState::new();
        state.block_height = 7;
        store.save_ledger(&state).unwrap();

        let restored = store.load_ledger().unwrap().unwrap();
        assert_eq!(restored.block_height, 7);
        assert_eq!(restored.version, state.version);
    }

    #[test]
    fn test_corrupt_file_is_typed_error() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("ledger.json"), "{not json").unwrap();

        match store.load_ledger() {
            Err(StoreError::Corrupt { file, .. }) => assert_eq!(file, "ledger.json"),
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }
}
