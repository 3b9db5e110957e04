//! JSON file store: a single array of message ids.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use super::error::{Result, StoreError};
use super::ProcessedStore;

/// Keeps processed ids in a JSON array on disk.
///
/// Every append rewrites the file through a temporary sibling and a rename,
/// so a crash mid-write leaves the previous list intact. The file is read
/// before the first append even if `load` was never called.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Vec<String>,
    loaded: bool,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
            loaded: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_entries(&self) -> Result<Vec<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No processed store at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            source: e,
        })
    }

    fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_vec(&self.entries).map_err(StoreError::Encode)?;
        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|e| StoreError::Write {
            path: temp.clone(),
            source: e,
        })?;
        fs::rename(&temp, &self.path).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl ProcessedStore for JsonFileStore {
    fn load(&mut self) -> Result<Vec<String>> {
        let entries = self.read_entries()?;
        self.entries = entries.clone();
        self.loaded = true;
        Ok(entries)
    }

    fn append(&mut self, message_id: &str) -> Result<()> {
        if !self.loaded {
            self.load()?;
        }
        if self.entries.iter().any(|id| id == message_id) {
            return Ok(());
        }

        self.entries.push(message_id.to_string());
        if let Err(e) = self.write() {
            self.entries.pop();
            return Err(e);
        }
        Ok(())
    }

    fn persisted_count(&self) -> Result<u64> {
        if self.loaded {
            Ok(self.entries.len() as u64)
        } else {
            Ok(self.read_entries()?.len() as u64)
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
