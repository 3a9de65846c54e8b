//! Durable local storage for the vocabulary map
//!
//! State is kept under one namespaced key per language, holding the whole
//! serialized `word -> VocabEntry` map.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{LexisubError, Result};

use super::types::VocabEntry;

/// Storage key for a language's vocabulary map.
pub fn storage_key(language: &str) -> String {
    format!("lexisub.vocab.{}", language.to_ascii_lowercase())
}

/// Synchronous key/value persistence for the vocabulary cache.
pub trait VocabStore: Send + Sync {
    /// Load the map for `language`; a missing key is an empty map.
    fn load(&self, language: &str) -> Result<HashMap<String, VocabEntry>>;

    /// Replace the stored map for `language`.
    fn save(&self, language: &str, entries: &HashMap<String, VocabEntry>) -> Result<()>;
}

/// One JSON file per language inside a directory.
#[derive(Debug, Clone)]
pub struct FileVocabStore {
    dir: PathBuf,
}

impl FileVocabStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the file backing `language`.
    pub fn path_for(&self, language: &str) -> PathBuf {
        self.dir.join(format!("{}.json", storage_key(language)))
    }
}

impl VocabStore for FileVocabStore {
    fn load(&self, language: &str) -> Result<HashMap<String, VocabEntry>> {
        let path = self.path_for(language);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        let entries = serde_json::from_str(&content)?;
        Ok(entries)
    }

    fn save(&self, language: &str, entries: &HashMap<String, VocabEntry>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(language);
        let content = serde_json::to_string(entries)?;

        // previous file stays intact until the rename
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            LexisubError::Storage(format!("Failed to replace {}: {}", path.display(), e))
        })?;
        Ok(())
    }
}

/// In-process store, serialized the same way as the file store.
#[derive(Debug, Default)]
pub struct MemoryVocabStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryVocabStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw serialized value under a key, if any.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.data.lock().get(key).cloned()
    }
}

impl VocabStore for MemoryVocabStore {
    fn load(&self, language: &str) -> Result<HashMap<String, VocabEntry>> {
        match self.data.lock().get(&storage_key(language)) {
            Some(raw) => Ok(serde_json::from_str(raw)?),
            None => Ok(HashMap::new()),
        }
    }

    fn save(&self, language: &str, entries: &HashMap<String, VocabEntry>) -> Result<()> {
        let raw = serde_json::to_string(entries)?;
        self.data.lock().insert(storage_key(language), raw);
        Ok(())
    }
}
