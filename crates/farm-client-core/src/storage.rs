//! Client side cache for the session (the user record and tokens), keyed by
//! the names in [`farm_shared::const_config::storage`]

use anyhow::Context as _;
use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::Mutex,
};

pub trait KeyValueStore: Debug + Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    /// Removing a key that is not present is not an error
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// Lives as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

/// One file per key inside a directory, named after the key. Survives restarts
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .values
            .lock()
            .expect("mutex poisoned")
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values
            .lock()
            .expect("mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.values.lock().expect("mutex poisoned").remove(key);
        Ok(())
    }
}

impl FileStore {
    /// Creates the directory if it doesn't exist yet
    #[tracing::instrument]
    pub fn new(dir: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create storage folder: {dir:?}"))?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {path:?}")),
        }
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.key_path(key);
        fs::write(&path, value).with_context(|| format!("failed to write {path:?}"))
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {path:?}")),
        }
    }
}
