use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;

pub const SYNC_CACHE_KEY: &str = "syncCache";
pub const COURSE_PAGE_CACHE_KEY: &str = "coursePageCache";
pub const LAST_SYNC_KEY: &str = "lastSync";
pub const LAST_SYNC_RESULT_KEY: &str = "lastSyncResult";

/// Key-value persistence for the engine's state. Each key is read once at
/// run start and written once at run end.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn put(&self, key: &str, value: Value) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// State as a single JSON object on disk, read-modify-write per operation.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn read_map(&self) -> Result<Map<String, Value>> {
        match fs::read(&self.path).await {
            Ok(data) => serde_json::from_slice(&data)
                .with_context(|| format!("corrupt state file {}", self.path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(error) => Err(error.into()),
        }
    }

    async fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        let data = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, format!("{data}\n")).await?;

        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_map().await?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut map = self.read_map().await?;
        map.insert(key.to_owned(), value);

        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_map().await?;
        if map.remove(key).is_none() {
            return Ok(());
        }

        self.write_map(&map).await
    }
}
