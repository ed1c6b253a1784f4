//! Persistence gateway: the whole collection as one pretty-printed JSON
//! blob in the per-user config directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::userdata::UserdataCollection;

const STORE_FILE: &str = "userdatas.json";

pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    /// Store at the default location, `<config_dir>/gariban/userdatas.json`.
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("gariban").join(STORE_FILE),
        }
    }

    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted collection; a missing file yields the empty
    /// default collection.
    pub async fn read_all(&self) -> Result<UserdataCollection> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let collection = serde_json::from_str(&contents)?;
                debug!("Loaded userdatas from {:?}", self.path);
                Ok(collection)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No userdatas file at {:?}, starting empty", self.path);
                Ok(UserdataCollection::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the whole collection. In-memory state is not rolled back on
    /// failure; the caller surfaces the error.
    pub async fn write_all(&self, collection: &UserdataCollection) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(collection)?;
        tokio::fs::write(&self.path, contents).await?;
        debug!("Wrote userdatas to {:?}", self.path);
        Ok(())
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::userdata::construct::push_new_cluster;

    #[tokio::test]
    async fn round_trips_the_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::at(dir.path().join("userdatas.json"));

        let mut collection = UserdataCollection::default();
        push_new_cluster(&mut collection, "demo", "round trip");
        store.write_all(&collection).await.unwrap();

        let loaded = store.read_all().await.unwrap();
        assert_eq!(loaded.clusters.len(), 1);
        assert_eq!(loaded.current_cluster, 0);
        assert_eq!(loaded.clusters[0].cluster_meta.id, "demo");
        assert_eq!(loaded.clusters[0].info.comment, "");
        assert_eq!(loaded.clusters[0].cluster_meta.comment, "round trip");
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::at(dir.path().join("nope.json"));
        let loaded = store.read_all().await.unwrap();
        assert!(loaded.clusters.is_empty());
    }
}
