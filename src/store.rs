use std::collections::HashMap;
use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{CreatorName, Identifier};
use crate::error::CrunchyError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowRecord {
    pub identifier: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<CreatorName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Full(ShowRecord),
    Bare(String),
}

#[derive(Debug)]
pub struct IdentifierStore {
    path: Utf8PathBuf,
    records: HashMap<Identifier, ShowRecord>,
}

impl IdentifierStore {
    pub fn load(path: Utf8PathBuf) -> Self {
        let mut store = Self {
            path,
            records: HashMap::new(),
        };

        if !store.path.as_std_path().exists() {
            debug!(path = %store.path, "no identifier store found, starting fresh");
            return store;
        }

        let content = match fs::read_to_string(store.path.as_std_path()) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %store.path, %err, "could not read identifier store, starting fresh");
                return store;
            }
        };

        let entries: Vec<StoredEntry> = match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %store.path, %err, "could not parse identifier store, starting fresh");
                return store;
            }
        };

        for entry in entries {
            match entry {
                StoredEntry::Full(record) => {
                    store.records.insert(record.identifier.clone(), record);
                }
                StoredEntry::Bare(value) => match value.parse::<Identifier>() {
                    Ok(identifier) => {
                        let record = ShowRecord {
                            identifier: identifier.clone(),
                            creator: None,
                            downloaded_at: None,
                        };
                        store.records.insert(identifier, record);
                    }
                    Err(err) => {
                        warn!(entry = %value, %err, "skipping unusable store entry");
                    }
                },
            }
        }

        store
    }

    pub fn default_path() -> Result<Utf8PathBuf, CrunchyError> {
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.data_dir()
                        .join("crunchy-downloader")
                        .join("downloaded_shows.json"),
                )
                .ok()
            })
            .ok_or_else(|| {
                CrunchyError::Filesystem("unable to resolve identifier store directory".to_string())
            })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.records.contains_key(identifier)
    }

    pub fn get(&self, identifier: &Identifier) -> Option<&ShowRecord> {
        self.records.get(identifier)
    }

    pub fn record(&mut self, identifier: Identifier, creator: CreatorName, downloaded_at: String) {
        let record = ShowRecord {
            identifier: identifier.clone(),
            creator: Some(creator),
            downloaded_at: Some(downloaded_at),
        };
        self.records.insert(identifier, record);
    }

    pub fn persist(&self) -> Result<(), CrunchyError> {
        let mut records = self.records.values().collect::<Vec<_>>();
        records.sort_by(|a, b| a.identifier.as_str().cmp(b.identifier.as_str()));
        let content = serde_json::to_vec_pretty(&records).map_err(|err| {
            CrunchyError::StorePersist {
                path: self.path.clone(),
                message: err.to_string(),
            }
        })?;

        let parent = self
            .path
            .parent()
            .ok_or_else(|| CrunchyError::StorePersist {
                path: self.path.clone(),
                message: "store path has no parent directory".to_string(),
            })?;
        fs::create_dir_all(parent.as_std_path()).map_err(|err| CrunchyError::StorePersist {
            path: self.path.clone(),
            message: err.to_string(),
        })?;

        let mut temp = tempfile::Builder::new()
            .prefix("downloaded_shows")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| CrunchyError::StorePersist {
                path: self.path.clone(),
                message: err.to_string(),
            })?;
        temp.write_all(&content)
            .map_err(|err| CrunchyError::StorePersist {
                path: self.path.clone(),
                message: err.to_string(),
            })?;
        temp.persist(self.path.as_std_path())
            .map_err(|err| CrunchyError::StorePersist {
                path: self.path.clone(),
                message: err.to_string(),
            })?;

        set_store_permissions(&self.path);
        Ok(())
    }
}

#[cfg(unix)]
fn set_store_permissions(path: &Utf8Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(err) = fs::set_permissions(path.as_std_path(), fs::Permissions::from_mode(0o664)) {
        warn!(path = %path, %err, "could not set identifier store permissions");
    }
}

#[cfg(not(unix))]
fn set_store_permissions(_path: &Utf8Path) {}
