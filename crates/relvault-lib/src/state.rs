use crate::config::RepoTarget;
use crate::error::RelvaultError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateEntry {
    /// Tag of the last release that was fully backed up.
    pub last_release: String,
    /// When this entry was written.
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    /// Version of the state file format
    version: u32,
    /// Entries keyed by `owner/name`
    repositories: BTreeMap<String, StateEntry>,
}

/// Durable record of the last release backed up per repository.
///
/// The whole document is rewritten through a sibling temporary file and
/// renamed over the old one, so a crash mid-write leaves the previous
/// record intact.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    document: StateDocument,
}

impl StateStore {
    pub const VERSION: u32 = 1;

    pub fn load(path: &Path) -> Result<Self, RelvaultError> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                document: StateDocument {
                    version: Self::VERSION,
                    repositories: BTreeMap::new(),
                },
            });
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| RelvaultError::StateLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let document: StateDocument =
            serde_json::from_str(&content).map_err(|e| RelvaultError::StateLoad {
                path: path.to_path_buf(),
                reason: format!("JSON parsing failed: {}", e),
            })?;

        if document.version != Self::VERSION {
            return Err(RelvaultError::StateLoad {
                path: path.to_path_buf(),
                reason: format!(
                    "State file version {} is not supported. Expected version {}",
                    document.version,
                    Self::VERSION
                ),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn get_last(&self, repo: &RepoTarget) -> Option<&str> {
        self.document
            .repositories
            .get(&repo.full_name())
            .map(|entry| entry.last_release.as_str())
    }

    pub fn entry(&self, repo: &RepoTarget) -> Option<&StateEntry> {
        self.document.repositories.get(&repo.full_name())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &StateEntry)> {
        self.document
            .repositories
            .iter()
            .map(|(key, entry)| (key.as_str(), entry))
    }

    /// Record `tag` as the last fully backed-up release and persist.
    pub fn set_last(&mut self, repo: &RepoTarget, tag: &str) -> Result<(), RelvaultError> {
        self.document.repositories.insert(
            repo.full_name(),
            StateEntry {
                last_release: tag.to_string(),
                checked_at: Utc::now(),
            },
        );
        self.save()
    }

    fn save(&self) -> Result<(), RelvaultError> {
        let save_error = |reason: String| RelvaultError::StateSave {
            path: self.path.clone(),
            reason,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| save_error(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(&self.document)
            .map_err(|e| save_error(format!("JSON serialization failed: {}", e)))?;

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| save_error("state path has no file name".to_string()))?;
        let tmp_path = self
            .path
            .with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

        std::fs::write(&tmp_path, json).map_err(|e| save_error(e.to_string()))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| save_error(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(reference: &str) -> RepoTarget {
        RepoTarget::parse(reference).unwrap()
    }

    #[test]
    fn test_missing_file_loads_as_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::load(&dir.path().join("state.json")).unwrap();
        assert!(store.get_last(&repo("acme/tool")).is_none());
        assert_eq!(store.entries().count(), 0);
    }

    #[test]
    fn test_set_last_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = StateStore::load(&path).unwrap();
        store.set_last(&repo("acme/tool"), "v1.1").unwrap();
        store.set_last(&repo("acme/other"), "v2.0").unwrap();

        let reloaded = StateStore::load(&path).unwrap();
        assert_eq!(reloaded.get_last(&repo("acme/tool")), Some("v1.1"));
        assert_eq!(reloaded.get_last(&repo("acme/other")), Some("v2.0"));
        assert_eq!(reloaded.entries().count(), 2);
    }

    #[test]
    fn test_set_last_overwrites_previous_tag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = StateStore::load(&path).unwrap();
        store.set_last(&repo("acme/tool"), "v1.0").unwrap();
        store.set_last(&repo("acme/tool"), "v1.1").unwrap();

        let reloaded = StateStore::load(&path).unwrap();
        assert_eq!(reloaded.get_last(&repo("acme/tool")), Some("v1.1"));
        assert_eq!(reloaded.entries().count(), 1);
    }

    #[test]
    fn test_save_leaves_no_temporary_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = StateStore::load(&path).unwrap();
        store.set_last(&repo("acme/tool"), "v1.0").unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "leftover temp files: {:?}", leftovers);
    }

    #[test]
    fn test_save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut store = StateStore::load(&path).unwrap();
        store.set_last(&repo("acme/tool"), "v1.0").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupted_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = StateStore::load(&path).unwrap_err();
        assert!(matches!(err, RelvaultError::StateLoad { .. }));
    }

    #[test]
    fn test_unsupported_version_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"version": 99, "repositories": {}}"#).unwrap();

        let err = StateStore::load(&path).unwrap_err();
        assert!(matches!(err, RelvaultError::StateLoad { .. }));
    }
}
