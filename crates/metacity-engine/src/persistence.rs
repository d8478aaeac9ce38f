//! Snapshot file storage and startup restore.

use std::fs;
use std::path::PathBuf;

use metacity_core::snapshot::{SnapshotError, SnapshotStore, decode, encode};
use metacity_core::{Action, GameState};
use tracing::{debug, info, warn};

/// Stores the snapshot as a single JSON file.
///
/// Saves write a sibling temp file and rename it over the target, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<GameState>, SnapshotError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => decode(&json).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, state: &GameState) -> Result<(), SnapshotError> {
        let json = encode(state)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

/// The action that ends the loading phase: restore the saved snapshot if
/// there is a usable one, otherwise just clear the loading flag.
pub fn restore_action(store: &dyn SnapshotStore) -> Action {
    match store.load() {
        Ok(Some(saved)) => {
            info!(
                buildings = saved.buildings.len(),
                currency = %saved.ledger.currency(),
                "Restoring saved snapshot"
            );
            Action::LoadState(Box::new(saved))
        }
        Ok(None) => {
            info!("No saved snapshot, starting a new city");
            Action::SetIsLoading(false)
        }
        Err(e) => {
            warn!(error = %e, "Saved snapshot unusable, starting a new city");
            Action::SetIsLoading(false)
        }
    }
}

/// Save `state`, logging rather than failing.
pub fn save_logged(store: &dyn SnapshotStore, state: &GameState) {
    match store.save(state) {
        Ok(()) => debug!(buildings = state.buildings.len(), "Snapshot saved"),
        Err(e) => warn!(error = %e, "Snapshot save failed"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use metacity_core::config::WorldConfig;

    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("metacity-engine-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn missing_file_loads_as_none() {
        let store = FileSnapshotStore::new(scratch("absent.json"));
        assert!(store.load().unwrap().is_none());
        assert_eq!(restore_action(&store), Action::SetIsLoading(false));
    }

    #[test]
    fn save_then_load_restores_state() {
        let path = scratch("roundtrip.json");
        let store = FileSnapshotStore::new(&path);
        let state = GameState::initial(&WorldConfig::default(), Utc::now()).unwrap();

        store.save(&state).unwrap();
        assert!(path.exists());
        assert!(!store.temp_path().exists());
        assert_eq!(store.load().unwrap(), Some(state.clone()));
        assert_eq!(restore_action(&store), Action::LoadState(Box::new(state)));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn corrupt_file_falls_back_to_new_city() {
        let path = scratch("corrupt.json");
        fs::create_dir_all(path.parent().unwrap()).ok();
        fs::write(&path, "{ not json").unwrap();
        let store = FileSnapshotStore::new(&path);

        assert!(matches!(store.load(), Err(SnapshotError::Json(_))));
        assert_eq!(restore_action(&store), Action::SetIsLoading(false));
        fs::remove_file(&path).ok();
    }
}
