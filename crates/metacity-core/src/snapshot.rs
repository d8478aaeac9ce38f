//! Snapshot encoding and the storage seam.
//!
//! A snapshot is the whole [`GameState`] as JSON. Decoding always runs the
//! invariant checks, so a hand-edited or truncated save never reaches the
//! reducer in an inconsistent shape.

use std::sync::{Mutex, PoisonError};

use crate::state::{GameState, InvariantViolation};

/// Errors from encoding, decoding or storing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The JSON could not be produced or parsed.
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The decoded state is structurally inconsistent.
    #[error("snapshot failed invariant check: {0}")]
    Invariant(#[from] InvariantViolation),

    /// Reading or writing the backing store failed.
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize `state` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] if serialization fails.
pub fn encode(state: &GameState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Parse and validate a snapshot.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] for malformed input and
/// [`SnapshotError::Invariant`] when tiles and buildings disagree.
pub fn decode(json: &str) -> Result<GameState, SnapshotError> {
    let state: GameState = serde_json::from_str(json)?;
    state.verify_invariants()?;
    Ok(state)
}

/// Somewhere snapshots can be saved to and restored from.
pub trait SnapshotStore: Send + Sync {
    /// Load the most recent snapshot, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if the stored snapshot cannot be read or
    /// decoded.
    fn load(&self) -> Result<Option<GameState>, SnapshotError>;

    /// Persist `state`, replacing any previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if encoding or writing fails.
    fn save(&self, state: &GameState) -> Result<(), SnapshotError>;
}

/// An in-process store holding the encoded snapshot.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    saved: Mutex<Option<String>>,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            saved: Mutex::new(None),
        }
    }

    /// The raw JSON last saved, if any.
    pub fn raw(&self) -> Option<String> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<GameState>, SnapshotError> {
        self.raw().as_deref().map(decode).transpose()
    }

    fn save(&self, state: &GameState) -> Result<(), SnapshotError> {
        let json = encode(state)?;
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        Ok(())
    }
}
