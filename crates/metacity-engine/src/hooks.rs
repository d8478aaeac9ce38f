//! Scheduled side effects: autosave and flavor refresh.
//!
//! The simulation loop calls [`EngineHooks`] on its own task, so the hooks
//! only hand a snapshot to a background worker through a `watch` channel.
//! A worker that is still busy sees only the newest snapshot when it comes
//! back.

use std::sync::Arc;

use metacity_core::flavor::{headline_request, tutorial_hint_request};
use metacity_core::snapshot::SnapshotStore;
use metacity_core::{GameState, SimulationHooks};
use metacity_flavor::{FlavorBoard, FlavorClient, FlavorError};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::persistence::save_logged;

type Pending = watch::Sender<Option<Arc<GameState>>>;

/// Hooks that forward snapshots to the autosave and flavor workers.
#[derive(Debug)]
pub struct EngineHooks {
    autosave: Pending,
    flavor: Pending,
}

impl SimulationHooks for EngineHooks {
    fn on_autosave(&mut self, state: &GameState) {
        self.autosave.send_replace(Some(Arc::new(state.clone())));
    }

    fn on_flavor_refresh(&mut self, state: &GameState) {
        self.flavor.send_replace(Some(Arc::new(state.clone())));
    }
}

/// Background tasks fed by [`EngineHooks`].
#[derive(Debug)]
pub struct Workers {
    /// Writes autosaves to the store.
    pub autosave: JoinHandle<()>,
    /// Refreshes the flavor board.
    pub flavor: JoinHandle<()>,
}

/// Create the hooks and spawn their workers.
///
/// The workers stop once the hooks are dropped.
pub fn spawn(
    store: Arc<dyn SnapshotStore>,
    client: Arc<FlavorClient>,
    board: Arc<RwLock<FlavorBoard>>,
) -> (EngineHooks, Workers) {
    let (autosave_tx, autosave_rx) = watch::channel(None);
    let (flavor_tx, flavor_rx) = watch::channel(None);
    let hooks = EngineHooks {
        autosave: autosave_tx,
        flavor: flavor_tx,
    };
    let workers = Workers {
        autosave: tokio::spawn(autosave_worker(store, autosave_rx)),
        flavor: tokio::spawn(flavor_worker(client, board, flavor_rx)),
    };
    (hooks, workers)
}

async fn autosave_worker(
    store: Arc<dyn SnapshotStore>,
    mut pending: watch::Receiver<Option<Arc<GameState>>>,
) {
    while pending.changed().await.is_ok() {
        let Some(state) = pending.borrow_and_update().clone() else {
            continue;
        };
        let store = Arc::clone(&store);
        let saved = tokio::task::spawn_blocking(move || save_logged(store.as_ref(), &state)).await;
        if let Err(e) = saved {
            warn!(error = %e, "Autosave task failed");
        }
    }
    debug!("Autosave worker stopped");
}

async fn flavor_worker(
    client: Arc<FlavorClient>,
    board: Arc<RwLock<FlavorBoard>>,
    mut pending: watch::Receiver<Option<Arc<GameState>>>,
) {
    if !client.is_enabled() {
        debug!("Flavor text disabled, refresh worker idle");
    }
    while pending.changed().await.is_ok() {
        let Some(state) = pending.borrow_and_update().clone() else {
            continue;
        };
        if !client.is_enabled() {
            continue;
        }
        let generation = board.write().await.begin_refresh();
        tokio::spawn(refresh(
            Arc::clone(&client),
            Arc::clone(&board),
            generation,
            state,
        ));
    }
    debug!("Flavor worker stopped");
}

/// Generate a headline and a hint from `state` and publish whatever
/// succeeds. A failed call keeps the previous text on the board.
pub async fn refresh(
    client: Arc<FlavorClient>,
    board: Arc<RwLock<FlavorBoard>>,
    generation: u64,
    state: Arc<GameState>,
) {
    let headline_request = headline_request(&state);
    let hint_request = tutorial_hint_request(&state);
    let (headline, hint) = futures::join!(
        client.news_headline(&headline_request),
        client.tutorial_hint(&hint_request),
    );

    let mut board = board.write().await;
    match headline {
        Ok(headline) => {
            board.publish_headline(generation, headline);
        }
        Err(e) => log_failure("headline", &e),
    }
    match hint {
        Ok(hint) => {
            board.publish_hint(generation, hint);
        }
        Err(e) => log_failure("tutorial hint", &e),
    }
}

fn log_failure(what: &str, error: &FlavorError) {
    warn!(what, error = %error, "Failed to fetch flavor text");
}
