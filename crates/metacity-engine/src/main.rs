//! Engine binary for the MetaCity simulation.
//!
//! Wires configuration, logging, snapshot persistence, the single-writer
//! simulation loop, the API server and the flavor-text worker together,
//! then runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `metacity-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the flavor client
//! 4. Create the starting city (still flagged as loading)
//! 5. Start the simulation loop with autosave and flavor hooks
//! 6. Restore the saved snapshot, or clear the loading flag
//! 7. Start the API server
//! 8. On `Ctrl-C`: stop the loop, save the final state, stop the server

mod error;
mod hooks;
mod persistence;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use metacity_core::clock::SystemClock;
use metacity_core::config::LlmConfig;
use metacity_core::snapshot::SnapshotStore;
use metacity_core::{GameState, Reducer, ReducerRules, Scheduler, SimulationConfig, run_simulation};
use metacity_flavor::{FlavorBoard, FlavorClient, LlmBackendConfig, PromptEngine, create_backend};
use metacity_observer::{AppState, ServerConfig, start_server};
use tokio::sync::{RwLock, oneshot};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::persistence::{FileSnapshotStore, restore_action, save_logged};

/// Capacity of the action queue.
const COMMAND_CAPACITY: usize = 256;

/// Environment variable naming an alternative config file.
const CONFIG_PATH_ENV: &str = "METACITY_CONFIG";

/// Environment variable naming a directory of prompt template overrides.
const PROMPT_DIR_ENV: &str = "METACITY_PROMPT_DIR";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step fails or a background task
/// dies.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), EngineError> {
    // 1. Configuration first: it carries the default log level.
    let config = load_config()?;

    // 2. Structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_unset| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        grid_size = config.world.grid_size,
        tick_interval_ms = config.timing.tick_interval_ms,
        autosave_interval_ms = config.timing.autosave_interval_ms,
        snapshot_path = %config.persistence.snapshot_path.display(),
        "metacity-engine starting"
    );

    // 3. Flavor text.
    let flavor = Arc::new(build_flavor_client(&config.llm)?);
    let board = Arc::new(RwLock::new(FlavorBoard::default()));

    // 4. Starting city.
    let now = Utc::now();
    let initial = GameState::initial(&config.world, now)?;
    let store: Arc<dyn SnapshotStore> =
        Arc::new(FileSnapshotStore::new(&config.persistence.snapshot_path));

    // 5. Simulation loop.
    let (handle, inbox) = metacity_core::channel(&initial, COMMAND_CAPACITY);
    let (mut engine_hooks, workers) =
        hooks::spawn(Arc::clone(&store), Arc::clone(&flavor), Arc::clone(&board));
    let reducer = Reducer::new(ReducerRules::from_config(&config));
    let scheduler = Scheduler::new(&config.timing, now);
    let simulation = tokio::spawn(async move {
        let clock = SystemClock;
        run_simulation(
            initial,
            &reducer,
            scheduler,
            &clock,
            inbox,
            &mut engine_hooks,
        )
        .await
    });

    // 6. Restore.
    handle.dispatch(restore_action(store.as_ref())).await?;

    // 7. API server.
    let server_config = ServerConfig {
        host: config.observer.host.clone(),
        port: config.observer.port,
    };
    let app_state = Arc::new(AppState::new(
        handle.clone(),
        Arc::clone(&board),
        Arc::clone(&flavor),
    ));
    let (stop_server, server_stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        start_server(&server_config, app_state, async move {
            server_stopped.await.ok();
        })
        .await
    });

    // 8. Run until interrupted.
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
    }
    info!("Shutdown requested");

    handle.shutdown().await?;
    let final_state = simulation.await.map_err(|e| EngineError::Task {
        message: format!("simulation task: {e}"),
    })?;
    // The loop has dropped the hooks, so the autosave worker drains and
    // exits; the final save must land after it.
    workers.autosave.await.map_err(|e| EngineError::Task {
        message: format!("autosave worker: {e}"),
    })?;
    workers.flavor.abort();
    save_logged(store.as_ref(), &final_state);

    if stop_server.send(()).is_err() {
        warn!("API server already stopped");
    }
    server.await.map_err(|e| EngineError::Task {
        message: format!("API server task: {e}"),
    })??;

    info!(
        currency = %final_state.ledger.currency(),
        buildings = final_state.buildings.len(),
        "metacity-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration from `$METACITY_CONFIG` or `metacity-config.yaml`,
/// falling back to defaults when the file does not exist.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let path = std::env::var(CONFIG_PATH_ENV)
        .map_or_else(|_unset| PathBuf::from("metacity-config.yaml"), PathBuf::from);
    if path.exists() {
        Ok(SimulationConfig::from_file(&path)?)
    } else {
        Ok(SimulationConfig::parse("")?)
    }
}

/// Build the flavor client. Flavor text is cosmetic, so a missing API key
/// disables it with a warning instead of stopping the engine.
fn build_flavor_client(llm: &LlmConfig) -> Result<FlavorClient, EngineError> {
    let prompts = match std::env::var(PROMPT_DIR_ENV) {
        Ok(dir) => PromptEngine::from_dir(Path::new(&dir))?,
        Err(_unset) => PromptEngine::builtin()?,
    };

    if !llm.enabled {
        info!("Flavor text disabled");
        return Ok(FlavorClient::disabled(prompts));
    }

    let backend_config = match LlmBackendConfig::from_parts(
        &llm.backend,
        &llm.api_url,
        &llm.model,
        llm.request_timeout_ms,
    ) {
        Ok(backend_config) => backend_config,
        Err(e) => {
            warn!(error = %e, "Flavor text disabled");
            return Ok(FlavorClient::disabled(prompts));
        }
    };

    let backend = create_backend(&backend_config)?;
    info!(
        backend = backend.name(),
        model = %backend_config.model,
        "Flavor text enabled"
    );
    Ok(FlavorClient::new(
        backend,
        prompts,
        backend_config.request_timeout,
    ))
}
