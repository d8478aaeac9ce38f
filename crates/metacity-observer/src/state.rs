//! Shared application state for the API server.
//!
//! Reads come from the snapshot the simulation loop publishes after every
//! applied action, so no request ever waits on the loop. Writes are
//! actions submitted through the [`SimulationHandle`].

use std::sync::Arc;

use metacity_core::SimulationHandle;
use metacity_flavor::{FlavorBoard, FlavorClient};
use tokio::sync::RwLock;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client of the running simulation.
    pub simulation: SimulationHandle,
    /// Latest headline and tutorial hint, written by the flavor worker.
    pub board: Arc<RwLock<FlavorBoard>>,
    /// Flavor client used for on-demand building descriptions.
    pub flavor: Arc<FlavorClient>,
}

impl AppState {
    /// Create application state around a running simulation.
    pub const fn new(
        simulation: SimulationHandle,
        board: Arc<RwLock<FlavorBoard>>,
        flavor: Arc<FlavorClient>,
    ) -> Self {
        Self {
            simulation,
            board,
            flavor,
        }
    }
}
