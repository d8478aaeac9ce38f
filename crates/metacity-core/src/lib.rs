//! Game state, reducer, and single-writer runner for the MetaCity simulation.
//!
//! All state changes flow through one entry point: an [`Action`] applied
//! by the [`Reducer`] inside [`run_simulation`]. Timers, HTTP intake and
//! snapshot restores all become actions on the same queue.
//!
//! # Modules
//!
//! - [`action`] -- The [`Action`] enum accepted by the reducer.
//! - [`clock`] -- [`Clock`] trait with system and manual implementations.
//! - [`config`] -- Configuration loading from `metacity-config.yaml`.
//! - [`flavor`] -- Requests for the AI flavor-text collaborator.
//! - [`reducer`] -- The pure transition function and its [`Outcome`].
//! - [`runner`] -- The async loop owning the state, and its handle.
//! - [`scheduler`] -- Deterministic periodic triggers.
//! - [`snapshot`] -- JSON snapshot codec and the [`SnapshotStore`] seam.
//! - [`state`] -- [`GameState`] and its invariant checks.
//! - [`tutorial`] -- Rule-based tutorial advisor and objectives.
//!
//! [`Clock`]: clock::Clock
//! [`SnapshotStore`]: snapshot::SnapshotStore

pub mod action;
pub mod clock;
pub mod config;
pub mod flavor;
pub mod reducer;
pub mod runner;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod tutorial;

pub use action::Action;
pub use config::{ConfigError, SimulationConfig};
pub use reducer::{Outcome, Reducer, ReducerRules, Transition};
pub use runner::{
    Command, NoOpHooks, RunnerError, SimulationHandle, SimulationHooks, SimulationInbox, channel,
    run_simulation,
};
pub use scheduler::{ScheduledEvent, Scheduler};
pub use snapshot::{MemorySnapshotStore, SnapshotError, SnapshotStore};
pub use state::{GameState, InvariantViolation, ResourceSummary};
