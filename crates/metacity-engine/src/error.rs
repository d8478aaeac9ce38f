//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps a subsystem error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: metacity_core::ConfigError,
    },

    /// The starting city could not be built.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: metacity_world::WorldError,
    },

    /// The simulation loop stopped unexpectedly.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: metacity_core::RunnerError,
    },

    /// The flavor client could not be set up.
    #[error("flavor error: {source}")]
    Flavor {
        /// The underlying flavor error.
        #[from]
        source: metacity_flavor::FlavorError,
    },

    /// The API server failed.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: metacity_observer::ServerError,
    },

    /// A background task panicked or was cancelled.
    #[error("task error: {message}")]
    Task {
        /// Description of the failure.
        message: String,
    },
}
