//! Configuration loading and typed config structures for the MetaCity simulation.
//!
//! The canonical configuration lives in `metacity-config.yaml` at the
//! project root. Every field has a default, so an empty file (or no file
//! at all) yields the reference city: a 20 x 20 grid, one-second ticks,
//! thirty-second autosaves and three-minute proposals.

use std::path::{Path, PathBuf};

use chrono::Duration;
use metacity_ledger::EconomySettings;
use metacity_types::{ActorId, Position};
use metacity_world::StartingWorldOptions;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `metacity-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Starting city layout and balances.
    #[serde(default)]
    pub world: WorldConfig,

    /// Timer intervals.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Morale and production tunables.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Marketplace behaviour.
    #[serde(default)]
    pub market: MarketConfig,

    /// Snapshot storage.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Flavor-text LLM backend.
    #[serde(default)]
    pub llm: LlmConfig,

    /// HTTP API bind address.
    #[serde(default)]
    pub observer: ObserverConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `METACITY_SNAPSHOT_PATH` overrides `persistence.snapshot_path`
    /// - `METACITY_OBSERVER_PORT` overrides `observer.port`
    /// - `METACITY_LLM_API_URL` overrides `llm.api_url`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("METACITY_SNAPSHOT_PATH") {
            self.persistence.snapshot_path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("METACITY_OBSERVER_PORT")
            && let Ok(port) = val.parse::<u16>()
        {
            self.observer.port = port;
        }
        if let Ok(val) = std::env::var("METACITY_LLM_API_URL") {
            self.llm.api_url = val;
        }
    }
}

/// Starting city configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Side length of the square grid.
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,

    /// Actor who owns the starting parcels.
    #[serde(default = "default_starting_actor")]
    pub starting_actor: String,

    /// Parcels granted to the starting actor; the first gets a house.
    #[serde(default = "default_starting_parcels")]
    pub starting_parcels: Vec<Position>,

    /// Opening currency balance.
    #[serde(default = "default_starting_currency")]
    pub starting_currency: Decimal,

    /// Opening population.
    #[serde(default = "default_starting_population")]
    pub starting_population: Decimal,

    /// Opening morale.
    #[serde(default = "default_starting_morale")]
    pub starting_morale: Decimal,

    /// Whether the market opens with a demo listing.
    #[serde(default = "default_true")]
    pub seed_demo_listing: bool,

    /// Seller recorded on seeded listings.
    #[serde(default = "default_system_seller")]
    pub system_seller: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            starting_actor: default_starting_actor(),
            starting_parcels: default_starting_parcels(),
            starting_currency: default_starting_currency(),
            starting_population: default_starting_population(),
            starting_morale: default_starting_morale(),
            seed_demo_listing: true,
            system_seller: default_system_seller(),
        }
    }
}

impl WorldConfig {
    /// Options for building the starting world.
    pub fn starting_options(&self) -> StartingWorldOptions {
        StartingWorldOptions {
            grid_size: self.grid_size,
            actor: ActorId::new(self.starting_actor.clone()),
            parcels: self.starting_parcels.clone(),
            seed_demo_listing: self.seed_demo_listing,
            system_seller: ActorId::new(self.system_seller.clone()),
        }
    }
}

/// Timer intervals in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Nominal tick interval; ticks closer than half of this are debounced.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Interval between snapshot autosaves.
    #[serde(default = "default_autosave_interval_ms")]
    pub autosave_interval_ms: u64,

    /// How long a proposal accepts votes.
    #[serde(default = "default_proposal_duration_ms")]
    pub proposal_duration_ms: u64,

    /// Interval between news-headline refreshes.
    #[serde(default = "default_flavor_refresh_ms")]
    pub flavor_refresh_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            autosave_interval_ms: default_autosave_interval_ms(),
            proposal_duration_ms: default_proposal_duration_ms(),
            flavor_refresh_ms: default_flavor_refresh_ms(),
        }
    }
}

/// Convert a millisecond count to a [`Duration`], saturating on overflow.
pub(crate) fn millis(ms: u64) -> Duration {
    i64::try_from(ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .unwrap_or(Duration::MAX)
}

impl TimingConfig {
    /// Proposal voting window.
    pub fn proposal_duration(&self) -> Duration {
        millis(self.proposal_duration_ms)
    }
}

/// Morale and production tunables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Morale at which production runs at 1x.
    #[serde(default = "default_morale_baseline")]
    pub morale_baseline: Decimal,

    /// Fraction of the gap to target morale closed per tick.
    #[serde(default = "default_morale_drift_rate")]
    pub morale_drift_rate: Decimal,

    /// Lower bound of the morale production multiplier.
    #[serde(default = "default_morale_floor_multiplier")]
    pub morale_floor_multiplier: Decimal,

    /// Optional upper bound of the morale production multiplier.
    #[serde(default)]
    pub morale_multiplier_cap: Option<Decimal>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            morale_baseline: default_morale_baseline(),
            morale_drift_rate: default_morale_drift_rate(),
            morale_floor_multiplier: default_morale_floor_multiplier(),
            morale_multiplier_cap: None,
        }
    }
}

impl EconomyConfig {
    /// Settings for the economy calculator and ledger.
    pub const fn settings(&self) -> EconomySettings {
        EconomySettings {
            morale_baseline: self.morale_baseline,
            morale_drift_rate: self.morale_drift_rate,
            morale_floor_multiplier: self.morale_floor_multiplier,
            morale_multiplier_cap: self.morale_multiplier_cap,
        }
    }
}

/// Marketplace behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MarketConfig {
    /// Credit the purchase price to the seller when the seller is the
    /// connected actor. Off by default: purchases are a currency sink.
    #[serde(default)]
    pub credit_seller: bool,
}

/// Snapshot storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Path of the JSON snapshot file.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Flavor-text LLM backend configuration. The API key is never stored in
/// the file; it is read from `METACITY_LLM_API_KEY`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LlmConfig {
    /// Whether flavor text is requested at all.
    #[serde(default)]
    pub enabled: bool,

    /// Backend wire format: `"openai"` or `"anthropic"`.
    #[serde(default = "default_llm_backend")]
    pub backend: String,

    /// Base URL of the API.
    #[serde(default = "default_llm_api_url")]
    pub api_url: String,

    /// Model identifier.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: default_llm_backend(),
            api_url: default_llm_api_url(),
            model: default_llm_model(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// HTTP API bind address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Host to bind.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_grid_size() -> u32 {
    20
}

fn default_starting_actor() -> String {
    "0xPlayer1...".to_owned()
}

fn default_starting_parcels() -> Vec<Position> {
    vec![
        Position::new(9, 9),
        Position::new(10, 9),
        Position::new(11, 9),
    ]
}

fn default_starting_currency() -> Decimal {
    Decimal::from(1000)
}

fn default_starting_population() -> Decimal {
    Decimal::from(10)
}

fn default_starting_morale() -> Decimal {
    Decimal::from(50)
}

fn default_system_seller() -> String {
    "0xSystem".to_owned()
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_autosave_interval_ms() -> u64 {
    30_000
}

const fn default_proposal_duration_ms() -> u64 {
    180_000
}

const fn default_flavor_refresh_ms() -> u64 {
    60_000
}

fn default_morale_baseline() -> Decimal {
    Decimal::from(50)
}

fn default_morale_drift_rate() -> Decimal {
    Decimal::new(1, 1)
}

fn default_morale_floor_multiplier() -> Decimal {
    Decimal::new(5, 1)
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("metacity-state.json")
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_llm_backend() -> String {
    "openai".to_owned()
}

fn default_llm_api_url() -> String {
    "https://api.openai.com/v1".to_owned()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_config_matches_reference_city() {
        let config = SimulationConfig::default();
        assert_eq!(config.world.grid_size, 20);
        assert_eq!(config.world.starting_parcels.len(), 3);
        assert_eq!(config.world.starting_currency, dec!(1000));
        assert_eq!(config.timing.tick_interval_ms, 1000);
        assert_eq!(config.timing.autosave_interval_ms, 30_000);
        assert_eq!(config.timing.proposal_duration_ms, 180_000);
        assert_eq!(config.economy.morale_drift_rate, dec!(0.1));
        assert!(config.economy.morale_multiplier_cap.is_none());
        assert!(!config.market.credit_seller);
        assert!(!config.llm.enabled);
    }

    #[test]
    fn empty_yaml_is_valid() {
        let config = SimulationConfig::parse("");
        assert!(config.is_ok());
        assert_eq!(
            config.map(|c| c.world.grid_size).unwrap_or_default(),
            20
        );
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r#"
world:
  grid_size: 12
  starting_parcels:
    - { x: 1, y: 1 }
    - { x: 2, y: 1 }
  seed_demo_listing: false

timing:
  tick_interval_ms: 500

economy:
  morale_multiplier_cap: "1.25"

market:
  credit_seller: true

llm:
  enabled: true
  backend: "anthropic"
  model: "claude-test"
"#;
        let config = SimulationConfig::parse(yaml).unwrap_or_default();
        assert_eq!(config.world.grid_size, 12);
        assert_eq!(config.world.starting_parcels, vec![Position::new(1, 1), Position::new(2, 1)]);
        assert!(!config.world.seed_demo_listing);
        assert_eq!(config.timing.tick_interval_ms, 500);
        assert_eq!(config.timing.autosave_interval_ms, 30_000);
        assert_eq!(config.economy.morale_multiplier_cap, Some(dec!(1.25)));
        assert!(config.market.credit_seller);
        assert_eq!(config.llm.backend, "anthropic");
        assert_eq!(config.world.starting_actor, "0xPlayer1...");
    }

    #[test]
    fn shipped_config_spells_out_the_defaults() {
        let shipped = include_str!("../../../metacity-config.yaml");
        let parsed = SimulationConfig::parse(shipped);
        assert!(parsed.is_ok());
        let config = parsed.unwrap_or_default();
        let defaults = SimulationConfig::default();
        assert_eq!(config.world, defaults.world);
        assert_eq!(config.timing, defaults.timing);
        assert_eq!(config.economy, defaults.economy);
        assert_eq!(config.market, defaults.market);
        assert_eq!(config.logging, defaults.logging);
        assert_eq!(config.llm.model, defaults.llm.model);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = SimulationConfig::parse("world: [not, a, map");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn economy_settings_carry_config_values() {
        let config = EconomyConfig {
            morale_multiplier_cap: Some(dec!(2)),
            ..EconomyConfig::default()
        };
        let settings = config.settings();
        assert_eq!(settings.morale_baseline, dec!(50));
        assert_eq!(settings.morale_multiplier_cap, Some(dec!(2)));
    }
}
