//! The canonical game snapshot.
//!
//! [`GameState`] composes every part of the simulation: the grid and
//! building registry, NFT records, resource ledger, marketplace,
//! proposals, game parameters, and the transient UI fields a client needs
//! to render. Only the reducer produces new states; everyone else reads.

use chrono::{DateTime, Utc};
use metacity_civics::{Marketplace, ProposalBook};
use metacity_ledger::Ledger;
use metacity_types::{
    ActorId, BuildingId, BuildingType, GameParameters, Position, ResourceLedger,
};
use metacity_world::{
    BuildingRegistry, NftBook, SpatialGrid, WorldError, create_starting_world, default_parameters,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;

// ---------------------------------------------------------------------------
// Invariant violations
// ---------------------------------------------------------------------------

/// A structural inconsistency found in a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum InvariantViolation {
    /// Tiles and buildings disagree.
    #[error(transparent)]
    World(#[from] WorldError),

    /// A building's level is outside `1..=max_level` for its type.
    #[error("building {building} has level {level}, allowed 1..={max}")]
    LevelOutOfRange {
        /// The building.
        building: BuildingId,
        /// Its recorded level.
        level: u32,
        /// The type's maximum level.
        max: u32,
    },

    /// Morale is outside `0..=100`.
    #[error("morale {0} is outside 0..=100")]
    MoraleOutOfRange(Decimal),

    /// A listed building is also present in the registry.
    #[error("listed building {0} is still registered")]
    ListedBuildingRegistered(BuildingId),
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The complete, serializable state of a city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Currency, population and morale.
    #[serde(rename = "resources")]
    pub ledger: Ledger,
    /// The land grid.
    pub grid: SpatialGrid,
    /// Standing buildings.
    pub buildings: BuildingRegistry,
    /// Ownership tokens.
    pub nfts: NftBook,
    /// Open listings.
    pub market: Marketplace,
    /// Governance proposals.
    pub proposals: ProposalBook,
    /// Governance-tunable economy parameters.
    pub parameters: GameParameters,
    /// The connected actor, if any.
    pub actor: Option<ActorId>,
    /// The tile the player has selected.
    pub selected_tile: Option<Position>,
    /// The building type armed for placement.
    pub build_mode: Option<BuildingType>,
    /// Current tutorial step.
    pub tutorial_step: u32,
    /// Whether the tutorial panel is open.
    pub is_tutorial_open: bool,
    /// Whether the client is still loading a saved snapshot.
    pub is_loading: bool,
    /// Time of the last applied tick.
    pub last_update: DateTime<Utc>,
}

impl GameState {
    /// Build the starting city described by `config`.
    ///
    /// The state starts with `is_loading` set; the driver clears it once it
    /// has either loaded a snapshot or decided to keep this one.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the grid size is invalid or a starting
    /// parcel lies off the grid.
    pub fn initial(config: &WorldConfig, now: DateTime<Utc>) -> Result<Self, WorldError> {
        let world = create_starting_world(&config.starting_options(), now)?;
        let mut market = Marketplace::new();
        if let Some(listing) = world.demo_listing {
            market.push(listing);
        }

        Ok(Self {
            ledger: Ledger::new(
                config.starting_currency,
                config.starting_population,
                config.starting_morale,
            ),
            grid: world.grid,
            buildings: world.registry,
            nfts: world.nfts,
            market,
            proposals: ProposalBook::new(),
            parameters: default_parameters(),
            actor: None,
            selected_tile: None,
            build_mode: None,
            tutorial_step: 0,
            is_tutorial_open: true,
            is_loading: true,
            last_update: now,
        })
    }

    /// Current resource balances.
    pub const fn resources(&self) -> &ResourceLedger {
        self.ledger.balances()
    }

    /// Check every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn verify_invariants(&self) -> Result<(), InvariantViolation> {
        self.grid.verify_links(&self.buildings)?;

        for building in self.buildings.iter() {
            if let Some(stats) = self.parameters.stats(building.building_type)
                && (building.level == 0 || building.level > stats.max_level)
            {
                return Err(InvariantViolation::LevelOutOfRange {
                    building: building.id,
                    level: building.level,
                    max: stats.max_level,
                });
            }
        }

        let morale = self.ledger.morale();
        if morale < Decimal::ZERO || morale > Decimal::ONE_HUNDRED {
            return Err(InvariantViolation::MoraleOutOfRange(morale));
        }

        if let Some(listing) = self
            .market
            .iter()
            .find(|l| self.buildings.get(l.building.id).is_some())
        {
            return Err(InvariantViolation::ListedBuildingRegistered(
                listing.building.id,
            ));
        }
        Ok(())
    }

    /// A compact view for live dashboards.
    pub fn summary(&self) -> ResourceSummary {
        let resources = self.resources();
        ResourceSummary {
            currency: resources.currency,
            population: resources.population,
            morale: resources.morale,
            buildings: self.buildings.len(),
            active_proposals: self
                .proposals
                .iter()
                .filter(|p| !p.status.is_terminal())
                .count(),
            listings: self.market.len(),
            last_update: self.last_update,
        }
    }
}

/// Headline numbers broadcast after every applied action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    /// Current currency.
    pub currency: Decimal,
    /// Current population.
    pub population: Decimal,
    /// Current morale.
    pub morale: Decimal,
    /// Standing buildings.
    pub buildings: usize,
    /// Proposals still accepting votes.
    pub active_proposals: usize,
    /// Open market listings.
    pub listings: usize,
    /// Time of the last applied tick.
    pub last_update: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn initial_state_matches_reference_city() {
        let state = GameState::initial(&WorldConfig::default(), Utc::now()).unwrap();
        assert_eq!(state.resources().currency, dec!(1000));
        assert_eq!(state.resources().population, dec!(10));
        assert_eq!(state.resources().morale, dec!(50));
        assert_eq!(state.buildings.len(), 1);
        assert_eq!(state.market.len(), 1);
        assert!(state.actor.is_none());
        assert!(state.is_loading);
        assert!(state.is_tutorial_open);
        assert!(state.verify_invariants().is_ok());
    }

    #[test]
    fn over_level_building_violates_invariants() {
        let mut state = GameState::initial(&WorldConfig::default(), Utc::now()).unwrap();
        let id = state.buildings.iter().map(|b| b.id).next().unwrap();
        if let Some(b) = state.buildings.get_mut(id) {
            b.level = 9;
        }
        assert!(matches!(
            state.verify_invariants(),
            Err(InvariantViolation::LevelOutOfRange { level: 9, .. })
        ));
    }

    #[test]
    fn summary_counts_entities() {
        let state = GameState::initial(&WorldConfig::default(), Utc::now()).unwrap();
        let summary = state.summary();
        assert_eq!(summary.buildings, 1);
        assert_eq!(summary.listings, 1);
        assert_eq!(summary.active_proposals, 0);
        assert_eq!(
            state.buildings.count_of_type(BuildingType::Residential),
            1
        );
    }
}
