//! Core entity structs for the MetaCity simulation.
//!
//! Covers the grid tile, building, resource ledger, governance proposal,
//! market listing, NFT ownership record, and the governance-mutable game
//! parameters. Cross references between entities are always IDs or
//! positions, never embedded live handles.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{BuildingType, ListingKind, ProposalStatus, Resource, VoteChoice};
use crate::ids::{ActorId, BuildingId, ListingId, ProposalId, TileId, TokenId};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Grid coordinates. `x` is the column, `y` is the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Column index.
    pub x: u32,
    /// Row index.
    pub y: u32,
}

impl Position {
    /// Construct a position.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// The up-to-four orthogonal neighbours that fall inside a square grid
    /// of side `size`. Diagonals are never included.
    pub fn orthogonal_neighbors(self, size: u32) -> Vec<Self> {
        let mut neighbors = Vec::with_capacity(4);
        if let Some(x) = self.x.checked_sub(1) {
            neighbors.push(Self::new(x, self.y));
        }
        if let Some(x) = self.x.checked_add(1).filter(|x| *x < size) {
            neighbors.push(Self::new(x, self.y));
        }
        if let Some(y) = self.y.checked_sub(1) {
            neighbors.push(Self::new(self.x, y));
        }
        if let Some(y) = self.y.checked_add(1).filter(|y| *y < size) {
            neighbors.push(Self::new(self.x, y));
        }
        neighbors
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// A single land parcel on the grid.
///
/// Invariant: when `building_id` is set, the referenced building's
/// `position` equals this tile's `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Tile {
    /// Unique tile identifier.
    pub id: TileId,
    /// Coordinates of the tile.
    pub position: Position,
    /// The actor owning the parcel, if any.
    pub owner: Option<ActorId>,
    /// The building occupying the tile, if any.
    pub building_id: Option<BuildingId>,
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// A building placed on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Building {
    /// Unique building identifier.
    pub id: BuildingId,
    /// Owning actor.
    pub owner: ActorId,
    /// The building's type.
    pub building_type: BuildingType,
    /// Current level, starting at 1 and bounded by the type's max level.
    pub level: u32,
    /// The tile the building stands on.
    pub position: Position,
    /// When the building was first placed.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Resource ledger
// ---------------------------------------------------------------------------

/// The city's three scalar resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ResourceLedger {
    /// Spendable currency.
    #[ts(as = "String")]
    pub currency: Decimal,
    /// Population count (fractional while it accrues).
    #[ts(as = "String")]
    pub population: Decimal,
    /// Citizen morale, always within `0..=100`.
    #[ts(as = "String")]
    pub morale: Decimal,
}

// ---------------------------------------------------------------------------
// Game parameters
// ---------------------------------------------------------------------------

/// A building type's production curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Production {
    /// The resource produced.
    pub resource: Resource,
    /// Units per second, indexed by `level - 1`.
    #[ts(as = "Vec<String>")]
    pub rate: Vec<Decimal>,
}

/// Static and governance-tunable stats for one building type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BuildingStats {
    /// Display name.
    pub name: String,
    /// Short base description, also fed to the description generator.
    pub description: String,
    /// Highest reachable level.
    pub max_level: u32,
    /// Cost to reach each level, indexed by `level - 1` (entry 0 is the
    /// placement cost).
    #[ts(as = "Vec<String>")]
    pub cost: Vec<Decimal>,
    /// Production curve, if the type produces anything.
    pub production: Option<Production>,
    /// Happiness effect per level, if the type affects morale.
    #[ts(as = "Option<Vec<String>>")]
    pub happiness: Option<Vec<Decimal>>,
}

/// Look up a 1-based level in a 0-indexed curve.
fn level_entry(curve: &[Decimal], level: u32) -> Option<Decimal> {
    let index = usize::try_from(level.checked_sub(1)?).ok()?;
    curve.get(index).copied()
}

impl BuildingStats {
    /// Cost to *reach* `level` (level 1 is the placement cost).
    pub fn cost_to_reach(&self, level: u32) -> Option<Decimal> {
        level_entry(&self.cost, level)
    }

    /// Production rate per second at `level`; zero when the type does not
    /// produce or the level is beyond the curve.
    pub fn rate_at(&self, level: u32) -> Decimal {
        self.production
            .as_ref()
            .and_then(|p| level_entry(&p.rate, level))
            .unwrap_or(Decimal::ZERO)
    }

    /// Happiness effect at `level`; zero when absent.
    pub fn happiness_at(&self, level: u32) -> Decimal {
        self.happiness
            .as_deref()
            .and_then(|h| level_entry(h, level))
            .unwrap_or(Decimal::ZERO)
    }
}

/// Process-wide economy configuration, mutable only through executed
/// governance proposals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameParameters {
    /// Stats per building type.
    pub building_stats: BTreeMap<BuildingType, BuildingStats>,
    /// Production bonus for a non-road building next to a road (0.2 = +20%).
    #[ts(as = "String")]
    pub adjacency_bonus: Decimal,
}

impl GameParameters {
    /// Stats for a building type, if configured.
    pub fn stats(&self, building_type: BuildingType) -> Option<&BuildingStats> {
        self.building_stats.get(&building_type)
    }
}

// ---------------------------------------------------------------------------
// Governance
// ---------------------------------------------------------------------------

/// A parameter change embedded in a proposal, applied once if it passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ProposalAction {
    /// Override the cost to reach `level` for a building type.
    UpdateBuildingCost {
        /// Target building type.
        building_type: BuildingType,
        /// 1-based level whose cost changes.
        level: u32,
        /// The new cost.
        #[ts(as = "String")]
        new_cost: Decimal,
    },
    /// Override the production rate at `level` for a building type.
    UpdateProductionRate {
        /// Target building type.
        building_type: BuildingType,
        /// 1-based level whose rate changes.
        level: u32,
        /// The new rate per second.
        #[ts(as = "String")]
        new_rate: Decimal,
    },
}

impl ProposalAction {
    /// The building type the action targets.
    pub const fn building_type(&self) -> BuildingType {
        match self {
            Self::UpdateBuildingCost { building_type, .. }
            | Self::UpdateProductionRate { building_type, .. } => *building_type,
        }
    }

    /// The 1-based level the action targets.
    pub const fn level(&self) -> u32 {
        match self {
            Self::UpdateBuildingCost { level, .. } | Self::UpdateProductionRate { level, .. } => {
                *level
            }
        }
    }
}

/// Running vote totals, weighted by voting power.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VoteTally {
    /// Weighted votes in favour.
    pub votes_for: u64,
    /// Weighted votes against.
    pub votes_against: u64,
}

/// The caller-supplied part of a new proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProposalDraft {
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// The parameter change to apply if the proposal passes.
    pub action: ProposalAction,
}

/// A time-boxed governance vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Proposal {
    /// Unique proposal identifier.
    pub id: ProposalId,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// The actor who created the proposal.
    pub proposer: ActorId,
    /// Lifecycle status.
    pub status: ProposalStatus,
    /// Weighted tally.
    pub votes: VoteTally,
    /// Who has voted and on which side; at most one entry per actor.
    pub voters: BTreeMap<ActorId, VoteChoice>,
    /// The embedded parameter change.
    pub action: ProposalAction,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Expiry; the proposal resolves on the first evaluation strictly after it.
    pub ends_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Marketplace
// ---------------------------------------------------------------------------

/// A building offered for sale. While listed, the building is absent from
/// the registry and from every tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MarketListing {
    /// Unique listing identifier.
    pub id: ListingId,
    /// The selling actor.
    pub seller: ActorId,
    /// Asking price in currency.
    #[ts(as = "String")]
    pub price: Decimal,
    /// What kind of asset is listed.
    pub kind: ListingKind,
    /// The detached building record.
    pub building: Building,
}

// ---------------------------------------------------------------------------
// NFT records
// ---------------------------------------------------------------------------

/// A tokenized ownership record, distinct from the tile or building it
/// mirrors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind")]
#[ts(export, export_to = "bindings/")]
pub enum NftRecord {
    /// Ownership of a land parcel.
    Land {
        /// Token identifier.
        token_id: TokenId,
        /// The parcel.
        tile_id: TileId,
        /// The parcel's coordinates.
        position: Position,
        /// Current owner.
        owner: ActorId,
        /// Mint time.
        minted_at: DateTime<Utc>,
    },
    /// Ownership of a building.
    BuildingToken {
        /// Token identifier.
        token_id: TokenId,
        /// The building.
        building_id: BuildingId,
        /// The building's type at mint time.
        building_type: BuildingType,
        /// Current owner.
        owner: ActorId,
        /// Mint time.
        minted_at: DateTime<Utc>,
    },
}

impl NftRecord {
    /// The token identifier.
    pub const fn token_id(&self) -> TokenId {
        match self {
            Self::Land { token_id, .. } | Self::BuildingToken { token_id, .. } => *token_id,
        }
    }

    /// The current owner.
    pub const fn owner(&self) -> &ActorId {
        match self {
            Self::Land { owner, .. } | Self::BuildingToken { owner, .. } => owner,
        }
    }

    /// The building this token mirrors, if it is a building token.
    pub const fn building_id(&self) -> Option<BuildingId> {
        match self {
            Self::BuildingToken { building_id, .. } => Some(*building_id),
            Self::Land { .. } => None,
        }
    }

    /// Transfer the token to a new owner.
    pub fn set_owner(&mut self, new_owner: ActorId) {
        match self {
            Self::Land { owner, .. } | Self::BuildingToken { owner, .. } => *owner = new_owner,
        }
    }
}
