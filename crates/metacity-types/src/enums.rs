//! Enumeration types for the MetaCity simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Building types
// ---------------------------------------------------------------------------

/// The closed set of building types a player can place on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BuildingType {
    /// Housing; produces population.
    Residential,
    /// Shops and offices; produces currency.
    Commercial,
    /// Factories; produces a lot of currency but lowers morale.
    Industrial,
    /// Green space; raises morale.
    Park,
    /// Infrastructure; grants the adjacency bonus to neighbouring buildings.
    Road,
}

impl BuildingType {
    /// Every building type, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Residential,
        Self::Commercial,
        Self::Industrial,
        Self::Park,
        Self::Road,
    ];

    /// Whether this type is a road (roads never receive the adjacency bonus).
    pub const fn is_road(self) -> bool {
        matches!(self, Self::Road)
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A ledger resource that buildings can produce over time.
///
/// Morale is deliberately absent: buildings shift the morale *target*
/// through happiness effects rather than producing morale directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Resource {
    /// Spendable currency (gold tokens).
    Currency,
    /// Citizens living in the city.
    Population,
}

// ---------------------------------------------------------------------------
// Governance
// ---------------------------------------------------------------------------

/// Lifecycle status of a governance proposal.
///
/// `Active` transitions exactly once to a terminal `Passed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ProposalStatus {
    /// Accepting votes until expiry.
    Active,
    /// Resolved with more votes for than against; its action has been applied.
    Passed,
    /// Resolved with a tie or more votes against.
    Failed,
}

impl ProposalStatus {
    /// Whether the status is terminal.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// The side of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum VoteChoice {
    /// In favour of the proposal.
    For,
    /// Against the proposal.
    Against,
}

// ---------------------------------------------------------------------------
// Marketplace
// ---------------------------------------------------------------------------

/// What kind of asset a market listing trades.
///
/// The market currently only lists buildings; `Land` is accepted when
/// decoding snapshots written by clients that tag parcel listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ListingKind {
    /// A building detached from its tile.
    Building,
    /// A land parcel.
    Land,
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why the reducer left the snapshot unchanged.
///
/// Rejections are not errors in the Rust sense: the caller always receives
/// a valid snapshot. The reason exists so callers (and tests) can tell a
/// refused action apart from one that had no visible effect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
    thiserror::Error,
)]
#[ts(export, export_to = "bindings/")]
pub enum RejectionReason {
    /// No actor is connected.
    #[error("no actor is connected")]
    NoActor,
    /// The same actor is already connected.
    #[error("actor already connected")]
    AlreadyConnected,
    /// A placement was attempted without a build mode selected.
    #[error("no build mode selected")]
    BuildModeNotSelected,
    /// The position lies outside the grid.
    #[error("position is outside the grid")]
    OutOfBounds,
    /// The tile already holds a building.
    #[error("tile is occupied")]
    TileOccupied,
    /// The tile is not owned by the acting actor.
    #[error("tile is not owned by the actor")]
    TileNotOwned,
    /// The building does not exist in the registry.
    #[error("building not found")]
    BuildingNotFound,
    /// The acting actor does not own the building.
    #[error("actor does not own the building")]
    NotOwner,
    /// The building is already at its type's maximum level.
    #[error("building is at maximum level")]
    MaxLevelReached,
    /// The ledger does not hold enough currency.
    #[error("insufficient currency")]
    InsufficientFunds,
    /// The building type has no configured stats.
    #[error("building type is not configured")]
    UnconfiguredBuildingType,
    /// The cost curve has no entry for the requested level.
    #[error("no cost configured for this level")]
    CostNotConfigured,
    /// The proposal does not exist.
    #[error("proposal not found")]
    ProposalNotFound,
    /// The proposal is no longer accepting votes.
    #[error("proposal is not active")]
    ProposalNotActive,
    /// The actor has already voted on the proposal.
    #[error("actor already voted on this proposal")]
    AlreadyVoted,
    /// The proposal's embedded action targets a level or curve that does not exist.
    #[error("proposal action is invalid")]
    InvalidProposal,
    /// The market listing does not exist.
    #[error("listing not found")]
    ListingNotFound,
    /// The asking price is negative.
    #[error("asking price must not be negative")]
    InvalidPrice,
    /// The buyer owns no empty tile to receive the purchase.
    #[error("buyer owns no empty tile")]
    NoFreeTile,
    /// A tick arrived sooner than half the nominal tick interval.
    #[error("tick debounced")]
    Debounced,
    /// A checked ledger computation overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    /// Grid and registry disagree; the action was abandoned.
    #[error("world state is inconsistent")]
    InconsistentState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_road_is_road() {
        let roads: Vec<BuildingType> = BuildingType::ALL
            .into_iter()
            .filter(|t| t.is_road())
            .collect();
        assert_eq!(roads, vec![BuildingType::Road]);
    }

    #[test]
    fn only_active_is_non_terminal() {
        assert!(!ProposalStatus::Active.is_terminal());
        assert!(ProposalStatus::Passed.is_terminal());
        assert!(ProposalStatus::Failed.is_terminal());
    }

    #[test]
    fn rejection_reason_displays_message() {
        assert_eq!(
            RejectionReason::InsufficientFunds.to_string(),
            "insufficient currency"
        );
    }
}
