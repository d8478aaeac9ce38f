//! The closed set of state transitions the reducer accepts.
//!
//! Actions arrive from the scheduler (ticks, proposal execution), from the
//! observer's HTTP intake, and from the engine when it restores a saved
//! snapshot. On the wire an action is `{"type": "PLACE_BUILDING",
//! "payload": {...}}`.

use chrono::{DateTime, Utc};
use metacity_types::{
    ActorId, BuildingId, BuildingType, ListingId, Position, ProposalDraft, ProposalId, VoteChoice,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::state::GameState;

/// A request to change the game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Advance the economy to `now`.
    Tick {
        /// Wall-clock time of the tick.
        now: DateTime<Utc>,
    },
    /// Attach an actor to the session.
    #[serde(rename = "CONNECT")]
    ConnectActor(ActorId),
    /// Detach the current actor.
    #[serde(rename = "DISCONNECT")]
    DisconnectActor,
    /// Arm (or disarm) a building type for placement.
    SetBuildMode(Option<BuildingType>),
    /// Select (or clear) a tile.
    SelectTile(Option<Position>),
    /// Build a level-1 building. Requires an armed build mode.
    PlaceBuilding {
        /// Target tile.
        position: Position,
        /// Type to build and charge for.
        building_type: BuildingType,
    },
    /// Raise a building by one level.
    UpgradeBuilding {
        /// The building.
        building_id: BuildingId,
    },
    /// Remove a building and burn its token.
    DemolishBuilding {
        /// The building.
        building_id: BuildingId,
    },
    /// Open a governance proposal.
    CreateProposal(ProposalDraft),
    /// Cast the connected actor's vote.
    VoteOnProposal {
        /// The proposal.
        proposal_id: ProposalId,
        /// For or against.
        vote: VoteChoice,
    },
    /// Resolve every proposal whose voting window has closed.
    ExecuteProposals,
    /// List a building for sale.
    ListItem {
        /// The building.
        building_id: BuildingId,
        /// Asking price.
        price: Decimal,
    },
    /// Buy a listing.
    BuyItem {
        /// The listing.
        listing_id: ListingId,
    },
    /// Move the tutorial to a step.
    SetTutorialStep(u32),
    /// Open or close the tutorial panel.
    ToggleTutorial(bool),
    /// Replace the whole state with a restored snapshot.
    LoadState(Box<GameState>),
    /// Mark the state as loading or ready.
    SetIsLoading(bool),
}

impl Action {
    /// Short name for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::ConnectActor(_) => "connect",
            Self::DisconnectActor => "disconnect",
            Self::SetBuildMode(_) => "set_build_mode",
            Self::SelectTile(_) => "select_tile",
            Self::PlaceBuilding { .. } => "place_building",
            Self::UpgradeBuilding { .. } => "upgrade_building",
            Self::DemolishBuilding { .. } => "demolish_building",
            Self::CreateProposal(_) => "create_proposal",
            Self::VoteOnProposal { .. } => "vote_on_proposal",
            Self::ExecuteProposals => "execute_proposals",
            Self::ListItem { .. } => "list_item",
            Self::BuyItem { .. } => "buy_item",
            Self::SetTutorialStep(_) => "set_tutorial_step",
            Self::ToggleTutorial(_) => "toggle_tutorial",
            Self::LoadState(_) => "load_state",
            Self::SetIsLoading(_) => "set_is_loading",
        }
    }

    /// Whether this action is produced by the scheduler rather than a player.
    pub const fn is_scheduled(&self) -> bool {
        matches!(self, Self::Tick { .. } | Self::ExecuteProposals)
    }
}
