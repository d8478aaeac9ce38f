//! The single-writer state transition function.
//!
//! [`Reducer::apply`] takes the current [`GameState`] and an [`Action`] and
//! returns the next state together with an [`Outcome`]. Every handler
//! checks its preconditions before touching anything, and the reducer runs
//! it against a working copy: a rejected action always hands back the
//! original snapshot untouched.
//!
//! # Tick rule
//!
//! A tick arriving less than half a tick interval after the previous one is
//! debounced. Otherwise production is computed for the elapsed wall-clock
//! time, added to the ledger, and morale drifts toward its target.

use chrono::{DateTime, Duration, Utc};
use metacity_civics::{MarketContext, MarketError, Marketplace};
use metacity_ledger::{EconomyInputs, EconomySettings, compute_gains};
use metacity_types::{
    ActorId, Building, BuildingId, BuildingType, ListingId, Position, ProposalDraft, ProposalId,
    RejectionReason, VoteChoice,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::Action;
use crate::config::SimulationConfig;
use crate::state::GameState;

// ---------------------------------------------------------------------------
// Rules and results
// ---------------------------------------------------------------------------

/// Tunables the reducer needs beyond the state itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReducerRules {
    /// Nominal tick interval; ticks closer than half of it are debounced.
    pub tick_interval_ms: u64,
    /// Voting window for new proposals.
    pub proposal_duration: Duration,
    /// Morale and multiplier settings.
    pub economy: EconomySettings,
    /// Credit the ledger when the connected actor buys their own listing.
    pub credit_seller: bool,
}

impl ReducerRules {
    /// Derive rules from the loaded configuration.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            tick_interval_ms: config.timing.tick_interval_ms,
            proposal_duration: config.timing.proposal_duration(),
            economy: config.economy.settings(),
            credit_seller: config.market.credit_seller,
        }
    }
}

impl Default for ReducerRules {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

/// Whether an action changed the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    /// The action was applied.
    Applied,
    /// The action was refused and the state is unchanged.
    Rejected(RejectionReason),
}

impl Outcome {
    /// Whether the action was applied.
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// The result of one reducer step.
#[derive(Debug, Clone)]
pub struct Transition {
    /// The next state (the input state if rejected).
    pub state: GameState,
    /// What happened.
    pub outcome: Outcome,
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// Applies actions to game states.
#[derive(Debug, Clone, Default)]
pub struct Reducer {
    rules: ReducerRules,
}

impl Reducer {
    /// Create a reducer with the given rules.
    pub const fn new(rules: ReducerRules) -> Self {
        Self { rules }
    }

    /// The rules in effect.
    pub const fn rules(&self) -> &ReducerRules {
        &self.rules
    }

    /// Apply `action` to `state`.
    ///
    /// `now` stamps new buildings, proposals and NFT records and decides
    /// which proposals are due. Ticks carry their own time.
    pub fn apply(&self, state: GameState, action: &Action, now: DateTime<Utc>) -> Transition {
        let mut next = state.clone();
        match self.step(&mut next, action, now) {
            Ok(()) => {
                debug!(action = action.kind(), "Action applied");
                Transition {
                    state: next,
                    outcome: Outcome::Applied,
                }
            }
            Err(reason) => {
                debug!(action = action.kind(), %reason, "Action rejected");
                Transition {
                    state,
                    outcome: Outcome::Rejected(reason),
                }
            }
        }
    }

    fn step(
        &self,
        state: &mut GameState,
        action: &Action,
        now: DateTime<Utc>,
    ) -> Result<(), RejectionReason> {
        match action {
            Action::Tick { now: tick_at } => self.tick(state, *tick_at),
            Action::ConnectActor(actor) => connect(state, actor),
            Action::DisconnectActor => {
                state.actor = None;
                Ok(())
            }
            Action::SetBuildMode(mode) => {
                state.build_mode = *mode;
                state.selected_tile = None;
                Ok(())
            }
            Action::SelectTile(position) => {
                state.selected_tile = *position;
                state.build_mode = None;
                Ok(())
            }
            Action::PlaceBuilding {
                position,
                building_type,
            } => place_building(state, *position, *building_type, now),
            Action::UpgradeBuilding { building_id } => upgrade_building(state, *building_id),
            Action::DemolishBuilding { building_id } => demolish_building(state, *building_id),
            Action::CreateProposal(draft) => self.create_proposal(state, draft, now),
            Action::VoteOnProposal { proposal_id, vote } => {
                vote_on_proposal(state, *proposal_id, *vote)
            }
            Action::ExecuteProposals => {
                state.proposals.execute_due(now, &mut state.parameters);
                Ok(())
            }
            Action::ListItem { building_id, price } => list_item(state, *building_id, *price),
            Action::BuyItem { listing_id } => self.buy_item(state, *listing_id, now),
            Action::SetTutorialStep(step) => {
                state.tutorial_step = *step;
                Ok(())
            }
            Action::ToggleTutorial(open) => {
                state.is_tutorial_open = *open;
                Ok(())
            }
            Action::LoadState(loaded) => load_state(state, loaded),
            Action::SetIsLoading(loading) => {
                state.is_loading = *loading;
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Handlers that depend on the rules
    // -----------------------------------------------------------------------

    fn tick(&self, state: &mut GameState, now: DateTime<Utc>) -> Result<(), RejectionReason> {
        let elapsed = now
            .signed_duration_since(state.last_update)
            .num_milliseconds();
        let half_interval = i64::try_from(self.rules.tick_interval_ms / 2).unwrap_or(i64::MAX);
        if elapsed < half_interval {
            return Err(RejectionReason::Debounced);
        }
        let elapsed_ms = u64::try_from(elapsed).map_err(|_negative| RejectionReason::Debounced)?;

        let inputs = EconomyInputs {
            grid: &state.grid,
            registry: &state.buildings,
            parameters: &state.parameters,
            morale: state.ledger.morale(),
        };
        let gains = compute_gains(&inputs, elapsed_ms, &self.rules.economy)
            .map_err(|_ledger_err| RejectionReason::ArithmeticOverflow)?;
        state
            .ledger
            .apply_gains(&gains, &self.rules.economy)
            .map_err(|_ledger_err| RejectionReason::ArithmeticOverflow)?;
        state.last_update = now;

        debug!(
            elapsed_ms,
            currency = %state.ledger.currency(),
            population = %state.ledger.population(),
            morale = %state.ledger.morale(),
            "Tick applied"
        );
        Ok(())
    }

    fn create_proposal(
        &self,
        state: &mut GameState,
        draft: &ProposalDraft,
        now: DateTime<Utc>,
    ) -> Result<(), RejectionReason> {
        let proposer = connected(state)?.clone();
        let id = state.proposals.create(
            draft.clone(),
            proposer.clone(),
            &state.parameters,
            now,
            self.rules.proposal_duration,
        )?;
        debug!(proposal_id = %id, proposer = %proposer, "Proposal created");
        Ok(())
    }

    fn buy_item(
        &self,
        state: &mut GameState,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> Result<(), RejectionReason> {
        let buyer = connected(state)?.clone();
        let purchase = with_market(state, |market, ctx| {
            market.buy(ctx, listing_id, &buyer, now)
        })?;
        if self.rules.credit_seller && purchase.seller == buyer {
            state
                .ledger
                .credit(purchase.price)
                .map_err(|_ledger_err| RejectionReason::ArithmeticOverflow)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stateless handlers
// ---------------------------------------------------------------------------

fn connected(state: &GameState) -> Result<&ActorId, RejectionReason> {
    state.actor.as_ref().ok_or(RejectionReason::NoActor)
}

fn connect(state: &mut GameState, actor: &ActorId) -> Result<(), RejectionReason> {
    if state.actor.as_ref() == Some(actor) {
        return Err(RejectionReason::AlreadyConnected);
    }
    state.actor = Some(actor.clone());
    Ok(())
}

fn place_building(
    state: &mut GameState,
    position: Position,
    building_type: BuildingType,
    now: DateTime<Utc>,
) -> Result<(), RejectionReason> {
    if state.build_mode.is_none() {
        return Err(RejectionReason::BuildModeNotSelected);
    }
    let owner = connected(state)?.clone();
    let tile = state
        .grid
        .tile(position)
        .ok_or(RejectionReason::OutOfBounds)?;
    if tile.building_id.is_some() {
        return Err(RejectionReason::TileOccupied);
    }
    if tile.owner.as_ref() != Some(&owner) {
        return Err(RejectionReason::TileNotOwned);
    }
    let cost = state
        .parameters
        .stats(building_type)
        .ok_or(RejectionReason::UnconfiguredBuildingType)?
        .cost_to_reach(1)
        .ok_or(RejectionReason::CostNotConfigured)?;
    if !state.ledger.can_afford(cost) {
        return Err(RejectionReason::InsufficientFunds);
    }

    let building = Building {
        id: BuildingId::new(),
        owner,
        building_type,
        level: 1,
        position,
        created_at: now,
    };
    state
        .grid
        .link_building(position, building.id)
        .map_err(|_world_err| RejectionReason::InconsistentState)?;
    state
        .ledger
        .spend(cost)
        .map_err(|_ledger_err| RejectionReason::InsufficientFunds)?;
    state.nfts.mint_building(&building, now);
    debug!(
        building_id = %building.id,
        building_type = ?building_type,
        %position,
        %cost,
        "Building placed"
    );
    state
        .buildings
        .insert(building)
        .map_err(|_world_err| RejectionReason::InconsistentState)?;
    state.build_mode = None;
    Ok(())
}

fn upgrade_building(state: &mut GameState, building_id: BuildingId) -> Result<(), RejectionReason> {
    let actor = connected(state)?.clone();
    let building = state
        .buildings
        .get(building_id)
        .ok_or(RejectionReason::BuildingNotFound)?;
    if building.owner != actor {
        return Err(RejectionReason::NotOwner);
    }
    let stats = state
        .parameters
        .stats(building.building_type)
        .ok_or(RejectionReason::UnconfiguredBuildingType)?;
    if building.level >= stats.max_level {
        return Err(RejectionReason::MaxLevelReached);
    }
    let next_level = building
        .level
        .checked_add(1)
        .ok_or(RejectionReason::ArithmeticOverflow)?;
    let cost = stats
        .cost_to_reach(next_level)
        .ok_or(RejectionReason::CostNotConfigured)?;
    if !state.ledger.can_afford(cost) {
        return Err(RejectionReason::InsufficientFunds);
    }

    state
        .ledger
        .spend(cost)
        .map_err(|_ledger_err| RejectionReason::InsufficientFunds)?;
    let building = state
        .buildings
        .get_mut(building_id)
        .ok_or(RejectionReason::BuildingNotFound)?;
    building.level = next_level;
    debug!(%building_id, level = next_level, %cost, "Building upgraded");
    Ok(())
}

fn demolish_building(
    state: &mut GameState,
    building_id: BuildingId,
) -> Result<(), RejectionReason> {
    let actor = connected(state)?;
    let building = state
        .buildings
        .get(building_id)
        .ok_or(RejectionReason::BuildingNotFound)?;
    if &building.owner != actor {
        return Err(RejectionReason::NotOwner);
    }

    let building = state
        .buildings
        .remove(building_id)
        .ok_or(RejectionReason::BuildingNotFound)?;
    state
        .grid
        .unlink_building(building.position)
        .map_err(|_world_err| RejectionReason::InconsistentState)?;
    let burned = state.nfts.burn_building(building_id);
    state.selected_tile = None;
    debug!(%building_id, burned, "Building demolished");
    Ok(())
}

fn vote_on_proposal(
    state: &mut GameState,
    proposal_id: ProposalId,
    vote: VoteChoice,
) -> Result<(), RejectionReason> {
    let voter = connected(state)?.clone();
    let power = state.nfts.voting_power(&voter);
    state.proposals.vote(proposal_id, &voter, vote, power)?;
    debug!(%proposal_id, voter = %voter, ?vote, power, "Vote recorded");
    Ok(())
}

fn list_item(
    state: &mut GameState,
    building_id: BuildingId,
    price: Decimal,
) -> Result<(), RejectionReason> {
    let seller = connected(state)?.clone();
    with_market(state, |market, ctx| {
        market.list_building(ctx, building_id, &seller, price)
    })?;
    Ok(())
}

fn load_state(state: &mut GameState, loaded: &GameState) -> Result<(), RejectionReason> {
    loaded.verify_invariants().map_err(|violation| {
        debug!(%violation, "Refusing inconsistent snapshot");
        RejectionReason::InconsistentState
    })?;
    *state = loaded.clone();
    state.is_loading = false;
    Ok(())
}

/// Run a marketplace operation against the state's grid, registry, NFTs
/// and ledger.
fn with_market<T>(
    state: &mut GameState,
    op: impl FnOnce(&mut Marketplace, &mut MarketContext<'_>) -> Result<T, MarketError>,
) -> Result<T, RejectionReason> {
    let mut ctx = MarketContext {
        grid: &mut state.grid,
        registry: &mut state.buildings,
        nfts: &mut state.nfts,
        ledger: &mut state.ledger,
    };
    op(&mut state.market, &mut ctx).map_err(RejectionReason::from)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
