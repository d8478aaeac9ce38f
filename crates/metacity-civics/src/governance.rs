//! Governance proposals: create, vote, execute.
//!
//! A proposal embeds a single parameter change and collects weighted votes
//! until it expires. Resolution happens only when [`ProposalBook::execute_due`]
//! runs at a time strictly after `ends_at`:
//!
//! - `votes_for > votes_against` -- **passed**, the action is applied once.
//! - otherwise (including ties) -- **failed**, parameters are untouched.
//!
//! Status transitions are one-way; a terminal proposal never changes again.
//! Each actor votes at most once per proposal and cannot change the vote.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use metacity_types::{
    ActorId, GameParameters, Proposal, ProposalAction, ProposalDraft, ProposalId, ProposalStatus,
    RejectionReason, VoteChoice, VoteTally,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors specific to governance operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GovernanceError {
    /// No proposal has the given ID.
    #[error("proposal not found: {0}")]
    NotFound(ProposalId),

    /// The proposal has already resolved.
    #[error("proposal {0} is no longer active")]
    NotActive(ProposalId),

    /// The actor has already voted on this proposal.
    #[error("actor {actor} already voted on proposal {proposal}")]
    AlreadyVoted {
        /// The proposal.
        proposal: ProposalId,
        /// The voter.
        actor: ActorId,
    },

    /// The embedded action targets a missing type, level or curve, or
    /// carries a negative value.
    #[error("invalid proposal action: {0}")]
    InvalidAction(&'static str),

    /// A vote tally overflowed.
    #[error("vote tally overflow")]
    TallyOverflow,
}

impl From<GovernanceError> for RejectionReason {
    fn from(err: GovernanceError) -> Self {
        match err {
            GovernanceError::NotFound(_) => Self::ProposalNotFound,
            GovernanceError::NotActive(_) => Self::ProposalNotActive,
            GovernanceError::AlreadyVoted { .. } => Self::AlreadyVoted,
            GovernanceError::InvalidAction(_) => Self::InvalidProposal,
            GovernanceError::TallyOverflow => Self::ArithmeticOverflow,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// The outcome of resolving one expired proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalResolution {
    /// The resolved proposal.
    pub id: ProposalId,
    /// Terminal status reached.
    pub status: ProposalStatus,
    /// Final tally.
    pub votes: VoteTally,
}

// ---------------------------------------------------------------------------
// Action validation and application
// ---------------------------------------------------------------------------

/// Check that `action` targets an existing curve entry.
///
/// # Errors
///
/// Returns [`GovernanceError::InvalidAction`] describing the problem.
pub fn validate_action(
    action: &ProposalAction,
    parameters: &GameParameters,
) -> Result<(), GovernanceError> {
    let stats = parameters
        .stats(action.building_type())
        .ok_or(GovernanceError::InvalidAction("building type is not configured"))?;
    let level = action.level();
    if level == 0 || level > stats.max_level {
        return Err(GovernanceError::InvalidAction("level out of range"));
    }
    match action {
        ProposalAction::UpdateBuildingCost { new_cost, .. } => {
            if *new_cost < Decimal::ZERO {
                return Err(GovernanceError::InvalidAction("cost must not be negative"));
            }
            stats
                .cost_to_reach(level)
                .map(|_| ())
                .ok_or(GovernanceError::InvalidAction("no cost entry for level"))
        }
        ProposalAction::UpdateProductionRate { new_rate, .. } => {
            if *new_rate < Decimal::ZERO {
                return Err(GovernanceError::InvalidAction("rate must not be negative"));
            }
            let production = stats
                .production
                .as_ref()
                .ok_or(GovernanceError::InvalidAction("building type does not produce"))?;
            let index = usize::try_from(level.saturating_sub(1))
                .map_err(|_err| GovernanceError::InvalidAction("level out of range"))?;
            production
                .rate
                .get(index)
                .map(|_| ())
                .ok_or(GovernanceError::InvalidAction("no rate entry for level"))
        }
    }
}

/// Apply a passed proposal's action to the parameters.
///
/// # Errors
///
/// Returns [`GovernanceError::InvalidAction`] if the target entry no longer
/// exists; the parameters are unchanged in that case.
pub fn apply_action(
    action: &ProposalAction,
    parameters: &mut GameParameters,
) -> Result<(), GovernanceError> {
    validate_action(action, parameters)?;
    let stats = parameters
        .building_stats
        .get_mut(&action.building_type())
        .ok_or(GovernanceError::InvalidAction("building type is not configured"))?;
    let index = usize::try_from(action.level().saturating_sub(1))
        .map_err(|_err| GovernanceError::InvalidAction("level out of range"))?;

    let slot = match action {
        ProposalAction::UpdateBuildingCost { new_cost, .. } => {
            stats.cost.get_mut(index).map(|slot| (slot, *new_cost))
        }
        ProposalAction::UpdateProductionRate { new_rate, .. } => stats
            .production
            .as_mut()
            .and_then(|p| p.rate.get_mut(index))
            .map(|slot| (slot, *new_rate)),
    };
    let (slot, value) = slot.ok_or(GovernanceError::InvalidAction("missing curve entry"))?;
    *slot = value;
    Ok(())
}

// ---------------------------------------------------------------------------
// ProposalBook
// ---------------------------------------------------------------------------

/// All proposals ever created, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalBook {
    proposals: Vec<Proposal>,
}

impl ProposalBook {
    /// Create an empty book.
    pub const fn new() -> Self {
        Self {
            proposals: Vec::new(),
        }
    }

    /// Open a new proposal that accepts votes for `duration`.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::InvalidAction`] if the embedded action
    /// does not target an existing curve entry.
    pub fn create(
        &mut self,
        draft: ProposalDraft,
        proposer: ActorId,
        parameters: &GameParameters,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Result<ProposalId, GovernanceError> {
        validate_action(&draft.action, parameters)?;
        let ends_at = now
            .checked_add_signed(duration)
            .ok_or(GovernanceError::InvalidAction("expiry out of range"))?;

        let id = ProposalId::new();
        self.proposals.push(Proposal {
            id,
            title: draft.title,
            description: draft.description,
            proposer,
            status: ProposalStatus::Active,
            votes: VoteTally::default(),
            voters: BTreeMap::new(),
            action: draft.action,
            created_at: now,
            ends_at,
        });
        Ok(id)
    }

    /// Record `actor`'s vote with weight `power`.
    ///
    /// Voting on an expired-but-unresolved proposal is still accepted; only
    /// resolution closes a proposal.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::NotFound`], [`GovernanceError::NotActive`]
    /// or [`GovernanceError::AlreadyVoted`]. The tally is unchanged on error.
    pub fn vote(
        &mut self,
        id: ProposalId,
        actor: &ActorId,
        choice: VoteChoice,
        power: u64,
    ) -> Result<(), GovernanceError> {
        let proposal = self
            .proposals
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GovernanceError::NotFound(id))?;
        if proposal.status != ProposalStatus::Active {
            return Err(GovernanceError::NotActive(id));
        }
        if proposal.voters.contains_key(actor) {
            return Err(GovernanceError::AlreadyVoted {
                proposal: id,
                actor: actor.clone(),
            });
        }

        let tally = &mut proposal.votes;
        match choice {
            VoteChoice::For => {
                tally.votes_for = tally
                    .votes_for
                    .checked_add(power)
                    .ok_or(GovernanceError::TallyOverflow)?;
            }
            VoteChoice::Against => {
                tally.votes_against = tally
                    .votes_against
                    .checked_add(power)
                    .ok_or(GovernanceError::TallyOverflow)?;
            }
        }
        proposal.voters.insert(actor.clone(), choice);
        Ok(())
    }

    /// Resolve every active proposal whose `ends_at` is strictly before
    /// `now`, applying the actions of those that pass.
    ///
    /// A passed proposal whose action can no longer be applied still passes;
    /// the failure is logged and the parameters are left as they were.
    pub fn execute_due(
        &mut self,
        now: DateTime<Utc>,
        parameters: &mut GameParameters,
    ) -> Vec<ProposalResolution> {
        let mut resolved = Vec::new();
        for proposal in &mut self.proposals {
            if proposal.status != ProposalStatus::Active || now <= proposal.ends_at {
                continue;
            }
            if proposal.votes.votes_for > proposal.votes.votes_against {
                proposal.status = ProposalStatus::Passed;
                if let Err(e) = apply_action(&proposal.action, parameters) {
                    tracing::warn!(
                        proposal_id = %proposal.id,
                        error = %e,
                        "Passed proposal could not be applied"
                    );
                }
            } else {
                proposal.status = ProposalStatus::Failed;
            }
            tracing::info!(
                proposal_id = %proposal.id,
                title = %proposal.title,
                status = ?proposal.status,
                votes_for = proposal.votes.votes_for,
                votes_against = proposal.votes.votes_against,
                "Proposal resolved"
            );
            resolved.push(ProposalResolution {
                id: proposal.id,
                status: proposal.status,
                votes: proposal.votes,
            });
        }
        resolved
    }

    /// Look up a proposal.
    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.id == id)
    }

    /// Iterate over proposals in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.iter()
    }

    /// Number of proposals.
    pub const fn len(&self) -> usize {
        self.proposals.len()
    }

    /// Whether there are no proposals.
    pub const fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Whether `actor` has voted on any proposal.
    pub fn has_voted(&self, actor: &ActorId) -> bool {
        self.proposals.iter().any(|p| p.voters.contains_key(actor))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use metacity_types::BuildingType;
    use metacity_world::default_parameters;
    use rust_decimal_macros::dec;

    use super::*;

    fn draft(action: ProposalAction) -> ProposalDraft {
        ProposalDraft {
            title: "Cheaper shops".to_owned(),
            description: "Lower the commercial placement cost".to_owned(),
            action,
        }
    }

    fn cost_cut() -> ProposalAction {
        ProposalAction::UpdateBuildingCost {
            building_type: BuildingType::Commercial,
            level: 1,
            new_cost: dec!(50),
        }
    }

    fn open(book: &mut ProposalBook, params: &GameParameters, now: DateTime<Utc>) -> ProposalId {
        book.create(
            draft(cost_cut()),
            ActorId::new("alice"),
            params,
            now,
            Duration::minutes(3),
        )
        .unwrap()
    }

    #[test]
    fn double_vote_counts_once() {
        let params = default_parameters();
        let mut book = ProposalBook::new();
        let id = open(&mut book, &params, Utc::now());
        let alice = ActorId::new("alice");

        book.vote(id, &alice, VoteChoice::For, 4).unwrap();
        let second = book.vote(id, &alice, VoteChoice::Against, 4);
        assert!(matches!(second, Err(GovernanceError::AlreadyVoted { .. })));

        let proposal = book.get(id).unwrap();
        assert_eq!(proposal.votes.votes_for, 4);
        assert_eq!(proposal.votes.votes_against, 0);
        assert_eq!(proposal.voters.len(), 1);
    }

    #[test]
    fn passes_only_strictly_after_expiry() {
        let mut params = default_parameters();
        let mut book = ProposalBook::new();
        let start = Utc::now();
        let id = open(&mut book, &params, start);
        book.vote(id, &ActorId::new("alice"), VoteChoice::For, 2).unwrap();
        let ends_at = book.get(id).unwrap().ends_at;

        assert!(book.execute_due(ends_at, &mut params).is_empty());
        assert_eq!(book.get(id).unwrap().status, ProposalStatus::Active);

        let resolved = book.execute_due(ends_at + Duration::milliseconds(1), &mut params);
        assert_eq!(resolved.len(), 1);
        assert_eq!(book.get(id).unwrap().status, ProposalStatus::Passed);
        let commercial = params.stats(BuildingType::Commercial).unwrap();
        assert_eq!(commercial.cost_to_reach(1), Some(dec!(50)));
    }

    #[test]
    fn three_for_five_against_fails_without_change() {
        let mut params = default_parameters();
        let before = params.clone();
        let mut book = ProposalBook::new();
        let start = Utc::now();
        let id = open(&mut book, &params, start);
        book.vote(id, &ActorId::new("alice"), VoteChoice::For, 3).unwrap();
        book.vote(id, &ActorId::new("bob"), VoteChoice::Against, 5).unwrap();

        book.execute_due(start + Duration::minutes(4), &mut params);
        assert_eq!(book.get(id).unwrap().status, ProposalStatus::Failed);
        assert_eq!(params, before);
    }

    #[test]
    fn tie_fails() {
        let mut params = default_parameters();
        let mut book = ProposalBook::new();
        let start = Utc::now();
        let id = open(&mut book, &params, start);
        book.vote(id, &ActorId::new("alice"), VoteChoice::For, 2).unwrap();
        book.vote(id, &ActorId::new("bob"), VoteChoice::Against, 2).unwrap();
        book.execute_due(start + Duration::minutes(4), &mut params);
        assert_eq!(book.get(id).unwrap().status, ProposalStatus::Failed);
    }

    #[test]
    fn terminal_proposals_reject_votes_and_do_not_reapply() {
        let mut params = default_parameters();
        let mut book = ProposalBook::new();
        let start = Utc::now();
        let id = open(&mut book, &params, start);
        book.vote(id, &ActorId::new("alice"), VoteChoice::For, 1).unwrap();
        book.execute_due(start + Duration::minutes(4), &mut params);

        let late = book.vote(id, &ActorId::new("bob"), VoteChoice::Against, 1);
        assert!(matches!(late, Err(GovernanceError::NotActive(_))));
        assert!(book.execute_due(start + Duration::minutes(5), &mut params).is_empty());
    }

    #[test]
    fn invalid_actions_are_refused_at_creation() {
        let params = default_parameters();
        let mut book = ProposalBook::new();
        let bad_level = ProposalAction::UpdateBuildingCost {
            building_type: BuildingType::Road,
            level: 2,
            new_cost: dec!(5),
        };
        let no_production = ProposalAction::UpdateProductionRate {
            building_type: BuildingType::Park,
            level: 1,
            new_rate: dec!(5),
        };
        for action in [bad_level, no_production] {
            let result = book.create(
                draft(action),
                ActorId::new("alice"),
                &params,
                Utc::now(),
                Duration::minutes(3),
            );
            assert!(matches!(result, Err(GovernanceError::InvalidAction(_))));
        }
        assert!(book.is_empty());
    }

    #[test]
    fn production_rate_change_applies() {
        let mut params = default_parameters();
        let action = ProposalAction::UpdateProductionRate {
            building_type: BuildingType::Industrial,
            level: 2,
            new_rate: dec!(99),
        };
        apply_action(&action, &mut params).unwrap();
        let industrial = params.stats(BuildingType::Industrial).unwrap();
        assert_eq!(industrial.rate_at(2), dec!(99));
    }
}
