//! Request/response contracts for the AI flavor-text collaborators.
//!
//! Flavor text is cosmetic. Requests are derived from a snapshot at call
//! time and responses are shown to the player but never merged back into
//! simulation state. Field names serialize in camelCase because these
//! payloads are rendered into prompts and parsed out of model replies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::BuildingType;

// ---------------------------------------------------------------------------
// Building description
// ---------------------------------------------------------------------------

/// Input for a short building description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct BuildingDescriptionRequest {
    /// The building's type.
    pub building_type: BuildingType,
    /// The building's current level.
    pub level: u32,
    /// Production per second at that level.
    #[ts(as = "String")]
    pub production_rate: Decimal,
    /// Adjacency bonus in effect, if any.
    #[ts(as = "Option<String>")]
    pub adjacency_bonus: Option<Decimal>,
    /// The type's base description, if configured.
    pub base_description: Option<String>,
}

/// A generated building description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BuildingDescription {
    /// One or two sentences of flavor text.
    pub text: String,
}

// ---------------------------------------------------------------------------
// News headline
// ---------------------------------------------------------------------------

/// Input for a city news headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewsHeadlineRequest {
    /// Current currency.
    #[ts(as = "String")]
    pub currency: Decimal,
    /// Current population.
    #[ts(as = "String")]
    pub population: Decimal,
    /// Current morale.
    #[ts(as = "String")]
    pub morale: Decimal,
}

/// A generated news headline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewsHeadline {
    /// The headline text.
    pub headline: String,
}

// ---------------------------------------------------------------------------
// Tutorial hint
// ---------------------------------------------------------------------------

/// Progress milestones derived from a snapshot and reported to the
/// tutorial-hint collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Objective {
    /// An actor is connected.
    ConnectWallet,
    /// The connected actor owns at least one building.
    FirstBuilding,
    /// A road exists on the grid.
    FirstRoad,
    /// Some building has been upgraded past level 1.
    FirstUpgrade,
    /// At least one proposal exists.
    FirstProposal,
    /// The connected actor has voted on some proposal.
    FirstVote,
    /// The connected actor has a building listed for sale.
    FirstListing,
}

/// Input for an AI tutorial hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TutorialHintRequest {
    /// Current currency.
    #[ts(as = "String")]
    pub currency: Decimal,
    /// Current population.
    #[ts(as = "String")]
    pub population: Decimal,
    /// Current morale.
    #[ts(as = "String")]
    pub morale: Decimal,
    /// Number of buildings in the registry.
    pub buildings_built: u32,
    /// Objectives completed so far.
    pub completed_objectives: Vec<Objective>,
}

/// A generated tutorial hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TutorialHint {
    /// The suggested next step.
    pub step_text: String,
    /// Why the step is suggested.
    pub rationale: String,
}

/// A deterministic suggestion produced by the rule-based tutorial advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TutorialSuggestion {
    /// Short title.
    pub title: String,
    /// One-sentence explanation.
    pub description: String,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn description_request_uses_camel_case() {
        let request = BuildingDescriptionRequest {
            building_type: BuildingType::Commercial,
            level: 2,
            production_rate: dec!(25),
            adjacency_bonus: None,
            base_description: None,
        };
        let json = serde_json::to_value(&request).unwrap_or_default();
        assert!(json.get("buildingType").is_some());
        assert!(json.get("productionRate").is_some());
    }

    #[test]
    fn hint_parses_from_model_shape() {
        let raw = r#"{"stepText":"Build a park","rationale":"Morale is low"}"#;
        let hint: Option<TutorialHint> = serde_json::from_str(raw).ok();
        assert_eq!(
            hint.map(|h| h.step_text),
            Some("Build a park".to_owned())
        );
    }
}
