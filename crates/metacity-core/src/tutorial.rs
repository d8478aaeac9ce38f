//! Rule-based tutorial advisor.
//!
//! [`suggest`] picks the single most useful next step for the player from
//! the current state. The first two tutorial steps are scripted; after that
//! the first matching rule wins, in this order: low morale, low treasury,
//! low population, no roads, and finally a generic expansion hint.

use metacity_types::{BuildingType, Objective, TutorialSuggestion};
use rust_decimal::Decimal;

use crate::state::GameState;

/// The scripted walkthrough shown in the tutorial panel, one line per step.
pub const WALKTHROUGH_STEPS: [&str; 6] = [
    "Connect your wallet to begin.",
    "Select a 'Commercial' building from the menu on the right.",
    "Click on one of your owned (lightly colored) empty tiles to place the building.",
    "Select your new building on the map to see its info.",
    "Try upgrading your building from the info panel.",
    "Explore Governance and the Marketplace using the buttons on the top left.",
];

/// Morale below which the advisor recommends a park.
const LOW_MORALE: i64 = 40;
/// Currency below which the advisor recommends commercial buildings.
const LOW_TREASURY: i64 = 200;
/// Population below which the advisor recommends housing.
const LOW_POPULATION: i64 = 20;

fn suggestion(title: &str, description: &str) -> TutorialSuggestion {
    TutorialSuggestion {
        title: title.to_owned(),
        description: description.to_owned(),
    }
}

/// The advisor's recommendation for `state`.
pub fn suggest(state: &GameState) -> TutorialSuggestion {
    match state.tutorial_step {
        0 => {
            return suggestion(
                "Welcome to MetaCity!",
                "Let's get started. Click the 'Connect Wallet' button on the top right to join the network.",
            );
        }
        1 => {
            return suggestion(
                "Place a Building",
                "You own some land. Select 'Commercial' from the Build menu on the right, then click an empty tile you own on the map to build it.",
            );
        }
        _ => {}
    }

    let resources = state.resources();
    let commercial = state.buildings.count_of_type(BuildingType::Commercial);
    let residential = state.buildings.count_of_type(BuildingType::Residential);

    if resources.morale < Decimal::from(LOW_MORALE) {
        return suggestion(
            "Boost Happiness",
            "Your citizens are unhappy! Build a Park to improve their mood and boost overall productivity.",
        );
    }
    if resources.currency < Decimal::from(LOW_TREASURY) && commercial < 2 {
        return suggestion(
            "Increase Income",
            "Your treasury is low. Build more Commercial buildings to generate more Gold tokens.",
        );
    }
    if resources.population < Decimal::from(LOW_POPULATION) && residential < 3 {
        return suggestion(
            "Grow Population",
            "You need more citizens to operate your city. Build Residential structures to attract more people.",
        );
    }
    if state.buildings.count_of_type(BuildingType::Road) == 0 {
        return suggestion(
            "Build Roads",
            "Connect your buildings with Roads to give them a 20% production bonus!",
        );
    }
    suggestion(
        "City Expansion",
        "Your city is growing! Try upgrading a building by selecting it on the map and clicking 'Upgrade' on the right panel.",
    )
}

/// The walkthrough line for `step`, if the step exists.
pub fn walkthrough_step(step: u32) -> Option<&'static str> {
    usize::try_from(step)
        .ok()
        .and_then(|i| WALKTHROUGH_STEPS.get(i))
        .copied()
}

/// Milestones the connected actor has reached.
///
/// The starting house does not count toward [`Objective::FirstBuilding`];
/// the actor must own a second building. Without a connected actor the list
/// is empty.
pub fn objectives(state: &GameState) -> Vec<Objective> {
    let Some(actor) = state.actor.as_ref() else {
        return Vec::new();
    };
    let owned = || state.buildings.iter().filter(|b| &b.owner == actor);

    let mut reached = vec![Objective::ConnectWallet];
    if state.buildings.count_owned_by(actor) >= 2 {
        reached.push(Objective::FirstBuilding);
    }
    if owned().any(|b| b.building_type.is_road()) {
        reached.push(Objective::FirstRoad);
    }
    if owned().any(|b| b.level > 1) {
        reached.push(Objective::FirstUpgrade);
    }
    if state.proposals.iter().any(|p| &p.proposer == actor) {
        reached.push(Objective::FirstProposal);
    }
    if state.proposals.has_voted(actor) {
        reached.push(Objective::FirstVote);
    }
    if state.market.has_listing_from(actor) {
        reached.push(Objective::FirstListing);
    }
    reached
}
