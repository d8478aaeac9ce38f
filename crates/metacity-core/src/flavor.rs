//! Requests for the AI flavor-text collaborator, derived from a snapshot.
//!
//! These functions only read state. The collaborator's answers are shown
//! to the player and never written back.

use metacity_types::{
    BuildingDescriptionRequest, BuildingId, NewsHeadlineRequest, TutorialHintRequest,
};

use crate::state::GameState;
use crate::tutorial::objectives;

/// Inputs for a news headline about the city.
pub fn headline_request(state: &GameState) -> NewsHeadlineRequest {
    let resources = state.resources();
    NewsHeadlineRequest {
        currency: resources.currency,
        population: resources.population,
        morale: resources.morale,
    }
}

/// Inputs for a personalised tutorial hint.
pub fn tutorial_hint_request(state: &GameState) -> TutorialHintRequest {
    let resources = state.resources();
    let built = state
        .actor
        .as_ref()
        .map_or(0, |actor| state.buildings.count_owned_by(actor));
    TutorialHintRequest {
        currency: resources.currency,
        population: resources.population,
        morale: resources.morale,
        buildings_built: u32::try_from(built).unwrap_or(u32::MAX),
        completed_objectives: objectives(state),
    }
}

/// Inputs for a building description, or `None` if the building is not
/// registered.
///
/// The adjacency bonus is included only when the building currently
/// receives it.
pub fn description_request(
    state: &GameState,
    building_id: BuildingId,
) -> Option<BuildingDescriptionRequest> {
    let building = state.buildings.get(building_id)?;
    let stats = state.parameters.stats(building.building_type);
    let boosted = !building.building_type.is_road()
        && state
            .grid
            .has_adjacent_road(building.position, &state.buildings);

    Some(BuildingDescriptionRequest {
        building_type: building.building_type,
        level: building.level,
        production_rate: stats.map(|s| s.rate_at(building.level)).unwrap_or_default(),
        adjacency_bonus: boosted.then_some(state.parameters.adjacency_bonus),
        base_description: stats.map(|s| s.description.clone()),
    })
}
