//! Building registry: the arena of live buildings keyed by ID.
//!
//! Buildings that are listed on the marketplace are *not* in the registry;
//! the listing carries the detached record until a purchase re-registers it.

use std::collections::BTreeMap;

use metacity_types::{ActorId, Building, BuildingId, BuildingType};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// All buildings currently standing on the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingRegistry {
    buildings: BTreeMap<BuildingId, Building>,
}

impl BuildingRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            buildings: BTreeMap::new(),
        }
    }

    /// Register a building.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateBuilding`] if the ID is already taken.
    pub fn insert(&mut self, building: Building) -> Result<(), WorldError> {
        if self.buildings.contains_key(&building.id) {
            return Err(WorldError::DuplicateBuilding(building.id));
        }
        self.buildings.insert(building.id, building);
        Ok(())
    }

    /// Look up a building.
    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Look up a building mutably.
    pub fn get_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.get_mut(&id)
    }

    /// Remove and return a building.
    pub fn remove(&mut self, id: BuildingId) -> Option<Building> {
        self.buildings.remove(&id)
    }

    /// Number of registered buildings.
    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Iterate over buildings in ID order (creation order for v7 IDs).
    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    /// Number of buildings of the given type.
    pub fn count_of_type(&self, building_type: BuildingType) -> usize {
        self.iter()
            .filter(|b| b.building_type == building_type)
            .count()
    }

    /// Number of buildings owned by `owner`.
    pub fn count_owned_by(&self, owner: &ActorId) -> usize {
        self.iter().filter(|b| &b.owner == owner).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use metacity_types::Position;

    use super::*;

    fn building(owner: &str, building_type: BuildingType) -> Building {
        Building {
            id: BuildingId::new(),
            owner: ActorId::new(owner),
            building_type,
            level: 1,
            position: Position::new(0, 0),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut registry = BuildingRegistry::new();
        let house = building("alice", BuildingType::Residential);
        registry.insert(house.clone()).unwrap();
        assert!(matches!(
            registry.insert(house),
            Err(WorldError::DuplicateBuilding(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn counts_by_type_and_owner() {
        let mut registry = BuildingRegistry::new();
        registry.insert(building("alice", BuildingType::Road)).unwrap();
        registry.insert(building("alice", BuildingType::Park)).unwrap();
        registry.insert(building("bob", BuildingType::Road)).unwrap();

        assert_eq!(registry.count_of_type(BuildingType::Road), 2);
        assert_eq!(registry.count_of_type(BuildingType::Industrial), 0);
        assert_eq!(registry.count_owned_by(&ActorId::new("alice")), 2);
    }

    #[test]
    fn remove_returns_the_record() {
        let mut registry = BuildingRegistry::new();
        let park = building("alice", BuildingType::Park);
        let id = park.id;
        registry.insert(park).unwrap();
        assert_eq!(registry.remove(id).map(|b| b.id), Some(id));
        assert!(registry.is_empty());
        assert!(registry.remove(id).is_none());
    }
}
