//! The spatial grid: a fixed-size square of land parcels.
//!
//! Tiles are stored row-major in a flat vector so that iteration order is
//! the scan order used by the marketplace when relocating purchases
//! (row by row from `y = 0`, left to right within a row). Tiles are created
//! once at world construction and never destroyed; only their owner and
//! building link change.

use metacity_types::{ActorId, BuildingId, Position, Tile, TileId};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::registry::BuildingRegistry;

/// A square grid of [`Tile`]s addressed by [`Position`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialGrid {
    /// Side length of the grid.
    size: u32,
    /// All tiles in row-major order.
    tiles: Vec<Tile>,
}

impl SpatialGrid {
    /// Create an unowned, empty grid of `size * size` tiles.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGridSize`] when `size` is zero or the
    /// tile count does not fit in memory addressing.
    pub fn new(size: u32) -> Result<Self, WorldError> {
        let side = usize::try_from(size).map_err(|_err| WorldError::InvalidGridSize(size))?;
        let count = side
            .checked_mul(side)
            .filter(|c| *c > 0)
            .ok_or(WorldError::InvalidGridSize(size))?;

        let mut tiles = Vec::with_capacity(count);
        for y in 0..size {
            for x in 0..size {
                tiles.push(Tile {
                    id: TileId::new(),
                    position: Position::new(x, y),
                    owner: None,
                    building_id: None,
                });
            }
        }
        Ok(Self { size, tiles })
    }

    /// Side length of the grid.
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Whether `position` lies inside the grid.
    pub const fn contains(&self, position: Position) -> bool {
        position.x < self.size && position.y < self.size
    }

    /// Row-major storage index of `position`, if it is inside the grid.
    fn index(&self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        let side = usize::try_from(self.size).ok()?;
        let row = usize::try_from(position.y).ok()?;
        let col = usize::try_from(position.x).ok()?;
        row.checked_mul(side)?.checked_add(col)
    }

    /// The tile at `position`.
    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.index(position).and_then(|i| self.tiles.get(i))
    }

    fn tile_mut(&mut self, position: Position) -> Result<&mut Tile, WorldError> {
        self.index(position)
            .and_then(|i| self.tiles.get_mut(i))
            .ok_or(WorldError::OutOfBounds(position))
    }

    /// Iterate over all tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// The building linked from the tile at `position`, if any.
    pub fn building_at(&self, position: Position) -> Option<BuildingId> {
        self.tile(position).and_then(|t| t.building_id)
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    /// Assign ownership of the parcel at `position`.
    pub fn set_owner(&mut self, position: Position, owner: ActorId) -> Result<(), WorldError> {
        self.tile_mut(position)?.owner = Some(owner);
        Ok(())
    }

    /// Link a building to the tile at `position`.
    pub fn link_building(
        &mut self,
        position: Position,
        building: BuildingId,
    ) -> Result<(), WorldError> {
        self.tile_mut(position)?.building_id = Some(building);
        Ok(())
    }

    /// Clear the building link of the tile at `position`, returning the
    /// previously linked building.
    pub fn unlink_building(&mut self, position: Position) -> Result<Option<BuildingId>, WorldError> {
        Ok(self.tile_mut(position)?.building_id.take())
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// The first tile in row-major order owned by `owner` that holds no
    /// building.
    pub fn first_free_tile_of(&self, owner: &ActorId) -> Option<Position> {
        self.tiles
            .iter()
            .find(|t| t.building_id.is_none() && t.owner.as_ref() == Some(owner))
            .map(|t| t.position)
    }

    /// Number of tiles owned by `owner`.
    pub fn parcels_owned_by(&self, owner: &ActorId) -> usize {
        self.tiles
            .iter()
            .filter(|t| t.owner.as_ref() == Some(owner))
            .count()
    }

    /// Whether any orthogonal neighbour of `position` holds a road.
    ///
    /// Diagonal neighbours never count.
    pub fn has_adjacent_road(&self, position: Position, registry: &BuildingRegistry) -> bool {
        position
            .orthogonal_neighbors(self.size)
            .into_iter()
            .filter_map(|n| self.building_at(n))
            .filter_map(|id| registry.get(id))
            .any(|b| b.building_type.is_road())
    }

    // -------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------

    /// Check that the grid's storage is well formed and that tile links and
    /// the registry agree in both directions.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn verify_links(&self, registry: &BuildingRegistry) -> Result<(), WorldError> {
        let side = usize::try_from(self.size).map_err(|_err| WorldError::InvalidGridSize(self.size))?;
        let expected = side
            .checked_mul(side)
            .filter(|c| *c > 0)
            .ok_or(WorldError::InvalidGridSize(self.size))?;
        if self.tiles.len() != expected {
            return Err(WorldError::TileCountMismatch {
                expected,
                actual: self.tiles.len(),
            });
        }

        for (index, tile) in self.tiles.iter().enumerate() {
            if self.index(tile.position) != Some(index) {
                return Err(WorldError::MisplacedTile {
                    index,
                    position: tile.position,
                });
            }
            if let Some(building_id) = tile.building_id {
                match registry.get(building_id) {
                    Some(b) if b.position == tile.position => {}
                    Some(b) => {
                        return Err(WorldError::UnlinkedBuilding {
                            building: building_id,
                            position: b.position,
                        });
                    }
                    None => {
                        return Err(WorldError::DanglingBuildingLink {
                            position: tile.position,
                            building: building_id,
                        });
                    }
                }
            }
        }

        for building in registry.iter() {
            if self.building_at(building.position) != Some(building.id) {
                return Err(WorldError::UnlinkedBuilding {
                    building: building.id,
                    position: building.position,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use metacity_types::{Building, BuildingType};

    use super::*;

    fn building(position: Position, building_type: BuildingType) -> Building {
        Building {
            id: BuildingId::new(),
            owner: ActorId::new("alice"),
            building_type,
            level: 1,
            position,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            SpatialGrid::new(0),
            Err(WorldError::InvalidGridSize(0))
        ));
    }

    #[test]
    fn tiles_are_row_major() {
        let grid = SpatialGrid::new(3).unwrap();
        let positions: Vec<Position> = grid.tiles().map(|t| t.position).take(4).collect();
        assert_eq!(
            positions,
            vec![
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(2, 0),
                Position::new(0, 1),
            ]
        );
        assert!(grid.tile(Position::new(3, 0)).is_none());
    }

    #[test]
    fn free_tile_scan_is_row_major() {
        let mut grid = SpatialGrid::new(4).unwrap();
        let alice = ActorId::new("alice");
        let _ = grid.set_owner(Position::new(3, 0), alice.clone());
        let _ = grid.set_owner(Position::new(0, 2), alice.clone());
        let _ = grid.set_owner(Position::new(1, 0), ActorId::new("bob"));
        assert_eq!(grid.first_free_tile_of(&alice), Some(Position::new(3, 0)));

        let _ = grid.link_building(Position::new(3, 0), BuildingId::new());
        assert_eq!(grid.first_free_tile_of(&alice), Some(Position::new(0, 2)));
        assert_eq!(grid.parcels_owned_by(&alice), 2);
    }

    #[test]
    fn road_adjacency_ignores_diagonals() {
        let mut grid = SpatialGrid::new(5).unwrap();
        let mut registry = BuildingRegistry::new();
        let road = building(Position::new(2, 2), BuildingType::Road);
        let _ = grid.link_building(road.position, road.id);
        let _ = registry.insert(road);

        assert!(grid.has_adjacent_road(Position::new(2, 1), &registry));
        assert!(grid.has_adjacent_road(Position::new(3, 2), &registry));
        assert!(!grid.has_adjacent_road(Position::new(3, 3), &registry));
        assert!(!grid.has_adjacent_road(Position::new(1, 1), &registry));
    }

    #[test]
    fn verify_links_catches_dangling_and_unlinked() {
        let mut grid = SpatialGrid::new(3).unwrap();
        let mut registry = BuildingRegistry::new();
        let house = building(Position::new(1, 1), BuildingType::Residential);
        let id = house.id;
        let _ = registry.insert(house);
        assert!(matches!(
            grid.verify_links(&registry),
            Err(WorldError::UnlinkedBuilding { .. })
        ));

        let _ = grid.link_building(Position::new(1, 1), id);
        assert!(grid.verify_links(&registry).is_ok());

        let _ = grid.link_building(Position::new(0, 0), BuildingId::new());
        assert!(matches!(
            grid.verify_links(&registry),
            Err(WorldError::DanglingBuildingLink { .. })
        ));
    }
}
