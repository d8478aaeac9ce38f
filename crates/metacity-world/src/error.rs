//! Error types for the `metacity-world` crate.
//!
//! These are structural errors: a grid that cannot be built or a snapshot
//! whose tiles and buildings disagree. Player-facing precondition failures
//! are [`RejectionReason`](metacity_types::RejectionReason)s, not errors.

use metacity_types::{BuildingId, Position};

/// Errors that can occur while constructing or validating the world.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The grid side length must be at least 1.
    #[error("invalid grid size: {0}")]
    InvalidGridSize(u32),

    /// A position lies outside the grid.
    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),

    /// The stored tile count does not match `size * size`.
    #[error("grid holds {actual} tiles, expected {expected}")]
    TileCountMismatch {
        /// Tiles implied by the grid size.
        expected: usize,
        /// Tiles actually stored.
        actual: usize,
    },

    /// A tile is stored at an index that does not match its coordinates.
    #[error("tile at index {index} claims position {position}")]
    MisplacedTile {
        /// Row-major storage index.
        index: usize,
        /// Coordinates recorded on the tile.
        position: Position,
    },

    /// A building with the same ID is already registered.
    #[error("duplicate building id: {0}")]
    DuplicateBuilding(BuildingId),

    /// A tile references a building missing from the registry.
    #[error("tile {position} references unknown building {building}")]
    DanglingBuildingLink {
        /// The tile's position.
        position: Position,
        /// The missing building.
        building: BuildingId,
    },

    /// A building's recorded position does not hold a link back to it.
    #[error("building {building} at {position} is not linked from its tile")]
    UnlinkedBuilding {
        /// The building.
        building: BuildingId,
        /// The position the building claims.
        position: Position,
    },
}
