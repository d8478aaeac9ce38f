//! Grid, buildings, and ownership records for the MetaCity simulation.
//!
//! This crate models the physical city: a square grid of land parcels, the
//! registry of buildings standing on it, and the NFT book that mirrors
//! ownership for governance.
//!
//! # Modules
//!
//! - [`error`] -- Structural errors for grid construction and link validation.
//! - [`grid`] -- [`SpatialGrid`]: row-major tiles, road adjacency, free-tile scan.
//! - [`registry`] -- [`BuildingRegistry`]: buildings keyed by ID.
//! - [`nft`] -- [`NftBook`]: land and building tokens, voting power.
//! - [`starting_world`] -- Default game parameters and the starting city.

pub mod error;
pub mod grid;
pub mod nft;
pub mod registry;
pub mod starting_world;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use grid::SpatialGrid;
pub use nft::NftBook;
pub use registry::BuildingRegistry;
pub use starting_world::{
    StartingWorld, StartingWorldOptions, create_starting_world, default_parameters,
};
