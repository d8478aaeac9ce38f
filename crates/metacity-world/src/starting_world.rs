//! Default parameters and the starting world for a fresh MetaCity.
//!
//! A new city is a 20 x 20 grid where the starting actor owns three
//! adjacent parcels in the middle row, each minted as a land token, with a
//! level-1 residential building on the first. The market is seeded with a
//! single demo listing sold by the system account.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use metacity_types::{
    ActorId, Building, BuildingId, BuildingStats, BuildingType, GameParameters, ListingId,
    ListingKind, MarketListing, Position, Production, Resource,
};
use rust_decimal::Decimal;

use crate::error::WorldError;
use crate::grid::SpatialGrid;
use crate::nft::NftBook;
use crate::registry::BuildingRegistry;

/// Helper to turn a whole-number curve into decimals.
fn curve(values: &[i64]) -> Vec<Decimal> {
    values.iter().copied().map(Decimal::from).collect()
}

/// Helper to build a [`BuildingStats`] entry.
fn stats(
    name: &str,
    description: &str,
    cost: &[i64],
    production: Option<(Resource, &[i64])>,
    happiness: Option<&[i64]>,
) -> BuildingStats {
    BuildingStats {
        name: name.to_owned(),
        description: description.to_owned(),
        max_level: u32::try_from(cost.len()).unwrap_or(1),
        cost: curve(cost),
        production: production.map(|(resource, rate)| Production {
            resource,
            rate: curve(rate),
        }),
        happiness: happiness.map(curve),
    }
}

/// The out-of-the-box economy: five building types and a 20% road bonus.
pub fn default_parameters() -> GameParameters {
    let mut building_stats = BTreeMap::new();
    building_stats.insert(
        BuildingType::Residential,
        stats(
            "Residential",
            "Generates citizens for your city.",
            &[50, 150, 400],
            Some((Resource::Population, &[1, 2, 5])),
            None,
        ),
    );
    building_stats.insert(
        BuildingType::Commercial,
        stats(
            "Commercial",
            "Generates Gold tokens.",
            &[100, 300, 800],
            Some((Resource::Currency, &[10, 25, 70])),
            None,
        ),
    );
    building_stats.insert(
        BuildingType::Industrial,
        stats(
            "Industrial",
            "Produces a large amount of Gold but lowers happiness.",
            &[200, 600, 1500],
            Some((Resource::Currency, &[30, 80, 200])),
            Some(&[-2, -5, -10]),
        ),
    );
    building_stats.insert(
        BuildingType::Park,
        stats(
            "Park",
            "Increases the happiness of your citizens.",
            &[150, 400, 1000],
            None,
            Some(&[5, 12, 25]),
        ),
    );
    building_stats.insert(
        BuildingType::Road,
        stats(
            "Road",
            "Connects buildings, providing adjacency bonuses.",
            &[10],
            None,
            None,
        ),
    );

    GameParameters {
        building_stats,
        adjacency_bonus: Decimal::new(2, 1),
    }
}

/// Inputs for [`create_starting_world`].
#[derive(Debug, Clone)]
pub struct StartingWorldOptions {
    /// Side length of the grid.
    pub grid_size: u32,
    /// The actor who owns the starting parcels.
    pub actor: ActorId,
    /// Parcels granted to `actor`; the first receives a residential building.
    pub parcels: Vec<Position>,
    /// Whether to seed the market with a demo listing.
    pub seed_demo_listing: bool,
    /// Seller recorded on the demo listing.
    pub system_seller: ActorId,
}

impl Default for StartingWorldOptions {
    fn default() -> Self {
        Self {
            grid_size: 20,
            actor: ActorId::new("0xPlayer1..."),
            parcels: vec![
                Position::new(9, 9),
                Position::new(10, 9),
                Position::new(11, 9),
            ],
            seed_demo_listing: true,
            system_seller: ActorId::new("0xSystem"),
        }
    }
}

/// The spatial half of a fresh city, before resources and UI state are
/// attached.
#[derive(Debug, Clone)]
pub struct StartingWorld {
    /// The grid with the starting parcels owned.
    pub grid: SpatialGrid,
    /// Registry holding the starter building.
    pub registry: BuildingRegistry,
    /// Land tokens plus the starter building's token.
    pub nfts: NftBook,
    /// The seeded demo listing, if enabled.
    pub demo_listing: Option<MarketListing>,
}

/// Build the starting world.
///
/// # Errors
///
/// Returns [`WorldError::InvalidGridSize`] for a zero-sized grid and
/// [`WorldError::OutOfBounds`] when a starting parcel lies off the grid.
pub fn create_starting_world(
    options: &StartingWorldOptions,
    now: DateTime<Utc>,
) -> Result<StartingWorld, WorldError> {
    let mut grid = SpatialGrid::new(options.grid_size)?;
    let mut registry = BuildingRegistry::new();
    let mut nfts = NftBook::new();

    for (index, &position) in options.parcels.iter().enumerate() {
        grid.set_owner(position, options.actor.clone())?;
        let tile = grid
            .tile(position)
            .ok_or(WorldError::OutOfBounds(position))?;
        nfts.mint_land(tile, options.actor.clone(), now);

        if index == 0 {
            let house = Building {
                id: BuildingId::new(),
                owner: options.actor.clone(),
                building_type: BuildingType::Residential,
                level: 1,
                position,
                created_at: now,
            };
            grid.link_building(position, house.id)?;
            nfts.mint_building(&house, now);
            registry.insert(house)?;
        }
    }

    let demo_listing = options.seed_demo_listing.then(|| MarketListing {
        id: ListingId::new(),
        seller: options.system_seller.clone(),
        price: Decimal::from(500),
        kind: ListingKind::Building,
        building: Building {
            id: BuildingId::new(),
            owner: options.system_seller.clone(),
            building_type: BuildingType::Commercial,
            level: 2,
            position: Position::new(1, 1),
            created_at: now,
        },
    });

    tracing::debug!(
        grid_size = options.grid_size,
        parcels = options.parcels.len(),
        actor = %options.actor,
        "Created starting world"
    );

    Ok(StartingWorld {
        grid,
        registry,
        nfts,
        demo_listing,
    })
}
