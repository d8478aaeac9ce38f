//! The building marketplace.
//!
//! Implements the listing lifecycle:
//!
//! 1. [`Marketplace::list_building`] -- detach a building from the registry
//!    and its tile and offer it at a seller-chosen price.
//! 2. [`Marketplace::buy`] -- pay the asking price and relocate the building
//!    onto the buyer's first empty parcel in row-major order.
//!
//! Both operations validate every precondition before mutating anything.
//! A listing has no expiry and is destroyed only by a purchase. The
//! building's NFT record stays with the seller while listed and moves to
//! the buyer on purchase; a listing with no backing token (the seeded
//! system listing) has one minted for the buyer.

use chrono::{DateTime, Utc};
use metacity_ledger::{Ledger, LedgerError};
use metacity_types::{
    ActorId, BuildingId, ListingId, ListingKind, MarketListing, Position, RejectionReason,
};
use metacity_world::{BuildingRegistry, NftBook, SpatialGrid, WorldError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors specific to marketplace operations.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// The building to list is not in the registry.
    #[error("building not found: {0}")]
    BuildingNotFound(BuildingId),

    /// The seller does not own the building.
    #[error("actor {actor} does not own building {building}")]
    NotOwner {
        /// The would-be seller.
        actor: ActorId,
        /// The building.
        building: BuildingId,
    },

    /// The asking price is negative.
    #[error("asking price must not be negative, got {0}")]
    InvalidPrice(Decimal),

    /// No listing has the given ID.
    #[error("listing not found: {0}")]
    ListingNotFound(ListingId),

    /// The buyer cannot afford the asking price.
    #[error("insufficient currency: need {required}, have {available}")]
    InsufficientFunds {
        /// Asking price.
        required: Decimal,
        /// Buyer's currency.
        available: Decimal,
    },

    /// The buyer owns no empty parcel to receive the building.
    #[error("actor {0} owns no empty tile")]
    NoFreeTile(ActorId),

    /// Grid or registry bookkeeping failed.
    #[error("world error during market operation: {0}")]
    World(#[from] WorldError),

    /// Ledger arithmetic failed.
    #[error("ledger error during market operation: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<MarketError> for RejectionReason {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::BuildingNotFound(_) => Self::BuildingNotFound,
            MarketError::NotOwner { .. } => Self::NotOwner,
            MarketError::InvalidPrice(_) => Self::InvalidPrice,
            MarketError::ListingNotFound(_) => Self::ListingNotFound,
            MarketError::InsufficientFunds { .. }
            | MarketError::Ledger(LedgerError::InsufficientFunds { .. }) => Self::InsufficientFunds,
            MarketError::NoFreeTile(_) => Self::NoFreeTile,
            MarketError::World(_) => Self::InconsistentState,
            MarketError::Ledger(_) => Self::ArithmeticOverflow,
        }
    }
}

// ---------------------------------------------------------------------------
// Context and results
// ---------------------------------------------------------------------------

/// Mutable views of the state a market operation touches.
#[derive(Debug)]
pub struct MarketContext<'a> {
    /// The grid, for unlinking and relocating.
    pub grid: &'a mut SpatialGrid,
    /// The registry buildings leave and re-enter.
    pub registry: &'a mut BuildingRegistry,
    /// NFT records, for ownership transfer.
    pub nfts: &'a mut NftBook,
    /// The buyer's ledger.
    pub ledger: &'a mut Ledger,
}

/// Details of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    /// The consumed listing.
    pub listing_id: ListingId,
    /// The relocated building.
    pub building_id: BuildingId,
    /// Where the building now stands.
    pub position: Position,
    /// The previous owner.
    pub seller: ActorId,
    /// Price paid.
    pub price: Decimal,
}

// ---------------------------------------------------------------------------
// Marketplace
// ---------------------------------------------------------------------------

/// All open listings, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marketplace {
    listings: Vec<MarketListing>,
}

impl Marketplace {
    /// Create an empty marketplace.
    pub const fn new() -> Self {
        Self {
            listings: Vec::new(),
        }
    }

    /// Add a pre-built listing, such as the seeded demo listing.
    pub fn push(&mut self, listing: MarketListing) {
        self.listings.push(listing);
    }

    /// Detach `building_id` from the world and list it at `price`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::BuildingNotFound`], [`MarketError::NotOwner`]
    /// or [`MarketError::InvalidPrice`] before any mutation.
    pub fn list_building(
        &mut self,
        ctx: &mut MarketContext<'_>,
        building_id: BuildingId,
        seller: &ActorId,
        price: Decimal,
    ) -> Result<ListingId, MarketError> {
        let building = ctx
            .registry
            .get(building_id)
            .ok_or(MarketError::BuildingNotFound(building_id))?;
        if &building.owner != seller {
            return Err(MarketError::NotOwner {
                actor: seller.clone(),
                building: building_id,
            });
        }
        if price < Decimal::ZERO {
            return Err(MarketError::InvalidPrice(price));
        }

        let building = ctx
            .registry
            .remove(building_id)
            .ok_or(MarketError::BuildingNotFound(building_id))?;
        ctx.grid.unlink_building(building.position)?;

        let id = ListingId::new();
        tracing::debug!(
            listing_id = %id,
            building_id = %building_id,
            seller = %seller,
            price = %price,
            "Building listed"
        );
        self.listings.push(MarketListing {
            id,
            seller: seller.clone(),
            price,
            kind: ListingKind::Building,
            building,
        });
        Ok(id)
    }

    /// Buy `listing_id` on behalf of `buyer`.
    ///
    /// The price is deducted from the ledger and is not credited to the
    /// seller here; callers that credit sellers do so with the returned
    /// [`Purchase`].
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ListingNotFound`],
    /// [`MarketError::InsufficientFunds`] or [`MarketError::NoFreeTile`]
    /// before any mutation.
    pub fn buy(
        &mut self,
        ctx: &mut MarketContext<'_>,
        listing_id: ListingId,
        buyer: &ActorId,
        now: DateTime<Utc>,
    ) -> Result<Purchase, MarketError> {
        let index = self
            .listings
            .iter()
            .position(|l| l.id == listing_id)
            .ok_or(MarketError::ListingNotFound(listing_id))?;
        let price = self
            .listings
            .get(index)
            .map(|l| l.price)
            .ok_or(MarketError::ListingNotFound(listing_id))?;
        if !ctx.ledger.can_afford(price) {
            return Err(MarketError::InsufficientFunds {
                required: price,
                available: ctx.ledger.currency(),
            });
        }
        let position = ctx
            .grid
            .first_free_tile_of(buyer)
            .ok_or_else(|| MarketError::NoFreeTile(buyer.clone()))?;

        ctx.ledger.spend(price)?;
        let listing = self.listings.remove(index);
        let mut building = listing.building;
        building.owner = buyer.clone();
        building.position = position;
        let building_id = building.id;

        ctx.grid.link_building(position, building_id)?;
        if !ctx.nfts.transfer_building(building_id, buyer) {
            ctx.nfts.mint_building(&building, now);
        }
        ctx.registry.insert(building)?;

        tracing::info!(
            listing_id = %listing_id,
            building_id = %building_id,
            buyer = %buyer,
            seller = %listing.seller,
            price = %price,
            x = position.x,
            y = position.y,
            "Market purchase completed"
        );

        Ok(Purchase {
            listing_id,
            building_id,
            position,
            seller: listing.seller,
            price,
        })
    }

    /// Look up a listing.
    pub fn get(&self, id: ListingId) -> Option<&MarketListing> {
        self.listings.iter().find(|l| l.id == id)
    }

    /// Iterate over listings in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &MarketListing> {
        self.listings.iter()
    }

    /// Number of open listings.
    pub const fn len(&self) -> usize {
        self.listings.len()
    }

    /// Whether there are no open listings.
    pub const fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Whether `actor` has any building listed.
    pub fn has_listing_from(&self, actor: &ActorId) -> bool {
        self.listings.iter().any(|l| &l.seller == actor)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use metacity_types::{Building, BuildingType};
    use rust_decimal_macros::dec;

    use super::*;

    struct World {
        grid: SpatialGrid,
        registry: BuildingRegistry,
        nfts: NftBook,
        ledger: Ledger,
    }

    impl World {
        /// Alice owns (1,0) with a park on it and an empty parcel at (3,2).
        fn new() -> (Self, BuildingId) {
            let alice = ActorId::new("alice");
            let mut grid = SpatialGrid::new(5).unwrap();
            grid.set_owner(Position::new(1, 0), alice.clone()).unwrap();
            grid.set_owner(Position::new(3, 2), alice.clone()).unwrap();
            let park = Building {
                id: BuildingId::new(),
                owner: alice,
                building_type: BuildingType::Park,
                level: 2,
                position: Position::new(1, 0),
                created_at: Utc::now(),
            };
            let id = park.id;
            grid.link_building(park.position, id).unwrap();
            let mut nfts = NftBook::new();
            nfts.mint_building(&park, Utc::now());
            let mut registry = BuildingRegistry::new();
            registry.insert(park).unwrap();
            let world = Self {
                grid,
                registry,
                nfts,
                ledger: Ledger::new(dec!(1000), dec!(10), dec!(50)),
            };
            (world, id)
        }

        fn ctx(&mut self) -> MarketContext<'_> {
            MarketContext {
                grid: &mut self.grid,
                registry: &mut self.registry,
                nfts: &mut self.nfts,
                ledger: &mut self.ledger,
            }
        }
    }

    #[test]
    fn listing_detaches_building() {
        let (mut world, id) = World::new();
        let mut market = Marketplace::new();
        let alice = ActorId::new("alice");
        market
            .list_building(&mut world.ctx(), id, &alice, dec!(300))
            .unwrap();

        assert!(world.registry.get(id).is_none());
        assert!(world.grid.building_at(Position::new(1, 0)).is_none());
        assert_eq!(market.len(), 1);
        // The token stays with the seller while listed.
        assert_eq!(world.nfts.owned_by(&alice), 1);
    }

    #[test]
    fn list_then_buy_round_trips_to_first_free_tile() {
        let (mut world, id) = World::new();
        let mut market = Marketplace::new();
        let alice = ActorId::new("alice");
        let listing = market
            .list_building(&mut world.ctx(), id, &alice, dec!(300))
            .unwrap();

        let purchase = market
            .buy(&mut world.ctx(), listing, &alice, Utc::now())
            .unwrap();

        // (1,0) is now free again and comes first in row-major order.
        assert_eq!(purchase.position, Position::new(1, 0));
        assert_eq!(world.ledger.currency(), dec!(700));
        assert!(market.is_empty());
        let building = world.registry.get(id).unwrap();
        assert_eq!(building.level, 2);
        assert_eq!(building.position, purchase.position);
        assert!(world.grid.verify_links(&world.registry).is_ok());
    }

    #[test]
    fn purchase_without_free_tile_changes_nothing() {
        let (mut world, _) = World::new();
        let mut market = Marketplace::new();
        let bob = ActorId::new("bob");
        let listing_id = ListingId::new();
        market.push(MarketListing {
            id: listing_id,
            seller: ActorId::new("0xSystem"),
            price: dec!(500),
            kind: ListingKind::Building,
            building: Building {
                id: BuildingId::new(),
                owner: ActorId::new("0xSystem"),
                building_type: BuildingType::Commercial,
                level: 2,
                position: Position::new(1, 1),
                created_at: Utc::now(),
            },
        });

        let result = market.buy(&mut world.ctx(), listing_id, &bob, Utc::now());
        assert!(matches!(result, Err(MarketError::NoFreeTile(_))));
        assert_eq!(world.ledger.currency(), dec!(1000));
        assert_eq!(market.len(), 1);
    }

    #[test]
    fn system_listing_mints_token_for_buyer() {
        let (mut world, _) = World::new();
        let mut market = Marketplace::new();
        let alice = ActorId::new("alice");
        let listing_id = ListingId::new();
        let building_id = BuildingId::new();
        market.push(MarketListing {
            id: listing_id,
            seller: ActorId::new("0xSystem"),
            price: dec!(500),
            kind: ListingKind::Building,
            building: Building {
                id: building_id,
                owner: ActorId::new("0xSystem"),
                building_type: BuildingType::Commercial,
                level: 2,
                position: Position::new(1, 1),
                created_at: Utc::now(),
            },
        });

        let purchase = market
            .buy(&mut world.ctx(), listing_id, &alice, Utc::now())
            .unwrap();
        assert_eq!(purchase.position, Position::new(3, 2));
        assert!(world.nfts.has_building_token(building_id));
        assert_eq!(world.nfts.owned_by(&alice), 2);
    }

    #[test]
    fn unaffordable_purchase_is_refused() {
        let (mut world, id) = World::new();
        let mut market = Marketplace::new();
        let alice = ActorId::new("alice");
        let listing = market
            .list_building(&mut world.ctx(), id, &alice, dec!(5000))
            .unwrap();
        let result = market.buy(&mut world.ctx(), listing, &alice, Utc::now());
        assert!(matches!(result, Err(MarketError::InsufficientFunds { .. })));
        assert_eq!(market.len(), 1);
    }

    #[test]
    fn only_owner_may_list() {
        let (mut world, id) = World::new();
        let mut market = Marketplace::new();
        let result = market.list_building(&mut world.ctx(), id, &ActorId::new("bob"), dec!(1));
        assert!(matches!(result, Err(MarketError::NotOwner { .. })));
        let negative = market.list_building(
            &mut world.ctx(),
            id,
            &ActorId::new("alice"),
            dec!(-1),
        );
        assert!(matches!(negative, Err(MarketError::InvalidPrice(_))));
        assert!(world.registry.get(id).is_some());
    }
}
