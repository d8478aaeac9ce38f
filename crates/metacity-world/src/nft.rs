//! NFT ownership records.
//!
//! The book is an append-ordered list of [`NftRecord`]s. It mirrors land
//! and building ownership for display and for governance: an actor's
//! voting power is the number of records they own, with a floor of one.

use chrono::{DateTime, Utc};
use metacity_types::{ActorId, Building, BuildingId, NftRecord, Tile, TokenId};
use serde::{Deserialize, Serialize};

/// Every minted ownership record, in mint order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NftBook {
    records: Vec<NftRecord>,
}

impl NftBook {
    /// Create an empty book.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Mint a land token for `tile`, owned by `owner`.
    pub fn mint_land(&mut self, tile: &Tile, owner: ActorId, now: DateTime<Utc>) -> TokenId {
        let token_id = TokenId::new();
        self.records.push(NftRecord::Land {
            token_id,
            tile_id: tile.id,
            position: tile.position,
            owner,
            minted_at: now,
        });
        token_id
    }

    /// Mint a building token for `building`, owned by the building's owner.
    pub fn mint_building(&mut self, building: &Building, now: DateTime<Utc>) -> TokenId {
        let token_id = TokenId::new();
        self.records.push(NftRecord::BuildingToken {
            token_id,
            building_id: building.id,
            building_type: building.building_type,
            owner: building.owner.clone(),
            minted_at: now,
        });
        token_id
    }

    /// Remove every token mirroring `building`, returning how many were
    /// removed.
    pub fn burn_building(&mut self, building: BuildingId) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.building_id() != Some(building));
        before.saturating_sub(self.records.len())
    }

    /// Move the token for `building` to `new_owner`.
    ///
    /// Returns `false` when no token mirrors the building.
    pub fn transfer_building(&mut self, building: BuildingId, new_owner: &ActorId) -> bool {
        match self
            .records
            .iter_mut()
            .find(|r| r.building_id() == Some(building))
        {
            Some(record) => {
                record.set_owner(new_owner.clone());
                true
            }
            None => false,
        }
    }

    /// Whether a token mirrors `building`.
    pub fn has_building_token(&self, building: BuildingId) -> bool {
        self.records
            .iter()
            .any(|r| r.building_id() == Some(building))
    }

    /// Number of records owned by `actor`.
    pub fn owned_by(&self, actor: &ActorId) -> usize {
        self.records.iter().filter(|r| r.owner() == actor).count()
    }

    /// Governance weight of `actor`: records owned, minimum one.
    pub fn voting_power(&self, actor: &ActorId) -> u64 {
        u64::try_from(self.owned_by(actor))
            .unwrap_or(u64::MAX)
            .max(1)
    }

    /// Iterate over records in mint order.
    pub fn iter(&self) -> impl Iterator<Item = &NftRecord> {
        self.records.iter()
    }

    /// Number of records.
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the book is empty.
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use metacity_types::{BuildingType, Position, TileId};

    use super::*;

    fn house(owner: &str) -> Building {
        Building {
            id: BuildingId::new(),
            owner: ActorId::new(owner),
            building_type: BuildingType::Residential,
            level: 1,
            position: Position::new(1, 1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn voting_power_has_floor_of_one() {
        let book = NftBook::new();
        assert_eq!(book.voting_power(&ActorId::new("nobody")), 1);
    }

    #[test]
    fn voting_power_counts_land_and_buildings() {
        let mut book = NftBook::new();
        let alice = ActorId::new("alice");
        let tile = Tile {
            id: TileId::new(),
            position: Position::new(1, 1),
            owner: Some(alice.clone()),
            building_id: None,
        };
        let _ = book.mint_land(&tile, alice.clone(), Utc::now());
        let _ = book.mint_building(&house("alice"), Utc::now());
        let _ = book.mint_building(&house("bob"), Utc::now());
        assert_eq!(book.voting_power(&alice), 2);
        assert_eq!(book.voting_power(&ActorId::new("bob")), 1);
    }

    #[test]
    fn transfer_and_burn_follow_the_building() {
        let mut book = NftBook::new();
        let building = house("alice");
        let _ = book.mint_building(&building, Utc::now());
        let bob = ActorId::new("bob");

        assert!(book.transfer_building(building.id, &bob));
        assert_eq!(book.owned_by(&bob), 1);
        assert_eq!(book.owned_by(&ActorId::new("alice")), 0);

        assert_eq!(book.burn_building(building.id), 1);
        assert!(!book.has_building_token(building.id));
        assert!(!book.transfer_building(building.id, &bob));
    }
}
