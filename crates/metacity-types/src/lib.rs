//! Shared type definitions for the MetaCity simulation.
//!
//! This crate is the single source of truth for the entity model used
//! across the MetaCity workspace. Types defined here flow downstream to
//! `TypeScript` via `ts-rs` for the browser client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifiers for tiles, buildings, tokens, proposals, listings and actors
//! - [`enums`] -- Building types, resources, proposal status, vote choice, rejection reasons
//! - [`structs`] -- Core entity structs (tile, building, ledger, proposal, listing, NFT record, parameters)
//! - [`flavor`] -- Request/response contracts for the AI flavor-text collaborators

pub mod enums;
pub mod flavor;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{BuildingType, ListingKind, ProposalStatus, RejectionReason, Resource, VoteChoice};
pub use flavor::{
    BuildingDescription, BuildingDescriptionRequest, NewsHeadline, NewsHeadlineRequest, Objective,
    TutorialHint, TutorialHintRequest, TutorialSuggestion,
};
pub use ids::{ActorId, BuildingId, ListingId, ProposalId, TileId, TokenId};
pub use structs::{
    Building, BuildingStats, GameParameters, MarketListing, NftRecord, Position, Production,
    Proposal, ProposalAction, ProposalDraft, ResourceLedger, Tile, VoteTally,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::TileId::export_all();
        let _ = crate::ids::BuildingId::export_all();
        let _ = crate::ids::TokenId::export_all();
        let _ = crate::ids::ProposalId::export_all();
        let _ = crate::ids::ListingId::export_all();
        let _ = crate::ids::ActorId::export_all();

        // Enums
        let _ = crate::enums::BuildingType::export_all();
        let _ = crate::enums::Resource::export_all();
        let _ = crate::enums::ProposalStatus::export_all();
        let _ = crate::enums::VoteChoice::export_all();
        let _ = crate::enums::ListingKind::export_all();
        let _ = crate::enums::RejectionReason::export_all();

        // Structs
        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::Tile::export_all();
        let _ = crate::structs::Building::export_all();
        let _ = crate::structs::ResourceLedger::export_all();
        let _ = crate::structs::Production::export_all();
        let _ = crate::structs::BuildingStats::export_all();
        let _ = crate::structs::GameParameters::export_all();
        let _ = crate::structs::ProposalAction::export_all();
        let _ = crate::structs::VoteTally::export_all();
        let _ = crate::structs::ProposalDraft::export_all();
        let _ = crate::structs::Proposal::export_all();
        let _ = crate::structs::MarketListing::export_all();
        let _ = crate::structs::NftRecord::export_all();

        // Flavor contracts
        let _ = crate::flavor::BuildingDescriptionRequest::export_all();
        let _ = crate::flavor::BuildingDescription::export_all();
        let _ = crate::flavor::NewsHeadlineRequest::export_all();
        let _ = crate::flavor::NewsHeadline::export_all();
        let _ = crate::flavor::Objective::export_all();
        let _ = crate::flavor::TutorialHintRequest::export_all();
        let _ = crate::flavor::TutorialHint::export_all();
        let _ = crate::flavor::TutorialSuggestion::export_all();
    }
}
