//! Governance and marketplace modules for the MetaCity simulation.
//!
//! # Modules
//!
//! - [`governance`] -- [`ProposalBook`]: time-boxed proposals with weighted
//!   votes whose passed actions rewrite the game parameters.
//! - [`market`] -- [`Marketplace`]: building listings and purchases that
//!   relocate onto the buyer's first empty parcel.

pub mod governance;
pub mod market;

pub use governance::{
    GovernanceError, ProposalBook, ProposalResolution, apply_action, validate_action,
};
pub use market::{MarketContext, MarketError, Marketplace, Purchase};
