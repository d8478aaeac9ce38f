//! Resource ledger and economy calculator for the MetaCity simulation.
//!
//! The city holds three scalar resources: currency, population and morale.
//! Currency is spent on construction, upgrades and purchases; all three
//! change every tick according to the buildings standing on the grid.
//!
//! # Architecture
//!
//! - [`economy`] -- [`compute_gains`]: the pure `(world, elapsed) -> deltas`
//!   calculator with road adjacency and the morale production multiplier.
//! - [`ledger`] -- The [`Ledger`] struct: checked spending, crediting, and
//!   applying tick gains with morale drift and clamping.
//!
//! # Tick rule
//!
//! ```text
//! currency   += production(currency)   * multiplier(morale)
//! population += production(population) * multiplier(morale)
//! target      = baseline + sum(happiness effects)
//! morale      = clamp(morale + (target - morale) * drift_rate, 0, 100)
//! ```
//!
//! Production is time-scaled; happiness effects are not. Every computation
//! uses checked [`Decimal`] arithmetic and never panics.

pub mod economy;
pub mod ledger;

// Re-export primary types at crate root.
pub use economy::{EconomyInputs, EconomySettings, ResourceGains, compute_gains, morale_multiplier};
pub use ledger::Ledger;

use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger arithmetic.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A checked decimal operation overflowed.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// The amount to spend or credit was negative.
    #[error("amount must not be negative, got {amount}")]
    NegativeAmount {
        /// The rejected amount.
        amount: Decimal,
    },

    /// The ledger does not hold enough currency.
    #[error("insufficient currency: need {required}, have {available}")]
    InsufficientFunds {
        /// The amount required.
        required: Decimal,
        /// The amount available.
        available: Decimal,
    },
}
