//! The resource ledger: the city's currency, population and morale.
//!
//! Spending is all-or-nothing: a spend that would take currency below zero
//! fails with [`LedgerError::InsufficientFunds`] and leaves the ledger
//! untouched. Morale is kept within `0..=100` on every tick.

use metacity_types::ResourceLedger;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::LedgerError;
use crate::economy::{EconomySettings, ResourceGains};

/// Upper bound of morale.
const MORALE_MAX: Decimal = Decimal::ONE_HUNDRED;

/// The city's resource balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    balances: ResourceLedger,
}

impl Ledger {
    /// Create a ledger with the given starting balances. Morale is clamped
    /// into range.
    pub fn new(currency: Decimal, population: Decimal, morale: Decimal) -> Self {
        Self {
            balances: ResourceLedger {
                currency,
                population,
                morale: morale.clamp(Decimal::ZERO, MORALE_MAX),
            },
        }
    }

    /// Current balances.
    pub const fn balances(&self) -> &ResourceLedger {
        &self.balances
    }

    /// Current currency.
    pub const fn currency(&self) -> Decimal {
        self.balances.currency
    }

    /// Current population.
    pub const fn population(&self) -> Decimal {
        self.balances.population
    }

    /// Current morale.
    pub const fn morale(&self) -> Decimal {
        self.balances.morale
    }

    /// Whether at least `amount` currency is available.
    pub fn can_afford(&self, amount: Decimal) -> bool {
        self.balances.currency >= amount
    }

    /// Deduct `amount` currency.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NegativeAmount`] for a negative amount and
    /// [`LedgerError::InsufficientFunds`] when the balance is too low. The
    /// ledger is unchanged on error.
    pub fn spend(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount { amount });
        }
        if !self.can_afford(amount) {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: self.balances.currency,
            });
        }
        self.balances.currency = self
            .balances
            .currency
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow("spend"))?;
        Ok(())
    }

    /// Add `amount` currency.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NegativeAmount`] for a negative amount or
    /// [`LedgerError::Overflow`] if the balance would overflow.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount { amount });
        }
        self.balances.currency = self
            .balances
            .currency
            .checked_add(amount)
            .ok_or(LedgerError::Overflow("credit"))?;
        Ok(())
    }

    /// Apply one tick's gains.
    ///
    /// Currency and population deltas are added directly. Morale drifts
    /// toward `baseline + gains.morale` by `drift_rate` of the gap and is
    /// clamped to `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if a checked operation overflows;
    /// the ledger is unchanged on error.
    pub fn apply_gains(
        &mut self,
        gains: &ResourceGains,
        settings: &EconomySettings,
    ) -> Result<(), LedgerError> {
        let currency = self
            .balances
            .currency
            .checked_add(gains.currency)
            .ok_or(LedgerError::Overflow("currency"))?;
        let population = self
            .balances
            .population
            .checked_add(gains.population)
            .ok_or(LedgerError::Overflow("population"))?;

        let target = settings
            .morale_baseline
            .checked_add(gains.morale)
            .ok_or(LedgerError::Overflow("morale target"))?;
        let drift = target
            .checked_sub(self.balances.morale)
            .and_then(|gap| gap.checked_mul(settings.morale_drift_rate))
            .ok_or(LedgerError::Overflow("morale drift"))?;
        let morale = self
            .balances
            .morale
            .checked_add(drift)
            .ok_or(LedgerError::Overflow("morale"))?
            .clamp(Decimal::ZERO, MORALE_MAX);

        self.balances = ResourceLedger {
            currency,
            population,
            morale,
        };
        Ok(())
    }
}

impl From<ResourceLedger> for Ledger {
    fn from(balances: ResourceLedger) -> Self {
        Self::new(balances.currency, balances.population, balances.morale)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn ledger() -> Ledger {
        Ledger::new(dec!(1000), dec!(10), dec!(50))
    }

    #[test]
    fn spend_is_all_or_nothing() {
        let mut ledger = ledger();
        ledger.spend(dec!(100)).unwrap();
        assert_eq!(ledger.currency(), dec!(900));

        let err = ledger.spend(dec!(901));
        assert!(matches!(err, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(ledger.currency(), dec!(900));

        ledger.spend(dec!(900)).unwrap();
        assert_eq!(ledger.currency(), Decimal::ZERO);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut ledger = ledger();
        assert!(ledger.spend(dec!(-1)).is_err());
        assert!(ledger.credit(dec!(-1)).is_err());
        assert_eq!(ledger.currency(), dec!(1000));
    }

    #[test]
    fn morale_drifts_a_tenth_of_the_gap() {
        let mut ledger = ledger();
        let gains = ResourceGains {
            morale: dec!(25),
            ..ResourceGains::default()
        };
        ledger.apply_gains(&gains, &EconomySettings::default()).unwrap();
        // target 75, gap 25, drift 2.5
        assert_eq!(ledger.morale(), dec!(52.5));
    }

    #[test]
    fn morale_is_clamped() {
        let settings = EconomySettings {
            morale_drift_rate: dec!(1),
            ..EconomySettings::default()
        };
        let mut ledger = ledger();
        let high = ResourceGains {
            morale: dec!(500),
            ..ResourceGains::default()
        };
        ledger.apply_gains(&high, &settings).unwrap();
        assert_eq!(ledger.morale(), dec!(100));

        let low = ResourceGains {
            morale: dec!(-500),
            ..ResourceGains::default()
        };
        ledger.apply_gains(&low, &settings).unwrap();
        assert_eq!(ledger.morale(), Decimal::ZERO);
    }

    #[test]
    fn starting_morale_is_clamped() {
        assert_eq!(Ledger::new(dec!(0), dec!(0), dec!(150)).morale(), dec!(100));
    }
}
