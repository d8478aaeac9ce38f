//! The economy calculator: buildings and elapsed time in, resource deltas out.
//!
//! [`compute_gains`] is pure. It reads the grid, the building registry and
//! the game parameters and returns the deltas a tick should apply; it
//! never mutates anything. Buildings whose type has no configured stats are
//! skipped with a debug log.

use metacity_types::{GameParameters, Resource};
use metacity_world::{BuildingRegistry, SpatialGrid};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::LedgerError;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Tunables for morale and its effect on production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomySettings {
    /// Morale level at which production runs at exactly 1x, and the resting
    /// point morale drifts toward absent happiness effects.
    pub morale_baseline: Decimal,
    /// Fraction of the gap to the target closed per tick.
    pub morale_drift_rate: Decimal,
    /// Lower bound of the morale production multiplier.
    pub morale_floor_multiplier: Decimal,
    /// Optional upper bound of the morale production multiplier.
    pub morale_multiplier_cap: Option<Decimal>,
}

impl Default for EconomySettings {
    fn default() -> Self {
        Self {
            morale_baseline: Decimal::from(50),
            morale_drift_rate: Decimal::new(1, 1),
            morale_floor_multiplier: Decimal::new(5, 1),
            morale_multiplier_cap: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Read-only view of the state the calculator needs.
#[derive(Debug, Clone, Copy)]
pub struct EconomyInputs<'a> {
    /// The grid, for road adjacency.
    pub grid: &'a SpatialGrid,
    /// Every standing building.
    pub registry: &'a BuildingRegistry,
    /// Cost, production and happiness curves.
    pub parameters: &'a GameParameters,
    /// Current morale, for the production multiplier.
    pub morale: Decimal,
}

/// Deltas produced by one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGains {
    /// Currency to add, already scaled by morale.
    pub currency: Decimal,
    /// Population to add, already scaled by morale.
    pub population: Decimal,
    /// Raw happiness-effect total; not time-scaled.
    pub morale: Decimal,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

fn checked_add(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, LedgerError> {
    a.checked_add(b).ok_or(LedgerError::Overflow(what))
}

fn checked_mul(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, LedgerError> {
    a.checked_mul(b).ok_or(LedgerError::Overflow(what))
}

/// Production multiplier for the current morale:
/// `max(floor, 1 + (morale - baseline) / 100)`, optionally capped.
pub fn morale_multiplier(morale: Decimal, settings: &EconomySettings) -> Result<Decimal, LedgerError> {
    let offset = morale
        .checked_sub(settings.morale_baseline)
        .and_then(|d| d.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(LedgerError::Overflow("morale multiplier"))?;
    let raw = checked_add(Decimal::ONE, offset, "morale multiplier")?;
    let floored = raw.max(settings.morale_floor_multiplier);
    Ok(settings
        .morale_multiplier_cap
        .map_or(floored, |cap| floored.min(cap)))
}

/// Compute the resource deltas for `elapsed_ms` milliseconds.
///
/// Non-road buildings with at least one road among their four orthogonal
/// neighbours produce at `1 + adjacency_bonus`. A level beyond the rate or
/// effect curve contributes zero.
///
/// # Errors
///
/// Returns [`LedgerError::Overflow`] if a checked operation overflows.
pub fn compute_gains(
    inputs: &EconomyInputs<'_>,
    elapsed_ms: u64,
    settings: &EconomySettings,
) -> Result<ResourceGains, LedgerError> {
    let elapsed_secs = Decimal::from(elapsed_ms)
        .checked_div(Decimal::ONE_THOUSAND)
        .ok_or(LedgerError::Overflow("elapsed seconds"))?;
    let boosted = checked_add(Decimal::ONE, inputs.parameters.adjacency_bonus, "adjacency")?;

    let mut gains = ResourceGains::default();

    for building in inputs.registry.iter() {
        let Some(stats) = inputs.parameters.stats(building.building_type) else {
            debug!(
                building_id = %building.id,
                building_type = ?building.building_type,
                "Skipping building with unconfigured type"
            );
            continue;
        };

        if let Some(production) = &stats.production {
            let multiplier = if !building.building_type.is_road()
                && inputs.grid.has_adjacent_road(building.position, inputs.registry)
            {
                boosted
            } else {
                Decimal::ONE
            };
            let rate = stats.rate_at(building.level);
            let produced = checked_mul(
                checked_mul(rate, multiplier, "production")?,
                elapsed_secs,
                "production",
            )?;
            match production.resource {
                Resource::Currency => {
                    gains.currency = checked_add(gains.currency, produced, "currency gain")?;
                }
                Resource::Population => {
                    gains.population = checked_add(gains.population, produced, "population gain")?;
                }
            }
        }

        gains.morale = checked_add(
            gains.morale,
            stats.happiness_at(building.level),
            "happiness effect",
        )?;
    }

    let multiplier = morale_multiplier(inputs.morale, settings)?;
    gains.currency = checked_mul(gains.currency, multiplier, "currency gain")?;
    gains.population = checked_mul(gains.population, multiplier, "population gain")?;

    Ok(gains)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use metacity_types::{ActorId, Building, BuildingId, BuildingType, Position};
    use metacity_world::default_parameters;
    use rust_decimal_macros::dec;

    use super::*;

    struct Fixture {
        grid: SpatialGrid,
        registry: BuildingRegistry,
        parameters: GameParameters,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                grid: SpatialGrid::new(10).unwrap(),
                registry: BuildingRegistry::new(),
                parameters: default_parameters(),
            }
        }

        fn place(&mut self, building_type: BuildingType, level: u32, x: u32, y: u32) {
            let building = Building {
                id: BuildingId::new(),
                owner: ActorId::new("alice"),
                building_type,
                level,
                position: Position::new(x, y),
                created_at: Utc::now(),
            };
            self.grid.link_building(building.position, building.id).unwrap();
            self.registry.insert(building).unwrap();
        }

        fn gains(&self, morale: Decimal, elapsed_ms: u64) -> ResourceGains {
            let inputs = EconomyInputs {
                grid: &self.grid,
                registry: &self.registry,
                parameters: &self.parameters,
                morale,
            };
            compute_gains(&inputs, elapsed_ms, &EconomySettings::default()).unwrap()
        }
    }

    #[test]
    fn empty_city_produces_nothing() {
        let fixture = Fixture::new();
        assert_eq!(fixture.gains(dec!(50), 1000), ResourceGains::default());
    }

    #[test]
    fn orthogonal_road_grants_bonus() {
        let mut fixture = Fixture::new();
        fixture.place(BuildingType::Commercial, 1, 4, 4);
        fixture.place(BuildingType::Road, 1, 4, 5);
        assert_eq!(fixture.gains(dec!(50), 1000).currency, dec!(12));
    }

    #[test]
    fn diagonal_road_grants_nothing() {
        let mut fixture = Fixture::new();
        fixture.place(BuildingType::Commercial, 1, 4, 4);
        fixture.place(BuildingType::Road, 1, 5, 5);
        assert_eq!(fixture.gains(dec!(50), 1000).currency, dec!(10));
    }

    #[test]
    fn bonus_is_boolean_not_per_road() {
        let mut fixture = Fixture::new();
        fixture.place(BuildingType::Commercial, 1, 4, 4);
        fixture.place(BuildingType::Road, 1, 4, 5);
        fixture.place(BuildingType::Road, 1, 4, 3);
        fixture.place(BuildingType::Road, 1, 3, 4);
        assert_eq!(fixture.gains(dec!(50), 1000).currency, dec!(12));
    }

    #[test]
    fn production_scales_with_time_but_happiness_does_not() {
        let mut fixture = Fixture::new();
        fixture.place(BuildingType::Industrial, 1, 0, 0);
        let one = fixture.gains(dec!(50), 1000);
        let two = fixture.gains(dec!(50), 2000);
        assert_eq!(one.currency, dec!(30));
        assert_eq!(two.currency, dec!(60));
        assert_eq!(one.morale, dec!(-2));
        assert_eq!(two.morale, dec!(-2));
    }

    #[test]
    fn level_beyond_curve_contributes_zero() {
        let mut fixture = Fixture::new();
        fixture.place(BuildingType::Commercial, 7, 0, 0);
        fixture.place(BuildingType::Park, 7, 2, 2);
        let gains = fixture.gains(dec!(50), 1000);
        assert_eq!(gains.currency, Decimal::ZERO);
        assert_eq!(gains.morale, Decimal::ZERO);
    }

    #[test]
    fn unconfigured_type_is_skipped() {
        let mut fixture = Fixture::new();
        fixture.place(BuildingType::Residential, 1, 0, 0);
        fixture.place(BuildingType::Commercial, 1, 5, 5);
        fixture.parameters.building_stats.remove(&BuildingType::Commercial);
        let gains = fixture.gains(dec!(50), 1000);
        assert_eq!(gains.currency, Decimal::ZERO);
        assert_eq!(gains.population, dec!(1));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn unconfigured_type_is_logged_at_debug() {
        let mut fixture = Fixture::new();
        fixture.place(BuildingType::Commercial, 1, 5, 5);
        fixture.parameters.building_stats.remove(&BuildingType::Commercial);

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let gains =
            tracing::subscriber::with_default(subscriber, || fixture.gains(dec!(50), 1000));

        assert_eq!(gains.currency, Decimal::ZERO);
        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Skipping building with unconfigured type"));
        assert!(output.contains("Commercial"));
    }

    #[test]
    fn morale_multiplier_has_floor_and_optional_cap() {
        let settings = EconomySettings::default();
        assert_eq!(morale_multiplier(dec!(50), &settings).unwrap(), dec!(1));
        assert_eq!(morale_multiplier(dec!(0), &settings).unwrap(), dec!(0.5));
        assert_eq!(morale_multiplier(dec!(100), &settings).unwrap(), dec!(1.5));

        let capped = EconomySettings {
            morale_multiplier_cap: Some(dec!(1.2)),
            ..settings
        };
        assert_eq!(morale_multiplier(dec!(100), &capped).unwrap(), dec!(1.2));
    }

    #[test]
    fn low_morale_halves_production() {
        let mut fixture = Fixture::new();
        fixture.place(BuildingType::Commercial, 1, 0, 0);
        assert_eq!(fixture.gains(dec!(0), 1000).currency, dec!(5));
    }
}
