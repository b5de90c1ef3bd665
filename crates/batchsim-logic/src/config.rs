//! Parameter bundle for the whole suite and the validation errors every
//! per-batch config reports.
//!
//! Defaults are the fixed constants the batches ship with; nothing reads
//! them from the environment or the command line.
//!
//! ```
//! use batchsim_logic::config::SimulationSuite;
//!
//! let suite = SimulationSuite::default();
//! assert!(suite.validate().is_empty());
//! assert_eq!(suite.aggregation.passenger_count, 100_000);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::accrual::AccrualConfig;
use crate::aggregation::AggregationConfig;
use crate::machines::MachineConfig;
use crate::tlb::TlbConfig;

/// Seed every randomized batch uses unless told otherwise.
pub const DEFAULT_SEED: u64 = 11111;

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Rate step interval of zero years.
    #[error("step_every must be at least 1 year")]
    ZeroStepInterval,
    /// A floating parameter is NaN or infinite.
    #[error("{0} must be finite")]
    NonFinite(&'static str),
    /// A floating parameter is below zero.
    #[error("{0} must not be negative")]
    Negative(&'static str),
    /// Passengers exist but there is no flight to assign them to.
    #[error("flight_count must be non-zero when there are passengers")]
    ZeroFlights,
    /// A modulo bound of zero.
    #[error("{0} must be non-zero")]
    ZeroBound(&'static str),
    /// A record count that does not fit the 32-bit id space.
    #[error("{field} of {value} exceeds the 32-bit id range")]
    TooLarge { field: &'static str, value: usize },
    /// TLB sweep without any size.
    #[error("tlb sweep needs at least one size")]
    NoTlbSizes,
}

/// Every batch's parameters in one place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSuite {
    pub accrual: AccrualConfig,
    pub aggregation: AggregationConfig,
    pub machines: MachineConfig,
    pub tlb: TlbConfig,
}

impl SimulationSuite {
    /// Validate every batch, returning all errors found.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.accrual.validate();
        errors.extend(self.aggregation.validate());
        errors.extend(self.machines.validate());
        errors.extend(self.tlb.validate());
        errors
    }
}

/// Push `NonFinite` or `Negative` for a floating parameter.
pub(crate) fn check_non_negative(errors: &mut Vec<ConfigError>, name: &'static str, value: f64) {
    if !value.is_finite() {
        errors.push(ConfigError::NonFinite(name));
    } else if value < 0.0 {
        errors.push(ConfigError::Negative(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngKind;

    #[test]
    fn default_suite_is_valid() {
        let suite = SimulationSuite::default();
        let errors = suite.validate();
        assert!(errors.is_empty(), "default suite should be valid: {errors:?}");
    }

    #[test]
    fn collects_errors_from_every_batch() {
        let mut suite = SimulationSuite::default();
        suite.accrual.step_every = 0;
        suite.aggregation.flight_count = 0;
        suite.machines.cycle_bound = 0;
        suite.tlb.sizes.clear();
        let errors = suite.validate();
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.contains(&ConfigError::ZeroStepInterval));
        assert!(errors.contains(&ConfigError::ZeroFlights));
        assert!(errors.contains(&ConfigError::ZeroBound("cycle_bound")));
        assert!(errors.contains(&ConfigError::NoTlbSizes));
    }

    #[test]
    fn non_negative_check() {
        let mut errors = Vec::new();
        check_non_negative(&mut errors, "rate", 0.0);
        assert!(errors.is_empty());
        check_non_negative(&mut errors, "rate", -0.1);
        check_non_negative(&mut errors, "principal", f64::NAN);
        assert_eq!(
            errors,
            vec![
                ConfigError::Negative("rate"),
                ConfigError::NonFinite("principal")
            ]
        );
    }

    #[test]
    fn empty_json_yields_defaults() {
        let suite: SimulationSuite = serde_json::from_str("{}").unwrap();
        assert_eq!(suite.accrual.years, 100);
        assert_eq!(suite.aggregation.seed, DEFAULT_SEED);
        assert_eq!(suite.machines.machine_count, 5);
        assert_eq!(suite.tlb.sizes, vec![4, 8, 16, 32, 64, 128]);
    }

    #[test]
    fn partial_json_overrides_one_field() {
        let suite: SimulationSuite =
            serde_json::from_str(r#"{"machines": {"operations_per_machine": 3, "rng": "std"}}"#)
                .unwrap();
        assert_eq!(suite.machines.operations_per_machine, 3);
        assert_eq!(suite.machines.rng, RngKind::Std);
        assert_eq!(suite.machines.unit_bound, 10);
    }
}
