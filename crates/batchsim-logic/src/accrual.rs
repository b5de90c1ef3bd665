//! Compound interest over a fixed horizon.
//!
//! Each year the account earns `principal * rate`, the interest is added to
//! the principal and to both interest totals, and every `step_every`-th year
//! the rate is raised by `rate_step` *after* that year's accrual, so the new
//! rate first applies the following year.
//!
//! Principal and interest totals are summed with Neumaier compensation so a
//! 100-year run carries no visible rounding drift; the rate is a plain `f64`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{check_non_negative, ConfigError};
use crate::error::SimError;

/// Accrual parameters. Defaults: 100 years, 1000.0 at 5%, +0.1% every decade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccrualConfig {
    pub years: u32,
    pub initial_principal: f64,
    pub initial_rate: f64,
    pub rate_step: f64,
    /// Years between rate steps.
    pub step_every: u32,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            years: 100,
            initial_principal: 1000.0,
            initial_rate: 0.05,
            rate_step: 0.001,
            step_every: 10,
        }
    }
}

impl AccrualConfig {
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.step_every == 0 {
            errors.push(ConfigError::ZeroStepInterval);
        }
        check_non_negative(&mut errors, "initial_principal", self.initial_principal);
        check_non_negative(&mut errors, "initial_rate", self.initial_rate);
        check_non_negative(&mut errors, "rate_step", self.rate_step);
        errors
    }
}

/// Neumaier-compensated running sum.
#[derive(Debug, Clone, Copy, Default)]
struct Compensated {
    sum: f64,
    compensation: f64,
}

impl Compensated {
    fn new(value: f64) -> Self {
        Self {
            sum: value,
            compensation: 0.0,
        }
    }

    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if !t.is_finite() {
            // Past f64 range the correction term would be inf - inf.
            self.sum = t;
            self.compensation = 0.0;
            return;
        }
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        if !self.sum.is_finite() {
            return self.sum;
        }
        self.sum + self.compensation
    }
}

/// The single account an accrual run mutates.
#[derive(Debug, Clone)]
pub struct InterestAccount {
    principal: Compensated,
    rate: f64,
    accumulated_interest: Compensated,
    total_yield: Compensated,
}

impl InterestAccount {
    pub fn new(principal: f64, rate: f64) -> Self {
        Self {
            principal: Compensated::new(principal),
            rate,
            accumulated_interest: Compensated::default(),
            total_yield: Compensated::default(),
        }
    }

    pub fn principal(&self) -> f64 {
        self.principal.value()
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn accumulated_interest(&self) -> f64 {
        self.accumulated_interest.value()
    }

    pub fn total_yield(&self) -> f64 {
        self.total_yield.value()
    }

    /// Apply one year and return the interest it earned. `year` is 1-based.
    pub fn accrue_year(&mut self, year: u32, config: &AccrualConfig) -> f64 {
        let interest = self.principal() * self.rate;
        self.principal.add(interest);
        self.accumulated_interest.add(interest);
        self.total_yield.add(interest);
        if year.is_multiple_of(config.step_every) {
            self.rate += config.rate_step;
        }
        interest
    }
}

/// Final values of an accrual run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccrualReport {
    pub years: u32,
    pub final_principal: f64,
    pub accumulated_interest: f64,
    pub total_yield: f64,
    pub final_rate: f64,
}

impl fmt::Display for AccrualReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "final principal: {:.3}", self.final_principal)?;
        writeln!(f, "accumulated interest: {:.3}", self.accumulated_interest)?;
        writeln!(f, "total yield: {:.3}", self.total_yield)?;
        write!(f, "final interest rate: {:.3}", self.final_rate)
    }
}

/// Run the whole horizon.
pub fn run_accrual(config: &AccrualConfig) -> Result<AccrualReport, SimError> {
    run_accrual_with(config, |_, _| {})
}

/// Run the whole horizon, handing `observer` the account after each year.
pub fn run_accrual_with(
    config: &AccrualConfig,
    mut observer: impl FnMut(u32, &InterestAccount),
) -> Result<AccrualReport, SimError> {
    SimError::check(config.validate())?;

    let mut account = InterestAccount::new(config.initial_principal, config.initial_rate);
    for year in 1..=config.years {
        account.accrue_year(year, config);
        observer(year, &account);
    }

    log::debug!(
        "accrual finished after {} years at rate {:.4}",
        config.years,
        account.rate()
    );

    Ok(AccrualReport {
        years: config.years,
        final_principal: account.principal(),
        accumulated_interest: account.accumulated_interest(),
        total_yield: account.total_yield(),
        final_rate: account.rate(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_years_returns_initial_values() {
        let config = AccrualConfig {
            years: 0,
            ..Default::default()
        };
        let report = run_accrual(&config).unwrap();
        assert_eq!(report.final_principal, 1000.0);
        assert_eq!(report.accumulated_interest, 0.0);
        assert_eq!(report.total_yield, 0.0);
        assert_eq!(report.final_rate, 0.05);
    }

    #[test]
    fn default_horizon_matches_reference() {
        let report = run_accrual(&AccrualConfig::default()).unwrap();
        assert!((report.final_rate - 0.06).abs() < 1e-12);
        assert_eq!(format!("{:.3}", report.accumulated_interest), "200603.143");
        assert_eq!(format!("{:.3}", report.final_principal), "201603.143");
        assert_eq!(report.accumulated_interest, report.total_yield);
    }

    #[test]
    fn rate_steps_after_the_tenth_accrual() {
        let config = AccrualConfig::default();
        let mut rates = Vec::new();
        run_accrual_with(&config, |year, account| rates.push((year, account.rate()))).unwrap();

        // Year 10 accrues at 5% and only then steps.
        assert!((rates[8].1 - 0.05).abs() < 1e-12);
        assert!((rates[9].1 - 0.051).abs() < 1e-12);
        assert!((rates[10].1 - 0.051).abs() < 1e-12);
        assert!((rates[19].1 - 0.052).abs() < 1e-12);
    }

    #[test]
    fn eleventh_year_uses_stepped_rate() {
        let mut config = AccrualConfig {
            initial_principal: 100.0,
            ..Default::default()
        };
        config.years = 10;
        let ten = run_accrual(&config).unwrap();
        config.years = 11;
        let eleven = run_accrual(&config).unwrap();

        let interest = eleven.accumulated_interest - ten.accumulated_interest;
        assert!((interest - ten.final_principal * 0.051).abs() < 1e-9);
    }

    #[test]
    fn accumulators_never_decrease() {
        let mut last = (0.0, 0.0, 0.0);
        run_accrual_with(&AccrualConfig::default(), |_, account| {
            let now = (
                account.principal(),
                account.accumulated_interest(),
                account.total_yield(),
            );
            assert!(now.0 >= last.0 && now.1 >= last.1 && now.2 >= last.2);
            last = now;
        })
        .unwrap();
    }

    #[test]
    fn zero_rate_earns_nothing() {
        let config = AccrualConfig {
            initial_rate: 0.0,
            rate_step: 0.0,
            ..Default::default()
        };
        let report = run_accrual(&config).unwrap();
        assert_eq!(report.final_principal, 1000.0);
        assert_eq!(report.accumulated_interest, 0.0);
    }

    #[test]
    fn rejects_zero_step_interval() {
        let config = AccrualConfig {
            step_every: 0,
            ..Default::default()
        };
        assert!(matches!(
            run_accrual(&config),
            Err(SimError::InvalidConfig(errors)) if errors == vec![ConfigError::ZeroStepInterval]
        ));
    }

    #[test]
    fn compensated_sum_beats_naive() {
        let mut naive = 1.0e16;
        let mut compensated = Compensated::new(1.0e16);
        for _ in 0..1000 {
            naive += 1.0;
            compensated.add(1.0);
        }
        assert_eq!(compensated.value(), 1.0e16 + 1000.0);
        assert_ne!(naive, 1.0e16 + 1000.0);
    }

    #[test]
    fn overflow_saturates_instead_of_nan() {
        let config = AccrualConfig {
            years: 400,
            initial_rate: 10.0,
            ..Default::default()
        };
        let mut last = 0.0;
        let report = run_accrual_with(&config, |year, account| {
            let principal = account.principal();
            assert!(!principal.is_nan(), "principal NaN in year {year}");
            assert!(principal >= last, "principal dropped in year {year}");
            assert!(!account.accumulated_interest().is_nan());
            last = principal;
        })
        .unwrap();
        assert_eq!(report.final_principal, f64::INFINITY);
        assert_eq!(report.accumulated_interest, f64::INFINITY);
        assert_eq!(report.total_yield, f64::INFINITY);
    }

    #[test]
    fn compensated_sum_stays_infinite() {
        let mut sum = Compensated::new(f64::MAX);
        sum.add(1.0);
        sum.add(f64::MAX);
        assert_eq!(sum.value(), f64::INFINITY);
        sum.add(1.0);
        assert_eq!(sum.value(), f64::INFINITY);
    }

    #[test]
    fn report_display() {
        let report = run_accrual(&AccrualConfig::default()).unwrap();
        let text = report.to_string();
        assert!(text.contains("accumulated interest: 200603.143"));
        assert!(text.ends_with("final interest rate: 0.060"));
    }
}
