//! Per-machine production counters.
//!
//! Machines run one after another from a single shared generator, so a
//! machine's counters depend on how many draws the machines before it made.
//! Each operation draws the unit increment, then the cycle increment, then
//! checks the bonus rule: whenever `units_produced` lands on a multiple of
//! `bonus_every` after the update, one extra cycle is added. Landing on the
//! same multiple again (a zero increment) earns another bonus.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, DEFAULT_SEED};
use crate::error::SimError;
use crate::rng::{RngKind, SimRng};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub machine_count: u32,
    pub operations_per_machine: u32,
    /// Unit increments are drawn in `[0, unit_bound)`.
    pub unit_bound: u32,
    /// Cycle increments are drawn in `[0, cycle_bound)`.
    pub cycle_bound: u32,
    pub bonus_every: u64,
    pub seed: u64,
    pub rng: RngKind,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            machine_count: 5,
            operations_per_machine: 50_000,
            unit_bound: 10,
            cycle_bound: 5,
            bonus_every: 100,
            seed: DEFAULT_SEED,
            rng: RngKind::Glibc,
        }
    }
}

impl MachineConfig {
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.unit_bound == 0 {
            errors.push(ConfigError::ZeroBound("unit_bound"));
        }
        if self.cycle_bound == 0 {
            errors.push(ConfigError::ZeroBound("cycle_bound"));
        }
        if self.bonus_every == 0 {
            errors.push(ConfigError::ZeroBound("bonus_every"));
        }
        errors
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: u32,
    pub units_produced: u64,
    pub cycle_count: u64,
    /// How many of `cycle_count`'s cycles came from the bonus rule.
    pub bonus_cycles: u64,
}

impl Machine {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// One operation. Returns true when the bonus fired.
    ///
    /// # Panics
    ///
    /// If `unit_bound` or `cycle_bound` is zero. [`run_machines`] rejects
    /// such configs before stepping.
    pub fn step(&mut self, config: &MachineConfig, rng: &mut impl SimRng) -> bool {
        self.units_produced += u64::from(rng.below(config.unit_bound));
        self.cycle_count += u64::from(rng.below(config.cycle_bound));
        if self.units_produced.is_multiple_of(config.bonus_every) {
            self.cycle_count += 1;
            self.bonus_cycles += 1;
            true
        } else {
            false
        }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "machine {} finished: {} units produced, {} cycles",
            self.id, self.units_produced, self.cycle_count
        )
    }
}

/// Run all of a machine's operations.
///
/// # Panics
///
/// Same as [`Machine::step`]: on a zero `unit_bound` or `cycle_bound`.
pub fn operate(machine: &mut Machine, config: &MachineConfig, rng: &mut impl SimRng) {
    for _ in 0..config.operations_per_machine {
        machine.step(config, rng);
    }
}

/// Machines with ids `1..=count` and zeroed counters.
pub fn init_machines(count: u32) -> Vec<Machine> {
    (1..=count).map(Machine::new).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineReport {
    pub operations_per_machine: u32,
    pub machines: Vec<Machine>,
}

impl fmt::Display for MachineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.machines.iter().map(ToString::to_string).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

pub fn run_machines(config: &MachineConfig) -> Result<MachineReport, SimError> {
    run_machines_with(config, |_| {}, |_| {})
}

/// Run every machine in id order. `on_start` fires before a machine's first
/// operation and `on_finished` right after its last, before the next
/// machine begins.
pub fn run_machines_with(
    config: &MachineConfig,
    mut on_start: impl FnMut(&Machine),
    mut on_finished: impl FnMut(&Machine),
) -> Result<MachineReport, SimError> {
    SimError::check(config.validate())?;

    let mut rng = config.rng.seeded(config.seed);
    let mut machines = init_machines(config.machine_count);
    for machine in machines.iter_mut() {
        on_start(machine);
        operate(machine, config, &mut rng);
        log::debug!(
            "machine {} earned {} bonus cycles",
            machine.id,
            machine.bonus_cycles
        );
        on_finished(machine);
    }

    Ok(MachineReport {
        operations_per_machine: config.operations_per_machine,
        machines,
    })
}
