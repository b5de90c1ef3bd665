//! Per-flight passenger and baggage tallies.
//!
//! A fixed roster of passengers is generated once: each draws a flight id,
//! then a baggage weight, from the shared generator in passenger order.
//! The roster is then tallied onto the flights `pass_count` times.
//!
//! Flight accumulators are not cleared between passes, so the final counts
//! are the single-pass counts multiplied by `pass_count`. That is the
//! reference behaviour and stays the default; `reset_between_passes` opts
//! into per-pass totals instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, DEFAULT_SEED};
use crate::error::SimError;
use crate::rng::{RngKind, SimRng};

/// Aggregation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub passenger_count: usize,
    pub flight_count: usize,
    pub pass_count: u32,
    /// Weights are drawn in `[1, max_baggage_weight]`.
    pub max_baggage_weight: u32,
    /// How many flights (lowest ids first) the report prints.
    pub reported_flights: usize,
    pub seed: u64,
    pub rng: RngKind,
    pub reset_between_passes: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            passenger_count: 100_000,
            flight_count: 200,
            pass_count: 10,
            max_baggage_weight: 30,
            reported_flights: 10,
            seed: DEFAULT_SEED,
            rng: RngKind::Glibc,
            reset_between_passes: false,
        }
    }
}

impl AggregationConfig {
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.flight_count == 0 && self.passenger_count > 0 {
            errors.push(ConfigError::ZeroFlights);
        }
        for (field, value) in [
            ("passenger_count", self.passenger_count),
            ("flight_count", self.flight_count),
        ] {
            if u32::try_from(value).is_err() {
                errors.push(ConfigError::TooLarge { field, value });
            }
        }
        if self.max_baggage_weight == 0 {
            errors.push(ConfigError::ZeroBound("max_baggage_weight"));
        }
        errors
    }
}

/// One passenger. Never changes after the roster is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: u32,
    pub flight_id: u32,
    pub baggage_weight: u32,
}

/// One flight's running totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub id: u32,
    pub passenger_count: u64,
    pub total_baggage_weight: u64,
}

impl Flight {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn board(&mut self, passenger: &Passenger) {
        self.passenger_count += 1;
        self.total_baggage_weight += u64::from(passenger.baggage_weight);
    }

    fn clear(&mut self) {
        self.passenger_count = 0;
        self.total_baggage_weight = 0;
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "flight {}: {} passengers, {} kg of baggage",
            self.id, self.passenger_count, self.total_baggage_weight
        )
    }
}

/// Reserve exactly `count` slots up front; the collections never grow.
fn allocate<T>(what: &'static str, count: usize) -> Result<Vec<T>, SimError> {
    let mut records = Vec::new();
    records
        .try_reserve_exact(count)
        .map_err(|source| SimError::Allocation {
            what,
            count,
            source,
        })?;
    Ok(records)
}

/// Zeroed flights with ids `0..count`.
pub fn init_flights(count: usize) -> Result<Vec<Flight>, SimError> {
    let mut flights = allocate("flights", count)?;
    // ids fit in u32, checked by validate()
    flights.extend((0..count).map(|id| Flight::new(id as u32)));
    Ok(flights)
}

/// The fixed passenger set.
#[derive(Debug, Clone)]
pub struct Roster {
    passengers: Vec<Passenger>,
}

impl Roster {
    /// Draw every passenger's flight id then weight, in id order.
    ///
    /// # Panics
    ///
    /// If there are passengers and `flight_count` or `max_baggage_weight`
    /// is zero. [`run_aggregation`] validates the config first.
    pub fn generate(config: &AggregationConfig, rng: &mut impl SimRng) -> Result<Self, SimError> {
        let mut passengers = allocate("passengers", config.passenger_count)?;
        // ids fit in u32, checked by validate()
        let flights = config.flight_count as u32;
        for id in 0..config.passenger_count {
            let flight_id = rng.below(flights);
            let baggage_weight = rng.below(config.max_baggage_weight) + 1;
            passengers.push(Passenger {
                id: id as u32,
                flight_id,
                baggage_weight,
            });
        }
        Ok(Self { passengers })
    }

    pub fn from_passengers(passengers: Vec<Passenger>) -> Self {
        Self { passengers }
    }

    pub fn passengers(&self) -> &[Passenger] {
        &self.passengers
    }

    pub fn len(&self) -> usize {
        self.passengers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passengers.is_empty()
    }
}

/// Add every passenger to its flight once. Flight ids index `flights`.
///
/// # Panics
///
/// If a passenger's `flight_id` is not an index into `flights`.
pub fn run_pass(roster: &Roster, flights: &mut [Flight]) {
    for passenger in roster.passengers() {
        flights[passenger.flight_id as usize].board(passenger);
    }
}

/// Final flight totals of an aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationReport {
    pub passes: u32,
    pub passenger_count: usize,
    pub reported_flights: usize,
    /// Every flight, ordered by id.
    pub flights: Vec<Flight>,
}

impl AggregationReport {
    /// The flights the report prints.
    pub fn reported(&self) -> &[Flight] {
        &self.flights[..self.reported_flights.min(self.flights.len())]
    }

    pub fn total_passengers(&self) -> u64 {
        self.flights.iter().map(|f| f.passenger_count).sum()
    }

    pub fn total_baggage_weight(&self) -> u64 {
        self.flights.iter().map(|f| f.total_baggage_weight).sum()
    }
}

impl fmt::Display for AggregationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for flight in self.reported() {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{flight}")?;
            first = false;
        }
        Ok(())
    }
}

/// Build the roster, tally it `pass_count` times, report every flight.
pub fn run_aggregation(config: &AggregationConfig) -> Result<AggregationReport, SimError> {
    SimError::check(config.validate())?;

    let mut rng = config.rng.seeded(config.seed);
    let mut flights = init_flights(config.flight_count)?;
    let roster = Roster::generate(config, &mut rng)?;
    log::debug!(
        "generated {} passengers over {} flights",
        roster.len(),
        flights.len()
    );

    for pass in 0..config.pass_count {
        if config.reset_between_passes {
            flights.iter_mut().for_each(Flight::clear);
        }
        run_pass(&roster, &mut flights);
        log::trace!("pass {} done", pass + 1);
    }

    Ok(AggregationReport {
        passes: config.pass_count,
        passenger_count: roster.len(),
        reported_flights: config.reported_flights,
        flights,
    })
}
