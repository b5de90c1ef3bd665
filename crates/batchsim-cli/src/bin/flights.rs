//! Passenger and baggage totals for the first flights after ten passes.
//!
//! Exits with status 1 when the passenger or flight collections cannot be
//! allocated.

use batchsim_logic::aggregation::{run_aggregation, AggregationConfig};

fn main() {
    batchsim_cli::init_logging();
    let config = AggregationConfig::default();
    match run_aggregation(&config) {
        Ok(report) => {
            println!("{report}");
            log::info!(
                "{} passengers over {} flights, {} passes",
                report.passenger_count,
                report.flights.len(),
                report.passes
            );
        }
        Err(err) => batchsim_cli::fail("flights", err),
    }
}
