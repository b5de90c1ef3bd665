//! Compound interest over 100 years with a stepped rate.

use batchsim_logic::accrual::{run_accrual, AccrualConfig};

fn main() {
    batchsim_cli::init_logging();
    match run_accrual(&AccrualConfig::default()) {
        Ok(report) => println!("{report}"),
        Err(err) => batchsim_cli::fail("accrual", err),
    }
}
