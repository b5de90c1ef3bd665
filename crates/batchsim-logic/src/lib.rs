//! Pure simulation logic for batchsim.
//!
//! Every batch here follows the same shape: build a fixed set of records,
//! run a bounded loop of arithmetic updates, hand back a report. Nothing in
//! this crate prints or touches the filesystem; the binaries in
//! `batchsim-cli` and the `batchsim-simtest` harness do the formatting.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`rng`] | Seeded generators (`GlibcRand`, `StdRng`, scripted) behind [`rng::SimRng`] |
//! | [`accrual`] | Compound interest over a fixed horizon with stepped rates |
//! | [`aggregation`] | Per-flight passenger and baggage tallies over repeated passes |
//! | [`machines`] | Per-machine production counters with a bonus-cycle rule |
//! | [`tlb`] | FIFO instruction/data TLB miss rates over an access trace |
//! | [`config`] | Parameter bundle for the whole suite and validation errors |
//! | [`error`] | Runtime error type shared by all batches |
//!
//! ```
//! use batchsim_logic::accrual::{run_accrual, AccrualConfig};
//!
//! let report = run_accrual(&AccrualConfig::default()).unwrap();
//! assert!((report.final_rate - 0.06).abs() < 1e-9);
//! ```

pub mod accrual;
pub mod aggregation;
pub mod config;
pub mod error;
pub mod machines;
pub mod rng;
pub mod tlb;

pub use error::SimError;
