//! Shared plumbing for the standalone batch binaries.
//!
//! Reports go to stdout; logs and diagnostics go to stderr so the report
//! stays clean when piped.

use std::error::Error;
use std::fmt::Write;

use batchsim_logic::SimError;

/// Warnings and errors only, unless `RUST_LOG` says otherwise. Safe to call
/// more than once; later calls keep the first logger.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .try_init();
}

/// One-line `batch: error: cause: ...` message covering the source chain.
pub fn diagnostic(batch: &str, err: &SimError) -> String {
    let mut message = format!("{batch}: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(message, ": {cause}");
        source = cause.source();
    }
    message
}

/// Print `err` and its source chain to stderr, then exit with status 1.
pub fn fail(batch: &str, err: SimError) -> ! {
    log::error!("{batch} failed: {err}");
    eprintln!("{}", diagnostic(batch, &err));
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchsim_logic::config::ConfigError;

    #[test]
    fn diagnostic_includes_allocation_cause() {
        let source = Vec::<u64>::new().try_reserve_exact(usize::MAX).unwrap_err();
        let cause = source.to_string();
        let err = SimError::Allocation {
            what: "flights",
            count: 3,
            source,
        };
        let message = diagnostic("flights", &err);
        assert!(message.starts_with("flights: failed to allocate 3 flights"));
        assert!(message.ends_with(&format!(": {cause}")));
    }

    #[test]
    fn diagnostic_without_source_is_single_segment() {
        let err = SimError::InvalidConfig(vec![ConfigError::ZeroFlights]);
        assert_eq!(diagnostic("flights", &err), format!("flights: {err}"));
    }

    #[test]
    fn logging_init_is_repeatable() {
        init_logging();
        init_logging();
        log::warn!("logger still installed");
    }
}
