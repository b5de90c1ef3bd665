//! FIFO TLB miss rates for the bundled access trace across TLB sizes.

use batchsim_logic::tlb::{run_tlb_sweep, TlbConfig, SAMPLE_TRACE};

fn main() {
    batchsim_cli::init_logging();
    match run_tlb_sweep(SAMPLE_TRACE, &TlbConfig::default()) {
        Ok(reports) => {
            for report in reports {
                println!("{report}");
            }
        }
        Err(err) => batchsim_cli::fail("tlb", err),
    }
}
