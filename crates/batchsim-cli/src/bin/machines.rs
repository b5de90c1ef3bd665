//! Production counters for each machine, printed as each one finishes.

use batchsim_logic::machines::{run_machines_with, MachineConfig};

fn main() {
    batchsim_cli::init_logging();
    let result = run_machines_with(
        &MachineConfig::default(),
        |machine| println!("starting machine {}", machine.id),
        |machine| println!("{machine}\n"),
    );
    if let Err(err) = result {
        batchsim_cli::fail("machines", err);
    }
}
