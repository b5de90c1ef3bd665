//! batchsim Headless Simulation Harness
//!
//! Runs every batch with its shipped constants, prints the reports and
//! checks the properties each batch promises.
//!
//! Usage:
//!   cargo run -p batchsim-simtest
//!   cargo run -p batchsim-simtest -- --verbose
//!   cargo run -p batchsim-simtest -- --json

use batchsim_logic::accrual::{self, AccrualConfig, AccrualReport};
use batchsim_logic::aggregation::{self, AggregationConfig, AggregationReport, Roster};
use batchsim_logic::config::SimulationSuite;
use batchsim_logic::machines::{self, Machine, MachineConfig, MachineReport};
use batchsim_logic::rng::{GlibcRand, Scripted, SimRng};
use batchsim_logic::tlb::{self, TlbReport, SAMPLE_TRACE};
use serde::Serialize;

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }

    fn error(name: &str, err: impl std::fmt::Display) -> Self {
        Self::new(name, false, format!("run failed: {err}"))
    }
}

#[derive(Debug, Default, Serialize)]
struct SuiteReports {
    accrual: Option<AccrualReport>,
    aggregation: Option<AggregationReport>,
    machines: Option<MachineReport>,
    tlb: Vec<TlbReport>,
}

/// Human output is suppressed in `--json` mode.
struct Output {
    quiet: bool,
}

impl Output {
    fn line(&self, text: impl std::fmt::Display) {
        if !self.quiet {
            println!("{text}");
        }
    }
}

fn main() {
    batchsim_cli::init_logging();

    let verbose = std::env::args().any(|a| a == "--verbose");
    let json = std::env::args().any(|a| a == "--json");
    let out = Output { quiet: json };
    out.line("=== batchsim Simulation Harness ===\n");

    let suite = SimulationSuite::default();
    let mut reports = SuiteReports::default();
    let mut results = Vec::new();

    // 0. Parameters
    let config_errors = suite.validate();
    results.push(TestResult::new(
        "suite_config_valid",
        config_errors.is_empty(),
        format!("{} config errors", config_errors.len()),
    ));

    // 1. Generator
    results.extend(validate_generator(&out));

    // 2. Compound accrual
    results.extend(validate_accrual(&out, &suite.accrual, &mut reports));

    // 3. Flight aggregation
    results.extend(validate_aggregation(&out, &suite.aggregation, &mut reports));

    // 4. Machine throughput
    results.extend(validate_machines(&out, &suite.machines, &mut reports));

    // 5. TLB sweep
    results.extend(validate_tlb(&out, &suite, &mut reports));

    // ── Summary ──
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;
    log::info!("{passed}/{} checks passed", results.len());

    if json {
        let doc = serde_json::json!({
            "config": suite,
            "reports": reports,
            "checks": results,
            "passed": passed,
            "failed": failed,
        });
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("failed to encode report: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!();
        for r in &results {
            let icon = if r.passed { "✓" } else { "✗" };
            if !r.passed || verbose {
                println!("  {} {}: {}", icon, r.name, r.detail);
            }
        }
        println!(
            "\n=== RESULT: {}/{} passed, {} failed ===",
            passed,
            results.len(),
            failed
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Generator ────────────────────────────────────────────────────────

fn validate_generator(out: &Output) -> Vec<TestResult> {
    out.line("--- Seeded Generator ---");
    let mut results = Vec::new();

    let mut rng = GlibcRand::new(1);
    let head: Vec<u32> = (0..3).map(|_| rng.next_raw()).collect();
    results.push(TestResult::new(
        "rng_glibc_seed_one",
        head == [1_804_289_383, 846_930_886, 1_681_692_777],
        format!("srand(1) → {head:?}"),
    ));

    let mut a = GlibcRand::new(11111);
    let mut b = GlibcRand::new(11111);
    let same = (0..1000).all(|_| a.next_raw() == b.next_raw());
    results.push(TestResult::new(
        "rng_same_seed_same_stream",
        same,
        "two generators from seed 11111 agree for 1000 draws",
    ));

    results
}

// ── 2. Accrual ──────────────────────────────────────────────────────────

fn validate_accrual(
    out: &Output,
    config: &AccrualConfig,
    reports: &mut SuiteReports,
) -> Vec<TestResult> {
    out.line("--- Compound Accrual ---");
    let mut results = Vec::new();

    let mut monotonic = true;
    let mut last = (f64::MIN, f64::MIN);
    let report = match accrual::run_accrual_with(config, |_, account| {
        let now = (account.principal(), account.accumulated_interest());
        monotonic &= now.0 >= last.0 && now.1 >= last.1;
        last = now;
    }) {
        Ok(report) => report,
        Err(e) => {
            results.push(TestResult::error("accrual_run", e));
            return results;
        }
    };
    out.line(&report);

    let expected_rate =
        config.initial_rate + f64::from(config.years / config.step_every) * config.rate_step;
    results.push(TestResult::new(
        "accrual_rate_cadence",
        (report.final_rate - expected_rate).abs() < 1e-9,
        format!(
            "final rate {:.4}, expected {:.4}",
            report.final_rate, expected_rate
        ),
    ));

    results.push(TestResult::new(
        "accrual_monotonic",
        monotonic,
        "principal and interest never decrease",
    ));

    results.push(TestResult::new(
        "accrual_principal_identity",
        (report.final_principal - config.initial_principal - report.accumulated_interest).abs()
            < 1e-6,
        format!(
            "principal {:.3} = {:.3} + interest {:.3}",
            report.final_principal, config.initial_principal, report.accumulated_interest
        ),
    ));

    let zero = accrual::run_accrual(&AccrualConfig {
        years: 0,
        ..config.clone()
    });
    results.push(TestResult::new(
        "accrual_zero_years",
        matches!(&zero, Ok(r) if r.accumulated_interest == 0.0
            && r.total_yield == 0.0
            && r.final_rate == config.initial_rate),
        "0 years leaves the account untouched",
    ));

    reports.accrual = Some(report);
    results
}

// ── 3. Aggregation ──────────────────────────────────────────────────────

fn validate_aggregation(
    out: &Output,
    config: &AggregationConfig,
    reports: &mut SuiteReports,
) -> Vec<TestResult> {
    out.line("--- Flight Aggregation ---");
    let mut results = Vec::new();

    let report = match aggregation::run_aggregation(config) {
        Ok(report) => report,
        Err(e) => {
            results.push(TestResult::error("aggregation_run", e));
            return results;
        }
    };
    out.line(&report);

    let expected = config.passenger_count as u64 * u64::from(config.pass_count);
    results.push(TestResult::new(
        "aggregation_passenger_total",
        report.total_passengers() == expected,
        format!(
            "{} boardings for {} passengers × {} passes",
            report.total_passengers(),
            config.passenger_count,
            config.pass_count
        ),
    ));

    // One pass must agree with a direct sum over the roster.
    let single = AggregationConfig {
        pass_count: 1,
        ..config.clone()
    };
    let mut rng = single.rng.seeded(single.seed);
    let checked = Roster::generate(&single, &mut rng)
        .and_then(|roster| aggregation::run_aggregation(&single).map(|r| (roster, r)));
    match checked {
        Ok((roster, one)) => {
            let mut sums = vec![0u64; one.flights.len()];
            for p in roster.passengers() {
                sums[p.flight_id as usize] += u64::from(p.baggage_weight);
            }
            let mismatched = one
                .flights
                .iter()
                .filter(|f| f.total_baggage_weight != sums[f.id as usize])
                .count();
            results.push(TestResult::new(
                "aggregation_single_pass_weights",
                mismatched == 0,
                format!("{mismatched} flights differ from roster sums"),
            ));

            let replayed = one.flights.iter().zip(&report.flights).all(|(a, b)| {
                b.passenger_count == a.passenger_count * u64::from(config.pass_count)
            });
            results.push(TestResult::new(
                "aggregation_passes_accumulate",
                replayed || config.reset_between_passes,
                "final counts are single-pass counts × passes",
            ));
        }
        Err(e) => results.push(TestResult::error("aggregation_single_pass", e)),
    }

    reports.aggregation = Some(report);
    results
}

// ── 4. Machines ─────────────────────────────────────────────────────────

fn validate_machines(
    out: &Output,
    config: &MachineConfig,
    reports: &mut SuiteReports,
) -> Vec<TestResult> {
    out.line("--- Machine Throughput ---");
    let mut results = Vec::new();

    let report = match machines::run_machines_with(
        config,
        |m| out.line(format!("starting machine {}", m.id)),
        |m| out.line(m),
    ) {
        Ok(report) => report,
        Err(e) => {
            results.push(TestResult::error("machines_run", e));
            return results;
        }
    };

    results.push(TestResult::new(
        "machines_sequential_ids",
        report
            .machines
            .iter()
            .zip(1u32..)
            .all(|(m, id)| m.id == id),
        format!("{} machines numbered from 1", report.machines.len()),
    ));

    let bounded = report.machines.iter().all(|m| {
        let ops = u64::from(config.operations_per_machine);
        m.units_produced <= ops * u64::from(config.unit_bound - 1)
            && m.cycle_count <= ops * u64::from(config.cycle_bound)
    });
    results.push(TestResult::new(
        "machines_counters_bounded",
        bounded,
        "counters within per-operation maxima",
    ));

    // Scripted increments: +50 units per op lands on 100 every second op.
    let mut machine = Machine::new(1);
    let mut rng = Scripted::new([50, 0]);
    let scripted = MachineConfig {
        unit_bound: 51,
        operations_per_machine: 6,
        ..config.clone()
    };
    machines::operate(&mut machine, &scripted, &mut rng);
    results.push(TestResult::new(
        "machines_bonus_on_multiples",
        machine.units_produced == 300 && machine.bonus_cycles == 3 && machine.cycle_count == 3,
        format!(
            "units {} → {} bonus cycles",
            machine.units_produced, machine.bonus_cycles
        ),
    ));

    let idle = machines::run_machines(&MachineConfig {
        machine_count: 1,
        operations_per_machine: 0,
        ..config.clone()
    });
    results.push(TestResult::new(
        "machines_idle_machine",
        matches!(&idle, Ok(r) if r.machines.len() == 1
            && r.machines[0].units_produced == 0
            && r.machines[0].cycle_count == 0),
        "1 machine, 0 operations → 0 units, 0 cycles",
    ));

    reports.machines = Some(report);
    results
}

// ── 5. TLB ──────────────────────────────────────────────────────────────

fn validate_tlb(
    out: &Output,
    suite: &SimulationSuite,
    reports: &mut SuiteReports,
) -> Vec<TestResult> {
    out.line("--- FIFO TLB ---");
    let mut results = Vec::new();

    let sweep = match tlb::run_tlb_sweep(SAMPLE_TRACE, &suite.tlb) {
        Ok(sweep) => sweep,
        Err(e) => {
            results.push(TestResult::error("tlb_run", e));
            return results;
        }
    };
    for report in &sweep {
        out.line(report);
    }

    results.push(TestResult::new(
        "tlb_rates_in_range",
        sweep.iter().all(|r| {
            (0.0..=100.0).contains(&r.instruction_miss_rate())
                && (0.0..=100.0).contains(&r.data_miss_rate())
        }),
        format!("{} sizes swept", sweep.len()),
    ));

    let same_traffic = sweep.windows(2).all(|w| {
        w[0].instruction_accesses == w[1].instruction_accesses
            && w[0].data_accesses == w[1].data_accesses
    });
    results.push(TestResult::new(
        "tlb_same_traffic_every_size",
        same_traffic,
        "every size replays the same accesses",
    ));

    reports.tlb = sweep;
    results
}
