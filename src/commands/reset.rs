//! Factory reset command implementation

use indicatif::{ProgressBar, ProgressStyle};
use pnor_core::mediator::AccessMediator;
use pnor_core::reset::{PartitionOutcome, ResetReport};
use pnor_core::tool::FlashTool;
use pnor_core::ResetEngine;
use std::time::Duration;

use super::require_confirmation;

/// Clear every reprovisioned partition with a progress spinner
pub fn run_factory_reset<T: FlashTool, M: AccessMediator>(
    engine: &mut ResetEngine<T, M>,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    require_confirmation(yes, "factory-reset")?;

    let pb = spinner("Clearing partitions (this may take a while)...")?;
    let report = engine.factory_reset();
    pb.finish_and_clear();

    print_report(&report);
    check_report(&report)
}

/// Clear the guard partition only
pub fn run_clear_guard<T: FlashTool, M: AccessMediator>(
    engine: &mut ResetEngine<T, M>,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    require_confirmation(yes, "clear-guard")?;

    let pb = spinner("Clearing guard records...")?;
    let outcome = engine.clear_guard();
    pb.finish_and_clear();

    print_outcome(&outcome);
    outcome.result.map_err(Into::into)
}

fn spinner(message: &'static str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn print_outcome(outcome: &PartitionOutcome) {
    match &outcome.result {
        Ok(()) => println!("  {:<16} cleared ({})", outcome.name, outcome.mode),
        Err(e) => println!("  {:<16} FAILED: {}", outcome.name, e),
    }
}

fn print_report(report: &ResetReport) {
    if report.partitions.is_empty() {
        println!("No partitions flagged for reprovisioning");
        return;
    }
    for outcome in &report.partitions {
        print_outcome(outcome);
    }
    println!(
        "{} cleared, {} failed",
        report.cleared().count(),
        report.failed().count()
    );
}

fn check_report(report: &ResetReport) -> Result<(), Box<dyn std::error::Error>> {
    if report.is_complete() {
        Ok(())
    } else {
        Err(format!(
            "{} partition(s) could not be cleared",
            report.failed().count()
        )
        .into())
    }
}
