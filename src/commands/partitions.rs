//! Partitions command implementation

use pnor_core::inventory;
use pnor_core::tool::{FlashTool, Pnor};

/// List partitions that a factory reset would clear
pub fn run_partitions<T: FlashTool>(pnor: &Pnor<T>) -> Result<(), Box<dyn std::error::Error>> {
    let candidates = inventory::query_reset_candidates(pnor);
    if candidates.is_empty() {
        println!("No partitions flagged for reprovisioning");
        return Ok(());
    }

    println!("{:<16} {:<10}", "Partition", "Clear");
    println!("{}", "-".repeat(27));
    for part in &candidates {
        println!("{:<16} {:<10}", part.name, part.clear_mode().to_string());
    }
    Ok(())
}
