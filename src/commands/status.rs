//! Status command implementation

use pnor_core::activation::{Activation, ProcessOutcome};
use pnor_core::tool::FlashTool;
use pnor_core::ActivationEngine;

/// Scan the PNOR and print the published host firmware entity
pub fn run_status<T: FlashTool>(
    engine: &mut ActivationEngine<T>,
) -> Result<(), Box<dyn std::error::Error>> {
    match engine.process_image() {
        ProcessOutcome::Registered { id, .. } => {
            if let Some(activation) = engine.activation(&id) {
                print_activation(activation);
            }
            for assoc in engine.associations().as_slice() {
                println!("Software root:    {} -> {}", assoc.forward, assoc.endpoint);
            }
            println!(
                "Functional id:    {}",
                engine.functional_id().unwrap_or("none")
            );
            Ok(())
        }
        ProcessOutcome::Blank => {
            println!("No host firmware found (blank or corrupted PNOR)");
            Ok(())
        }
        ProcessOutcome::ReadFailed(e) => Err(e.into()),
    }
}

fn print_activation(activation: &Activation) {
    println!("Object:           {}", activation.path);
    println!("Version:          {}", activation.version);
    if !activation.extended_version.is_empty() {
        println!("Extended version: {}", activation.extended_version);
    }
    println!("Purpose:          {}", activation.purpose);
    println!("Activation:       {}", activation.state);
    if let Some(priority) = activation.redundancy_priority {
        println!("Priority:         {}", priority);
    }
    for assoc in &activation.associations {
        println!(
            "Association:      {} / {} -> {}",
            assoc.forward, assoc.reverse, assoc.endpoint
        );
    }
}
