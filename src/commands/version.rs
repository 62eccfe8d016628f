//! Version command implementation

use pnor_core::tool::{FlashTool, Pnor};
use pnor_core::version::{self, VersionIdentity};

/// Read the version partition and print its decoded fields
pub fn run_version<T: FlashTool>(
    pnor: &Pnor<T>,
    partition: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = version::read_version(pnor, partition)?;
    let ident = VersionIdentity::parse(&text);

    if ident.version.is_empty() {
        println!("{} partition is blank", partition);
        return Ok(());
    }

    println!("Raw:");
    for line in text.lines() {
        println!("  {}", line);
    }
    println!("Version:          {}", ident.version);
    if !ident.extended_version.is_empty() {
        println!("Extended version: {}", ident.extended_version);
    }
    println!("Id:               {}", ident.id());
    Ok(())
}
