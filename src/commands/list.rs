//! List commands implementation

use crate::tools;

/// List all supported flash tool backends
pub fn list_tools() {
    println!("Supported flash tools:");
    println!();
    for tool in tools::available_tools() {
        println!("  {:<9} - {}", tool.name, tool.description);
    }
}
