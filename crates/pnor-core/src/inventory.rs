//! Partition inventory parsing
//!
//! The flash tool lists the partition table one entry per line:
//!
//! ```text
//! ID=06 MVPD 0x0012d000..0x001bd000 (actual=0x00090000) [E--P--F-C-]
//! ```
//!
//! The bracketed flag field marks partitions to clear on factory reset
//! (`F`, reprovision) and partitions whose contents are ECC protected
//! (`E`). Only reset candidates are kept.

use crate::tool::{ClearMode, FlashTool, Pnor};
use log::{debug, error, warn};

/// Flag marking a partition for clearing on factory reset
const FLAG_REPROVISION: char = 'F';

/// Flag marking a partition as ECC protected
const FLAG_ECC: char = 'E';

/// A partition taken from the inventory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDescriptor {
    /// Partition name (e.g. "MVPD")
    pub name: String,
    /// Clearing must preserve ECC formatting
    pub requires_ecc: bool,
    /// Partition is cleared on factory reset
    pub reprovision_on_reset: bool,
}

impl PartitionDescriptor {
    /// How this partition has to be cleared
    pub fn clear_mode(&self) -> ClearMode {
        ClearMode::for_ecc(self.requires_ecc)
    }
}

/// Parse a partition listing into reset candidates
///
/// Lines without a flag block, without the `F` flag, or missing the
/// expected field separators are skipped. Output order follows input order.
pub fn parse(listing: &str) -> Vec<PartitionDescriptor> {
    listing.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<PartitionDescriptor> {
    let flags = &line[line.find('[')?..];
    if !flags.contains(FLAG_REPROVISION) {
        return None;
    }

    // Skip "ID=xx", the spaces after it, then take the name up to the
    // next space.
    let rest = &line[line.find(' ')?..];
    let rest = rest.trim_start_matches(' ');
    let name = &rest[..rest.find(' ')?];
    if name.is_empty() {
        return None;
    }

    Some(PartitionDescriptor {
        name: name.to_string(),
        requires_ecc: flags.contains(FLAG_ECC),
        reprovision_on_reset: true,
    })
}

/// Keep only partition entries that carry the reprovision flag
fn reset_lines(listing: &str) -> String {
    listing
        .lines()
        .filter(|line| line.starts_with("ID") && line.contains(FLAG_REPROVISION))
        .fold(String::new(), |mut acc, line| {
            acc.push_str(line);
            acc.push('\n');
            acc
        })
}

/// Ask the flash tool for the partition table and return the reset candidates
///
/// A tool that fails to run yields no candidates. A non-zero status is
/// logged and any output it still produced is used.
pub fn query_reset_candidates<T: FlashTool>(pnor: &Pnor<T>) -> Vec<PartitionDescriptor> {
    let out = match pnor.partition_info() {
        Ok(out) => out,
        Err(e) => {
            error!("Failed to list partitions: {}", e);
            return Vec::new();
        }
    };
    if !out.success() {
        warn!("Partition listing returned {}", out.status);
    }

    let parts = parse(&reset_lines(&out.output));
    debug!(
        "Reset candidates: {:?}",
        parts.iter().map(|p| p.name.as_str()).collect::<Vec<_>>()
    );
    parts
}
