//! Factory reset of PNOR partitions
//!
//! Clearing runs between a suspend and a resume of the access mediator so
//! the host cannot touch the flash while it is being rewritten. Partitions
//! are cleared one after another and a failure on one does not stop the
//! others.

use crate::config::Config;
use crate::error::Result;
use crate::inventory;
use crate::mediator::{AccessMediator, Suspended};
use crate::tool::{ClearMode, FlashTool, Pnor};
use log::{error, info};

/// Result of clearing one partition
#[derive(Debug)]
pub struct PartitionOutcome {
    /// Partition name
    pub name: String,
    /// How it was cleared
    pub mode: ClearMode,
    /// Tool result
    pub result: Result<()>,
}

impl PartitionOutcome {
    /// Whether the partition was cleared
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-partition results of a factory reset
#[derive(Debug, Default)]
pub struct ResetReport {
    /// One entry per candidate, in listing order
    pub partitions: Vec<PartitionOutcome>,
}

impl ResetReport {
    /// Partitions that were cleared
    pub fn cleared(&self) -> impl Iterator<Item = &PartitionOutcome> {
        self.partitions.iter().filter(|p| p.is_ok())
    }

    /// Partitions that failed to clear
    pub fn failed(&self) -> impl Iterator<Item = &PartitionOutcome> {
        self.partitions.iter().filter(|p| !p.is_ok())
    }

    /// Every candidate was cleared (trivially true with no candidates)
    pub fn is_complete(&self) -> bool {
        self.partitions.iter().all(PartitionOutcome::is_ok)
    }
}

/// Clears PNOR partitions on factory reset
///
/// Operations take `&mut self` so only one destructive sequence can be in
/// flight per engine.
pub struct ResetEngine<T, M> {
    pnor: Pnor<T>,
    mediator: M,
    guard_partition: String,
}

impl<T: FlashTool, M: AccessMediator> ResetEngine<T, M> {
    /// Create a reset engine
    pub fn new(pnor: Pnor<T>, mediator: M, config: &Config) -> Self {
        Self {
            pnor,
            mediator,
            guard_partition: config.partitions.guard.clone(),
        }
    }

    /// Clear every partition flagged for reprovisioning
    ///
    /// The mediator is suspended even when there is nothing to clear, and
    /// is always resumed once all clears have been attempted.
    pub fn factory_reset(&mut self) -> ResetReport {
        let candidates = inventory::query_reset_candidates(&self.pnor);
        info!("Factory reset: {} partition(s) to clear", candidates.len());

        let _suspended = Suspended::new(&self.mediator);
        let partitions = candidates
            .iter()
            .map(|part| self.clear(&part.name, part.clear_mode()))
            .collect();

        ResetReport { partitions }
    }

    /// Clear only the guard record partition
    pub fn clear_guard(&mut self) -> PartitionOutcome {
        let _suspended = Suspended::new(&self.mediator);
        self.clear(&self.guard_partition, ClearMode::Ecc)
    }

    fn clear(&self, name: &str, mode: ClearMode) -> PartitionOutcome {
        let result = self.pnor.clear_partition(name, mode);
        match &result {
            Ok(()) => info!("Clear partition {} successfully ({})", name, mode),
            Err(e) => error!("Failed to clear partition {}: {}", name, e),
        }
        PartitionOutcome {
            name: name.to_string(),
            mode,
            result,
        }
    }
}
