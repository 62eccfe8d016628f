//! CLI command implementations
//!
//! Every command works on a [`Pnor`](pnor_core::tool::Pnor) handle, so the
//! same code path runs against pflash or the in-memory dummy backend.

mod list;
mod partitions;
mod reset;
mod status;
mod version;

pub use list::list_tools;
pub use partitions::run_partitions;
pub use reset::{run_clear_guard, run_factory_reset};
pub use status::run_status;
pub use version::run_version;

/// Refuse a destructive command unless the user confirmed it
fn require_confirmation(yes: bool, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    if yes {
        Ok(())
    } else {
        Err(format!("{} destroys partition contents, pass --yes to proceed", what).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation() {
        assert!(require_confirmation(true, "factory-reset").is_ok());
        let err = require_confirmation(false, "factory-reset").unwrap_err();
        assert!(err.to_string().contains("--yes"));
    }
}
