//! Version discovery
//!
//! Reads the version partition off the PNOR and turns its text into the
//! `(version, extended version)` pair and short image id used to publish
//! the firmware entity.

mod extract;
mod identity;

pub use extract::{decode_version, extract_version, read_version, SIGNED_HEADER_SIZE, SIGNED_MAGIC};
pub use identity::{version_id, VersionIdentity};
