//! Version string splitting and image ids

use sha2::{Digest, Sha512};

/// Number of hex digits kept from the version digest
const ID_LEN: usize = 8;

/// A version string split into its components
///
/// The version partition holds the host firmware version on the first
/// line, followed by one indented line per component:
///
/// ```text
/// open-power-romulus-v2.2-rc1-48-g268344f-dirty
///     buildroot-2018.11.1-7-g5d7cc8c
///     skiboot-v6.2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionIdentity {
    /// First line of the version text
    pub version: String,
    /// Remaining lines, left-trimmed and joined with ','
    pub extended_version: String,
}

impl VersionIdentity {
    /// Split raw version text
    ///
    /// Lines end at `\n` only; a `\r` before it stays part of the line and
    /// so of the id. A single trailing newline does not start a new line.
    /// Empty text gives empty components.
    pub fn parse(full: &str) -> Self {
        if full.is_empty() {
            return Self::default();
        }
        let body = full.strip_suffix('\n').unwrap_or(full);
        let mut lines = body.split('\n');
        let version = lines.next().unwrap_or_default();
        let extended_version = lines
            .map(str::trim_start)
            .collect::<Vec<_>>()
            .join(",");

        Self {
            version: version.to_string(),
            extended_version,
        }
    }

    /// Short id of this version, empty when the version is empty
    pub fn id(&self) -> String {
        version_id(&self.version)
    }

    /// Both components were found
    pub fn is_complete(&self) -> bool {
        !self.version.is_empty() && !self.extended_version.is_empty()
    }
}

/// Derive the short image id for a version string
///
/// The id is the first 8 hex digits of the SHA-512 of the version.
pub fn version_id(version: &str) -> String {
    if version.is_empty() {
        return String::new();
    }
    let digest = Sha512::digest(version.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(ID_LEN);
    id
}
