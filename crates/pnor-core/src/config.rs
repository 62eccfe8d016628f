//! TOML configuration
//!
//! Every key is optional; a missing file section falls back to the values
//! used on a standard OpenPOWER BMC:
//!
//! ```toml
//! [tool]
//! path = "pflash"
//! timeout_secs = 600
//!
//! [mediator]
//! busctl = "busctl"
//! service = "xyz.openbmc_project.Hiomapd"
//! object = "/xyz/openbmc_project/Hiomapd"
//! interface = "xyz.openbmc_project.Hiomapd.Control"
//! timeout_secs = 30
//!
//! [paths]
//! software = "/xyz/openbmc_project/software"
//! host_inventory = "/xyz/openbmc_project/inventory/system/chassis"
//!
//! [partitions]
//! version = "VERSION"
//! guard = "GUARD"
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Flash tool settings
    pub tool: ToolConfig,
    /// Access mediation service settings
    pub mediator: MediatorConfig,
    /// Object paths used for published entities
    pub paths: PathsConfig,
    /// Well-known partition names
    pub partitions: PartitionsConfig,
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }
}

/// `[tool]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Flash tool executable
    pub path: PathBuf,
    /// Deadline for a single invocation in seconds, 0 disables it
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pflash"),
            timeout_secs: 600,
        }
    }
}

/// `[mediator]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediatorConfig {
    /// Bus client used to signal the service
    pub busctl: PathBuf,
    /// Bus name of the mediation service
    pub service: String,
    /// Object path of the control object
    pub object: String,
    /// Control interface carrying `Suspend`/`Resume`
    pub interface: String,
    /// Deadline for one bus call in seconds, 0 disables it
    pub timeout_secs: u64,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            busctl: PathBuf::from("busctl"),
            service: "xyz.openbmc_project.Hiomapd".to_string(),
            object: "/xyz/openbmc_project/Hiomapd".to_string(),
            interface: "xyz.openbmc_project.Hiomapd.Control".to_string(),
            timeout_secs: 30,
        }
    }
}

/// `[paths]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Root under which firmware entities are published
    pub software: String,
    /// Host inventory item an active image is associated with
    pub host_inventory: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            software: "/xyz/openbmc_project/software".to_string(),
            host_inventory: "/xyz/openbmc_project/inventory/system/chassis".to_string(),
        }
    }
}

/// `[partitions]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartitionsConfig {
    /// Partition holding the version string
    pub version: String,
    /// Partition holding guard records
    pub guard: String,
}

impl Default for PartitionsConfig {
    fn default() -> Self {
        Self {
            version: "VERSION".to_string(),
            guard: "GUARD".to_string(),
        }
    }
}
