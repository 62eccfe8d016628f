//! Published firmware entity types

use super::associations::Association;
use crate::error::Error;
use crate::version::VersionIdentity;
use std::fmt;

/// Activation state of a firmware image
///
/// A static layout only ever reports these two; the transitional states
/// of a multi-image updater are never reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    /// The image is installed and usable
    Active,
    /// The image could not be fully identified
    Invalid,
}

impl ActivationState {
    /// `Active` iff both version components are present
    pub fn from_identity(ident: &VersionIdentity) -> Self {
        if ident.is_complete() {
            Self::Active
        } else {
            Self::Invalid
        }
    }
}

impl fmt::Display for ActivationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Invalid => write!(f, "Invalid"),
        }
    }
}

/// What a firmware version is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPurpose {
    /// Host firmware
    Host,
}

impl fmt::Display for VersionPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "Host"),
        }
    }
}

/// The firmware entity (activation object) for the image on the PNOR
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Short image id
    pub id: String,
    /// Object path the entity is published at
    pub path: String,
    /// Host firmware version
    pub version: String,
    /// Component versions
    pub extended_version: String,
    /// Always `Host` here
    pub purpose: VersionPurpose,
    /// Activation state
    pub state: ActivationState,
    /// Present (0) only for an active image
    pub redundancy_priority: Option<u8>,
    /// Associations owned by this entity
    pub associations: Vec<Association>,
}

/// Version metadata published next to an [`Activation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    /// Short image id
    pub id: String,
    /// Object path, shared with the activation
    pub path: String,
    /// Host firmware version
    pub version: String,
    /// Always `Host` here
    pub purpose: VersionPurpose,
    /// Source image file, empty because the image already lives on the PNOR
    pub file_path: String,
}

/// Result of processing the image on the PNOR
#[derive(Debug)]
pub enum ProcessOutcome {
    /// One entity was published
    Registered {
        /// Image id
        id: String,
        /// Activation state of the entity
        state: ActivationState,
    },
    /// The version partition was read but yielded no usable version;
    /// the PNOR is blank or corrupted
    Blank,
    /// The version partition could not be read at all
    ReadFailed(Error),
}

impl ProcessOutcome {
    /// Id of the published entity, if any
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Registered { id, .. } => Some(id),
            _ => None,
        }
    }
}
