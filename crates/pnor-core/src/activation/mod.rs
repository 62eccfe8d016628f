//! Activation engine for a static (single image) PNOR layout
//!
//! The PNOR holds exactly one host firmware image. [`ActivationEngine`]
//! reads its version, publishes at most one [`Activation`] with its
//! [`VersionRecord`], and keeps the software-root associations and the
//! functional image id consistent with it.
//!
//! Every mutating operation takes `&mut self`; callers sharing an engine
//! between threads put it behind a `Mutex`.

mod associations;
mod types;

pub use associations::{
    Association, Associations, ACTIVATION_FWD, ACTIVATION_REV, ACTIVE_FWD, FUNCTIONAL_FWD,
    SOFTWARE_VERSION_REV, UPDATEABLE_FWD,
};
pub use types::{Activation, ActivationState, ProcessOutcome, VersionPurpose, VersionRecord};

use crate::config::Config;
use crate::tool::{FlashTool, Pnor};
use crate::version::{self, VersionIdentity};
use log::{error, info};
use std::collections::BTreeMap;

/// Publishes the firmware entity for the image on the PNOR
pub struct ActivationEngine<T> {
    pnor: Pnor<T>,
    software_root: String,
    host_inventory: String,
    version_partition: String,
    activations: BTreeMap<String, Activation>,
    versions: BTreeMap<String, VersionRecord>,
    associations: Associations,
    functional: Option<String>,
}

impl<T: FlashTool> ActivationEngine<T> {
    /// Create an engine with nothing published yet
    pub fn new(pnor: Pnor<T>, config: &Config) -> Self {
        Self {
            pnor,
            software_root: config.paths.software.trim_end_matches('/').to_string(),
            host_inventory: config.paths.host_inventory.clone(),
            version_partition: config.partitions.version.clone(),
            activations: BTreeMap::new(),
            versions: BTreeMap::new(),
            associations: Associations::new(),
            functional: None,
        }
    }

    /// Read the version partition and publish the image found there
    ///
    /// A blank or unreadable PNOR publishes nothing and leaves the current
    /// state untouched.
    pub fn process_image(&mut self) -> ProcessOutcome {
        match version::read_version(&self.pnor, &self.version_partition) {
            Ok(full) => self.process_version(&full),
            Err(e) => {
                error!("Failed to read {}: {}", self.version_partition, e);
                ProcessOutcome::ReadFailed(e)
            }
        }
    }

    /// Publish the image described by raw version text
    pub fn process_version(&mut self, full_version: &str) -> ProcessOutcome {
        let ident = VersionIdentity::parse(full_version);
        let id = ident.id();
        if id.is_empty() {
            info!("No version found, possibly a corrupted PNOR");
            return ProcessOutcome::Blank;
        }

        if ident.version.is_empty() {
            error!("Failed to read version, VERSION={:?}", full_version);
        }
        if ident.extended_version.is_empty() {
            error!("Failed to read extendedVersion, VERSION={:?}", full_version);
        }
        let state = ActivationState::from_identity(&ident);

        // One image at a time: anything published earlier is replaced
        self.unpublish_all();

        let path = self.object_path(&id);
        let mut entity_assocs = Vec::new();
        let mut redundancy_priority = None;

        if state == ActivationState::Active {
            entity_assocs.push(Association::new(
                ACTIVATION_FWD,
                ACTIVATION_REV,
                self.host_inventory.clone(),
            ));
            self.associations
                .add(Association::software(ACTIVE_FWD, path.clone()));
            redundancy_priority = Some(0);
        }

        // Every updateable component advertises it, whatever its state
        self.associations
            .add(Association::software(UPDATEABLE_FWD, path.clone()));

        self.activations.insert(
            id.clone(),
            Activation {
                id: id.clone(),
                path: path.clone(),
                version: ident.version.clone(),
                extended_version: ident.extended_version,
                purpose: VersionPurpose::Host,
                state,
                redundancy_priority,
                associations: entity_assocs,
            },
        );
        self.versions.insert(
            id.clone(),
            VersionRecord {
                id: id.clone(),
                path,
                version: ident.version,
                purpose: VersionPurpose::Host,
                file_path: String::new(),
            },
        );
        info!("Published host image {} ({})", id, state);

        self.update_functional_association(&id);
        ProcessOutcome::Registered { id, state }
    }

    /// Whether `id` is the image the host is running
    pub fn is_version_functional(&self, id: &str) -> bool {
        self.functional.as_deref() == Some(id)
    }

    /// Record `id` as functional and move the functional association to it
    pub fn update_functional_association(&mut self, id: &str) {
        self.functional = Some(id.to_string());
        let path = self.object_path(id);
        self.associations.remove_forward(FUNCTIONAL_FWD);
        self.associations
            .add(Association::software(FUNCTIONAL_FWD, path));
    }

    /// Make room for a new image by erasing the active one
    ///
    /// With no active image (blank or corrupted PNOR) there is nothing to
    /// free, which counts as success.
    pub fn free_space(&mut self) -> bool {
        let active = self
            .activations
            .values()
            .find(|a| a.state == ActivationState::Active)
            .map(|a| a.id.clone());

        match active {
            Some(id) => self.erase(&id),
            None => true,
        }
    }

    /// No-op: a single image has no priority to arbitrate
    pub fn free_priority(&mut self, _value: u8, _id: &str) {}

    /// No-op: a static layout never holds several images
    pub fn delete_all(&mut self) {}

    /// Remove the entity, version record and associations of `id`
    ///
    /// Returns false if nothing is published under `id`.
    pub fn erase(&mut self, id: &str) -> bool {
        let activation = self.activations.remove(id);
        let version = self.versions.remove(id);
        if activation.is_none() && version.is_none() {
            error!("Failed to find version {} to erase", id);
            return false;
        }

        let path = self.object_path(id);
        self.associations.remove_endpoint(&path);
        if self.is_version_functional(id) {
            self.functional = None;
        }
        info!("Erased version {}", id);
        true
    }

    /// Delete request on a published version record
    ///
    /// Only version records carry the delete capability; an id with an
    /// entity but no record is refused.
    pub fn delete_version(&mut self, id: &str) -> bool {
        if !self.versions.contains_key(id) {
            error!("Failed to find version {} to delete", id);
            return false;
        }
        self.erase(id)
    }

    /// Published entity for `id`
    pub fn activation(&self, id: &str) -> Option<&Activation> {
        self.activations.get(id)
    }

    /// Published version record for `id`
    pub fn version(&self, id: &str) -> Option<&VersionRecord> {
        self.versions.get(id)
    }

    /// All published entities
    pub fn activations(&self) -> impl Iterator<Item = &Activation> {
        self.activations.values()
    }

    /// Software-root associations
    pub fn associations(&self) -> &Associations {
        &self.associations
    }

    /// Id of the functional image, if any
    pub fn functional_id(&self) -> Option<&str> {
        self.functional.as_deref()
    }

    /// Object path an image id is published at
    pub fn object_path(&self, id: &str) -> String {
        format!("{}/{}", self.software_root, id)
    }

    fn unpublish_all(&mut self) {
        for path in self.activations.values().map(|a| &a.path) {
            self.associations.remove_endpoint(path);
        }
        self.activations.clear();
        self.versions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::tool::ToolOutput;
    use crate::version::version_id;

    const FULL: &str = "open-power-romulus-v2.2\n\tbuildroot-2018.11.1\n\tskiboot-v6.2";

    /// Tool that must never be called
    struct NoTool;

    impl FlashTool for NoTool {
        fn name(&self) -> &str {
            "pflash"
        }

        fn run(&self, args: &[&str]) -> Result<ToolOutput> {
            panic!("unexpected tool call {:?}", args);
        }
    }

    /// Tool that fails every call
    struct FailingTool;

    impl FlashTool for FailingTool {
        fn name(&self) -> &str {
            "pflash"
        }

        fn run(&self, _args: &[&str]) -> Result<ToolOutput> {
            Ok(ToolOutput::failed(255))
        }
    }

    fn engine() -> ActivationEngine<NoTool> {
        ActivationEngine::new(Pnor::new(NoTool), &Config::default())
    }

    #[test]
    fn test_active_image() {
        let mut engine = engine();
        let outcome = engine.process_version(FULL);
        let id = version_id("open-power-romulus-v2.2");
        assert!(matches!(
            &outcome,
            ProcessOutcome::Registered { id: got, state: ActivationState::Active } if *got == id
        ));

        let act = engine.activation(&id).unwrap();
        let path = format!("/xyz/openbmc_project/software/{}", id);
        assert_eq!(act.path, path);
        assert_eq!(act.version, "open-power-romulus-v2.2");
        assert_eq!(act.extended_version, "buildroot-2018.11.1,skiboot-v6.2");
        assert_eq!(act.purpose, VersionPurpose::Host);
        assert_eq!(act.redundancy_priority, Some(0));
        assert_eq!(
            act.associations,
            vec![Association::new(
                ACTIVATION_FWD,
                ACTIVATION_REV,
                "/xyz/openbmc_project/inventory/system/chassis"
            )]
        );

        let assocs = engine.associations();
        assert!(assocs.contains(ACTIVE_FWD, &path));
        assert!(assocs.contains(UPDATEABLE_FWD, &path));
        assert!(assocs.contains(FUNCTIONAL_FWD, &path));

        let record = engine.version(&id).unwrap();
        assert_eq!(record.version, act.version);
        assert_eq!(record.file_path, "");
        assert!(engine.is_version_functional(&id));
    }

    #[test]
    fn test_missing_extended_version_is_invalid() {
        let mut engine = engine();
        let outcome = engine.process_version("open-power-romulus-v2.2\n");
        let id = outcome.id().unwrap().to_string();

        let act = engine.activation(&id).unwrap();
        assert_eq!(act.state, ActivationState::Invalid);
        assert_eq!(act.redundancy_priority, None);
        assert!(act.associations.is_empty());

        let path = engine.object_path(&id);
        assert!(!engine.associations().contains(ACTIVE_FWD, &path));
        assert!(engine.associations().contains(UPDATEABLE_FWD, &path));
        assert!(engine.is_version_functional(&id));
    }

    #[test]
    fn test_blank_image_registers_nothing() {
        let mut engine = engine();
        assert!(matches!(engine.process_version(""), ProcessOutcome::Blank));
        assert_eq!(engine.activations().count(), 0);
        assert!(engine.associations().is_empty());
        assert_eq!(engine.functional_id(), None);
    }

    #[test]
    fn test_blank_image_keeps_functional_marker() {
        let mut engine = engine();
        let id = engine.process_version(FULL).id().unwrap().to_string();
        assert!(matches!(engine.process_version(""), ProcessOutcome::Blank));
        assert_eq!(engine.functional_id(), Some(id.as_str()));
        assert_eq!(engine.activations().count(), 1);
    }

    #[test]
    fn test_reprocess_replaces_entity() {
        let mut engine = engine();
        let old = engine.process_version(FULL).id().unwrap().to_string();
        let new = engine
            .process_version("open-power-romulus-v2.3\n\tskiboot-v6.3")
            .id()
            .unwrap()
            .to_string();
        assert_ne!(old, new);

        assert_eq!(engine.activations().count(), 1);
        assert!(engine.activation(&old).is_none());
        assert!(engine.version(&old).is_none());
        assert!(!engine.is_version_functional(&old));
        assert!(engine.is_version_functional(&new));

        let old_path = engine.object_path(&old);
        assert!(engine
            .associations()
            .as_slice()
            .iter()
            .all(|a| a.endpoint != old_path));
        assert_eq!(engine.associations().len(), 3);
    }

    #[test]
    fn test_functional_association_moves() {
        let mut engine = engine();
        engine.update_functional_association("aaaa1111");
        engine.update_functional_association("bbbb2222");

        let functional: Vec<_> = engine.associations().endpoints(FUNCTIONAL_FWD).collect();
        assert_eq!(functional, vec!["/xyz/openbmc_project/software/bbbb2222"]);
        assert!(engine.is_version_functional("bbbb2222"));
        assert!(!engine.is_version_functional("aaaa1111"));
    }

    #[test]
    fn test_free_space_erases_active() {
        let mut engine = engine();
        let id = engine.process_version(FULL).id().unwrap().to_string();

        assert!(engine.free_space());
        assert!(engine.activation(&id).is_none());
        assert!(engine.version(&id).is_none());
        assert!(engine.associations().is_empty());
        assert_eq!(engine.functional_id(), None);
    }

    #[test]
    fn test_free_space_without_active_image() {
        let mut engine = engine();
        assert!(engine.free_space());

        let id = engine
            .process_version("open-power-romulus-v2.2")
            .id()
            .unwrap()
            .to_string();
        assert!(engine.free_space());
        // Invalid images are left alone
        assert!(engine.activation(&id).is_some());
    }

    #[test]
    fn test_erase_unknown_id() {
        let mut engine = engine();
        assert!(!engine.erase("deadbeef"));
        assert!(!engine.delete_version("deadbeef"));
    }

    #[test]
    fn test_delete_version_routes_to_erase() {
        let mut engine = engine();
        let id = engine.process_version(FULL).id().unwrap().to_string();
        assert!(engine.delete_version(&id));
        assert_eq!(engine.activations().count(), 0);
        assert!(engine.version(&id).is_none());
        // The record went with the entity
        assert!(!engine.delete_version(&id));
    }

    #[test]
    fn test_noops_leave_state_alone() {
        let mut engine = engine();
        let id = engine.process_version(FULL).id().unwrap().to_string();
        engine.free_priority(1, &id);
        engine.delete_all();
        assert_eq!(engine.activation(&id).unwrap().redundancy_priority, Some(0));
        assert_eq!(engine.activations().count(), 1);
    }

    #[test]
    fn test_process_image_read_failure() {
        let mut engine = ActivationEngine::new(Pnor::new(FailingTool), &Config::default());
        assert!(matches!(
            engine.process_image(),
            ProcessOutcome::ReadFailed(Error::ToolFailed { status: 255, .. })
        ));
        assert_eq!(engine.activations().count(), 0);
        assert_eq!(engine.functional_id(), None);
    }
}
