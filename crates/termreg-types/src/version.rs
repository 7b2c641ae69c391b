//! Container version snapshots.
//!
//! A container version is identified by `(versioned_object_id, mnemonic)`.
//! The version labeled `HEAD` is mutable and accumulates new concept and
//! mapping references; every other version becomes append-only once
//! `released` is set.

use std::collections::BTreeSet;

use crate::{Audit, ContainerFields, Mnemonic, ResourceId};

/// A lease held while a batch operation mutates a version.
///
/// Replaces a plain "processing" boolean: the lease names its holder and an
/// expiry instant, so a crashed holder's lock is reclaimable once the lease
/// runs out instead of requiring a manual clear.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessingLease {
    /// Identifier of the process or task holding the lease.
    pub holder: String,
    /// Epoch seconds after which the lease may be reclaimed.
    pub expires_at: i64,
}

impl ProcessingLease {
    /// Returns true if the lease has expired as of `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// An immutable-once-released snapshot of a container.
///
/// Carries a denormalized copy of the container's descriptive fields as of
/// version creation, the chain back-references, and the sets of concept- and
/// mapping-version ids included in the snapshot. Reference sets are
/// `BTreeSet`s, so re-adding an existing reference is naturally a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerVersion {
    /// Internal identifier.
    pub id: ResourceId,
    /// The container this version snapshots.
    pub versioned_object_id: ResourceId,
    /// Version label, unique per container. `HEAD` for the mutable version.
    pub mnemonic: Mnemonic,
    /// Descriptive fields frozen at version-creation time.
    pub fields: ContainerFields,
    /// Once true, the reference sets and fields are immutable.
    pub released: bool,
    /// The version this one was branched from, if any. Retained even after
    /// the referenced version is released, so the chain stays traversable.
    pub previous_version_id: Option<ResourceId>,
    /// Parent in a branching chain, if any.
    pub parent_version_id: Option<ResourceId>,
    /// Concept-version ids included in this snapshot.
    pub concept_references: BTreeSet<ResourceId>,
    /// Mapping-version ids included in this snapshot.
    pub mapping_references: BTreeSet<ResourceId>,
    /// Active batch-operation lease, if one is held.
    pub processing: Option<ProcessingLease>,
    /// Audit stamp.
    pub audit: Audit,
}

impl ContainerVersion {
    /// Returns true if this is the mutable HEAD version.
    pub fn is_head(&self) -> bool {
        self.mnemonic.as_str() == crate::well_known::HEAD
    }

    /// Total number of references in this snapshot.
    pub fn reference_count(&self) -> usize {
        self.concept_references.len() + self.mapping_references.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccessLevel;

    fn fields() -> ContainerFields {
        ContainerFields {
            name: "Test".to_string(),
            full_name: None,
            description: None,
            default_locale: "en".to_string(),
            supported_locales: vec!["en".to_string()],
            public_access: AccessLevel::View,
            custom_validation_schema: None,
        }
    }

    #[test]
    fn test_is_head() {
        let mut version = ContainerVersion {
            id: 2,
            versioned_object_id: 1,
            mnemonic: Mnemonic::new("HEAD").unwrap(),
            fields: fields(),
            released: false,
            previous_version_id: None,
            parent_version_id: None,
            concept_references: BTreeSet::new(),
            mapping_references: BTreeSet::new(),
            processing: None,
            audit: Audit::new("admin", 0),
        };
        assert!(version.is_head());

        version.mnemonic = Mnemonic::new("v1-0").unwrap();
        assert!(!version.is_head());
    }

    #[test]
    fn test_lease_expiry() {
        let lease = ProcessingLease {
            holder: "worker-1".to_string(),
            expires_at: 100,
        };
        assert!(!lease.is_expired(99));
        assert!(lease.is_expired(100));
        assert!(lease.is_expired(500));
    }
}
