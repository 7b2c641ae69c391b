//! Versioned-resource manager.
//!
//! Creates, branches, and releases container versions while maintaining the
//! exactly-one-HEAD invariant: every container has one mutable version
//! labeled `HEAD`, created atomically with the container itself. All other
//! versions become immutable once released.

use termreg_types::{
    well_known, Audit, Container, ContainerFields, ContainerKind, ContainerVersion, Mnemonic,
    ProcessingLease, ResourceId,
};

use crate::errors::{ConflictKind, RegistryError, RegistryResult};
use crate::store::{now_epoch, RegistryStore};

/// Input for creating a container.
#[derive(Debug, Clone)]
pub struct NewContainer {
    /// Source or collection.
    pub kind: ContainerKind,
    /// Mnemonic, unique per (owner, kind).
    pub mnemonic: String,
    /// Owning user or organization.
    pub owner_id: ResourceId,
    /// Descriptive metadata.
    pub fields: ContainerFields,
}

/// Creates a container together with its HEAD version.
///
/// The two documents are inserted in one step so the exactly-one-HEAD
/// invariant holds for the whole lifetime of the container.
pub fn create_container(
    store: &mut RegistryStore,
    new: NewContainer,
    actor: &str,
) -> RegistryResult<ResourceId> {
    let mnemonic = Mnemonic::new(&new.mnemonic).map_err(|e| {
        RegistryError::Validation(crate::errors::ErrorMap::from([(
            "mnemonic".to_string(),
            vec![e.to_string()],
        )]))
    })?;

    if store.get_owner(new.owner_id).is_none() {
        return Err(RegistryError::NotFound { resource: "owner", id: new.owner_id });
    }
    if store
        .find_container(new.owner_id, new.kind, mnemonic.as_str())
        .is_some()
    {
        return Err(RegistryError::Conflict {
            kind: ConflictKind::DuplicateMnemonic,
            detail: format!("{} '{}' already exists for owner", new.kind.resource_type(), mnemonic),
        });
    }

    let now = now_epoch();
    let container_id = store.allocate_id();
    let head_id = store.allocate_id();

    store.insert_container(Container {
        id: container_id,
        kind: new.kind,
        mnemonic,
        owner_id: new.owner_id,
        fields: new.fields.clone(),
        audit: Audit::new(actor, now),
    });
    store.insert_version(ContainerVersion {
        id: head_id,
        versioned_object_id: container_id,
        mnemonic: Mnemonic::new(well_known::HEAD).expect("HEAD is a valid mnemonic"),
        fields: new.fields,
        released: false,
        previous_version_id: None,
        parent_version_id: None,
        concept_references: Default::default(),
        mapping_references: Default::default(),
        processing: None,
        audit: Audit::new(actor, now),
    });

    tracing::debug!(container_id, head_id, "created container with HEAD version");
    Ok(container_id)
}

/// Returns the HEAD version of a container.
///
/// Guaranteed to exist once the container exists.
pub fn get_head<'a>(
    store: &'a RegistryStore,
    container_id: ResourceId,
) -> RegistryResult<&'a ContainerVersion> {
    if store.get_container(container_id).is_none() {
        return Err(RegistryError::NotFound { resource: "container", id: container_id });
    }
    store
        .find_version(container_id, well_known::HEAD)
        .ok_or(RegistryError::NotFound { resource: "container version", id: container_id })
}

/// Creates a new version of a container by cloning the reference sets and
/// denormalized fields of `based_on` (HEAD when not given).
///
/// Fails with [`RegistryError::InvalidVersionLabel`] for empty or reserved
/// labels, and with a duplicate-version-label conflict if the label is
/// already taken for this container.
pub fn create_version(
    store: &mut RegistryStore,
    container_id: ResourceId,
    label: &str,
    based_on: Option<&str>,
    actor: &str,
) -> RegistryResult<ResourceId> {
    if label.is_empty() || well_known::RESERVED_VERSION_LABELS.contains(&label) {
        return Err(RegistryError::InvalidVersionLabel { label: label.to_string() });
    }
    let mnemonic = Mnemonic::new(label)
        .map_err(|_| RegistryError::InvalidVersionLabel { label: label.to_string() })?;

    // Re-read at commit time; the label check races with concurrent creates
    // and the per-container index is the backstop.
    if store.find_version(container_id, label).is_some() {
        return Err(RegistryError::Conflict {
            kind: ConflictKind::DuplicateVersionLabel,
            detail: format!("version '{label}' already exists"),
        });
    }

    let base = match based_on {
        Some(base_label) => store.find_version(container_id, base_label).ok_or(
            RegistryError::NotFound { resource: "container version", id: container_id },
        )?,
        None => get_head(store, container_id)?,
    };

    let version = ContainerVersion {
        id: 0, // assigned below
        versioned_object_id: container_id,
        mnemonic,
        fields: base.fields.clone(),
        released: false,
        previous_version_id: Some(base.id),
        parent_version_id: base.parent_version_id,
        concept_references: base.concept_references.clone(),
        mapping_references: base.mapping_references.clone(),
        processing: None,
        audit: Audit::new(actor, now_epoch()),
    };

    let id = store.allocate_id();
    store.insert_version(ContainerVersion { id, ..version });
    tracing::debug!(container_id, version_id = id, label, "created container version");
    Ok(id)
}

/// Releases a version, freezing its reference sets and metadata.
///
/// Releasing an already-released version is a no-op that returns `false`
/// and logs a warning, so retried release operations stay safe. The HEAD
/// version is never releasable.
pub fn release(
    store: &mut RegistryStore,
    version_id: ResourceId,
    actor: &str,
) -> RegistryResult<bool> {
    let now = now_epoch();
    let version = store
        .get_version_mut(version_id)
        .ok_or(RegistryError::NotFound { resource: "container version", id: version_id })?;

    if version.is_head() {
        return Err(RegistryError::InvalidVersionLabel {
            label: well_known::HEAD.to_string(),
        });
    }
    if version.released {
        tracing::warn!(version_id, "release called on an already-released version");
        return Ok(false);
    }

    version.released = true;
    version.audit.touch(actor, now);
    tracing::info!(version_id, label = %version.mnemonic, "released container version");
    Ok(true)
}

/// Registers a concept-version id in a version's reference set.
///
/// Returns `true` if the reference was new, `false` if it was already
/// present (re-adding is a no-op, never an error). Fails if the version is
/// released.
pub fn add_concept_reference(
    store: &mut RegistryStore,
    version_id: ResourceId,
    concept_version_id: ResourceId,
) -> RegistryResult<bool> {
    let version = store
        .get_version_mut(version_id)
        .ok_or(RegistryError::NotFound { resource: "container version", id: version_id })?;
    if version.released {
        return Err(RegistryError::ReleasedVersionImmutable { version_id });
    }
    Ok(version.concept_references.insert(concept_version_id))
}

/// Registers a mapping-version id in a version's reference set.
///
/// Same semantics as [`add_concept_reference`].
pub fn add_mapping_reference(
    store: &mut RegistryStore,
    version_id: ResourceId,
    mapping_version_id: ResourceId,
) -> RegistryResult<bool> {
    let version = store
        .get_version_mut(version_id)
        .ok_or(RegistryError::NotFound { resource: "container version", id: version_id })?;
    if version.released {
        return Err(RegistryError::ReleasedVersionImmutable { version_id });
    }
    Ok(version.mapping_references.insert(mapping_version_id))
}

/// Walks the `previous_version` chain starting at `version_id`, most recent
/// first. The starting version is included.
pub fn version_chain(store: &RegistryStore, version_id: ResourceId) -> Vec<&ContainerVersion> {
    let mut chain = Vec::new();
    let mut current = store.get_version(version_id);
    while let Some(version) = current {
        chain.push(version);
        current = version.previous_version_id.and_then(|id| store.get_version(id));
    }
    chain
}

// =============================================================================
// Processing leases
// =============================================================================

/// Acquires the processing lease on a version for `holder`.
///
/// An expired lease left by a crashed holder is reclaimed in place. A live
/// lease held by someone else fails with [`RegistryError::VersionBusy`];
/// re-acquiring one's own lease extends it.
pub fn acquire_lease(
    store: &mut RegistryStore,
    version_id: ResourceId,
    holder: &str,
    ttl_secs: i64,
    now: i64,
) -> RegistryResult<()> {
    let version = store
        .get_version_mut(version_id)
        .ok_or(RegistryError::NotFound { resource: "container version", id: version_id })?;

    if let Some(lease) = &version.processing {
        if lease.holder != holder && !lease.is_expired(now) {
            return Err(RegistryError::VersionBusy {
                version_id,
                holder: lease.holder.clone(),
            });
        }
        if lease.is_expired(now) {
            tracing::warn!(
                version_id,
                stale_holder = %lease.holder,
                "reclaiming expired processing lease"
            );
        }
    }

    version.processing = Some(ProcessingLease {
        holder: holder.to_string(),
        expires_at: now + ttl_secs,
    });
    Ok(())
}

/// Releases the processing lease on a version if `holder` owns it.
///
/// Releasing a lease that is absent or owned by someone else is a no-op;
/// completion must never fail because the lease was already reclaimed.
pub fn release_lease(store: &mut RegistryStore, version_id: ResourceId, holder: &str) {
    if let Some(version) = store.get_version_mut(version_id) {
        if version
            .processing
            .as_ref()
            .is_some_and(|lease| lease.holder == holder)
        {
            version.processing = None;
        }
    }
}

/// Clears every expired processing lease in the store.
///
/// Run at startup to recover versions left leased by an abnormal shutdown.
/// Returns the number of leases cleared.
pub fn recover_stale_leases(store: &mut RegistryStore, now: i64) -> usize {
    let mut cleared = 0;
    for version_id in store.container_version_ids() {
        if let Some(version) = store.get_version_mut(version_id) {
            if version.processing.as_ref().is_some_and(|l| l.is_expired(now)) {
                tracing::warn!(version_id, "clearing stale processing lease at startup");
                version.processing = None;
                cleared += 1;
            }
        }
    }
    cleared
}
