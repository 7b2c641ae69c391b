//! Concept and mapping persistence pipeline.
//!
//! Creating a concept or mapping is three writes: the root document, its
//! initial version snapshot, and the registration of that snapshot in the
//! target container version's reference set. The pipeline validates before
//! the first write and rolls the writes back in reverse order if any of
//! them fails, so the operation is all-or-nothing from the caller's view.

use std::collections::BTreeMap;

use termreg_types::{
    Audit, Concept, ConceptDraft, ConceptVersion, Container, Mapping, MappingDraft,
    MappingTarget, MappingVersion, Mnemonic, ResourceId,
};

use crate::errors::{
    push_error, ConflictKind, ErrorMap, RegistryError, RegistryResult, NON_FIELD_ERRORS,
};
use crate::store::{now_epoch, RegistryStore};
use crate::validation::{
    check_duplicate_mapping, validate_mapping_draft, ValidationOptions, ValidatorChain,
};
use crate::versioning;

/// Options for a persistence run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersistOptions {
    /// Validation configuration, including the custom-validation bypass.
    pub validation: ValidationOptions,
    /// Container version to register the new entity in. Defaults to the
    /// owning container's HEAD.
    pub target_version: Option<ResourceId>,
}

/// Outcome of a bulk persist, keyed the way importers report it.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    /// Ids of the entities created, in input order.
    pub created: Vec<ResourceId>,
    /// Validation errors per entity mnemonic.
    pub errors: BTreeMap<String, ErrorMap>,
}

/// Creates a concept, its initial version, and its registration in the
/// target container version. All-or-nothing.
pub fn persist_new_concept(
    store: &mut RegistryStore,
    draft: ConceptDraft,
    options: PersistOptions,
) -> RegistryResult<ResourceId> {
    // Mandatory fields, before any write.
    let actor = draft
        .created_by
        .clone()
        .ok_or(RegistryError::MissingField { field: "created_by" })?;
    let parent_id = draft
        .parent_id
        .ok_or(RegistryError::MissingField { field: "parent" })?;
    let parent = store
        .get_container(parent_id)
        .ok_or(RegistryError::NotFound { resource: "container", id: parent_id })?
        .clone();

    let mnemonic = parse_mnemonic(&draft.mnemonic)?;
    if store.find_concept(parent_id, mnemonic.as_str()).is_some() {
        return Err(RegistryError::Conflict {
            kind: ConflictKind::DuplicateMnemonic,
            detail: format!("concept '{mnemonic}' already exists in source"),
        });
    }

    // Stamp derived fields.
    let now = now_epoch();
    let concept = Concept {
        id: 0, // assigned at write time
        mnemonic,
        parent_id,
        concept_class: draft.concept_class,
        datatype: draft.datatype,
        names: draft.names,
        descriptions: draft.descriptions,
        retired: false,
        public_access: parent.fields.public_access,
        audit: Audit::new(&actor, now),
    };

    // Full validation before persistence.
    let chain = ValidatorChain::for_schema(
        parent.fields.custom_validation_schema,
        options.validation,
    );
    let errors = chain.validate_concept(store, &concept)?;
    if !errors.is_empty() {
        return Err(RegistryError::Validation(errors));
    }

    let target_version = resolve_target_version(store, &parent, options.target_version)?;

    // Writes, rolled back in reverse order on failure.
    let concept_id = store.allocate_id();
    let version_id = store.allocate_id();
    let concept = Concept { id: concept_id, ..concept };
    store.insert_concept(concept.clone());
    store.insert_concept_version(ConceptVersion {
        id: version_id,
        versioned_object_id: concept_id,
        data: concept,
        is_latest_version: true,
        retired: false,
        audit: Audit::new(&actor, now),
    });

    if let Err(err) = versioning::add_concept_reference(store, target_version, version_id) {
        store.remove_concept_version(version_id);
        store.remove_concept(concept_id);
        return Err(errored_action(
            "could not add concept version to repository version",
            err,
        ));
    }

    tracing::debug!(concept_id, version_id, target_version, "persisted new concept");
    Ok(concept_id)
}

/// Bulk variant of [`persist_new_concept`]; failures are collected per
/// mnemonic instead of aborting the batch.
pub fn persist_new_concepts(
    store: &mut RegistryStore,
    drafts: Vec<ConceptDraft>,
    options: PersistOptions,
) -> BulkOutcome {
    let mut outcome = BulkOutcome::default();
    for draft in drafts {
        let mnemonic = draft.mnemonic.clone();
        match persist_new_concept(store, draft, options) {
            Ok(id) => outcome.created.push(id),
            Err(err) => {
                let errors = match err {
                    RegistryError::Validation(map) => map,
                    other => {
                        let mut map = ErrorMap::new();
                        push_error(&mut map, NON_FIELD_ERRORS, other.to_string());
                        map
                    }
                };
                outcome.errors.insert(mnemonic, errors);
            }
        }
    }
    outcome
}

/// Creates a mapping, its initial version, and its registration in the
/// target container version. All-or-nothing.
///
/// Structural draft errors short-circuit: schema validation only runs once
/// the target shape is valid, and its errors are combined with reference
/// resolution failures into one list.
pub fn persist_new_mapping(
    store: &mut RegistryStore,
    draft: MappingDraft,
    options: PersistOptions,
) -> RegistryResult<ResourceId> {
    let actor = draft
        .created_by
        .clone()
        .ok_or(RegistryError::MissingField { field: "created_by" })?;
    let parent_id = draft
        .parent_id
        .ok_or(RegistryError::MissingField { field: "parent" })?;
    let parent = store
        .get_container(parent_id)
        .ok_or(RegistryError::NotFound { resource: "container", id: parent_id })?
        .clone();

    let structural = validate_mapping_draft(&draft);
    if !structural.is_empty() {
        return Err(RegistryError::Validation(structural));
    }

    let mnemonic = parse_mnemonic(&draft.mnemonic)?;
    if store
        .mappings_in(parent_id)
        .iter()
        .any(|m| m.mnemonic == mnemonic)
    {
        return Err(RegistryError::Conflict {
            kind: ConflictKind::DuplicateMnemonic,
            detail: format!("mapping '{mnemonic}' already exists in source"),
        });
    }

    // Resolve references; failures are validation errors, not panics.
    let mut errors = ErrorMap::new();
    let from_concept_id = draft
        .from_concept_id
        .ok_or(RegistryError::MissingField { field: "from_concept" })?;
    if store.get_concept(from_concept_id).is_none() {
        push_error(&mut errors, "from_concept", format!("concept {from_concept_id} not found"));
    }
    let target = match (draft.to_concept_id, draft.to_source, draft.to_concept_code) {
        (Some(concept_id), _, _) => {
            if store.get_concept(concept_id).is_none() {
                push_error(&mut errors, "to_concept", format!("concept {concept_id} not found"));
            }
            MappingTarget::Internal { concept_id }
        }
        (None, Some(source), Some(concept_code)) => {
            MappingTarget::External { source, concept_code }
        }
        _ => return Err(RegistryError::MissingField { field: "to_concept" }),
    };

    let now = now_epoch();
    let mapping = Mapping {
        id: 0,
        mnemonic,
        parent_id,
        map_type: draft.map_type,
        from_concept_id,
        target,
        retired: false,
        public_access: parent.fields.public_access,
        audit: Audit::new(&actor, now),
    };

    // Schema checks combine with the resolution errors above.
    let custom_active =
        parent.fields.custom_validation_schema.is_some() && !options.validation.bypass_custom;
    if custom_active {
        let chain = ValidatorChain::for_schema(
            parent.fields.custom_validation_schema,
            options.validation,
        );
        crate::errors::merge_errors(&mut errors, chain.validate_mapping(store, &mapping)?);
    }
    if !errors.is_empty() {
        return Err(RegistryError::Validation(errors));
    }

    // Duplicate check re-reads the store at commit time.
    if custom_active {
        check_duplicate_mapping(store, &mapping)?;
    }

    let target_version = resolve_target_version(store, &parent, options.target_version)?;

    let mapping_id = store.allocate_id();
    let version_id = store.allocate_id();
    let mapping = Mapping { id: mapping_id, ..mapping };
    store.insert_mapping(mapping.clone());
    store.insert_mapping_version(MappingVersion {
        id: version_id,
        versioned_object_id: mapping_id,
        data: mapping,
        is_latest_version: true,
        retired: false,
        audit: Audit::new(&actor, now),
    });

    if let Err(err) = versioning::add_mapping_reference(store, target_version, version_id) {
        store.remove_mapping_version(version_id);
        store.remove_mapping(mapping_id);
        return Err(errored_action(
            "could not add mapping version to repository version",
            err,
        ));
    }

    tracing::debug!(mapping_id, version_id, target_version, "persisted new mapping");
    Ok(mapping_id)
}

/// Persists an edit to an existing concept as a new version snapshot.
///
/// The root document is updated in place, a new version becomes latest, and
/// the owning source's HEAD reference set swaps the old latest version id
/// for the new one.
pub fn persist_concept_changes(
    store: &mut RegistryStore,
    updated: Concept,
    actor: &str,
    options: PersistOptions,
) -> RegistryResult<ResourceId> {
    let concept_id = updated.id;
    let existing = store
        .get_concept(concept_id)
        .ok_or(RegistryError::NotFound { resource: "concept", id: concept_id })?;

    // Identity is immutable once assigned: the code and the owning source
    // never change across versions.
    let mut errors = ErrorMap::new();
    if updated.mnemonic != existing.mnemonic {
        push_error(&mut errors, "mnemonic", "Concept mnemonic cannot be changed");
    }
    if updated.parent_id != existing.parent_id {
        push_error(&mut errors, "parent", "Concept cannot be moved to another source");
    }
    if !errors.is_empty() {
        return Err(RegistryError::Validation(errors));
    }

    let parent = store
        .get_container(existing.parent_id)
        .ok_or(RegistryError::NotFound { resource: "container", id: existing.parent_id })?
        .clone();

    let chain = ValidatorChain::for_schema(
        parent.fields.custom_validation_schema,
        options.validation,
    );
    let errors = chain.validate_concept(store, &updated)?;
    if !errors.is_empty() {
        return Err(RegistryError::Validation(errors));
    }

    create_concept_snapshot(store, updated, false, actor, &parent, options.target_version)
}

/// Retires a concept: the root is flagged retired and a new retired version
/// snapshot replaces the previous latest in the HEAD reference set.
///
/// Retired entities are skipped by exports and by duplicate checks; the
/// version history keeps every pre-retirement snapshot.
pub fn retire_concept(
    store: &mut RegistryStore,
    concept_id: ResourceId,
    actor: &str,
) -> RegistryResult<ResourceId> {
    let mut updated = store
        .get_concept(concept_id)
        .ok_or(RegistryError::NotFound { resource: "concept", id: concept_id })?
        .clone();
    let parent = store
        .get_container(updated.parent_id)
        .ok_or(RegistryError::NotFound { resource: "container", id: updated.parent_id })?
        .clone();

    updated.retired = true;
    // Retirement skips validation: the concept may predate stricter rules.
    create_concept_snapshot(store, updated, true, actor, &parent, None)
}

/// Retires a mapping, mirroring [`retire_concept`].
pub fn retire_mapping(
    store: &mut RegistryStore,
    mapping_id: ResourceId,
    actor: &str,
) -> RegistryResult<ResourceId> {
    let now = now_epoch();
    let mut updated = store
        .get_mapping(mapping_id)
        .ok_or(RegistryError::NotFound { resource: "mapping", id: mapping_id })?
        .clone();
    let parent_id = updated.parent_id;

    updated.retired = true;
    updated.audit.touch(actor, now);

    let old_latest = store.latest_mapping_version(mapping_id).map(|v| v.id);
    let version_id = store.allocate_id();

    if let Some(root) = store.get_mapping_mut(mapping_id) {
        *root = updated.clone();
    }
    if let Some(old_id) = old_latest {
        if let Some(old) = store.get_mapping_version_mut(old_id) {
            old.is_latest_version = false;
        }
    }
    store.insert_mapping_version(MappingVersion {
        id: version_id,
        versioned_object_id: mapping_id,
        data: updated,
        is_latest_version: true,
        retired: true,
        audit: Audit::new(actor, now),
    });

    swap_head_reference(store, parent_id, old_latest, version_id, ReferenceKind::Mapping)?;
    Ok(version_id)
}

/// Which reference set of a container version to touch.
enum ReferenceKind {
    Concept,
    Mapping,
}

fn create_concept_snapshot(
    store: &mut RegistryStore,
    updated: Concept,
    retired: bool,
    actor: &str,
    parent: &Container,
    target_version: Option<ResourceId>,
) -> RegistryResult<ResourceId> {
    let now = now_epoch();
    let concept_id = updated.id;
    let old_latest = store.latest_concept_version(concept_id).map(|v| v.id);
    let version_id = store.allocate_id();

    let mut stamped = updated;
    stamped.audit.touch(actor, now);

    if let Some(root) = store.get_concept_mut(concept_id) {
        *root = stamped.clone();
    }
    if let Some(old_id) = old_latest {
        if let Some(old) = store.get_concept_version_mut(old_id) {
            old.is_latest_version = false;
        }
    }
    store.insert_concept_version(ConceptVersion {
        id: version_id,
        versioned_object_id: concept_id,
        data: stamped,
        is_latest_version: true,
        retired,
        audit: Audit::new(actor, now),
    });

    match target_version {
        Some(target) => {
            versioning::add_concept_reference(store, target, version_id)?;
        }
        None => {
            swap_head_reference(store, parent.id, old_latest, version_id, ReferenceKind::Concept)?;
        }
    }
    Ok(version_id)
}

/// Swaps the previous latest version id for the new one in HEAD.
fn swap_head_reference(
    store: &mut RegistryStore,
    container_id: ResourceId,
    old_version: Option<ResourceId>,
    new_version: ResourceId,
    kind: ReferenceKind,
) -> RegistryResult<()> {
    let head_id = versioning::get_head(store, container_id)?.id;
    let head = store
        .get_version_mut(head_id)
        .ok_or(RegistryError::NotFound { resource: "container version", id: head_id })?;
    let references = match kind {
        ReferenceKind::Concept => &mut head.concept_references,
        ReferenceKind::Mapping => &mut head.mapping_references,
    };
    if let Some(old) = old_version {
        references.remove(&old);
    }
    references.insert(new_version);
    Ok(())
}

fn resolve_target_version(
    store: &RegistryStore,
    parent: &Container,
    requested: Option<ResourceId>,
) -> RegistryResult<ResourceId> {
    match requested {
        Some(id) => {
            let version = store
                .get_version(id)
                .ok_or(RegistryError::NotFound { resource: "container version", id })?;
            if version.versioned_object_id != parent.id {
                return Err(RegistryError::NotFound { resource: "container version", id });
            }
            Ok(id)
        }
        None => Ok(versioning::get_head(store, parent.id)?.id),
    }
}

fn parse_mnemonic(raw: &str) -> RegistryResult<Mnemonic> {
    Mnemonic::new(raw).map_err(|e| {
        let mut map = ErrorMap::new();
        push_error(&mut map, "mnemonic", e.to_string());
        RegistryError::Validation(map)
    })
}

fn errored_action(action: &str, err: RegistryError) -> RegistryError {
    tracing::warn!(%err, action, "persistence failed; rolled back partial writes");
    let mut map = ErrorMap::new();
    push_error(&mut map, NON_FIELD_ERRORS, format!("{action}: {err}"));
    RegistryError::Validation(map)
}
