//! Cross-entity reference resolution and collection references.
//!
//! Concepts are addressed either by internal id or by an external
//! (source mnemonic, concept code) pair; the two forms are mutually
//! exclusive at the draft level. Collections pin concept and mapping
//! version snapshots into their version's reference sets.

use termreg_types::{Concept, ContainerKind, Mapping, MappingTarget, ResourceId};

use crate::errors::{RegistryError, RegistryResult};
use crate::store::RegistryStore;
use crate::versioning;

/// How a concept is addressed.
#[derive(Debug, Clone)]
pub enum ConceptSelector {
    /// Direct internal id.
    Id(ResourceId),
    /// External form: source mnemonic plus concept code within it.
    Coded {
        /// Mnemonic of the owning source.
        source: String,
        /// Concept code within that source.
        code: String,
    },
}

/// Resolves a concept by id or by (source, code) pair.
pub fn resolve_concept<'a>(
    store: &'a RegistryStore,
    selector: &ConceptSelector,
) -> RegistryResult<&'a Concept> {
    match selector {
        ConceptSelector::Id(id) => store
            .get_concept(*id)
            .ok_or(RegistryError::NotFound { resource: "concept", id: *id }),
        ConceptSelector::Coded { source, code } => {
            let container = store
                .containers()
                .find(|c| c.kind == ContainerKind::Source && c.mnemonic.as_str() == source)
                .ok_or(RegistryError::OwnerNotFound { mnemonic: source.clone() })?;
            store
                .find_concept(container.id, code)
                .ok_or(RegistryError::NotFound { resource: "concept", id: container.id })
        }
    }
}

/// Resolves a mapping's target concept.
///
/// Internal targets must resolve. External targets resolve to `Some` when
/// the named source is hosted in this registry and `None` when it is not;
/// an unhosted external target is valid, not broken.
pub fn resolve_mapping_target<'a>(
    store: &'a RegistryStore,
    mapping: &Mapping,
) -> RegistryResult<Option<&'a Concept>> {
    match &mapping.target {
        MappingTarget::Internal { concept_id } => store
            .get_concept(*concept_id)
            .map(Some)
            .ok_or(RegistryError::NotFound { resource: "concept", id: *concept_id }),
        MappingTarget::External { source, concept_code } => {
            let hosted = store
                .containers()
                .find(|c| c.kind == ContainerKind::Source && c.mnemonic.as_str() == source);
            match hosted {
                Some(container) => Ok(store.find_concept(container.id, concept_code)),
                None => Ok(None),
            }
        }
    }
}

/// Outcome of a bulk reference add on a collection version.
#[derive(Debug, Default)]
pub struct AddedReferences {
    /// Concept references that were new.
    pub concepts_added: usize,
    /// Mapping references that were new.
    pub mappings_added: usize,
    /// Informational warnings, e.g. latest-snapshot pinning notices.
    pub warnings: Vec<String>,
}

/// Adds concept and mapping references to a collection version.
///
/// Each id is pinned at its current latest version snapshot. Re-adding an
/// already-present reference is a no-op, never an error; the returned
/// counts cover only references that were new. Pinning the latest snapshot
/// is flagged with a warning because the reference will not track future
/// updates to the entity.
pub fn add_references(
    store: &mut RegistryStore,
    collection_version_id: ResourceId,
    concept_ids: &[ResourceId],
    mapping_ids: &[ResourceId],
) -> RegistryResult<AddedReferences> {
    let mut outcome = AddedReferences::default();

    for &concept_id in concept_ids {
        let snapshot = store
            .latest_concept_version(concept_id)
            .ok_or(RegistryError::NotFound { resource: "concept", id: concept_id })?;
        let snapshot_id = snapshot.id;
        let code = snapshot.data.mnemonic.clone();

        if versioning::add_concept_reference(store, collection_version_id, snapshot_id)? {
            outcome.concepts_added += 1;
            let warning = format!(
                "concept '{code}' was added at its latest snapshot; the reference will not track future updates"
            );
            tracing::warn!(concept_id, snapshot_id, "{warning}");
            outcome.warnings.push(warning);
        }
    }

    for &mapping_id in mapping_ids {
        let snapshot = store
            .latest_mapping_version(mapping_id)
            .ok_or(RegistryError::NotFound { resource: "mapping", id: mapping_id })?;
        let snapshot_id = snapshot.id;
        let code = snapshot.data.mnemonic.clone();

        if versioning::add_mapping_reference(store, collection_version_id, snapshot_id)? {
            outcome.mappings_added += 1;
            let warning = format!(
                "mapping '{code}' was added at its latest snapshot; the reference will not track future updates"
            );
            tracing::warn!(mapping_id, snapshot_id, "{warning}");
            outcome.warnings.push(warning);
        }
    }

    Ok(outcome)
}
