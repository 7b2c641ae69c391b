//! Search-index document emission.
//!
//! The engine emits one denormalized document per concept or mapping so an
//! external indexer can serve search without joining the document store.
//! Index freshness is eventually consistent; emission never affects the
//! correctness of the persistence pipelines.

use serde::{Deserialize, Serialize};

use termreg_types::{ContainerKind, OwnerKind, ResourceId};

use crate::errors::{RegistryError, RegistryResult};
use crate::store::RegistryStore;

/// What kind of entity an index document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexedKind {
    /// A concept document.
    Concept,
    /// A mapping document.
    Mapping,
}

/// A denormalized, indexer-ready view of one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Entity id.
    pub id: ResourceId,
    /// Concept or mapping.
    pub kind: IndexedKind,
    /// Entity code within its container.
    pub mnemonic: String,
    /// Owning container mnemonic.
    pub container: String,
    /// Owner mnemonic.
    pub owner: String,
    /// Owner kind.
    pub owner_kind: OwnerKind,
    /// Locales the entity's names cover (concepts only; empty for mappings).
    pub locales: Vec<String>,
    /// Source-version ids whose reference sets include a snapshot of this
    /// entity.
    pub source_version_ids: Vec<ResourceId>,
    /// Collection-version ids whose reference sets include a snapshot of
    /// this entity.
    pub collection_version_ids: Vec<ResourceId>,
    /// Retirement flag.
    pub retired: bool,
    /// Soft-delete flag.
    pub is_active: bool,
}

/// Builds the index document for a concept.
pub fn index_concept(store: &RegistryStore, concept_id: ResourceId) -> RegistryResult<IndexDocument> {
    let concept = store
        .get_concept(concept_id)
        .ok_or(RegistryError::NotFound { resource: "concept", id: concept_id })?;
    let (container, owner, owner_kind) = container_and_owner(store, concept.parent_id)?;

    let mut locales: Vec<String> = concept.names.iter().map(|n| n.locale.clone()).collect();
    locales.sort();
    locales.dedup();

    let snapshot_ids: Vec<ResourceId> =
        store.versions_of_concept(concept_id).iter().map(|v| v.id).collect();
    let (source_version_ids, collection_version_ids) =
        referencing_versions(store, &snapshot_ids, ReferenceSet::Concepts);

    Ok(IndexDocument {
        id: concept_id,
        kind: IndexedKind::Concept,
        mnemonic: concept.mnemonic.to_string(),
        container,
        owner,
        owner_kind,
        locales,
        source_version_ids,
        collection_version_ids,
        retired: concept.retired,
        is_active: concept.audit.is_active,
    })
}

/// Builds the index document for a mapping.
pub fn index_mapping(store: &RegistryStore, mapping_id: ResourceId) -> RegistryResult<IndexDocument> {
    let mapping = store
        .get_mapping(mapping_id)
        .ok_or(RegistryError::NotFound { resource: "mapping", id: mapping_id })?;
    let (container, owner, owner_kind) = container_and_owner(store, mapping.parent_id)?;

    let snapshot_ids: Vec<ResourceId> =
        store.versions_of_mapping(mapping_id).iter().map(|v| v.id).collect();
    let (source_version_ids, collection_version_ids) =
        referencing_versions(store, &snapshot_ids, ReferenceSet::Mappings);

    Ok(IndexDocument {
        id: mapping_id,
        kind: IndexedKind::Mapping,
        mnemonic: mapping.mnemonic.to_string(),
        container,
        owner,
        owner_kind,
        locales: Vec::new(),
        source_version_ids,
        collection_version_ids,
        retired: mapping.retired,
        is_active: mapping.audit.is_active,
    })
}

enum ReferenceSet {
    Concepts,
    Mappings,
}

fn container_and_owner(
    store: &RegistryStore,
    container_id: ResourceId,
) -> RegistryResult<(String, String, OwnerKind)> {
    let container = store
        .get_container(container_id)
        .ok_or(RegistryError::NotFound { resource: "container", id: container_id })?;
    let owner = store
        .get_owner(container.owner_id)
        .ok_or(RegistryError::NotFound { resource: "owner", id: container.owner_id })?;
    Ok((
        container.mnemonic.to_string(),
        owner.mnemonic.to_string(),
        owner.kind,
    ))
}

/// Partitions the container versions that reference any of `snapshot_ids`
/// into source-version and collection-version id lists.
fn referencing_versions(
    store: &RegistryStore,
    snapshot_ids: &[ResourceId],
    set: ReferenceSet,
) -> (Vec<ResourceId>, Vec<ResourceId>) {
    let mut sources = Vec::new();
    let mut collections = Vec::new();

    for version in store.container_versions() {
        let references = match set {
            ReferenceSet::Concepts => &version.concept_references,
            ReferenceSet::Mappings => &version.mapping_references,
        };
        if !snapshot_ids.iter().any(|id| references.contains(id)) {
            continue;
        }
        let Some(container) = store.get_container(version.versioned_object_id) else {
            continue;
        };
        match container.kind {
            ContainerKind::Source => sources.push(version.id),
            ContainerKind::Collection => collections.push(version.id),
        }
    }

    sources.sort_unstable();
    collections.sort_unstable();
    (sources, collections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::persist_new_concept;
    use crate::refs::add_references;
    use crate::versioning::{create_container, get_head, NewContainer};
    use termreg_types::{AccessLevel, ConceptDraft, ConceptName, ContainerFields};

    fn fields(name: &str) -> ContainerFields {
        ContainerFields {
            name: name.to_string(),
            full_name: None,
            description: None,
            default_locale: "en".to_string(),
            supported_locales: vec!["en".to_string()],
            public_access: AccessLevel::View,
            custom_validation_schema: None,
        }
    }

    #[test]
    fn test_concept_index_document_denormalizes_ownership() {
        let mut store = RegistryStore::new();
        let owner = store
            .insert_owner("acme", OwnerKind::Organization, "Acme", "root")
            .unwrap();
        let source = create_container(
            &mut store,
            NewContainer {
                kind: ContainerKind::Source,
                mnemonic: "drugs".to_string(),
                owner_id: owner,
                fields: fields("Drugs"),
            },
            "root",
        )
        .unwrap();
        let collection = create_container(
            &mut store,
            NewContainer {
                kind: ContainerKind::Collection,
                mnemonic: "starter-set".to_string(),
                owner_id: owner,
                fields: fields("Starter Set"),
            },
            "root",
        )
        .unwrap();

        let concept_id = persist_new_concept(
            &mut store,
            ConceptDraft {
                mnemonic: "C1".to_string(),
                parent_id: Some(source),
                created_by: Some("tester".to_string()),
                concept_class: "Diagnosis".to_string(),
                datatype: "None".to_string(),
                names: vec![
                    ConceptName {
                        name: "Fever".to_string(),
                        locale: "en".to_string(),
                        name_type: Some(ConceptName::FULLY_SPECIFIED.to_string()),
                        locale_preferred: true,
                    },
                    ConceptName {
                        name: "Fiebre".to_string(),
                        locale: "es".to_string(),
                        name_type: None,
                        locale_preferred: false,
                    },
                ],
                descriptions: vec![],
            },
            Default::default(),
        )
        .unwrap();

        let collection_head = get_head(&store, collection).unwrap().id;
        add_references(&mut store, collection_head, &[concept_id], &[]).unwrap();

        let document = index_concept(&store, concept_id).unwrap();
        assert_eq!(document.kind, IndexedKind::Concept);
        assert_eq!(document.owner, "acme");
        assert_eq!(document.owner_kind, OwnerKind::Organization);
        assert_eq!(document.container, "drugs");
        assert_eq!(document.locales, vec!["en", "es"]);
        assert!(!document.retired);
        assert!(document.is_active);

        let source_head = get_head(&store, source).unwrap().id;
        assert_eq!(document.source_version_ids, vec![source_head]);
        assert_eq!(document.collection_version_ids, vec![collection_head]);
    }

    #[test]
    fn test_index_missing_entity_fails() {
        let store = RegistryStore::new();
        assert!(index_concept(&store, 42).is_err());
        assert!(index_mapping(&store, 42).is_err());
    }
}
