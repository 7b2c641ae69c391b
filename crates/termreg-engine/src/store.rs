//! In-memory registry document store.
//!
//! The store is the single source of truth for all registry documents:
//! owners, containers, container versions, concepts, mappings, and their
//! version snapshots. Secondary indexes keep per-container lookups cheap.
//!
//! All mutation goes through the engine pipelines (`versioning`, `persist`);
//! the store itself only offers document-level primitives.

use std::collections::HashMap;

use termreg_types::{
    Concept, ConceptVersion, Container, ContainerKind, ContainerVersion, Mapping, MappingVersion,
    Mnemonic, Owner, OwnerKind, ResourceId,
};

use crate::errors::{ConflictKind, RegistryError, RegistryResult};

/// Returns the current time as epoch seconds.
pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

/// In-memory store for registry documents.
///
/// # Example
///
/// ```
/// use termreg_engine::RegistryStore;
/// use termreg_types::OwnerKind;
///
/// let mut store = RegistryStore::new();
/// let org = store
///     .insert_owner("WHO", OwnerKind::Organization, "World Health Organization", "root")
///     .unwrap();
/// assert!(store.get_owner(org).is_some());
/// ```
#[derive(Debug, Default)]
pub struct RegistryStore {
    next_id: ResourceId,
    owners: HashMap<ResourceId, Owner>,
    containers: HashMap<ResourceId, Container>,
    versions: HashMap<ResourceId, ContainerVersion>,
    concepts: HashMap<ResourceId, Concept>,
    concept_versions: HashMap<ResourceId, ConceptVersion>,
    mappings: HashMap<ResourceId, Mapping>,
    mapping_versions: HashMap<ResourceId, MappingVersion>,
    /// Container-version ids per container, in creation order.
    versions_by_container: HashMap<ResourceId, Vec<ResourceId>>,
    /// Concept ids per owning container.
    concepts_by_container: HashMap<ResourceId, Vec<ResourceId>>,
    /// Mapping ids per owning container.
    mappings_by_container: HashMap<ResourceId, Vec<ResourceId>>,
    /// Concept-version ids per concept, in creation order.
    versions_by_concept: HashMap<ResourceId, Vec<ResourceId>>,
    /// Mapping-version ids per mapping, in creation order.
    versions_by_mapping: HashMap<ResourceId, Vec<ResourceId>>,
}

impl RegistryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh resource id. Ids are never reused.
    pub fn allocate_id(&mut self) -> ResourceId {
        self.next_id += 1;
        self.next_id
    }

    // =============================================================================
    // Owners
    // =============================================================================

    /// Inserts a new owner, enforcing mnemonic uniqueness per owner kind.
    pub fn insert_owner(
        &mut self,
        mnemonic: &str,
        kind: OwnerKind,
        name: &str,
        actor: &str,
    ) -> RegistryResult<ResourceId> {
        let mnemonic = Mnemonic::new(mnemonic).map_err(|e| {
            RegistryError::Validation(crate::errors::ErrorMap::from([(
                "mnemonic".to_string(),
                vec![e.to_string()],
            )]))
        })?;

        if self.find_owner(mnemonic.as_str(), kind).is_some() {
            return Err(RegistryError::Conflict {
                kind: ConflictKind::DuplicateMnemonic,
                detail: format!("{} '{}' already exists", kind.resource_type(), mnemonic),
            });
        }

        let id = self.allocate_id();
        self.owners.insert(
            id,
            Owner {
                id,
                mnemonic,
                kind,
                name: name.to_string(),
                audit: termreg_types::Audit::new(actor, now_epoch()),
            },
        );
        Ok(id)
    }

    /// Gets an owner by id.
    pub fn get_owner(&self, id: ResourceId) -> Option<&Owner> {
        self.owners.get(&id)
    }

    /// Finds an owner by mnemonic and kind.
    pub fn find_owner(&self, mnemonic: &str, kind: OwnerKind) -> Option<&Owner> {
        self.owners
            .values()
            .find(|o| o.kind == kind && o.mnemonic.as_str() == mnemonic)
    }

    /// Resolves an owner by mnemonic and kind, failing if absent.
    pub fn resolve_owner(&self, mnemonic: &str, kind: OwnerKind) -> RegistryResult<&Owner> {
        self.find_owner(mnemonic, kind)
            .ok_or_else(|| RegistryError::OwnerNotFound {
                mnemonic: mnemonic.to_string(),
            })
    }

    // =============================================================================
    // Containers
    // =============================================================================

    /// Inserts a container document. Uniqueness of (owner, kind, mnemonic)
    /// must already have been checked by the caller.
    pub fn insert_container(&mut self, container: Container) {
        self.versions_by_container.entry(container.id).or_default();
        self.concepts_by_container.entry(container.id).or_default();
        self.mappings_by_container.entry(container.id).or_default();
        self.containers.insert(container.id, container);
    }

    /// Gets a container by id.
    pub fn get_container(&self, id: ResourceId) -> Option<&Container> {
        self.containers.get(&id)
    }

    /// Gets a mutable container by id.
    pub fn get_container_mut(&mut self, id: ResourceId) -> Option<&mut Container> {
        self.containers.get_mut(&id)
    }

    /// Finds a container by owner, kind, and mnemonic.
    pub fn find_container(
        &self,
        owner_id: ResourceId,
        kind: ContainerKind,
        mnemonic: &str,
    ) -> Option<&Container> {
        self.containers.values().find(|c| {
            c.owner_id == owner_id && c.kind == kind && c.mnemonic.as_str() == mnemonic
        })
    }

    /// Returns an iterator over all containers.
    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    /// Soft-deletes a container and cascades to its owned concepts and
    /// mappings.
    pub fn deactivate_container(&mut self, id: ResourceId, actor: &str) -> RegistryResult<()> {
        let now = now_epoch();
        let container = self
            .containers
            .get_mut(&id)
            .ok_or(RegistryError::NotFound { resource: "container", id })?;
        container.audit.is_active = false;
        container.audit.touch(actor, now);

        for concept_id in self.concepts_by_container.get(&id).cloned().unwrap_or_default() {
            if let Some(concept) = self.concepts.get_mut(&concept_id) {
                concept.audit.is_active = false;
                concept.audit.touch(actor, now);
            }
        }
        for mapping_id in self.mappings_by_container.get(&id).cloned().unwrap_or_default() {
            if let Some(mapping) = self.mappings.get_mut(&mapping_id) {
                mapping.audit.is_active = false;
                mapping.audit.touch(actor, now);
            }
        }
        Ok(())
    }

    // =============================================================================
    // Container versions
    // =============================================================================

    /// Inserts a container-version document.
    pub fn insert_version(&mut self, version: ContainerVersion) {
        self.versions_by_container
            .entry(version.versioned_object_id)
            .or_default()
            .push(version.id);
        self.versions.insert(version.id, version);
    }

    /// Gets a container version by id.
    pub fn get_version(&self, id: ResourceId) -> Option<&ContainerVersion> {
        self.versions.get(&id)
    }

    /// Gets a mutable container version by id.
    pub fn get_version_mut(&mut self, id: ResourceId) -> Option<&mut ContainerVersion> {
        self.versions.get_mut(&id)
    }

    /// Returns the versions of a container in creation order.
    pub fn versions_of(&self, container_id: ResourceId) -> Vec<&ContainerVersion> {
        self.versions_by_container
            .get(&container_id)
            .map(|ids| ids.iter().filter_map(|id| self.versions.get(id)).collect())
            .unwrap_or_default()
    }

    /// Finds a version of a container by label.
    pub fn find_version(&self, container_id: ResourceId, label: &str) -> Option<&ContainerVersion> {
        self.versions_of(container_id)
            .into_iter()
            .find(|v| v.mnemonic.as_str() == label)
    }

    /// Returns an iterator over all container versions.
    pub fn container_versions(&self) -> impl Iterator<Item = &ContainerVersion> {
        self.versions.values()
    }

    /// Returns the ids of all container versions.
    pub fn container_version_ids(&self) -> Vec<ResourceId> {
        self.versions.keys().copied().collect()
    }

    // =============================================================================
    // Concepts
    // =============================================================================

    /// Inserts a concept document.
    pub fn insert_concept(&mut self, concept: Concept) {
        self.concepts_by_container
            .entry(concept.parent_id)
            .or_default()
            .push(concept.id);
        self.versions_by_concept.entry(concept.id).or_default();
        self.concepts.insert(concept.id, concept);
    }

    /// Removes a concept document. Used only by pipeline rollback.
    pub fn remove_concept(&mut self, id: ResourceId) -> Option<Concept> {
        let concept = self.concepts.remove(&id)?;
        if let Some(ids) = self.concepts_by_container.get_mut(&concept.parent_id) {
            ids.retain(|&c| c != id);
        }
        self.versions_by_concept.remove(&id);
        Some(concept)
    }

    /// Gets a concept by id.
    pub fn get_concept(&self, id: ResourceId) -> Option<&Concept> {
        self.concepts.get(&id)
    }

    /// Gets a mutable concept by id.
    pub fn get_concept_mut(&mut self, id: ResourceId) -> Option<&mut Concept> {
        self.concepts.get_mut(&id)
    }

    /// Finds a concept in a container by its code.
    pub fn find_concept(&self, container_id: ResourceId, code: &str) -> Option<&Concept> {
        self.concepts_in(container_id)
            .into_iter()
            .find(|c| c.mnemonic.as_str() == code)
    }

    /// Returns the concepts owned by a container.
    pub fn concepts_in(&self, container_id: ResourceId) -> Vec<&Concept> {
        self.concepts_by_container
            .get(&container_id)
            .map(|ids| ids.iter().filter_map(|id| self.concepts.get(id)).collect())
            .unwrap_or_default()
    }

    /// Inserts a concept-version document.
    pub fn insert_concept_version(&mut self, version: ConceptVersion) {
        self.versions_by_concept
            .entry(version.versioned_object_id)
            .or_default()
            .push(version.id);
        self.concept_versions.insert(version.id, version);
    }

    /// Removes a concept-version document. Used only by pipeline rollback.
    pub fn remove_concept_version(&mut self, id: ResourceId) -> Option<ConceptVersion> {
        let version = self.concept_versions.remove(&id)?;
        if let Some(ids) = self.versions_by_concept.get_mut(&version.versioned_object_id) {
            ids.retain(|&v| v != id);
        }
        Some(version)
    }

    /// Gets a concept version by id.
    pub fn get_concept_version(&self, id: ResourceId) -> Option<&ConceptVersion> {
        self.concept_versions.get(&id)
    }

    /// Gets a mutable concept version by id.
    pub fn get_concept_version_mut(&mut self, id: ResourceId) -> Option<&mut ConceptVersion> {
        self.concept_versions.get_mut(&id)
    }

    /// Returns the versions of a concept in creation order.
    pub fn versions_of_concept(&self, concept_id: ResourceId) -> Vec<&ConceptVersion> {
        self.versions_by_concept
            .get(&concept_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.concept_versions.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the version flagged latest for a concept, if any.
    pub fn latest_concept_version(&self, concept_id: ResourceId) -> Option<&ConceptVersion> {
        self.versions_of_concept(concept_id)
            .into_iter()
            .find(|v| v.is_latest_version)
    }

    // =============================================================================
    // Mappings
    // =============================================================================

    /// Inserts a mapping document.
    pub fn insert_mapping(&mut self, mapping: Mapping) {
        self.mappings_by_container
            .entry(mapping.parent_id)
            .or_default()
            .push(mapping.id);
        self.versions_by_mapping.entry(mapping.id).or_default();
        self.mappings.insert(mapping.id, mapping);
    }

    /// Removes a mapping document. Used only by pipeline rollback.
    pub fn remove_mapping(&mut self, id: ResourceId) -> Option<Mapping> {
        let mapping = self.mappings.remove(&id)?;
        if let Some(ids) = self.mappings_by_container.get_mut(&mapping.parent_id) {
            ids.retain(|&m| m != id);
        }
        self.versions_by_mapping.remove(&id);
        Some(mapping)
    }

    /// Gets a mapping by id.
    pub fn get_mapping(&self, id: ResourceId) -> Option<&Mapping> {
        self.mappings.get(&id)
    }

    /// Gets a mutable mapping by id.
    pub fn get_mapping_mut(&mut self, id: ResourceId) -> Option<&mut Mapping> {
        self.mappings.get_mut(&id)
    }

    /// Returns the mappings owned by a container.
    pub fn mappings_in(&self, container_id: ResourceId) -> Vec<&Mapping> {
        self.mappings_by_container
            .get(&container_id)
            .map(|ids| ids.iter().filter_map(|id| self.mappings.get(id)).collect())
            .unwrap_or_default()
    }

    /// Inserts a mapping-version document.
    pub fn insert_mapping_version(&mut self, version: MappingVersion) {
        self.versions_by_mapping
            .entry(version.versioned_object_id)
            .or_default()
            .push(version.id);
        self.mapping_versions.insert(version.id, version);
    }

    /// Removes a mapping-version document. Used only by pipeline rollback.
    pub fn remove_mapping_version(&mut self, id: ResourceId) -> Option<MappingVersion> {
        let version = self.mapping_versions.remove(&id)?;
        if let Some(ids) = self.versions_by_mapping.get_mut(&version.versioned_object_id) {
            ids.retain(|&v| v != id);
        }
        Some(version)
    }

    /// Gets a mapping version by id.
    pub fn get_mapping_version(&self, id: ResourceId) -> Option<&MappingVersion> {
        self.mapping_versions.get(&id)
    }

    /// Gets a mutable mapping version by id.
    pub fn get_mapping_version_mut(&mut self, id: ResourceId) -> Option<&mut MappingVersion> {
        self.mapping_versions.get_mut(&id)
    }

    /// Returns the versions of a mapping in creation order.
    pub fn versions_of_mapping(&self, mapping_id: ResourceId) -> Vec<&MappingVersion> {
        self.versions_by_mapping
            .get(&mapping_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.mapping_versions.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the version flagged latest for a mapping, if any.
    pub fn latest_mapping_version(&self, mapping_id: ResourceId) -> Option<&MappingVersion> {
        self.versions_of_mapping(mapping_id)
            .into_iter()
            .find(|v| v.is_latest_version)
    }

    // Statistics

    /// Number of concepts in the store.
    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    /// Number of mappings in the store.
    pub fn mapping_count(&self) -> usize {
        self.mappings.len()
    }

    /// Number of container versions in the store.
    pub fn container_version_count(&self) -> usize {
        self.versions.len()
    }
}
