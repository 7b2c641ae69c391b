//! # termreg-engine
//!
//! Core engine for the termreg terminology registry: an in-memory document
//! store, the versioned-container manager, the validation pipeline, the
//! all-or-nothing persistence pipeline, reference resolution, the
//! broken-reference sweep, and the export pipeline.
//!
//! The engine exposes pure functions over [`RegistryStore`]; callers own
//! locking and task scheduling.

#![warn(missing_docs)]

pub mod errors;
pub mod export;
pub mod index;
pub mod integrity;
pub mod persist;
pub mod refs;
pub mod store;
pub mod validation;
pub mod versioning;

pub use errors::{ConflictKind, ErrorMap, RegistryError, RegistryResult, NON_FIELD_ERRORS};
pub use export::{
    archive_path, export_version, ArchiveStore, ExportDocument, LocalArchiveStore,
};
pub use index::{index_concept, index_mapping, IndexDocument, IndexedKind};
pub use integrity::{sweep_broken_references, SweepReport};
pub use persist::{
    persist_concept_changes, persist_new_concept, persist_new_concepts, persist_new_mapping,
    retire_concept, retire_mapping, BulkOutcome, PersistOptions,
};
pub use refs::{add_references, resolve_concept, resolve_mapping_target, AddedReferences, ConceptSelector};
pub use store::{now_epoch, RegistryStore};
pub use validation::{ValidationOptions, Validator, ValidatorChain};
pub use versioning::{
    acquire_lease, add_concept_reference, add_mapping_reference, create_container,
    create_version, get_head, recover_stale_leases, release, release_lease, version_chain,
    NewContainer,
};

// Re-export the types crate for convenience
pub use termreg_types;
