//! Export pipeline for released container versions.
//!
//! An export serializes a version's container metadata plus every active
//! concept and mapping snapshot in its reference sets into one JSON
//! document, packs it into a gzip-compressed tar archive, and publishes it
//! to an archive store under a path keyed by owner, container, and version
//! label. Export is idempotent per version; re-running overwrites the prior
//! artifact atomically.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tar::{Archive, Builder, Header};

use termreg_types::{
    Concept, ContainerFields, ContainerKind, Mapping, OwnerKind, ResourceId,
};

use crate::errors::{RegistryError, RegistryResult};
use crate::store::RegistryStore;

/// Name of the JSON entry inside the tar archive.
const EXPORT_ENTRY: &str = "export.json";

/// The serialized shape of one exported version.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Owner mnemonic.
    pub owner: String,
    /// Owner kind.
    pub owner_kind: OwnerKind,
    /// Container mnemonic.
    pub container: String,
    /// Source or collection.
    pub container_kind: ContainerKind,
    /// Version label.
    pub version: String,
    /// Whether the version was released at export time.
    pub released: bool,
    /// Denormalized container metadata frozen into the version.
    pub fields: ContainerFields,
    /// Active concept snapshots in the reference set.
    pub concepts: Vec<Concept>,
    /// Active mapping snapshots in the reference set.
    pub mappings: Vec<Mapping>,
}

/// Opaque blob store keyed by string path.
pub trait ArchiveStore {
    /// Publishes `bytes` at `path`, replacing any prior artifact. A partial
    /// artifact must never become visible at the path.
    fn put_archive(&self, path: &str, bytes: &[u8]) -> RegistryResult<()>;

    /// Fetches the artifact at `path`, or `None` if absent.
    fn get_archive(&self, path: &str) -> RegistryResult<Option<Vec<u8>>>;
}

/// Filesystem-backed archive store.
///
/// Writes go to a temp file in the same directory and are renamed into
/// place, so readers only ever observe complete artifacts.
#[derive(Debug)]
pub struct LocalArchiveStore {
    root: PathBuf,
}

impl LocalArchiveStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl ArchiveStore for LocalArchiveStore {
    fn put_archive(&self, path: &str, bytes: &[u8]) -> RegistryResult<()> {
        let target = self.full_path(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = target.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn get_archive(&self, path: &str) -> RegistryResult<Option<Vec<u8>>> {
        match fs::read(self.full_path(path)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Canonical archive path for a version: `{owner}/{container}/{label}/export.tar.gz`.
pub fn archive_path(owner: &str, container: &str, label: &str) -> String {
    format!("{owner}/{container}/{label}/export.tar.gz")
}

/// Builds the export document for a container version.
///
/// Only active, referenced snapshots are included; retired entities stay in
/// the version history but are filtered from the export payload.
pub fn build_export_document(
    store: &RegistryStore,
    version_id: ResourceId,
) -> RegistryResult<ExportDocument> {
    let version = store
        .get_version(version_id)
        .ok_or(RegistryError::NotFound { resource: "container version", id: version_id })?;
    let container = store
        .get_container(version.versioned_object_id)
        .ok_or(RegistryError::NotFound {
            resource: "container",
            id: version.versioned_object_id,
        })?;
    let owner = store
        .get_owner(container.owner_id)
        .ok_or(RegistryError::NotFound { resource: "owner", id: container.owner_id })?;

    let concepts: Vec<Concept> = version
        .concept_references
        .iter()
        .filter_map(|&id| store.get_concept_version(id))
        .filter(|v| v.audit.is_active && !v.retired)
        .map(|v| v.data.clone())
        .collect();
    let mappings: Vec<Mapping> = version
        .mapping_references
        .iter()
        .filter_map(|&id| store.get_mapping_version(id))
        .filter(|v| v.audit.is_active && !v.retired)
        .map(|v| v.data.clone())
        .collect();

    Ok(ExportDocument {
        owner: owner.mnemonic.to_string(),
        owner_kind: owner.kind,
        container: container.mnemonic.to_string(),
        container_kind: container.kind,
        version: version.mnemonic.to_string(),
        released: version.released,
        fields: version.fields.clone(),
        concepts,
        mappings,
    })
}

/// Serializes an export document into a gzip-compressed tar archive holding
/// a single `export.json` entry.
pub fn write_archive(document: &ExportDocument) -> RegistryResult<Vec<u8>> {
    let json = serde_json::to_vec_pretty(document)?;

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = Builder::new(encoder);

    let mut header = Header::new_gnu();
    header.set_size(json.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, EXPORT_ENTRY, json.as_slice())?;

    let encoder = builder.into_inner()?;
    Ok(encoder.finish()?)
}

/// Reads an export document back out of a gzip-tar archive.
pub fn read_archive(bytes: &[u8]) -> RegistryResult<ExportDocument> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.path()?.as_ref() == Path::new(EXPORT_ENTRY) {
            let mut json = Vec::new();
            entry.read_to_end(&mut json)?;
            return Ok(serde_json::from_slice(&json)?);
        }
    }
    Err(RegistryError::Archive(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("archive has no {EXPORT_ENTRY} entry"),
    )))
}

/// Exports a container version to the archive store.
///
/// A pure function of the version id given a store pair; the task queue
/// re-invokes it on failure. Returns the published archive path.
pub fn export_version(
    store: &RegistryStore,
    archive_store: &dyn ArchiveStore,
    version_id: ResourceId,
) -> RegistryResult<String> {
    let document = build_export_document(store, version_id)?;
    let bytes = write_archive(&document)?;

    let path = archive_path(&document.owner, &document.container, &document.version);
    archive_store.put_archive(&path, &bytes)?;

    tracing::info!(
        version_id,
        path,
        concepts = document.concepts.len(),
        mappings = document.mappings.len(),
        "exported container version"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{persist_new_concept, persist_new_mapping, retire_concept};
    use crate::versioning::{create_container, create_version, release, NewContainer};
    use termreg_types::{AccessLevel, ConceptDraft, ConceptName};

    fn setup() -> (RegistryStore, ResourceId) {
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
                fields: ContainerFields {
                    name: "Drugs".to_string(),
                    full_name: None,
                    description: None,
                    default_locale: "en".to_string(),
                    supported_locales: vec!["en".to_string()],
                    public_access: AccessLevel::View,
                    custom_validation_schema: None,
                },
            },
            "root",
        )
        .unwrap();
        (store, source)
    }

    fn concept(store: &mut RegistryStore, source: ResourceId, code: &str) -> ResourceId {
        persist_new_concept(
            store,
            ConceptDraft {
                mnemonic: code.to_string(),
                parent_id: Some(source),
                created_by: Some("tester".to_string()),
                concept_class: "Diagnosis".to_string(),
                datatype: "None".to_string(),
                names: vec![ConceptName {
                    name: format!("{code} name"),
                    locale: "en".to_string(),
                    name_type: Some(ConceptName::FULLY_SPECIFIED.to_string()),
                    locale_preferred: true,
                }],
                descriptions: vec![],
            },
            Default::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_export_round_trips_through_archive() {
        let (mut store, source) = setup();
        let c1 = concept(&mut store, source, "C1");
        let c2 = concept(&mut store, source, "C2");
        persist_new_mapping(
            &mut store,
            termreg_types::MappingDraft {
                mnemonic: "M1".to_string(),
                parent_id: Some(source),
                created_by: Some("tester".to_string()),
                map_type: "SAME-AS".to_string(),
                from_concept_id: Some(c1),
                to_concept_id: Some(c2),
                to_source: None,
                to_concept_code: None,
            },
            Default::default(),
        )
        .unwrap();
        let v1 = create_version(&mut store, source, "v1-0", None, "root").unwrap();
        release(&mut store, v1, "root").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let archive_store = LocalArchiveStore::new(dir.path());

        let path = export_version(&store, &archive_store, v1).unwrap();
        assert_eq!(path, "acme/drugs/v1-0/export.tar.gz");

        let bytes = archive_store.get_archive(&path).unwrap().unwrap();
        let document = read_archive(&bytes).unwrap();
        assert_eq!(document.version, "v1-0");
        assert!(document.released);

        let mut codes: Vec<_> = document.concepts.iter().map(|c| c.mnemonic.to_string()).collect();
        codes.sort();
        assert_eq!(codes, vec!["C1", "C2"]);
        assert_eq!(document.mappings.len(), 1);
        assert_eq!(document.mappings[0].mnemonic.as_str(), "M1");
    }

    #[test]
    fn test_export_excludes_retired_entities() {
        let (mut store, source) = setup();
        concept(&mut store, source, "KEEP");
        let gone = concept(&mut store, source, "GONE");
        retire_concept(&mut store, gone, "tester").unwrap();

        let v1 = create_version(&mut store, source, "v1-0", None, "root").unwrap();
        release(&mut store, v1, "root").unwrap();

        let document = build_export_document(&store, v1).unwrap();
        let codes: Vec<_> = document.concepts.iter().map(|c| c.mnemonic.to_string()).collect();
        assert_eq!(codes, vec!["KEEP"]);
    }

    #[test]
    fn test_export_is_idempotent_per_version() {
        let (mut store, source) = setup();
        concept(&mut store, source, "C1");
        let v1 = create_version(&mut store, source, "v1-0", None, "root").unwrap();
        release(&mut store, v1, "root").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let archive_store = LocalArchiveStore::new(dir.path());

        let first = export_version(&store, &archive_store, v1).unwrap();
        let second = export_version(&store, &archive_store, v1).unwrap();
        assert_eq!(first, second);

        // Only the published artifact exists, no temp leftovers
        let version_dir = dir.path().join("acme/drugs/v1-0");
        let entries: Vec<_> = fs::read_dir(version_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_get_archive_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let archive_store = LocalArchiveStore::new(dir.path());
        assert!(archive_store.get_archive("nope/export.tar.gz").unwrap().is_none());
    }
}
