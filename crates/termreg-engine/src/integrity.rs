//! Broken-reference maintenance sweep.
//!
//! Released container versions are immutable through the normal pipelines,
//! but a reference can still go stale if the entity behind it is removed by
//! an administrative cleanup. The sweep detects reference ids that no longer
//! resolve and heals the version documents in place. It is idempotent and
//! safe to re-run at any time.

use termreg_types::ResourceId;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::store::RegistryStore;

/// Summary of one sweep run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Versions that had at least one broken reference removed.
    pub versions_healed: usize,
    /// Concept references removed.
    pub concept_references_removed: usize,
    /// Mapping references removed.
    pub mapping_references_removed: usize,
}

impl SweepReport {
    /// True when the sweep found nothing to heal.
    pub fn is_clean(&self) -> bool {
        self.versions_healed == 0
    }
}

/// Broken references detected on one version.
struct BrokenRefs {
    version_id: ResourceId,
    concepts: Vec<ResourceId>,
    mappings: Vec<ResourceId>,
}

/// Scans every released container version and removes references whose
/// concept or mapping snapshot no longer resolves.
///
/// Detection is read-only and runs in parallel when the `parallel` feature
/// is enabled; healing applies the removals serially.
pub fn sweep_broken_references(store: &mut RegistryStore) -> SweepReport {
    let version_ids = store.container_version_ids();
    let snapshot: &RegistryStore = store;

    #[cfg(feature = "parallel")]
    let broken: Vec<BrokenRefs> = version_ids
        .par_iter()
        .filter_map(|&id| detect(snapshot, id))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let broken: Vec<BrokenRefs> = version_ids
        .iter()
        .filter_map(|&id| detect(snapshot, id))
        .collect();

    let mut report = SweepReport::default();
    for entry in broken {
        if let Some(version) = store.get_version_mut(entry.version_id) {
            for id in &entry.concepts {
                version.concept_references.remove(id);
            }
            for id in &entry.mappings {
                version.mapping_references.remove(id);
            }
            tracing::warn!(
                version_id = entry.version_id,
                concepts = entry.concepts.len(),
                mappings = entry.mappings.len(),
                "removed broken references from released version"
            );
            report.versions_healed += 1;
            report.concept_references_removed += entry.concepts.len();
            report.mapping_references_removed += entry.mappings.len();
        }
    }
    report
}

fn detect(store: &RegistryStore, version_id: ResourceId) -> Option<BrokenRefs> {
    let version = store.get_version(version_id)?;
    if !version.released {
        return None;
    }

    let concepts: Vec<ResourceId> = version
        .concept_references
        .iter()
        .copied()
        .filter(|&id| store.get_concept_version(id).is_none())
        .collect();
    let mappings: Vec<ResourceId> = version
        .mapping_references
        .iter()
        .copied()
        .filter(|&id| store.get_mapping_version(id).is_none())
        .collect();

    if concepts.is_empty() && mappings.is_empty() {
        None
    } else {
        Some(BrokenRefs { version_id, concepts, mappings })
    }
}
