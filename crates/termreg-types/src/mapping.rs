//! Mapping entities and their version snapshots.

use crate::{AccessLevel, Audit, Mnemonic, ResourceId};

/// The target of a mapping: either an internal concept or an external
/// (source, code) pair. A mapping has exactly one of the two; drafts that
/// supply both or neither are rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MappingTarget {
    /// Reference to a concept stored in this registry.
    Internal {
        /// The target concept id.
        concept_id: ResourceId,
    },
    /// Reference to a concept in an external terminology.
    External {
        /// Mnemonic of the external source.
        source: String,
        /// Concept code within the external source.
        concept_code: String,
    },
}

/// A mapping between two concepts, owned by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mapping {
    /// Internal identifier.
    pub id: ResourceId,
    /// Mapping code, unique within the owning source.
    pub mnemonic: Mnemonic,
    /// Owning source container.
    pub parent_id: ResourceId,
    /// Relationship kind, e.g. `"SAME-AS"`. Lookup-validated under OpenMRS.
    pub map_type: String,
    /// The concept this mapping starts from.
    pub from_concept_id: ResourceId,
    /// The concept this mapping points to.
    pub target: MappingTarget,
    /// Whether the mapping has been retired.
    pub retired: bool,
    /// Visibility, inherited from the parent container.
    pub public_access: AccessLevel,
    /// Audit stamp.
    pub audit: Audit,
}

/// An immutable snapshot of a mapping at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MappingVersion {
    /// Internal identifier of this version document.
    pub id: ResourceId,
    /// The mapping this version snapshots.
    pub versioned_object_id: ResourceId,
    /// Frozen copy of the mapping data at snapshot time.
    pub data: Mapping,
    /// True on exactly one version per mapping.
    pub is_latest_version: bool,
    /// Whether the mapping was retired as of this version.
    pub retired: bool,
    /// Audit stamp.
    pub audit: Audit,
}

/// Draft input for creating a mapping through the persistence pipeline.
///
/// Both target forms are optional here; structural validation enforces that
/// exactly one is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MappingDraft {
    /// Mapping code.
    pub mnemonic: String,
    /// Owning source container id. Required.
    pub parent_id: Option<ResourceId>,
    /// Actor performing the create. Required.
    pub created_by: Option<String>,
    /// Relationship kind.
    pub map_type: String,
    /// The concept this mapping starts from.
    pub from_concept_id: Option<ResourceId>,
    /// Internal target concept, if mapping within the registry.
    pub to_concept_id: Option<ResourceId>,
    /// External target source, if mapping out of the registry.
    pub to_source: Option<String>,
    /// External target code, paired with `to_source`.
    pub to_concept_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_variants() {
        let internal = MappingTarget::Internal { concept_id: 7 };
        let external = MappingTarget::External {
            source: "ICD-10".to_string(),
            concept_code: "B54".to_string(),
        };
        assert_ne!(internal, external);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_draft_deserializes_with_defaults() {
        let draft: MappingDraft = serde_json::from_str(r#"{"map_type": "SAME-AS"}"#).unwrap();
        assert_eq!(draft.map_type, "SAME-AS");
        assert!(draft.from_concept_id.is_none());
        assert!(draft.to_source.is_none());
    }
}
