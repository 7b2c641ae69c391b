//! Concept entities and their version snapshots.

use crate::{AccessLevel, Audit, Mnemonic, ResourceId};

/// A localized name attached to a concept.
///
/// # Examples
///
/// ```
/// use termreg_types::ConceptName;
///
/// let name = ConceptName {
///     name: "Malaria".to_string(),
///     locale: "en".to_string(),
///     name_type: Some("FULLY_SPECIFIED".to_string()),
///     locale_preferred: true,
/// };
///
/// assert!(name.is_fully_specified());
/// assert!(!name.is_short());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConceptName {
    /// The name text.
    pub name: String,
    /// Locale code, e.g. `"en"`.
    pub locale: String,
    /// Name type, e.g. `FULLY_SPECIFIED` or `SHORT`. `None` means synonym.
    pub name_type: Option<String>,
    /// Whether this is the preferred name in its locale.
    pub locale_preferred: bool,
}

impl ConceptName {
    /// Name type marking a fully specified name.
    pub const FULLY_SPECIFIED: &'static str = "FULLY_SPECIFIED";
    /// Name type marking a short name.
    pub const SHORT: &'static str = "SHORT";
    /// Name type marking an index term.
    pub const INDEX_TERM: &'static str = "INDEX_TERM";

    /// Returns true if this name is fully specified.
    pub fn is_fully_specified(&self) -> bool {
        self.name_type.as_deref() == Some(Self::FULLY_SPECIFIED)
    }

    /// Returns true if this name is a short name.
    pub fn is_short(&self) -> bool {
        self.name_type.as_deref() == Some(Self::SHORT)
    }

    /// Returns true if this name is an index term.
    pub fn is_index_term(&self) -> bool {
        self.name_type.as_deref() == Some(Self::INDEX_TERM)
    }
}

/// A localized free-text description attached to a concept.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConceptDescription {
    /// The description text.
    pub description: String,
    /// Locale code.
    pub locale: String,
    /// Description type, if any.
    pub description_type: Option<String>,
    /// Whether this is the preferred description in its locale.
    pub locale_preferred: bool,
}

/// A concept: the versioned-object root owned by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Concept {
    /// Internal identifier.
    pub id: ResourceId,
    /// Concept code, unique within the owning source.
    pub mnemonic: Mnemonic,
    /// Owning source container.
    pub parent_id: ResourceId,
    /// Concept class, e.g. `"Diagnosis"`. Lookup-validated under OpenMRS.
    pub concept_class: String,
    /// Datatype, e.g. `"Numeric"`. Lookup-validated under OpenMRS.
    pub datatype: String,
    /// Ordered localized names.
    pub names: Vec<ConceptName>,
    /// Ordered localized descriptions.
    pub descriptions: Vec<ConceptDescription>,
    /// Whether the concept has been retired.
    pub retired: bool,
    /// Visibility, inherited from the parent container.
    pub public_access: AccessLevel,
    /// Audit stamp.
    pub audit: Audit,
}

impl Concept {
    /// Returns the names in the given locale.
    pub fn names_in_locale<'a>(&'a self, locale: &'a str) -> impl Iterator<Item = &'a ConceptName> {
        self.names.iter().filter(move |n| n.locale == locale)
    }

    /// Returns the first fully specified name, if any.
    pub fn fully_specified_name(&self) -> Option<&ConceptName> {
        self.names.iter().find(|n| n.is_fully_specified())
    }
}

/// An immutable snapshot of a concept at a point in time.
///
/// Exactly one version per concept carries `is_latest_version = true`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConceptVersion {
    /// Internal identifier of this version document.
    pub id: ResourceId,
    /// The concept this version snapshots.
    pub versioned_object_id: ResourceId,
    /// Frozen copy of the concept data at snapshot time.
    pub data: Concept,
    /// True on exactly one version per concept.
    pub is_latest_version: bool,
    /// Whether the concept was retired as of this version.
    pub retired: bool,
    /// Audit stamp.
    pub audit: Audit,
}

/// Draft input for creating a concept through the persistence pipeline.
///
/// Fields that the pipeline stamps (access, audit) are absent; fields that
/// validation may reject are raw.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConceptDraft {
    /// Concept code.
    pub mnemonic: String,
    /// Owning source container id. Required.
    pub parent_id: Option<ResourceId>,
    /// Actor performing the create. Required.
    pub created_by: Option<String>,
    /// Concept class.
    pub concept_class: String,
    /// Datatype.
    pub datatype: String,
    /// Localized names.
    pub names: Vec<ConceptName>,
    /// Localized descriptions.
    pub descriptions: Vec<ConceptDescription>,
}
