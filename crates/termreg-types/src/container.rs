//! Container entities: sources and collections.
//!
//! A container is the versioned-resource root. It holds the mutable
//! descriptive metadata and is itself never snapshotted; its history lives
//! in the chain of [`crate::ContainerVersion`] documents.

use crate::{Audit, Mnemonic, ResourceId};

/// Whether a container is a source or a collection.
///
/// Sources own their concepts and mappings; collections aggregate
/// references to concepts and mappings that live in sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContainerKind {
    /// A source: the authoritative home of concepts and mappings.
    Source,
    /// A collection: a curated set of references into sources.
    Collection,
}

impl ContainerKind {
    /// Resource-type label used in index documents and archive paths.
    pub fn resource_type(self) -> &'static str {
        match self {
            Self::Source => "Source",
            Self::Collection => "Collection",
        }
    }

    /// URL keyword-argument name the outer API layer routes this kind under.
    pub fn url_kwarg(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Collection => "collection",
        }
    }
}

/// Visibility of a container and the entities it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessLevel {
    /// Readable and editable by anyone.
    Edit,
    /// Readable by anyone.
    #[default]
    View,
    /// Visible only to the owner.
    None,
}

/// A named rule set applied on top of basic validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidationSchema {
    /// OpenMRS dictionary rules (name uniqueness, lookup-backed attributes).
    OpenMrs,
}

/// Descriptive metadata shared by a container and denormalized into each of
/// its versions at version-creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerFields {
    /// Short display name.
    pub name: String,
    /// Optional long name.
    pub full_name: Option<String>,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Default locale for names and descriptions, e.g. `"en"`.
    pub default_locale: String,
    /// Locales this container accepts content in.
    pub supported_locales: Vec<String>,
    /// Visibility inherited by owned concepts and mappings.
    pub public_access: AccessLevel,
    /// Extra rule set applied when attaching concepts and mappings.
    pub custom_validation_schema: Option<ValidationSchema>,
}

/// A source or collection: the root of a version chain.
///
/// Exactly one [`crate::ContainerVersion`] with the label `HEAD` exists for
/// every container, created atomically with it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Container {
    /// Internal identifier.
    pub id: ResourceId,
    /// Source or collection.
    pub kind: ContainerKind,
    /// Unique mnemonic within the owner's namespace.
    pub mnemonic: Mnemonic,
    /// Owning user or organization. Never null.
    pub owner_id: ResourceId,
    /// Mutable descriptive metadata.
    pub fields: ContainerFields,
    /// Audit stamp.
    pub audit: Audit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_capabilities() {
        assert_eq!(ContainerKind::Source.resource_type(), "Source");
        assert_eq!(ContainerKind::Collection.url_kwarg(), "collection");
    }

    #[test]
    fn test_default_access_is_view() {
        assert_eq!(AccessLevel::default(), AccessLevel::View);
    }
}
