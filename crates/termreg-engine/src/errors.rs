//! Engine error types.
//!
//! Validation and conflict failures are data: they carry a field-keyed
//! message map so callers can render them without matching on exception
//! chains. Infrastructure failures wrap the underlying error.

use std::collections::BTreeMap;

use thiserror::Error;

use termreg_types::ResourceId;

/// Field-keyed validation messages.
///
/// Keys are entity field names (`names`, `map_type`, …) plus the
/// conventional `non_field_errors` key for errors that belong to no single
/// field. `BTreeMap` keeps error output deterministic.
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// Key used for errors not attributable to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Appends a message under a field key.
pub fn push_error(errors: &mut ErrorMap, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// Merges `other` into `errors`, preserving message order per field.
pub fn merge_errors(errors: &mut ErrorMap, other: ErrorMap) {
    for (field, messages) in other {
        errors.entry(field).or_default().extend(messages);
    }
}

/// Specific conflict kinds, distinguished from generic validation so callers
/// can retry with a different identifier where that makes sense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// A document with the same mnemonic already exists in the namespace.
    DuplicateMnemonic,
    /// A version with the same label already exists for the container.
    DuplicateVersionLabel,
    /// An active, non-retired mapping already connects the same concepts.
    DuplicateMapping,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DuplicateMnemonic => "duplicate mnemonic",
            Self::DuplicateVersionLabel => "duplicate version label",
            Self::DuplicateMapping => "duplicate mapping",
        };
        f.write_str(s)
    }
}

/// Errors produced by the registry engine.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A mandatory field was missing before any write was attempted.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// Entity-level validation failed. No writes were performed, or all
    /// partial writes were rolled back.
    #[error("validation failed: {0:?}")]
    Validation(ErrorMap),

    /// A uniqueness conflict.
    #[error("{kind}: {detail}")]
    Conflict {
        /// Which uniqueness rule was violated.
        kind: ConflictKind,
        /// Human-readable detail.
        detail: String,
    },

    /// A version label was empty or reserved.
    #[error("invalid version label '{label}'")]
    InvalidVersionLabel {
        /// The rejected label.
        label: String,
    },

    /// An operation tried to mutate a released version in place.
    #[error("version {version_id} is released and immutable")]
    ReleasedVersionImmutable {
        /// The released version.
        version_id: ResourceId,
    },

    /// No owner matched the given mnemonic and kind.
    #[error("owner not found: {mnemonic}")]
    OwnerNotFound {
        /// The mnemonic that failed to resolve.
        mnemonic: String,
    },

    /// A referenced document does not exist.
    #[error("{resource} not found: id {id}")]
    NotFound {
        /// Resource kind, e.g. `"concept"`.
        resource: &'static str,
        /// The id that failed to resolve.
        id: ResourceId,
    },

    /// The lookup vocabulary required by a custom schema is not present.
    /// Custom validation fails closed rather than silently passing.
    #[error("lookup attributes must be imported before custom validation can run")]
    LookupAttributesNotImported,

    /// Another holder owns the processing lease on a version.
    #[error("version {version_id} is being processed by {holder}")]
    VersionBusy {
        /// The leased version.
        version_id: ResourceId,
        /// Current lease holder.
        holder: String,
    },

    /// Archive or filesystem failure during export.
    #[error("archive I/O error: {0}")]
    Archive(#[from] std::io::Error),

    /// Serialization failure during export.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RegistryError {
    /// Returns the validation error map, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ErrorMap> {
        match self {
            Self::Validation(map) => Some(map),
            _ => None,
        }
    }

    /// Returns true if this is a conflict of the given kind.
    pub fn is_conflict(&self, expected: ConflictKind) -> bool {
        matches!(self, Self::Conflict { kind, .. } if *kind == expected)
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Human-readable validation messages.
pub mod messages {
    /// A concept must carry at least one name.
    pub const NAMES_CANNOT_BE_EMPTY: &str = "A concept must have at least one name";
    /// Descriptions, when present, must be non-blank.
    pub const DESCRIPTION_CANNOT_BE_EMPTY: &str = "Concept description cannot be empty";
    /// One fully specified name per locale.
    pub const ONE_FULLY_SPECIFIED_NAME_PER_LOCALE: &str =
        "A concept may not have more than one fully specified name in any locale";
    /// One short name per locale.
    pub const NO_MORE_THAN_ONE_SHORT_NAME_PER_LOCALE: &str =
        "A concept cannot have more than one short name in a locale";
    /// Non-short names unique per concept and locale.
    pub const NAMES_EXCEPT_SHORT_MUST_BE_UNIQUE: &str =
        "All names except short names must be unique for a concept and locale";
    /// Fully specified name unique across the owning source and locale.
    pub const FULLY_SPECIFIED_NAME_UNIQUE_PER_SOURCE_LOCALE: &str =
        "Concept fully specified name must be unique for same source and locale";
    /// Exactly one locale-preferred name per locale.
    pub const ONE_PREFERRED_NAME_PER_LOCALE: &str =
        "A concept may not have more than one preferred name (per locale)";
    /// Each locale with names needs a preferred one.
    pub const PREFERRED_NAME_REQUIRED_PER_LOCALE: &str =
        "A concept must have exactly one preferred name per locale";
    /// Short names cannot be preferred.
    pub const SHORT_NAME_CANNOT_BE_PREFERRED: &str =
        "A short name cannot be marked as locale preferred";
    /// At least one fully specified name overall.
    pub const AT_LEAST_ONE_FULLY_SPECIFIED_NAME: &str =
        "A concept must have at least one fully specified name";
    /// Name locale must come from the locale lookup.
    pub const INVALID_NAME_LOCALE: &str = "Invalid name locale";
    /// Description locale must come from the locale lookup.
    pub const INVALID_DESCRIPTION_LOCALE: &str = "Invalid description locale";
    /// Name type must come from the name-type lookup.
    pub const INVALID_NAME_TYPE: &str = "Invalid name type";
    /// Description type must come from the description-type lookup.
    pub const INVALID_DESCRIPTION_TYPE: &str = "Invalid description type";
    /// Concept class must come from the class lookup.
    pub const INVALID_CONCEPT_CLASS: &str = "Invalid concept class";
    /// Datatype must come from the datatype lookup.
    pub const INVALID_DATATYPE: &str = "Invalid datatype";
    /// Map type must come from the map-type lookup.
    pub const INVALID_MAP_TYPE: &str = "Invalid map type";
    /// Only one active mapping between two concepts per map type.
    pub const SINGLE_MAPPING_BETWEEN_TWO_CONCEPTS: &str =
        "There can be only one mapping between two concepts";
    /// A mapping may not point at its own from-concept.
    pub const MAPPING_CANNOT_SELF_REFERENCE: &str = "Mapping cannot map a concept to itself";
    /// Exactly one of internal and external target.
    pub const MAPPING_TARGET_AMBIGUOUS: &str =
        "Either an internal to-concept or an external (to_source, to_concept_code) pair must be given, not both";
    /// A target must be supplied.
    pub const MAPPING_TARGET_MISSING: &str =
        "A to-concept or an external (to_source, to_concept_code) pair is required";
    /// From-concept is mandatory.
    pub const MAPPING_FROM_CONCEPT_REQUIRED: &str = "A from-concept is required";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_merge() {
        let mut errors = ErrorMap::new();
        push_error(&mut errors, "names", "first");
        push_error(&mut errors, "names", "second");

        let mut other = ErrorMap::new();
        push_error(&mut other, "names", "third");
        push_error(&mut other, NON_FIELD_ERRORS, "global");

        merge_errors(&mut errors, other);
        assert_eq!(errors["names"], vec!["first", "second", "third"]);
        assert_eq!(errors[NON_FIELD_ERRORS], vec!["global"]);
    }

    #[test]
    fn test_conflict_matching() {
        let err = RegistryError::Conflict {
            kind: ConflictKind::DuplicateMapping,
            detail: "A -> B".to_string(),
        };
        assert!(err.is_conflict(ConflictKind::DuplicateMapping));
        assert!(!err.is_conflict(ConflictKind::DuplicateMnemonic));
    }

    #[test]
    fn test_validation_errors_accessor() {
        let mut map = ErrorMap::new();
        push_error(&mut map, "names", messages::NAMES_CANNOT_BE_EMPTY);
        let err = RegistryError::Validation(map.clone());
        assert_eq!(err.validation_errors(), Some(&map));

        let other = RegistryError::MissingField { field: "parent" };
        assert!(other.validation_errors().is_none());
    }
}
