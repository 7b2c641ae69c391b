//! Well-known identifiers used by the registry.
//!
//! This module provides constants for reserved version labels, the lookup
//! organization, and the names of its lookup sources. The lookup sources
//! hold the controlled vocabularies (concept classes, datatypes, map types,
//! locales, name and description types) as ordinary concepts.
//!
//! # Examples
//!
//! ```
//! use termreg_types::well_known;
//!
//! assert_eq!(well_known::HEAD, "HEAD");
//! assert!(well_known::RESERVED_VERSION_LABELS.contains(&well_known::INITIAL));
//! ```

// =============================================================================
// Reserved version labels
// =============================================================================

/// Label of the single mutable version every container carries.
pub const HEAD: &str = "HEAD";

/// Label reserved for the system-created first version.
pub const INITIAL: &str = "INITIAL";

/// Labels callers may not use when creating versions.
pub const RESERVED_VERSION_LABELS: [&str; 2] = [HEAD, INITIAL];

// =============================================================================
// Lookup organization and sources
// =============================================================================

/// Mnemonic of the organization that hosts the lookup vocabularies.
pub const LOOKUP_ORGANIZATION: &str = "OCL";

/// Source holding the allowed concept classes.
pub const CLASSES_SOURCE: &str = "Classes";

/// Source holding the allowed datatypes.
pub const DATATYPES_SOURCE: &str = "Datatypes";

/// Source holding the allowed map types.
pub const MAP_TYPES_SOURCE: &str = "MapTypes";

/// Source holding the allowed locales.
pub const LOCALES_SOURCE: &str = "Locales";

/// Source holding the allowed name types.
pub const NAME_TYPES_SOURCE: &str = "NameTypes";

/// Source holding the allowed description types.
pub const DESCRIPTION_TYPES_SOURCE: &str = "DescriptionTypes";
