//! # termreg-types
//!
//! Type definitions for the termreg terminology registry.
//!
//! This crate provides the data model for the versioned concept dictionary:
//! owners, containers (sources and collections), immutable container
//! versions, concepts, mappings, and their version snapshots.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via
//!   serde. Disable this feature for zero-dependency usage.
//!
//! ## Usage
//!
//! ```rust
//! use termreg_types::{Audit, Mnemonic, Owner, OwnerKind};
//! use termreg_types::well_known;
//!
//! let owner = Owner {
//!     id: 1,
//!     mnemonic: Mnemonic::new(well_known::LOOKUP_ORGANIZATION).unwrap(),
//!     kind: OwnerKind::Organization,
//!     name: "Open Concept Lab".to_string(),
//!     audit: Audit::new("root", 1_700_000_000),
//! };
//!
//! assert_eq!(owner.mnemonic.as_str(), "OCL");
//! ```
//!
//! ## Without Serde
//!
//! To use this crate without serde (zero dependencies):
//!
//! ```toml
//! [dependencies]
//! termreg-types = { version = "0.1", default-features = false }
//! ```

#![warn(missing_docs)]

mod audit;
mod concept;
mod container;
mod id;
mod mapping;
mod mnemonic;
mod owner;
mod version;
pub mod well_known;

// Re-export all public types at crate root
pub use audit::Audit;
pub use concept::{Concept, ConceptDescription, ConceptDraft, ConceptName, ConceptVersion};
pub use container::{AccessLevel, Container, ContainerFields, ContainerKind, ValidationSchema};
pub use id::ResourceId;
pub use mapping::{Mapping, MappingDraft, MappingTarget, MappingVersion};
pub use mnemonic::{Mnemonic, MnemonicError};
pub use owner::{Owner, OwnerKind};
pub use version::{ContainerVersion, ProcessingLease};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_exported() {
        // Verify all types are accessible from crate root
        let _id: ResourceId = 1;
        let _kind = OwnerKind::Organization;
        let _container_kind = ContainerKind::Source;
        let _access = AccessLevel::View;
        let _schema = ValidationSchema::OpenMrs;
    }

    #[test]
    fn test_well_known_accessible() {
        assert_eq!(well_known::HEAD, "HEAD");
        assert_eq!(well_known::LOOKUP_ORGANIZATION, "OCL");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let name = ConceptName {
            name: "Fever".to_string(),
            locale: "en".to_string(),
            name_type: Some(ConceptName::FULLY_SPECIFIED.to_string()),
            locale_preferred: true,
        };

        let json = serde_json::to_string(&name).unwrap();
        let parsed: ConceptName = serde_json::from_str(&json).unwrap();
        assert_eq!(name, parsed);
    }
}
