//! Resource identifier type.
//!
//! This module provides a type alias for internal resource identifiers.
//! Every stored document (owner, container, version, concept, mapping)
//! is keyed by a `ResourceId` allocated by the store.

/// An internal resource identifier.
///
/// Resource ids are 64-bit unsigned integers allocated sequentially by the
/// registry store. They are never reused, even after a document is removed.
///
/// # Examples
///
/// ```
/// use termreg_types::ResourceId;
///
/// let concept_id: ResourceId = 42;
/// let version_id: ResourceId = 43;
/// ```
pub type ResourceId = u64;
