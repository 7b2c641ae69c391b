//! Owner entities: user profiles and organizations.
//!
//! Every container belongs to exactly one owner, which is either a user
//! profile or an organization. The two kinds share a capability set and are
//! modeled as one entity with a kind tag rather than as parallel types.

use crate::{Audit, Mnemonic, ResourceId};

/// The kind of entity that owns a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OwnerKind {
    /// A user profile.
    User,
    /// An organization.
    Organization,
}

impl OwnerKind {
    /// Resource-type label used in index documents and archive paths.
    pub fn resource_type(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Organization => "Organization",
        }
    }

    /// URL keyword-argument name the outer API layer routes this kind under.
    pub fn url_kwarg(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organization => "org",
        }
    }
}

/// An owner of containers: a user profile or an organization.
///
/// # Examples
///
/// ```
/// use termreg_types::{Audit, Mnemonic, Owner, OwnerKind};
///
/// let owner = Owner {
///     id: 1,
///     mnemonic: Mnemonic::new("OCL").unwrap(),
///     kind: OwnerKind::Organization,
///     name: "Open Concept Lab".to_string(),
///     audit: Audit::new("admin", 1_700_000_000),
/// };
///
/// assert_eq!(owner.kind.resource_type(), "Organization");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Owner {
    /// Internal identifier.
    pub id: ResourceId,
    /// Unique mnemonic within the owner kind's namespace.
    pub mnemonic: Mnemonic,
    /// User or organization.
    pub kind: OwnerKind,
    /// Display name.
    pub name: String,
    /// Audit stamp.
    pub audit: Audit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_capabilities() {
        assert_eq!(OwnerKind::User.resource_type(), "User");
        assert_eq!(OwnerKind::User.url_kwarg(), "user");
        assert_eq!(OwnerKind::Organization.url_kwarg(), "org");
    }
}
