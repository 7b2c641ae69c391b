//! Audit stamp shared by all stored entities.

/// Creation/update bookkeeping carried by every registry document.
///
/// Timestamps are Unix epoch seconds; actors are the mnemonic of the user
/// who performed the write. `updated_at` is bumped on every mutation and is
/// monotonic for a given document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Audit {
    /// When the document was created (epoch seconds).
    pub created_at: i64,
    /// When the document was last mutated (epoch seconds).
    pub updated_at: i64,
    /// Actor who created the document.
    pub created_by: String,
    /// Actor who last mutated the document.
    pub updated_by: String,
    /// Soft-delete flag. Deactivated documents are excluded from exports
    /// and from duplicate checks.
    pub is_active: bool,
}

impl Audit {
    /// Creates a fresh stamp for a new document.
    pub fn new(actor: impl Into<String>, now: i64) -> Self {
        let actor = actor.into();
        Self {
            created_at: now,
            updated_at: now,
            created_by: actor.clone(),
            updated_by: actor,
            is_active: true,
        }
    }

    /// Records a mutation by `actor` at `now`.
    ///
    /// `updated_at` never moves backwards, even if the supplied clock does.
    pub fn touch(&mut self, actor: impl Into<String>, now: i64) {
        self.updated_by = actor.into();
        self.updated_at = self.updated_at.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stamp() {
        let audit = Audit::new("admin", 1_700_000_000);
        assert_eq!(audit.created_at, 1_700_000_000);
        assert_eq!(audit.updated_at, 1_700_000_000);
        assert_eq!(audit.created_by, "admin");
        assert!(audit.is_active);
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut audit = Audit::new("admin", 100);
        audit.touch("editor", 50); // clock went backwards
        assert_eq!(audit.updated_at, 100);
        assert_eq!(audit.updated_by, "editor");

        audit.touch("editor", 200);
        assert_eq!(audit.updated_at, 200);
        assert_eq!(audit.created_by, "admin");
    }
}
