//! Basic structural validation, applied to every concept regardless of the
//! owning container's schema.

use crate::errors::{messages, push_error, ErrorMap, RegistryResult};
use crate::store::RegistryStore;

use super::{ValidationTarget, Validator};

/// The always-on validator: concepts need at least one name, and any
/// description present must be non-blank.
#[derive(Debug, Default)]
pub struct BasicValidator;

impl Validator for BasicValidator {
    fn validate(&self, _store: &RegistryStore, target: &ValidationTarget<'_>) -> RegistryResult<ErrorMap> {
        let mut errors = ErrorMap::new();
        match target {
            ValidationTarget::Concept(concept) => {
                if concept.names.is_empty() {
                    push_error(&mut errors, "names", messages::NAMES_CANNOT_BE_EMPTY);
                }
                if concept
                    .descriptions
                    .iter()
                    .any(|d| d.description.trim().is_empty())
                {
                    push_error(&mut errors, "descriptions", messages::DESCRIPTION_CANNOT_BE_EMPTY);
                }
            }
            // Structural mapping checks run on the draft, before the target
            // reference is resolved; nothing to do here.
            ValidationTarget::Mapping(_) => {}
        }
        Ok(errors)
    }
}
