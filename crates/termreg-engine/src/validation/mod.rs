//! Validation pipeline.
//!
//! Validators form an ordered chain selected from the owning container's
//! custom-validation schema. Concept validation runs the whole chain and
//! merges the error maps; mapping validation runs structural draft checks
//! first and consults the schema validators only when the structure is
//! clean.
//!
//! The operational bypass for custom validation is an explicit
//! [`ValidationOptions`] field supplied at chain construction, not an
//! ambient environment read.

mod basic;
pub mod lookup;
mod openmrs;

pub use basic::BasicValidator;
pub use openmrs::{check_duplicate_mapping, OpenMrsValidator};

use termreg_types::{Concept, Mapping, MappingDraft, ValidationSchema};

use crate::errors::{merge_errors, messages, push_error, ErrorMap, RegistryResult};
use crate::store::RegistryStore;

/// The entity being validated.
#[derive(Debug)]
pub enum ValidationTarget<'a> {
    /// A concept about to be committed.
    Concept(&'a Concept),
    /// A mapping about to be committed.
    Mapping(&'a Mapping),
}

/// A single validation strategy.
pub trait Validator {
    /// Validates the target against this strategy's rules.
    ///
    /// `Ok` carries the (possibly empty) field-keyed error map; `Err` is
    /// reserved for integrity failures such as a missing lookup vocabulary.
    fn validate(&self, store: &RegistryStore, target: &ValidationTarget<'_>) -> RegistryResult<ErrorMap>;
}

/// Configuration injected into the chain at construction time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    /// Disables all custom (schema) validation. Operational escape hatch;
    /// basic structural validation still runs.
    pub bypass_custom: bool,
}

/// An ordered chain of validators for one container.
pub struct ValidatorChain {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidatorChain {
    /// Builds the chain for a container schema.
    ///
    /// The basic validator always leads; the schema validator follows unless
    /// custom validation is bypassed.
    pub fn for_schema(schema: Option<ValidationSchema>, options: ValidationOptions) -> Self {
        let mut validators: Vec<Box<dyn Validator>> = vec![Box::new(BasicValidator)];
        if !options.bypass_custom {
            if let Some(ValidationSchema::OpenMrs) = schema {
                validators.push(Box::new(OpenMrsValidator));
            }
        }
        Self { validators }
    }

    /// Validates a concept: every validator runs, error maps are merged.
    pub fn validate_concept(
        &self,
        store: &RegistryStore,
        concept: &Concept,
    ) -> RegistryResult<ErrorMap> {
        let target = ValidationTarget::Concept(concept);
        let mut errors = ErrorMap::new();
        for validator in &self.validators {
            merge_errors(&mut errors, validator.validate(store, &target)?);
        }
        Ok(errors)
    }

    /// Validates a resolved mapping with the schema validators.
    ///
    /// Callers run [`validate_mapping_draft`] first; schema checks are only
    /// meaningful once the structure is clean.
    pub fn validate_mapping(
        &self,
        store: &RegistryStore,
        mapping: &Mapping,
    ) -> RegistryResult<ErrorMap> {
        let target = ValidationTarget::Mapping(mapping);
        let mut errors = ErrorMap::new();
        for validator in &self.validators {
            merge_errors(&mut errors, validator.validate(store, &target)?);
        }
        Ok(errors)
    }
}

/// Structural checks on a mapping draft, before reference resolution.
///
/// Enforces: a from-concept is required, exactly one of the internal and
/// external target forms is supplied, and a mapping never points back at its
/// own from-concept.
pub fn validate_mapping_draft(draft: &MappingDraft) -> ErrorMap {
    let mut errors = ErrorMap::new();

    if draft.from_concept_id.is_none() {
        push_error(&mut errors, "from_concept", messages::MAPPING_FROM_CONCEPT_REQUIRED);
    }

    let has_internal = draft.to_concept_id.is_some();
    let has_external = draft.to_source.is_some() || draft.to_concept_code.is_some();
    match (has_internal, has_external) {
        (true, true) => {
            push_error(&mut errors, "to_concept", messages::MAPPING_TARGET_AMBIGUOUS);
        }
        (false, false) => {
            push_error(&mut errors, "to_concept", messages::MAPPING_TARGET_MISSING);
        }
        (false, true) => {
            // External form needs both halves of the pair.
            if draft.to_source.is_none() || draft.to_concept_code.is_none() {
                push_error(&mut errors, "to_concept", messages::MAPPING_TARGET_MISSING);
            }
        }
        (true, false) => {}
    }

    if let (Some(from), Some(to)) = (draft.from_concept_id, draft.to_concept_id) {
        if from == to {
            push_error(&mut errors, "to_concept", messages::MAPPING_CANNOT_SELF_REFERENCE);
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(
        from: Option<u64>,
        to: Option<u64>,
        to_source: Option<&str>,
        to_code: Option<&str>,
    ) -> MappingDraft {
        MappingDraft {
            mnemonic: "M1".to_string(),
            parent_id: Some(1),
            created_by: Some("tester".to_string()),
            map_type: "SAME-AS".to_string(),
            from_concept_id: from,
            to_concept_id: to,
            to_source: to_source.map(str::to_string),
            to_concept_code: to_code.map(str::to_string),
        }
    }

    #[test]
    fn test_internal_target_ok() {
        assert!(validate_mapping_draft(&draft(Some(1), Some(2), None, None)).is_empty());
    }

    #[test]
    fn test_external_target_ok() {
        assert!(validate_mapping_draft(&draft(Some(1), None, Some("ICD-10"), Some("B54"))).is_empty());
    }

    #[test]
    fn test_both_targets_rejected() {
        let errors = validate_mapping_draft(&draft(Some(1), Some(2), Some("ICD-10"), Some("B54")));
        assert!(errors["to_concept"].contains(&messages::MAPPING_TARGET_AMBIGUOUS.to_string()));
    }

    #[test]
    fn test_no_target_rejected() {
        let errors = validate_mapping_draft(&draft(Some(1), None, None, None));
        assert!(errors["to_concept"].contains(&messages::MAPPING_TARGET_MISSING.to_string()));
    }

    #[test]
    fn test_half_external_pair_rejected() {
        let errors = validate_mapping_draft(&draft(Some(1), None, Some("ICD-10"), None));
        assert!(errors["to_concept"].contains(&messages::MAPPING_TARGET_MISSING.to_string()));
    }

    #[test]
    fn test_self_reference_rejected() {
        let errors = validate_mapping_draft(&draft(Some(7), Some(7), None, None));
        assert!(errors["to_concept"].contains(&messages::MAPPING_CANNOT_SELF_REFERENCE.to_string()));
    }

    #[test]
    fn test_missing_from_concept() {
        let errors = validate_mapping_draft(&draft(None, Some(2), None, None));
        assert!(errors["from_concept"]
            .contains(&messages::MAPPING_FROM_CONCEPT_REQUIRED.to_string()));
    }

    #[test]
    fn test_bypass_skips_schema_validator() {
        let chain = ValidatorChain::for_schema(
            Some(ValidationSchema::OpenMrs),
            ValidationOptions { bypass_custom: true },
        );
        assert_eq!(chain.validators.len(), 1);

        let chain = ValidatorChain::for_schema(Some(ValidationSchema::OpenMrs), Default::default());
        assert_eq!(chain.validators.len(), 2);

        let chain = ValidatorChain::for_schema(None, Default::default());
        assert_eq!(chain.validators.len(), 1);
    }
}
