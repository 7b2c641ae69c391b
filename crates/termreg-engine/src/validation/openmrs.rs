//! OpenMRS dictionary validation rules.
//!
//! Applied on top of basic validation when the owning container declares the
//! OpenMRS schema. Name-shape rules operate on the concept alone;
//! uniqueness rules re-read the store, and attribute rules resolve the
//! controlled lookup vocabularies (failing closed when those are missing).

use std::collections::{BTreeMap, BTreeSet};

use termreg_types::{well_known, Concept, ConceptName, Mapping};

use crate::errors::{messages, push_error, ConflictKind, ErrorMap, RegistryError, RegistryResult};
use crate::store::RegistryStore;

use super::lookup::lookup_values;
use super::{ValidationTarget, Validator};

/// Validator implementing the OpenMRS rule set.
#[derive(Debug, Default)]
pub struct OpenMrsValidator;

impl Validator for OpenMrsValidator {
    fn validate(&self, store: &RegistryStore, target: &ValidationTarget<'_>) -> RegistryResult<ErrorMap> {
        match target {
            ValidationTarget::Concept(concept) => validate_concept(store, concept),
            ValidationTarget::Mapping(mapping) => validate_mapping(store, mapping),
        }
    }
}

fn validate_concept(store: &RegistryStore, concept: &Concept) -> RegistryResult<ErrorMap> {
    let mut errors = ErrorMap::new();

    name_shape_rules(concept, &mut errors);
    source_uniqueness_rule(store, concept, &mut errors);
    attribute_rules(store, concept, &mut errors)?;

    Ok(errors)
}

/// Per-concept name rules: counts and uniqueness within each locale.
fn name_shape_rules(concept: &Concept, errors: &mut ErrorMap) {
    let mut by_locale: BTreeMap<&str, Vec<&ConceptName>> = BTreeMap::new();
    for name in &concept.names {
        by_locale.entry(name.locale.as_str()).or_default().push(name);
    }

    for (_locale, names) in &by_locale {
        let fully_specified = names.iter().filter(|n| n.is_fully_specified()).count();
        if fully_specified > 1 {
            push_error(errors, "names", messages::ONE_FULLY_SPECIFIED_NAME_PER_LOCALE);
        }

        let short = names.iter().filter(|n| n.is_short()).count();
        if short > 1 {
            push_error(errors, "names", messages::NO_MORE_THAN_ONE_SHORT_NAME_PER_LOCALE);
        }

        // Non-short names must not repeat within the locale.
        let mut seen = BTreeSet::new();
        if names
            .iter()
            .filter(|n| !n.is_short())
            .any(|n| !seen.insert(n.name.as_str()))
        {
            push_error(errors, "names", messages::NAMES_EXCEPT_SHORT_MUST_BE_UNIQUE);
        }

        let preferred = names.iter().filter(|n| n.locale_preferred).count();
        if preferred > 1 {
            push_error(errors, "names", messages::ONE_PREFERRED_NAME_PER_LOCALE);
        } else if preferred == 0 {
            push_error(errors, "names", messages::PREFERRED_NAME_REQUIRED_PER_LOCALE);
        }

        if names.iter().any(|n| n.is_short() && n.locale_preferred) {
            push_error(errors, "names", messages::SHORT_NAME_CANNOT_BE_PREFERRED);
        }
    }

    if !concept.names.is_empty() && concept.fully_specified_name().is_none() {
        push_error(errors, "names", messages::AT_LEAST_ONE_FULLY_SPECIFIED_NAME);
    }
}

/// Fully specified names must be unique across the owning source and locale,
/// considering only other active, non-retired concepts.
fn source_uniqueness_rule(store: &RegistryStore, concept: &Concept, errors: &mut ErrorMap) {
    let own: Vec<_> = concept
        .names
        .iter()
        .filter(|n| n.is_fully_specified())
        .collect();
    if own.is_empty() {
        return;
    }

    for other in store.concepts_in(concept.parent_id) {
        if other.id == concept.id || !other.audit.is_active || other.retired {
            continue;
        }
        let clash = other.names.iter().any(|theirs| {
            theirs.is_fully_specified()
                && own
                    .iter()
                    .any(|ours| ours.locale == theirs.locale && ours.name == theirs.name)
        });
        if clash {
            push_error(
                errors,
                "names",
                messages::FULLY_SPECIFIED_NAME_UNIQUE_PER_SOURCE_LOCALE,
            );
            return;
        }
    }
}

/// Locales, name/description types, class, and datatype must be members of
/// the controlled lookups.
fn attribute_rules(
    store: &RegistryStore,
    concept: &Concept,
    errors: &mut ErrorMap,
) -> RegistryResult<()> {
    let locales = lookup_values(store, well_known::LOCALES_SOURCE)?;
    let name_types = lookup_values(store, well_known::NAME_TYPES_SOURCE)?;
    let description_types = lookup_values(store, well_known::DESCRIPTION_TYPES_SOURCE)?;
    let classes = lookup_values(store, well_known::CLASSES_SOURCE)?;
    let datatypes = lookup_values(store, well_known::DATATYPES_SOURCE)?;

    if concept.names.iter().any(|n| !locales.contains(&n.locale)) {
        push_error(errors, "names", messages::INVALID_NAME_LOCALE);
    }
    if concept
        .names
        .iter()
        .any(|n| n.name_type.as_ref().is_some_and(|t| !name_types.contains(t)))
    {
        push_error(errors, "names", messages::INVALID_NAME_TYPE);
    }
    if concept
        .descriptions
        .iter()
        .any(|d| !locales.contains(&d.locale))
    {
        push_error(errors, "descriptions", messages::INVALID_DESCRIPTION_LOCALE);
    }
    if concept.descriptions.iter().any(|d| {
        d.description_type
            .as_ref()
            .is_some_and(|t| !description_types.contains(t))
    }) {
        push_error(errors, "descriptions", messages::INVALID_DESCRIPTION_TYPE);
    }
    if !classes.contains(&concept.concept_class) {
        push_error(errors, "concept_class", messages::INVALID_CONCEPT_CLASS);
    }
    if !datatypes.contains(&concept.datatype) {
        push_error(errors, "datatype", messages::INVALID_DATATYPE);
    }
    Ok(())
}

fn validate_mapping(store: &RegistryStore, mapping: &Mapping) -> RegistryResult<ErrorMap> {
    let mut errors = ErrorMap::new();
    let map_types = lookup_values(store, well_known::MAP_TYPES_SOURCE)?;
    if !map_types.contains(&mapping.map_type) {
        push_error(&mut errors, "map_type", messages::INVALID_MAP_TYPE);
    }
    Ok(errors)
}

/// Commit-time duplicate check: at most one active, non-retired mapping may
/// connect the same (container, from, to) pair, whatever the map type.
///
/// Re-reads the store rather than trusting earlier validation, narrowing the
/// window between check and insert.
pub fn check_duplicate_mapping(store: &RegistryStore, mapping: &Mapping) -> RegistryResult<()> {
    let duplicate = store.mappings_in(mapping.parent_id).into_iter().any(|other| {
        other.id != mapping.id
            && other.audit.is_active
            && !other.retired
            && other.from_concept_id == mapping.from_concept_id
            && other.target == mapping.target
    });

    if duplicate {
        return Err(RegistryError::Conflict {
            kind: ConflictKind::DuplicateMapping,
            detail: messages::SINGLE_MAPPING_BETWEEN_TWO_CONCEPTS.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::lookup::seed_lookup_vocabulary;
    use termreg_types::{AccessLevel, Audit, Mnemonic};

    fn seeded_store() -> RegistryStore {
        let mut store = RegistryStore::new();
        seed_lookup_vocabulary(&mut store, "root").unwrap();
        store
    }

    fn name(text: &str, locale: &str, name_type: Option<&str>, preferred: bool) -> ConceptName {
        ConceptName {
            name: text.to_string(),
            locale: locale.to_string(),
            name_type: name_type.map(str::to_string),
            locale_preferred: preferred,
        }
    }

    fn concept(id: u64, names: Vec<ConceptName>) -> Concept {
        Concept {
            id,
            mnemonic: Mnemonic::new(format!("C{id}")).unwrap(),
            parent_id: 9999,
            concept_class: "Diagnosis".to_string(),
            datatype: "None".to_string(),
            names,
            descriptions: vec![],
            retired: false,
            public_access: AccessLevel::View,
            audit: Audit::new("tester", 0),
        }
    }

    fn errors_for(store: &RegistryStore, c: &Concept) -> ErrorMap {
        OpenMrsValidator
            .validate(store, &ValidationTarget::Concept(c))
            .unwrap()
    }

    #[test]
    fn test_valid_concept_passes() {
        let store = seeded_store();
        let c = concept(
            1,
            vec![
                name("Malaria", "en", Some("FULLY_SPECIFIED"), true),
                name("Mal", "en", Some("SHORT"), false),
            ],
        );
        assert!(errors_for(&store, &c).is_empty());
    }

    #[test]
    fn test_two_fully_specified_in_one_locale() {
        let store = seeded_store();
        let c = concept(
            1,
            vec![
                name("Malaria", "en", Some("FULLY_SPECIFIED"), true),
                name("Paludism", "en", Some("FULLY_SPECIFIED"), false),
            ],
        );
        assert!(errors_for(&store, &c)["names"]
            .contains(&messages::ONE_FULLY_SPECIFIED_NAME_PER_LOCALE.to_string()));
    }

    #[test]
    fn test_two_short_names_in_one_locale() {
        let store = seeded_store();
        let c = concept(
            1,
            vec![
                name("Malaria", "en", Some("FULLY_SPECIFIED"), true),
                name("Mal", "en", Some("SHORT"), false),
                name("Mala", "en", Some("SHORT"), false),
            ],
        );
        assert!(errors_for(&store, &c)["names"]
            .contains(&messages::NO_MORE_THAN_ONE_SHORT_NAME_PER_LOCALE.to_string()));
    }

    #[test]
    fn test_duplicate_non_short_names() {
        let store = seeded_store();
        let c = concept(
            1,
            vec![
                name("Malaria", "en", Some("FULLY_SPECIFIED"), true),
                name("Malaria", "en", None, false),
            ],
        );
        assert!(errors_for(&store, &c)["names"]
            .contains(&messages::NAMES_EXCEPT_SHORT_MUST_BE_UNIQUE.to_string()));
    }

    #[test]
    fn test_short_name_may_repeat_other_names() {
        let store = seeded_store();
        let c = concept(
            1,
            vec![
                name("Malaria", "en", Some("FULLY_SPECIFIED"), true),
                name("Malaria", "en", Some("SHORT"), false),
            ],
        );
        let errors = errors_for(&store, &c);
        assert!(errors.is_empty(), "short duplicate should pass: {errors:?}");
    }

    #[test]
    fn test_preferred_name_rules() {
        let store = seeded_store();

        let two_preferred = concept(
            1,
            vec![
                name("Malaria", "en", Some("FULLY_SPECIFIED"), true),
                name("Paludism", "en", None, true),
            ],
        );
        assert!(errors_for(&store, &two_preferred)["names"]
            .contains(&messages::ONE_PREFERRED_NAME_PER_LOCALE.to_string()));

        let none_preferred = concept(
            2,
            vec![name("Malaria", "en", Some("FULLY_SPECIFIED"), false)],
        );
        assert!(errors_for(&store, &none_preferred)["names"]
            .contains(&messages::PREFERRED_NAME_REQUIRED_PER_LOCALE.to_string()));

        let short_preferred = concept(
            3,
            vec![
                name("Malaria", "en", Some("FULLY_SPECIFIED"), false),
                name("Mal", "en", Some("SHORT"), true),
            ],
        );
        assert!(errors_for(&store, &short_preferred)["names"]
            .contains(&messages::SHORT_NAME_CANNOT_BE_PREFERRED.to_string()));
    }

    #[test]
    fn test_fully_specified_required() {
        let store = seeded_store();
        let c = concept(1, vec![name("Malaria", "en", None, true)]);
        assert!(errors_for(&store, &c)["names"]
            .contains(&messages::AT_LEAST_ONE_FULLY_SPECIFIED_NAME.to_string()));
    }

    #[test]
    fn test_attribute_lookups() {
        let store = seeded_store();

        let mut c = concept(1, vec![name("Malaria", "xx", Some("FULLY_SPECIFIED"), true)]);
        c.concept_class = "NotAClass".to_string();
        c.datatype = "NotAType".to_string();

        let errors = errors_for(&store, &c);
        assert!(errors["names"].contains(&messages::INVALID_NAME_LOCALE.to_string()));
        assert!(errors["concept_class"].contains(&messages::INVALID_CONCEPT_CLASS.to_string()));
        assert!(errors["datatype"].contains(&messages::INVALID_DATATYPE.to_string()));
    }

    #[test]
    fn test_missing_lookup_fails_closed() {
        let store = RegistryStore::new();
        let c = concept(1, vec![name("Malaria", "en", Some("FULLY_SPECIFIED"), true)]);
        let err = OpenMrsValidator
            .validate(&store, &ValidationTarget::Concept(&c))
            .unwrap_err();
        assert!(matches!(err, RegistryError::LookupAttributesNotImported));
    }

    #[test]
    fn test_source_wide_fully_specified_uniqueness() {
        let mut store = seeded_store();
        let existing = concept(
            501,
            vec![name("Non Unique", "en", Some("FULLY_SPECIFIED"), true)],
        );
        store.insert_concept(existing);

        let incoming = concept(
            502,
            vec![name("Non Unique", "en", Some("FULLY_SPECIFIED"), true)],
        );
        assert!(errors_for(&store, &incoming)["names"]
            .contains(&messages::FULLY_SPECIFIED_NAME_UNIQUE_PER_SOURCE_LOCALE.to_string()));

        // Same name in a different locale is fine
        let other_locale = concept(
            503,
            vec![name("Non Unique", "fr", Some("FULLY_SPECIFIED"), true)],
        );
        let errors = errors_for(&store, &other_locale);
        assert!(!errors
            .get("names")
            .is_some_and(|msgs| msgs
                .contains(&messages::FULLY_SPECIFIED_NAME_UNIQUE_PER_SOURCE_LOCALE.to_string())));
    }

    #[test]
    fn test_retired_concepts_ignored_for_uniqueness() {
        let mut store = seeded_store();
        let mut existing = concept(
            501,
            vec![name("Non Unique", "en", Some("FULLY_SPECIFIED"), true)],
        );
        existing.retired = true;
        store.insert_concept(existing);

        let incoming = concept(
            502,
            vec![name("Non Unique", "en", Some("FULLY_SPECIFIED"), true)],
        );
        assert!(errors_for(&store, &incoming).is_empty());
    }
}
