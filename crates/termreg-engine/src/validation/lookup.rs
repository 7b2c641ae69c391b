//! Controlled lookup vocabularies.
//!
//! The allowed concept classes, datatypes, map types, locales, and name and
//! description types are not hard-coded: they live as ordinary concepts in
//! the lookup sources of the well-known `OCL` organization. Custom
//! validation resolves them from the store at validation time and fails
//! closed when they have not been imported.

use std::collections::BTreeSet;

use termreg_types::{well_known, ContainerKind, OwnerKind};

use crate::errors::{RegistryError, RegistryResult};
use crate::store::RegistryStore;
use crate::versioning::{create_container, get_head, NewContainer};

/// Collects the values of a lookup source as a set of strings.
///
/// A value is every name of every active concept in the source. Returns
/// [`RegistryError::LookupAttributesNotImported`] if the lookup organization
/// or the source is absent: custom validation must not silently pass when
/// its vocabulary is missing.
pub fn lookup_values(store: &RegistryStore, source_name: &str) -> RegistryResult<BTreeSet<String>> {
    let org = store
        .find_owner(well_known::LOOKUP_ORGANIZATION, OwnerKind::Organization)
        .ok_or(RegistryError::LookupAttributesNotImported)?;
    let source = store
        .find_container(org.id, ContainerKind::Source, source_name)
        .ok_or(RegistryError::LookupAttributesNotImported)?;

    let mut values = BTreeSet::new();
    for concept in store.concepts_in(source.id) {
        if !concept.audit.is_active || concept.retired {
            continue;
        }
        for name in &concept.names {
            values.insert(name.name.clone());
        }
    }
    Ok(values)
}

/// Installs the standard lookup vocabulary.
///
/// Creates the `OCL` organization with its lookup sources and fills each
/// with the default value set shipped with the registry. Intended for
/// bootstrap and tests; idempotent seeding is not needed because the
/// organization mnemonic conflict surfaces re-runs.
pub fn seed_lookup_vocabulary(store: &mut RegistryStore, actor: &str) -> RegistryResult<()> {
    let org = store.insert_owner(
        well_known::LOOKUP_ORGANIZATION,
        OwnerKind::Organization,
        "Open Concept Lab",
        actor,
    )?;

    let sources: [(&str, &[&str]); 6] = [
        (
            well_known::CLASSES_SOURCE,
            &[
                "Diagnosis", "Drug", "Test", "Procedure", "Symptom", "Finding", "Symptom-Finding",
                "Question", "Misc", "Anatomy", "Indicator",
            ],
        ),
        (
            well_known::DATATYPES_SOURCE,
            &[
                "None", "Numeric", "Coded", "Text", "Boolean", "Date", "Time", "Datetime",
                "Document", "Rule", "Complex", "Structured-Numeric",
            ],
        ),
        (
            well_known::MAP_TYPES_SOURCE,
            &[
                "SAME-AS", "NARROWER-THAN", "BROADER-THAN", "Q-AND-A", "CONCEPT-SET",
                "ASSOCIATED-WITH",
            ],
        ),
        (
            well_known::LOCALES_SOURCE,
            &["en", "es", "fr", "tr", "sw", "pt"],
        ),
        (
            well_known::NAME_TYPES_SOURCE,
            &["FULLY_SPECIFIED", "SHORT", "INDEX_TERM", "None"],
        ),
        (
            well_known::DESCRIPTION_TYPES_SOURCE,
            &["None", "FULLY_SPECIFIED", "Definition"],
        ),
    ];

    for (source_name, values) in sources {
        let source_id = create_container(
            store,
            NewContainer {
                kind: ContainerKind::Source,
                mnemonic: source_name.to_string(),
                owner_id: org,
                fields: lookup_source_fields(source_name),
            },
            actor,
        )?;
        let head_id = get_head(store, source_id)?.id;

        for (index, value) in values.iter().enumerate() {
            let concept_id = store.allocate_id();
            let version_id = store.allocate_id();
            let concept = termreg_types::Concept {
                id: concept_id,
                mnemonic: termreg_types::Mnemonic::new(format!("{}", index + 1))
                    .expect("numeric mnemonics are valid"),
                parent_id: source_id,
                concept_class: "Misc".to_string(),
                datatype: "None".to_string(),
                names: vec![termreg_types::ConceptName {
                    name: value.to_string(),
                    locale: "en".to_string(),
                    name_type: Some(termreg_types::ConceptName::FULLY_SPECIFIED.to_string()),
                    locale_preferred: true,
                }],
                descriptions: vec![],
                retired: false,
                public_access: termreg_types::AccessLevel::View,
                audit: termreg_types::Audit::new(actor, crate::store::now_epoch()),
            };
            store.insert_concept(concept.clone());
            store.insert_concept_version(termreg_types::ConceptVersion {
                id: version_id,
                versioned_object_id: concept_id,
                data: concept,
                is_latest_version: true,
                retired: false,
                audit: termreg_types::Audit::new(actor, crate::store::now_epoch()),
            });
            crate::versioning::add_concept_reference(store, head_id, version_id)?;
        }
    }

    tracing::info!("seeded lookup vocabulary");
    Ok(())
}

fn lookup_source_fields(name: &str) -> termreg_types::ContainerFields {
    termreg_types::ContainerFields {
        name: name.to_string(),
        full_name: Some(format!("{name} lookup")),
        description: None,
        default_locale: "en".to_string(),
        supported_locales: vec!["en".to_string()],
        public_access: termreg_types::AccessLevel::View,
        custom_validation_schema: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_values_fail_closed_when_missing() {
        let store = RegistryStore::new();
        let err = lookup_values(&store, well_known::CLASSES_SOURCE).unwrap_err();
        assert!(matches!(err, RegistryError::LookupAttributesNotImported));
    }

    #[test]
    fn test_seed_then_lookup() {
        let mut store = RegistryStore::new();
        seed_lookup_vocabulary(&mut store, "root").unwrap();

        let classes = lookup_values(&store, well_known::CLASSES_SOURCE).unwrap();
        assert!(classes.contains("Diagnosis"));
        assert!(!classes.contains("NotAClass"));

        let map_types = lookup_values(&store, well_known::MAP_TYPES_SOURCE).unwrap();
        assert!(map_types.contains("SAME-AS"));

        let locales = lookup_values(&store, well_known::LOCALES_SOURCE).unwrap();
        assert!(locales.contains("en"));
    }

    #[test]
    fn test_missing_source_fails_closed_even_with_org_present() {
        let mut store = RegistryStore::new();
        store
            .insert_owner(
                well_known::LOOKUP_ORGANIZATION,
                OwnerKind::Organization,
                "Open Concept Lab",
                "root",
            )
            .unwrap();
        let err = lookup_values(&store, well_known::DATATYPES_SOURCE).unwrap_err();
        assert!(matches!(err, RegistryError::LookupAttributesNotImported));
    }
}
