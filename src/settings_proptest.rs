//! Property-based tests for settings resolution.
//!
//! These tests use proptest to generate random layer contents and candidate
//! sets and verify that the merge and partition invariants hold for all of
//! them.

#[cfg(test)]
mod proptest_tests {
    use crate::settings::{FileConfig, Settings};
    use crate::templates::{TemplateSet, TemplateSource};
    use proptest::prelude::*;
    use serde_yaml::{Mapping, Value};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn layer_strategy() -> impl Strategy<Value = BTreeMap<String, i64>> {
        prop::collection::btree_map("[a-e]", any::<i64>(), 0..5)
    }

    fn to_mapping(layer: &BTreeMap<String, i64>) -> Mapping {
        layer
            .iter()
            .map(|(k, v)| (Value::from(k.clone()), Value::from(*v)))
            .collect()
    }

    fn file_name_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-c]{1,3}", 1..3).prop_map(|parts| parts.join("/"))
    }

    fn file_entry_strategy() -> impl Strategy<Value = (String, Option<bool>, Option<bool>)> {
        (
            file_name_strategy(),
            prop::option::of(any::<bool>()),
            prop::option::of(any::<bool>()),
        )
    }

    fn build_document(entries: &[(String, Option<bool>, Option<bool>)]) -> Mapping {
        let mut document = Mapping::new();
        for (name, delete, unmanaged) in entries {
            let mut section = Mapping::new();
            if let Some(delete) = delete {
                section.insert(Value::from("delete"), Value::from(*delete));
            }
            if let Some(unmanaged) = unmanaged {
                section.insert(Value::from("unmanaged"), Value::from(*unmanaged));
            }
            document.insert(Value::from(name.clone()), Value::Mapping(section));
        }
        document
    }

    proptest! {
        /// Property: every key resolves to the value of the most specific
        /// layer that sets it
        #[test]
        fn merge_is_left_biased_per_layer(layers in prop::collection::vec(layer_strategy(), 4)) {
            let mappings: Vec<Mapping> = layers.iter().map(to_mapping).collect();
            let merged = FileConfig::merge_layers(mappings.iter());

            for key in ["a", "b", "c", "d", "e"] {
                let expected = layers
                    .iter()
                    .rev()
                    .find_map(|layer| layer.get(key))
                    .map(|v| Value::from(*v));
                prop_assert_eq!(merged.get(key).cloned(), expected);
            }
        }

        /// Property: merging is deterministic
        #[test]
        fn merge_is_deterministic(layers in prop::collection::vec(layer_strategy(), 4)) {
            let mappings: Vec<Mapping> = layers.iter().map(to_mapping).collect();
            let first = FileConfig::merge_layers(mappings.iter());
            let second = FileConfig::merge_layers(mappings.iter());
            prop_assert_eq!(first, second);
        }

        /// Property: managed and unmanaged files are disjoint and together
        /// cover every candidate
        #[test]
        fn managed_and_unmanaged_partition_candidates(
            template_names in prop::collection::btree_set(file_name_strategy(), 0..6),
            global_entries in prop::collection::vec(file_entry_strategy(), 0..4),
            module_entries in prop::collection::vec(file_entry_strategy(), 0..4),
        ) {
            let templates = TemplateSet::from_entries(
                "moduleroot",
                template_names.iter().map(|n| {
                    (n.clone(), TemplateSource::Templated(PathBuf::from(n)))
                }),
            );
            let settings = Settings::new(
                build_document(&global_entries),
                build_document(&module_entries),
            );

            let candidates = settings.candidates(&templates);
            let managed = settings.managed_files(&templates);
            let unmanaged = settings.unmanaged_files(&templates);

            prop_assert!(managed.is_disjoint(&unmanaged));
            let union: std::collections::BTreeSet<String> =
                managed.union(&unmanaged).cloned().collect();
            prop_assert_eq!(union, candidates.clone());

            for name in &template_names {
                prop_assert!(candidates.contains(name));
            }
        }

        /// Property: a managed file either has a template or is marked for
        /// deletion
        #[test]
        fn managed_files_have_a_template_or_delete(
            template_names in prop::collection::btree_set(file_name_strategy(), 0..6),
            module_entries in prop::collection::vec(file_entry_strategy(), 0..6),
        ) {
            let templates = TemplateSet::from_entries(
                "moduleroot",
                template_names.iter().map(|n| {
                    (n.clone(), TemplateSource::Templated(PathBuf::from(n)))
                }),
            );
            let settings = Settings::new(Mapping::new(), build_document(&module_entries));

            for name in settings.managed_files(&templates) {
                prop_assert!(
                    templates.contains(&name) || settings.build_file_configs(&name).is_delete()
                );
            }
        }
    }
}
