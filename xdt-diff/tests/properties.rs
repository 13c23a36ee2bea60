//! Property tests for matching and patch generation over generated
//! `appSettings` documents.

use std::collections::BTreeMap;

use proptest::prelude::*;
use xdt_diff::{diff, MatchState, Matching, Settings, StructuralMatching, Tree};

/// Builds `<configuration><appSettings>` with one `<add>` per entry.
fn app_settings(entries: &BTreeMap<u8, String>) -> Tree {
    app_settings_in_order(entries.iter().map(|(key, value)| (*key, value.clone())))
}

fn app_settings_in_order(entries: impl IntoIterator<Item = (u8, String)>) -> Tree {
    let mut tree = Tree::new("configuration");
    let root = tree.root();
    let settings = tree.append_element(root, "appSettings");
    for (key, value) in entries {
        let add = tree.append_element(settings, "add");
        tree.set_attribute(add, "key", format!("k{key}"));
        tree.set_attribute(add, "value", value);
    }
    tree
}

fn entries(keys: std::ops::Range<u8>, size: std::ops::Range<usize>) -> impl Strategy<Value = BTreeMap<u8, String>> {
    prop::collection::btree_map(keys, "[a-c]{1,2}", size)
}

/// Every node is resolved, and partner links are mutual.
fn assert_consistent(tree: &Tree, other: &Tree) {
    for id in tree.descendants(tree.root()) {
        let state = tree.state(id);
        assert_ne!(state, MatchState::Unmatched);
        match tree.partner(id) {
            Some(partner) => {
                assert_ne!(state, MatchState::NoMatch);
                assert_eq!(other.partner(partner), Some(id));
            }
            None => assert_eq!(state, MatchState::NoMatch),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn self_diff_is_empty(map in entries(0..8, 0..6)) {
        let mut old = app_settings(&map);
        let mut new = app_settings(&map);
        let patch = diff(&mut old, &mut new, &Settings::default()).unwrap();
        prop_assert!(!patch.has_changes());
    }

    #[test]
    fn matching_is_complete_and_mutual(
        old_map in entries(0..8, 0..6),
        new_map in entries(0..8, 0..6),
    ) {
        let mut old = app_settings(&old_map);
        let mut new = app_settings(&new_map);
        StructuralMatching::new().build_matching(&mut old, &mut new);
        assert_consistent(&old, &new);
        assert_consistent(&new, &old);
    }

    #[test]
    fn patch_is_deterministic(
        old_map in entries(0..8, 0..6),
        new_map in entries(0..8, 0..6),
    ) {
        let render = || {
            let mut old = app_settings(&old_map);
            let mut new = app_settings(&new_map);
            diff(&mut old, &mut new, &Settings::default())
                .unwrap()
                .to_xml_string()
                .unwrap()
        };
        prop_assert_eq!(render(), render());
    }

    #[test]
    fn appended_entries_are_plain_inserts(
        old_map in entries(0..8, 0..6),
        extra in entries(10..20, 0..4),
    ) {
        let mut old = app_settings(&old_map);
        let mut combined = old_map.clone();
        combined.extend(extra.clone());
        let mut new = app_settings(&combined);

        let patch = diff(&mut old, &mut new, &Settings::default()).unwrap();
        prop_assert_eq!(patch.transforms(), vec!["Insert"; extra.len()]);
        prop_assert!(patch.locators().is_empty());
    }

    #[test]
    fn kept_entries_pair_by_key_not_position(
        old_map in entries(0..8, 1..6),
        keep in prop::collection::vec(any::<bool>(), 6),
        revalue in prop::collection::vec(prop::option::of("[a-c]{1,2}"), 6),
    ) {
        let mut old = app_settings(&old_map);
        let kept: Vec<(u8, String)> = old_map
            .iter()
            .enumerate()
            .filter(|(i, _)| keep[*i])
            .map(|(i, (key, value))| (*key, revalue[i].clone().unwrap_or_else(|| value.clone())))
            .rev()
            .collect();
        let mut new = app_settings_in_order(kept);

        StructuralMatching::new().build_matching(&mut old, &mut new);
        for id in new.descendants(new.root()).filter(|&id| new.name(id) == "add") {
            let partner = new.partner(id);
            prop_assert!(partner.is_some());
            prop_assert_eq!(
                partner.and_then(|p| old.attribute_value(p, "key")),
                new.attribute_value(id, "key")
            );
        }
    }
}
