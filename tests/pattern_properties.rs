use proptest::prelude::*;

use compwatch::registry::ComponentPattern;

fn ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,6}(/[a-z]{1,6})?", 0..12)
}

proptest! {
    #[test]
    fn filter_is_an_ordered_subsequence(ids in ids(), needle in "[a-z]{1,3}") {
        let pattern: ComponentPattern = needle.parse().unwrap();
        let kept = pattern.filter(ids.iter().map(String::as_str));

        let mut rest = ids.iter();
        for id in &kept {
            prop_assert!(rest.any(|candidate| candidate.as_str() == *id));
            prop_assert!(id.contains(needle.as_str()));
        }
        let expected = ids.iter().filter(|id| id.contains(needle.as_str())).count();
        prop_assert_eq!(kept.len(), expected);
    }

    #[test]
    fn exact_pattern_keeps_only_listed_ids(ids in ids(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!ids.is_empty());
        let target = ids[pick.index(ids.len())].clone();
        let pattern: ComponentPattern = format!("is:{target}").parse().unwrap();

        let kept = pattern.filter(ids.iter().map(String::as_str));
        prop_assert!(!kept.is_empty());
        prop_assert!(kept.iter().all(|id| *id == target));
        prop_assert_eq!(kept.len(), ids.iter().filter(|id| **id == target).count());
    }

    #[test]
    fn star_glob_matches_everything(ids in ids()) {
        let pattern: ComponentPattern = "glob:*".parse().unwrap();
        let kept = pattern.filter(ids.iter().map(String::as_str));
        prop_assert_eq!(kept.len(), ids.len());
    }

    #[test]
    fn anchored_regex_agrees_with_prefix(ids in ids(), prefix in "[a-z]{1,2}") {
        let pattern: ComponentPattern = format!("reg:^{prefix}").parse().unwrap();
        for id in &ids {
            prop_assert_eq!(pattern.matches(id), id.starts_with(prefix.as_str()));
        }
    }
}
