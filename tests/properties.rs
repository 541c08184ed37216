use proptest::prelude::*;

use pwgen::{generate, Category, CategoryFlags, CharacterSets, GenerateError};

fn content_flags() -> impl Strategy<Value = CategoryFlags> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(uppercase, lowercase, digits, special, exclude_similar)| CategoryFlags {
            uppercase,
            lowercase,
            digits,
            special,
            exclude_similar,
        },
    )
}

fn selected_flags() -> impl Strategy<Value = CategoryFlags> {
    content_flags().prop_filter("at least one content category", |flags| flags.has_any())
}

proptest! {
    #[test]
    fn length_is_exact(length in 4usize..=35, flags in selected_flags()) {
        let password = generate(length, flags).unwrap();
        prop_assert_eq!(password.as_str().chars().count(), length);
        prop_assert_eq!(password.len(), length);
    }

    #[test]
    fn every_enabled_category_is_present(length in 4usize..=35, flags in selected_flags()) {
        let sets = CharacterSets::standard();
        let password = generate(length, flags).unwrap();
        for category in flags.enabled() {
            prop_assert!(
                password.as_str().chars().any(|ch| sets.category_of(ch) == Some(category)),
                "no {} character", category
            );
        }
    }

    #[test]
    fn only_enabled_categories_are_used(length in 4usize..=35, flags in selected_flags()) {
        let sets = CharacterSets::standard();
        let password = generate(length, flags).unwrap();
        for ch in password.as_str().chars() {
            let category = sets.category_of(ch);
            prop_assert!(category.map(|c| flags.is_enabled(c)).unwrap_or(false), "unexpected {:?}", ch);
        }
    }

    #[test]
    fn similar_characters_are_excluded(length in 4usize..=35, flags in selected_flags()) {
        let flags = CategoryFlags { exclude_similar: true, ..flags };
        let sets = CharacterSets::standard();
        let password = generate(length, flags).unwrap();
        prop_assert!(!password.as_str().chars().any(|ch| sets.is_similar(ch)));
    }

    #[test]
    fn short_lengths_are_rejected(length in 0usize..4, flags in content_flags()) {
        let is_length_error = matches!(
            generate(length, flags),
            Err(GenerateError::LengthOutOfRange { .. })
        );
        prop_assert!(is_length_error);
    }

    #[test]
    fn long_lengths_are_rejected(length in 36usize..1000, flags in content_flags()) {
        let is_length_error = matches!(
            generate(length, flags),
            Err(GenerateError::LengthOutOfRange { .. })
        );
        prop_assert!(is_length_error);
    }

    #[test]
    fn no_category_is_rejected(length in 4usize..=35, exclude_similar in any::<bool>()) {
        let flags = CategoryFlags { exclude_similar, ..CategoryFlags::default() };
        let is_selection_error =
            matches!(generate(length, flags), Err(GenerateError::NoCategorySelected));
        prop_assert!(is_selection_error);
    }
}

#[test]
fn minimum_length_with_every_category() {
    let sets = CharacterSets::standard();
    for _ in 0..100 {
        let password = generate(4, CategoryFlags::all()).unwrap();
        let mut categories = password
            .as_str()
            .chars()
            .filter_map(|ch| sets.category_of(ch))
            .collect::<Vec<_>>();
        categories.sort_by_key(|category| Category::ALL.iter().position(|c| c == category));
        assert_eq!(categories, Category::ALL);
    }
}

#[test]
fn twenty_characters_without_similar_ones() {
    let flags = CategoryFlags {
        exclude_similar: true,
        ..CategoryFlags::all()
    };
    let password = generate(20, flags).unwrap();
    assert_eq!(password.len(), 20);
    assert!(!password.as_str().chars().any(|ch| "il1O0".contains(ch)));
}

#[test]
fn passwords_are_not_repeated() {
    let first = generate(5, CategoryFlags::all()).unwrap();
    let second = generate(5, CategoryFlags::all()).unwrap();
    assert_ne!(first, second);
}

#[test]
fn generators_run_concurrently() {
    let handles = (0..8)
        .map(|_| std::thread::spawn(|| generate(16, CategoryFlags::all()).unwrap()))
        .collect::<Vec<_>>();
    for handle in handles {
        assert_eq!(handle.join().unwrap().len(), 16);
    }
}
