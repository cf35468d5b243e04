//! Property-based tests for chain naming and type substitution
//!
//! Uses proptest to generate names and nested types and check invariants.
//! Run with `cargo test --features proptest`.

#![cfg(feature = "proptest")]

use proptest::prelude::*;
use valuegen::*;

fn nested_list(inner: TypeRef, depth: usize) -> TypeRef {
    (0..depth).fold(inner, |ty, _| TypeRef::generic("java.util.List", vec![ty]))
}

proptest! {
    #[test]
    fn prop_links_only_add_dollars(
        prefix in "[A-Z][a-z]{0,5}_",
        simple in "[A-Z][a-zA-Z0-9]{0,8}",
        depth in 0usize..8,
    ) {
        let names = ChainNames::new(format!("{}{}", prefix, simple));
        let link = names.link(depth);
        prop_assert!(link.ends_with(names.terminal()));
        prop_assert_eq!(link.len() - names.terminal().len(), depth + 1);
        prop_assert_eq!(link.trim_start_matches('$'), names.terminal());
        prop_assert_ne!(names.link(depth + 1), link);
    }

    #[test]
    fn prop_substitution_binds_every_occurrence(var in "[A-Z]", depth in 0usize..6) {
        let ty = TypeRef::generic(
            "java.util.Map",
            vec![TypeRef::var(var.clone()), nested_list(TypeRef::var(var.clone()), depth)],
        );
        let mut bindings = TypeBindings::new();
        bindings.bind(var.clone(), TypeRef::string());
        let substituted = ty.substitute(&bindings);

        let mut free = Vec::new();
        substituted.type_vars(&mut free);
        prop_assert!(free.is_empty());
        prop_assert_eq!(
            substituted.type_args()[1].clone(),
            nested_list(TypeRef::string(), depth)
        );
    }

    #[test]
    fn prop_empty_bindings_change_nothing(var in "[A-Z]", depth in 0usize..6) {
        let ty = nested_list(TypeRef::var(var), depth);
        prop_assert_eq!(ty.substitute(&TypeBindings::new()), ty);
    }
}
