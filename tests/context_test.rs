//! What extensions can see through the context

mod common;

use common::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use valuegen::*;

const BUILDER: &str = r#"
types:
  - name: Baz
    package: foo.bar
    value: true
    line: 5
    methods:
      - { name: anInt, returns: int, modifiers: [abstract] }
      - { name: aString, returns: String, modifiers: [abstract] }
      - { name: toBuilder, returns: Builder, modifiers: [abstract] }
      - { name: builder, returns: Builder, modifiers: [static] }
    nested:
      - name: Builder
        builder: true
        line: 11
        methods:
          - { name: setAnInt, returns: Builder, params: [{ name: x, type: int }], modifiers: [abstract] }
          - { name: setAString, returns: Builder, params: [{ name: x, type: String }], modifiers: [abstract] }
          - { name: build, returns: Baz, modifiers: [abstract] }
"#;

fn with_context<R>(yaml: &str, class: &str, f: impl FnOnce(&mut Context<'_>) -> R) -> R {
    let universe = universe(yaml);
    let env = env();
    let value = universe.get(class).unwrap();
    let model = property::extract(&universe, value).unwrap();
    let builder = universe
        .builder_of(value)
        .map(|b| builder::classify(&universe, value, b, &model).unwrap());
    let mut context = Context::new(&universe, value, model, builder, &env);
    f(&mut context)
}

#[test]
fn test_property_types_through_generic_parent() {
    let yaml = r#"
types:
  - name: Parent
    package: foo.bar
    kind: interface
    type_params: [T]
    methods:
      - { name: thing, returns: T }
      - { name: list, returns: "java.util.List<T>" }
  - name: Baz
    package: foo.bar
    value: true
    supertypes: ["Parent<String>"]
"#;
    let types = with_context(yaml, "foo.bar.Baz", |context| {
        context
            .property_types()
            .into_iter()
            .map(|(name, ty)| (name.to_string(), ty.to_string()))
            .collect::<Vec<_>>()
    });
    assert_eq!(
        types,
        vec![
            ("thing".to_string(), "java.lang.String".to_string()),
            ("list".to_string(), "java.util.List<java.lang.String>".to_string()),
        ]
    );
}

#[test]
fn test_builder_context() {
    with_context(BUILDER, "foo.bar.Baz", |context| {
        assert_eq!(context.package_name(), "foo.bar");
        assert_eq!(context.property_names(), vec!["anInt", "aString"]);

        let builder = context.builder().unwrap();
        assert_eq!(builder.builder_type.qualified_name, "foo.bar.Baz.Builder");
        let factories: Vec<_> = builder.builder_methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(factories, vec!["builder"]);
        let to_builder: Vec<_> = builder
            .to_builder_methods
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(to_builder, vec!["toBuilder"]);
        assert_eq!(builder.setters_for("anInt")[0].name, "setAnInt");
        assert_eq!(builder.setters_for("aString")[0].name, "setAString");
        assert!(builder.setters_for("nope").is_empty());
        assert!(builder.property_builders.is_empty());
        assert_eq!(builder.auto_build_method.name, "build");
        assert!(builder.build_method.is_none());

        // toBuilder is a converter, not a property or leftover method
        assert!(context.abstract_methods().is_empty());
        assert_eq!(context.to_builder_methods().len(), 1);
    });
}

#[test]
fn test_builder_with_concrete_build_wrapper() {
    let yaml = r#"
types:
  - name: Baz
    package: foo.bar
    value: true
    methods:
      - { name: anInt, returns: int, modifiers: [abstract] }
    nested:
      - name: Builder
        builder: true
        methods:
          - { name: anInt, returns: Builder, params: [{ name: x, type: int }], modifiers: [abstract] }
          - { name: autoBuild, returns: Baz, modifiers: [abstract] }
          - { name: build, returns: Baz }
"#;
    with_context(yaml, "foo.bar.Baz", |context| {
        let builder = context.builder().unwrap();
        assert_eq!(builder.auto_build_method.name, "autoBuild");
        assert_eq!(builder.build_method.as_ref().unwrap().name, "build");
        assert_eq!(builder.setters_for("anInt")[0].name, "anInt");
    });
}

#[test]
fn test_builder_overloads_and_property_builders() {
    let yaml = r#"
types:
  - name: Parent
    package: foo.bar
    kind: interface
    type_params: [T]
    methods:
      - { name: list, returns: "com.google.common.collect.ImmutableList<T>" }
  - name: Baz
    package: foo.bar
    value: true
    supertypes: ["Parent<String>"]
    methods:
      - { name: anInt, returns: int, modifiers: [abstract] }
      - { name: toBuilder, returns: Builder, modifiers: [abstract] }
      - { name: builder, returns: Builder, modifiers: [static] }
    nested:
      - name: Builder
        builder: true
        methods:
          - { name: setAnInt, returns: Builder, params: [{ name: x, type: int }], modifiers: [abstract] }
          - { name: setList, returns: Builder, params: [{ name: x, type: "Iterable<String>" }], modifiers: [abstract] }
          - { name: setList, returns: Builder, params: [{ name: x, type: "com.google.common.collect.ImmutableList<String>" }], modifiers: [abstract] }
          - { name: listBuilder, returns: "com.google.common.collect.ImmutableList.Builder<String>", modifiers: [abstract] }
          - { name: autoBuild, returns: Baz, modifiers: [abstract] }
          - { name: build, returns: Baz }
"#;
    with_context(yaml, "foo.bar.Baz", |context| {
        assert_eq!(context.property_names(), vec!["anInt", "list"]);
        let builder = context.builder().unwrap();

        let list_setters: Vec<_> = builder
            .setters_for("list")
            .iter()
            .map(|m| m.params[0].ty.to_string())
            .collect();
        assert_eq!(
            list_setters,
            vec![
                "java.lang.Iterable<java.lang.String>",
                "com.google.common.collect.ImmutableList<java.lang.String>",
            ]
        );
        assert_eq!(builder.setters_for("anInt").len(), 1);

        let property_builders: Vec<_> = builder
            .property_builders
            .iter()
            .map(|(property, method)| (property.as_str(), method.name.as_str()))
            .collect();
        assert_eq!(property_builders, vec![("list", "listBuilder")]);

        assert_eq!(builder.auto_build_method.name, "autoBuild");
        assert_eq!(builder.build_method.as_ref().unwrap().name, "build");
        assert_eq!(builder.builder_methods.len(), 1);
        assert_eq!(builder.to_builder_methods.len(), 1);
    });
}

#[test]
fn test_build_with_parameters_is_not_a_build_method() {
    let yaml = r#"
types:
  - name: Baz
    package: foo.bar
    value: true
    methods:
      - { name: anInt, returns: int, modifiers: [abstract] }
    nested:
      - name: Builder
        builder: true
        methods:
          - { name: setAnInt, returns: Builder, params: [{ name: x, type: int }], modifiers: [abstract] }
          - { name: oddBuild, returns: Baz, modifiers: [abstract] }
          - { name: build, returns: Baz, params: [{ name: x, type: int }] }
"#;
    with_context(yaml, "foo.bar.Baz", |context| {
        let builder = context.builder().unwrap();
        assert_eq!(builder.auto_build_method.name, "oddBuild");
        assert!(builder.build_method.is_none());
        assert!(builder.property_builders.is_empty());
        assert_eq!(builder.setters.len(), 1);
    });
}

#[test]
fn test_odd_builder_setter_type() {
    let yaml = r#"
types:
  - name: Baz
    package: foo.bar
    value: true
    methods:
      - { name: anInt, returns: int, modifiers: [abstract] }
    nested:
      - name: Builder
        builder: true
        methods:
          - { name: setAnInt, returns: Builder, params: [{ name: x, type: String }], modifiers: [abstract], line: 14 }
          - { name: build, returns: Baz, modifiers: [abstract] }
"#;
    let universe = universe(yaml);
    let value = universe.get("foo.bar.Baz").unwrap();
    let model = property::extract(&universe, value).unwrap();
    let builder = universe.builder_of(value).unwrap();
    let err = builder::classify(&universe, value, builder, &model).unwrap_err();
    assert!(matches!(err, BuilderError::SetterType { .. }));
    assert_eq!(err.location().line, Some(14));
    assert!(err.to_string().contains("anInt"));
}

#[test]
fn test_builder_without_build_method() {
    let yaml = r#"
types:
  - name: Baz
    package: foo.bar
    value: true
    methods:
      - { name: anInt, returns: int, modifiers: [abstract] }
    nested:
      - name: Builder
        builder: true
        line: 9
        methods:
          - { name: setAnInt, returns: Builder, params: [{ name: x, type: int }], modifiers: [abstract] }
"#;
    let (report, env) = process(yaml, vec![]);
    assert_eq!(report.failed, vec!["foo.bar.Baz"]);
    let errors = env.messager.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("must have an unimplemented zero-argument method"));
    assert_eq!(errors[0].location.as_ref().unwrap().line, Some(9));
}

#[test]
fn test_consumption_reduces_context() {
    let yaml = r#"
types:
  - name: Baz
    package: foo.bar
    value: true
    methods:
      - { name: foo, returns: String, modifiers: [abstract] }
      - { name: bar, returns: int, modifiers: [abstract] }
      - { name: writeToParcel, params: [{ name: flags, type: int }], modifiers: [abstract] }
"#;
    let log = call_log();
    let extensions = vec![TestExtension::new("ext", &log)
        .consuming(&["foo"])
        .consuming_methods(|context| BTreeSet::from([abstract_method(context, "writeToParcel")]))
        .boxed()];

    with_context(yaml, "foo.bar.Baz", |context| {
        assert_eq!(context.abstract_methods().len(), 1);
        let names = ChainNames::for_class(context.value_class(), "Value_");
        let outcome = ExtensionChain::new(&extensions).run(context, &names).unwrap();

        assert_eq!(context.property_names(), vec!["bar"]);
        assert!(context.property("foo").is_none());
        assert_eq!(context.all_properties().len(), 2);
        assert!(context.abstract_methods().is_empty());
        assert_eq!(context.all_abstract_methods().len(), 3);
        assert_eq!(context.consumed_properties(), &BTreeSet::from(["foo".to_string()]));
        assert_eq!(context.consumed_methods().len(), 2);
        assert_eq!(outcome.links.len(), 1);
    });
}

#[test]
fn test_nested_value_class_names() {
    let yaml = r#"
types:
  - name: Outer
    package: p
    nested:
      - name: Inner
        value: true
        methods:
          - { name: x, returns: long, modifiers: [abstract] }
"#;
    let (report, env) = process(yaml, vec![]);
    assert!(!report.has_failures());
    assert_eq!(
        env.filer.names(),
        vec!["p.$Value_Outer_Inner", "p.Value_Outer_Inner"]
    );
    let base = env.filer.get("p.$Value_Outer_Inner").unwrap();
    assert!(base.contains("abstract class $Value_Outer_Inner extends Outer.Inner"));
    assert!(base.contains("(int) ((this.x >>> 32) ^ this.x)"));
}
