//! Builder model
//!
//! Classifies the methods of a value class's nested builder, purely from
//! their shape:
//!
//! | Role | Where | Shape |
//! |------|-------|-------|
//! | factory | value class | static, no arguments, returns the builder |
//! | to-builder | value class | abstract, no arguments, returns the builder |
//! | setter | builder | abstract, one argument, named `p` or `setP` |
//! | property builder | builder | abstract, no arguments, named `pBuilder`, returns `T.Builder` for a `T` property |
//! | auto-build | builder | abstract, no arguments, returns exactly the value class |
//! | build | builder | concrete, no arguments, returns the value class |

use crate::diagnostics::SourceLocation;
use crate::property::{PropertyDescriptor, PropertyModel};
use crate::types::{TypeRef, WildcardBound};
use crate::universe::{Method, TypeElement, TypeUniverse};
use crate::util::capitalize;
use std::collections::BTreeMap;
use thiserror::Error;

pub(crate) const IMMUTABLE_COLLECTIONS: &[&str] = &[
    "com.google.common.collect.ImmutableCollection",
    "com.google.common.collect.ImmutableList",
    "com.google.common.collect.ImmutableMultiset",
    "com.google.common.collect.ImmutableSet",
    "com.google.common.collect.ImmutableSortedSet",
];

pub(crate) const IMMUTABLE_MAPS: &[&str] = &[
    "com.google.common.collect.ImmutableBiMap",
    "com.google.common.collect.ImmutableMap",
    "com.google.common.collect.ImmutableSortedMap",
];

const COLLECTION_SOURCES: &[&str] = &[
    "java.lang.Iterable",
    "java.util.Collection",
    "java.util.List",
    "java.util.Set",
];

pub(crate) const OPTIONALS: &[&str] = &["java.util.Optional", "com.google.common.base.Optional"];

/// Classified builder methods
#[derive(Debug, Clone)]
pub struct BuilderModel {
    /// The nested builder declaration
    pub builder_type: TypeElement,
    /// Static factories on the value class returning a fresh builder
    pub builder_methods: Vec<Method>,
    /// Abstract methods on the value class returning a pre-populated builder
    pub to_builder_methods: Vec<Method>,
    /// Candidate setters per property; overloads are all kept
    pub setters: BTreeMap<String, Vec<Method>>,
    /// Sub-builder accessor per property
    pub property_builders: BTreeMap<String, Method>,
    /// The abstract method the generator implements to build the value
    pub auto_build_method: Method,
    /// A concrete wrapper around `auto_build_method`, if there is exactly one
    pub build_method: Option<Method>,
}

impl BuilderModel {
    pub fn setters_for(&self, property: &str) -> &[Method] {
        self.setters.get(property).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Builder-model errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuilderError {
    #[error("Builder {builder} must have an unimplemented zero-argument method returning {value}")]
    MissingAutoBuild {
        builder: String,
        value: String,
        location: SourceLocation,
    },

    #[error("Builder {builder} has more than one unimplemented method returning {value}: {methods}")]
    AmbiguousAutoBuild {
        builder: String,
        value: String,
        methods: String,
        location: SourceLocation,
    },

    #[error("Method {method} does not correspond to a property of {value}")]
    NoSuchProperty {
        method: String,
        value: String,
        location: SourceLocation,
    },

    #[error(
        "Parameter type {param} of setter {method} cannot set property `{property}` of type {property_type}"
    )]
    SetterType {
        method: String,
        param: String,
        property: String,
        property_type: String,
        location: SourceLocation,
    },

    #[error("Setter {method} must return {builder} or void")]
    SetterReturn {
        method: String,
        builder: String,
        location: SourceLocation,
    },
}

impl BuilderError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            BuilderError::MissingAutoBuild { location, .. }
            | BuilderError::AmbiguousAutoBuild { location, .. }
            | BuilderError::NoSuchProperty { location, .. }
            | BuilderError::SetterType { location, .. }
            | BuilderError::SetterReturn { location, .. } => location,
        }
    }
}

/// Classify `builder`, the nested builder of `value_class`
pub fn classify(
    universe: &TypeUniverse,
    value_class: &TypeElement,
    builder: &TypeElement,
    properties: &PropertyModel,
) -> Result<BuilderModel, BuilderError> {
    let value_type = value_class.as_type();
    let builder_type = builder.as_type();

    let methods: Vec<Method> = universe
        .all_methods(builder)
        .into_iter()
        .filter(|m| m.owner != "java.lang.Object" && !m.is_static())
        .collect();

    let returns_value = |m: &&Method| m.arity() == 0 && m.return_type == value_type;
    let auto_builds: Vec<&Method> = methods
        .iter()
        .filter(returns_value)
        .filter(|m| m.is_abstract())
        .collect();
    let auto_build_method = match auto_builds.as_slice() {
        [one] => (*one).clone(),
        [] => {
            return Err(BuilderError::MissingAutoBuild {
                builder: builder.qualified_name.clone(),
                value: value_class.qualified_name.clone(),
                location: builder.location.clone(),
            })
        }
        many => {
            let names: Vec<_> = many.iter().map(|m| format!("{}()", m.name)).collect();
            return Err(BuilderError::AmbiguousAutoBuild {
                builder: builder.qualified_name.clone(),
                value: value_class.qualified_name.clone(),
                methods: names.join(", "),
                location: builder.location.clone(),
            });
        }
    };

    let build_candidates: Vec<&Method> = methods
        .iter()
        .filter(returns_value)
        .filter(|m| m.reference() != auto_build_method.reference())
        .collect();
    let build_method = match build_candidates.as_slice() {
        [one] => Some((*one).clone()),
        _ => None,
    };

    let mut setters: BTreeMap<String, Vec<Method>> = BTreeMap::new();
    let mut property_builders = BTreeMap::new();
    for method in methods.iter().filter(|m| m.is_abstract()) {
        if method.reference() == auto_build_method.reference() {
            continue;
        }
        match method.arity() {
            1 => {
                let property = setter_property(method, properties).ok_or_else(|| {
                    BuilderError::NoSuchProperty {
                        method: format!("{}()", method.name),
                        value: value_class.qualified_name.clone(),
                        location: method.location.clone(),
                    }
                })?;
                check_setter(method, property, &builder_type)?;
                setters
                    .entry(property.name.clone())
                    .or_default()
                    .push(method.clone());
            }
            0 => match property_builder_property(method, properties) {
                Some(property) => {
                    property_builders.insert(property.name.clone(), method.clone());
                }
                None => tracing::debug!(method = %method.name, "ignoring builder method"),
            },
            _ => tracing::debug!(method = %method.name, "ignoring builder method"),
        }
    }

    let builder_methods = universe
        .declared_methods(&value_class.qualified_name)
        .iter()
        .filter(|m| m.is_static() && m.arity() == 0 && m.return_type == builder_type)
        .cloned()
        .collect();

    tracing::debug!(
        builder = %builder.qualified_name,
        auto_build = %auto_build_method.name,
        setters = setters.len(),
        property_builders = property_builders.len(),
        "classified builder"
    );
    Ok(BuilderModel {
        builder_type: builder.clone(),
        builder_methods,
        to_builder_methods: properties.to_builder_methods.clone(),
        setters,
        property_builders,
        auto_build_method,
        build_method,
    })
}

/// Exact name first, then the `setX` convention
fn setter_property<'a>(
    method: &Method,
    properties: &'a PropertyModel,
) -> Option<&'a PropertyDescriptor> {
    properties.property(&method.name).or_else(|| {
        properties
            .properties
            .iter()
            .find(|p| method.name == format!("set{}", capitalize(&p.name)))
    })
}

fn check_setter(
    method: &Method,
    property: &PropertyDescriptor,
    builder_type: &TypeRef,
) -> Result<(), BuilderError> {
    if !method.return_type.is_void() && method.return_type != *builder_type {
        return Err(BuilderError::SetterReturn {
            method: format!("{}()", method.name),
            builder: builder_type.to_string(),
            location: method.location.clone(),
        });
    }
    let param = &method.params[0].ty;
    if !is_convertible(param, &property.ty) {
        return Err(BuilderError::SetterType {
            method: format!("{}()", method.name),
            param: param.to_string(),
            property: property.name.clone(),
            property_type: property.ty.to_string(),
            location: method.location.clone(),
        });
    }
    Ok(())
}

fn property_builder_property<'a>(
    method: &Method,
    properties: &'a PropertyModel,
) -> Option<&'a PropertyDescriptor> {
    let name = method.name.strip_suffix("Builder")?;
    let property = properties.property(name)?;
    is_sub_builder(&method.return_type, &property.ty).then_some(property)
}

/// `ImmutableList.Builder<E>` for an `ImmutableList<E>` property
pub fn is_sub_builder(candidate: &TypeRef, property_type: &TypeRef) -> bool {
    match (candidate.raw_name(), property_type.raw_name()) {
        (Some(c), Some(p)) => {
            c == format!("{}.Builder", p) && candidate.type_args() == property_type.type_args()
        }
        _ => false,
    }
}

/// Can a setter taking `param` set a property of type `property`?
///
/// Identity always works. Immutable collections also accept their mutable
/// or iterable sources, and arrays for list/set shapes; optionals accept
/// their content type.
pub fn is_convertible(param: &TypeRef, property: &TypeRef) -> bool {
    if param == property {
        return true;
    }
    let Some(raw) = property.raw_name() else {
        return false;
    };
    let args = property.type_args();

    if IMMUTABLE_COLLECTIONS.contains(&raw) && args.len() == 1 {
        if let Some(component) = param.component() {
            return component == &args[0];
        }
        return param
            .raw_name()
            .is_some_and(|p| COLLECTION_SOURCES.contains(&p) || p == raw)
            && same_args(param.type_args(), args);
    }
    if IMMUTABLE_MAPS.contains(&raw) && args.len() == 2 {
        return param
            .raw_name()
            .is_some_and(|p| p == "java.util.Map" || p == raw)
            && same_args(param.type_args(), args);
    }
    if OPTIONALS.contains(&raw) && args.len() == 1 {
        return *param == args[0];
    }
    false
}

/// `? extends E` matches `E`
fn same_args(candidate: &[TypeRef], expected: &[TypeRef]) -> bool {
    candidate.len() == expected.len()
        && candidate.iter().zip(expected).all(|(c, e)| match c {
            TypeRef::Wildcard(WildcardBound::Extends(b)) => **b == *e,
            _ => c == e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(name: &str, arg: TypeRef) -> TypeRef {
        TypeRef::generic(name, vec![arg])
    }

    #[test]
    fn test_identity_conversion() {
        assert!(is_convertible(&TypeRef::string(), &TypeRef::string()));
        assert!(!is_convertible(&TypeRef::string(), &TypeRef::declared("java.lang.Integer")));
    }

    #[test]
    fn test_immutable_collection_conversions() {
        let prop = list_of("com.google.common.collect.ImmutableList", TypeRef::string());
        assert!(is_convertible(&list_of("java.lang.Iterable", TypeRef::string()), &prop));
        assert!(is_convertible(&list_of("java.util.Collection", TypeRef::string()), &prop));
        assert!(is_convertible(&TypeRef::array_of(TypeRef::string()), &prop));
        assert!(is_convertible(
            &list_of(
                "java.lang.Iterable",
                TypeRef::Wildcard(WildcardBound::Extends(Box::new(TypeRef::string())))
            ),
            &prop
        ));
        assert!(!is_convertible(
            &list_of("java.lang.Iterable", TypeRef::declared("java.lang.Integer")),
            &prop
        ));
        assert!(!is_convertible(
            &list_of("java.util.List", TypeRef::string()),
            &list_of("java.util.List", TypeRef::declared("java.lang.Object"))
        ));
    }

    #[test]
    fn test_map_and_optional_conversions() {
        let map_args = vec![TypeRef::string(), TypeRef::declared("java.lang.Integer")];
        let prop = TypeRef::generic("com.google.common.collect.ImmutableMap", map_args.clone());
        assert!(is_convertible(&TypeRef::generic("java.util.Map", map_args), &prop));

        let opt = list_of("java.util.Optional", TypeRef::string());
        assert!(is_convertible(&TypeRef::string(), &opt));
    }

    #[test]
    fn test_is_sub_builder() {
        let prop = list_of("com.google.common.collect.ImmutableList", TypeRef::string());
        assert!(is_sub_builder(
            &list_of("com.google.common.collect.ImmutableList.Builder", TypeRef::string()),
            &prop
        ));
        assert!(!is_sub_builder(
            &list_of("com.google.common.collect.ImmutableSet.Builder", TypeRef::string()),
            &prop
        ));
        assert!(!is_sub_builder(&TypeRef::string(), &prop));
    }
}
