//! Property model
//!
//! Finds the properties of a value class: every unimplemented, zero-argument,
//! non-void method it declares or inherits, except builder converters
//! (`toBuilder()`-style methods) and abstract redeclarations of `toString`,
//! `hashCode` and `equals`, which the base generator implements.
//!
//! Property types are the getters' return types after substitution through
//! the supertype instantiations they were inherited from, so a getter
//! `List<T> list()` on `Parent<T>` is a `List<String>` property of a class
//! implementing `Parent<String>`.

use crate::diagnostics::SourceLocation;
use crate::types::{Primitive, TypeRef};
use crate::universe::{Method, MethodRef, TypeElement, TypeUniverse};
use crate::util::{decapitalize, strip_bean_prefix};
use std::collections::HashSet;
use thiserror::Error;

/// A named, typed property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: String,
    /// Return type of the getter, with type variables substituted
    pub ty: TypeRef,
    /// The getter
    pub method: Method,
}

impl PropertyDescriptor {
    pub fn reference(&self) -> &MethodRef {
        self.method.reference()
    }
}

/// Property-model errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    #[error(
        "A value class cannot define an array-valued property unless it is a primitive array: \
         `{property}` has type {ty}"
    )]
    ArrayProperty {
        property: String,
        ty: String,
        location: SourceLocation,
    },

    #[error("More than one property is called `{name}`")]
    Duplicate {
        name: String,
        location: SourceLocation,
    },
}

impl PropertyError {
    /// The getter that caused the error
    pub fn location(&self) -> &SourceLocation {
        match self {
            PropertyError::ArrayProperty { location, .. } => location,
            PropertyError::Duplicate { location, .. } => location,
        }
    }
}

/// Abstract methods of a value class, classified
#[derive(Debug, Clone, Default)]
pub struct PropertyModel {
    /// Properties in traversal order
    pub properties: Vec<PropertyDescriptor>,
    /// Every abstract method, own and inherited
    pub abstract_methods: Vec<Method>,
    /// Abstract zero-argument methods returning the builder type
    pub to_builder_methods: Vec<Method>,
    /// Abstract methods that are neither getters, converters nor object methods
    pub unclassified: Vec<Method>,
}

impl PropertyModel {
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Extract the properties of `value_class`
pub fn extract(
    universe: &TypeUniverse,
    value_class: &TypeElement,
) -> Result<PropertyModel, PropertyError> {
    let builder_type = universe.builder_of(value_class).map(TypeElement::as_type);
    let abstract_methods: Vec<Method> = universe
        .all_methods(value_class)
        .into_iter()
        .filter(Method::is_abstract)
        .collect();

    let mut getters = Vec::new();
    let mut to_builder_methods = Vec::new();
    let mut unclassified = Vec::new();
    for method in &abstract_methods {
        if method.is_object_method() {
            continue;
        }
        let zero_arg = method.arity() == 0;
        if zero_arg && builder_type.as_ref() == Some(&method.return_type) {
            to_builder_methods.push(method.clone());
        } else if zero_arg && !method.return_type.is_void() {
            getters.push(method.clone());
        } else {
            unclassified.push(method.clone());
        }
    }

    let prefixed = all_prefixed(&getters);
    let mut seen = HashSet::new();
    let mut properties = Vec::with_capacity(getters.len());
    for getter in getters {
        let name = if prefixed {
            property_name(&getter)
        } else {
            getter.name.clone()
        };
        if !seen.insert(name.clone()) {
            return Err(PropertyError::Duplicate {
                name,
                location: getter.location.clone(),
            });
        }
        check_type(&name, &getter)?;
        properties.push(PropertyDescriptor {
            name,
            ty: getter.return_type.clone(),
            method: getter,
        });
    }

    tracing::debug!(
        class = %value_class.qualified_name,
        properties = properties.len(),
        prefixed,
        "extracted properties"
    );
    Ok(PropertyModel {
        properties,
        abstract_methods,
        to_builder_methods,
        unclassified,
    })
}

fn is_boolean(ty: &TypeRef) -> bool {
    *ty == TypeRef::Primitive(Primitive::Boolean)
}

fn bean_suffix(getter: &Method) -> Option<&str> {
    strip_bean_prefix(&getter.name, "get").or_else(|| {
        if is_boolean(&getter.return_type) {
            strip_bean_prefix(&getter.name, "is")
        } else {
            None
        }
    })
}

/// Prefixes are dropped only when every getter uses one
fn all_prefixed(getters: &[Method]) -> bool {
    !getters.is_empty() && getters.iter().all(|g| bean_suffix(g).is_some())
}

fn property_name(getter: &Method) -> String {
    bean_suffix(getter)
        .map(decapitalize)
        .unwrap_or_else(|| getter.name.clone())
}

fn check_type(name: &str, getter: &Method) -> Result<(), PropertyError> {
    if let Some(component) = getter.return_type.component() {
        if !component.is_primitive() {
            return Err(PropertyError::ArrayProperty {
                property: name.to_string(),
                ty: getter.return_type.to_string(),
                location: getter.location.clone(),
            });
        }
    }
    Ok(())
}
