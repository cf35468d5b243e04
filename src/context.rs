//! Per-class context handed to extensions
//!
//! Carries the property and builder models for one value class together
//! with the running consumption state. The views extensions see
//! (`properties()`, `abstract_methods()`) exclude whatever earlier
//! extensions have consumed.

use crate::builder::BuilderModel;
use crate::chain::ChainError;
use crate::diagnostics::SourceLocation;
use crate::filer::ProcessingEnv;
use crate::property::{PropertyDescriptor, PropertyModel};
use crate::types::TypeRef;
use crate::universe::{Method, MethodRef, TypeElement, TypeUniverse};
use std::collections::BTreeSet;

pub struct Context<'a> {
    universe: &'a TypeUniverse,
    value_class: &'a TypeElement,
    model: PropertyModel,
    builder: Option<BuilderModel>,
    env: &'a dyn ProcessingEnv,
    consumed_properties: BTreeSet<String>,
    consumed_methods: BTreeSet<MethodRef>,
}

/// Validated claims of one extension, ready to commit
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Claim {
    pub properties: BTreeSet<String>,
    pub methods: BTreeSet<MethodRef>,
}

impl<'a> Context<'a> {
    pub fn new(
        universe: &'a TypeUniverse,
        value_class: &'a TypeElement,
        model: PropertyModel,
        builder: Option<BuilderModel>,
        env: &'a dyn ProcessingEnv,
    ) -> Self {
        Self {
            universe,
            value_class,
            model,
            builder,
            env,
            consumed_properties: BTreeSet::new(),
            consumed_methods: BTreeSet::new(),
        }
    }

    pub fn package_name(&self) -> &str {
        &self.value_class.package
    }

    pub fn value_class(&self) -> &TypeElement {
        self.value_class
    }

    pub fn location(&self) -> &SourceLocation {
        &self.value_class.location
    }

    /// Type lookup over every known declaration
    pub fn types(&self) -> &TypeUniverse {
        self.universe
    }

    pub fn processing_env(&self) -> &dyn ProcessingEnv {
        self.env
    }

    /// Unconsumed properties, in declaration order
    pub fn properties(&self) -> Vec<&PropertyDescriptor> {
        self.model
            .properties
            .iter()
            .filter(|p| !self.is_consumed(p))
            .collect()
    }

    /// Unconsumed property by name
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.model
            .property(name)
            .filter(|p| !self.is_consumed(p))
    }

    pub fn property_names(&self) -> Vec<&str> {
        self.properties().into_iter().map(|p| p.name.as_str()).collect()
    }

    /// Name and type of each unconsumed property
    pub fn property_types(&self) -> Vec<(&str, &TypeRef)> {
        self.properties()
            .into_iter()
            .map(|p| (p.name.as_str(), &p.ty))
            .collect()
    }

    /// Every property, consumed or not
    pub fn all_properties(&self) -> &[PropertyDescriptor] {
        &self.model.properties
    }

    /// Abstract methods that are neither getters nor builder converters and
    /// that no extension has consumed
    pub fn abstract_methods(&self) -> Vec<&Method> {
        self.model
            .unclassified
            .iter()
            .filter(|m| !self.consumed_methods.contains(m.reference()))
            .collect()
    }

    /// Every abstract method the class declares or inherits
    pub fn all_abstract_methods(&self) -> &[Method] {
        &self.model.abstract_methods
    }

    /// Unconsumed `toBuilder()`-style methods
    pub fn to_builder_methods(&self) -> Vec<&Method> {
        self.model
            .to_builder_methods
            .iter()
            .filter(|m| !self.consumed_methods.contains(m.reference()))
            .collect()
    }

    /// Methods written directly in the value class
    pub fn declared_methods(&self) -> &[Method] {
        self.universe.declared_methods(&self.value_class.qualified_name)
    }

    pub fn builder(&self) -> Option<&BuilderModel> {
        self.builder.as_ref()
    }

    pub fn consumed_properties(&self) -> &BTreeSet<String> {
        &self.consumed_properties
    }

    pub fn consumed_methods(&self) -> &BTreeSet<MethodRef> {
        &self.consumed_methods
    }

    pub fn is_method_consumed(&self, method: &MethodRef) -> bool {
        self.consumed_methods.contains(method)
    }

    fn is_consumed(&self, property: &PropertyDescriptor) -> bool {
        self.consumed_properties.contains(&property.name)
            || self.consumed_methods.contains(property.reference())
    }

    /// Check an extension's claims against the current state. Every
    /// problem is reported, not just the first.
    pub(crate) fn validate_claims(
        &self,
        extension: &str,
        properties: &BTreeSet<String>,
        methods: &BTreeSet<MethodRef>,
    ) -> Result<Claim, Vec<ChainError>> {
        let mut claim = Claim::default();
        let mut errors = Vec::new();

        for name in properties {
            match self.model.property(name) {
                None => errors.push(ChainError::NonexistentProperty {
                    extension: extension.to_string(),
                    property: name.clone(),
                }),
                Some(p) if self.is_consumed(p) => errors.push(ChainError::AlreadyConsumed {
                    extension: extension.to_string(),
                    method: p.reference().to_string(),
                }),
                Some(p) => {
                    claim.properties.insert(p.name.clone());
                    claim.methods.insert(p.reference().clone());
                }
            }
        }

        for method in methods {
            let is_abstract = self
                .model
                .abstract_methods
                .iter()
                .any(|m| m.reference() == method);
            if !is_abstract {
                errors.push(ChainError::NotAbstract {
                    extension: extension.to_string(),
                    method: method.to_string(),
                });
            } else if self.consumed_methods.contains(method) {
                errors.push(ChainError::AlreadyConsumed {
                    extension: extension.to_string(),
                    method: method.to_string(),
                });
            } else {
                if let Some(p) = self
                    .model
                    .properties
                    .iter()
                    .find(|p| p.reference() == method)
                {
                    claim.properties.insert(p.name.clone());
                }
                claim.methods.insert(method.clone());
            }
        }

        if errors.is_empty() {
            Ok(claim)
        } else {
            Err(errors)
        }
    }

    pub(crate) fn commit(&mut self, claim: Claim) {
        self.consumed_properties.extend(claim.properties);
        self.consumed_methods.extend(claim.methods);
    }
}
