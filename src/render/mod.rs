//! Code rendering: Java source for the classes the processor owns
//!
//! The base implementation and the default terminal class are rendered
//! here. Extensions render their own links, and may use
//! [`pass_through_class`] for the common shape.

mod java;

pub use java::{constructor_params, pass_through_class, type_parameters, JavaGenerator};

use crate::decl::Declarations;

/// Render configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Include provenance header
    pub provenance: bool,
    /// Annotate generated classes with `@Generated`
    pub generated_annotation: bool,
    /// Declarations file named in the provenance header
    pub source: Option<String>,
    /// Declarations hash named in the provenance header
    pub hash: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            provenance: true,
            generated_annotation: true,
            source: None,
            hash: None,
        }
    }
}

impl RenderConfig {
    /// Fill in provenance from the declarations being processed
    pub fn with_declarations(mut self, decls: &Declarations) -> Self {
        self.source = decls.source.clone();
        self.hash = Some(decls.hash());
        self
    }
}
