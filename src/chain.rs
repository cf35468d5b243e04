//! Extension chain runner
//!
//! Runs the extensions configured for one value class and links what they
//! generate into a single inheritance chain:
//!
//! ```text
//! $Value_Baz          base implementation (base generator)
//!   $$Value_Baz       first non-final extension with output
//!     $$$Value_Baz    second non-final extension with output
//!       Value_Baz     terminal class (final extension, or the default)
//! ```
//!
//! Consumption runs first, for each extension in order: applicability,
//! claims, validation, commit, then the finality query. Generation starts
//! only after every extension has consumed, so all of them see the fully
//! reduced context.

use crate::context::Context;
use crate::diagnostics::SourceLocation;
use crate::extension::Extension;
use crate::universe::{MethodRef, TypeElement};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

const UNCONSUMED_WARNING: &str =
    "Abstract method is neither a property getter nor a Builder converter, and no extension consumed it";

/// Class names in one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainNames {
    terminal: String,
}

impl ChainNames {
    pub fn new(terminal: impl Into<String>) -> Self {
        Self {
            terminal: terminal.into(),
        }
    }

    /// `Value_` + `Outer_Inner` for nested value classes
    pub fn for_class(value_class: &TypeElement, prefix: &str) -> Self {
        Self::new(format!("{}{}", prefix, value_class.flat_name()))
    }

    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    pub fn base(&self) -> String {
        self.link(0)
    }

    /// Name of the `depth`-th generated link above the base
    pub fn link(&self, depth: usize) -> String {
        format!("{}{}", "$".repeat(depth + 1), self.terminal)
    }
}

/// A rejected claim, or conflicting finality
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Extension {extension} wants to consume a property that does not exist: {property}")]
    NonexistentProperty { extension: String, property: String },

    #[error(
        "Extension {extension} wants to consume a method that was already consumed by another extension: {method}"
    )]
    AlreadyConsumed { extension: String, method: String },

    #[error(
        "Extension {extension} wants to consume a method that is not one of the abstract methods in this class: {method}"
    )]
    NotAbstract { extension: String, method: String },

    #[error("More than one extension wants to generate the final class: {}", .extensions.join(", "))]
    MultipleFinal { extensions: Vec<String> },
}

/// Everything that went wrong for one value class
#[derive(Debug, Clone, PartialEq)]
pub struct ChainFailure {
    pub errors: Vec<ChainError>,
    pub location: SourceLocation,
}

impl fmt::Display for ChainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ChainFailure {}

/// What one applicable extension did
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionResult {
    pub extension: String,
    pub is_final: bool,
    pub consumed_properties: BTreeSet<String>,
    pub consumed_methods: BTreeSet<MethodRef>,
    /// Trimmed-empty output counts as none
    pub generated: Option<String>,
    index: usize,
}

/// A generated class in the chain
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLink {
    pub extension: String,
    pub class_name: String,
    pub extends: String,
    pub source: String,
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    pub names: ChainNames,
    /// Generated links, non-final in order, then the final one if any
    pub links: Vec<ChainLink>,
    /// One entry per applicable extension, in input order
    pub results: Vec<ExtensionResult>,
}

impl ChainOutcome {
    pub fn final_link(&self) -> Option<&ChainLink> {
        self.links.iter().find(|l| l.is_final)
    }

    /// No extension produced the terminal class
    pub fn needs_default_terminal(&self) -> bool {
        self.final_link().is_none()
    }

    /// The class the terminal class extends
    pub fn terminal_parent(&self) -> String {
        self.links
            .iter()
            .rev()
            .find(|l| !l.is_final)
            .map(|l| l.class_name.clone())
            .unwrap_or_else(|| self.names.base())
    }

    pub fn result(&self, extension: &str) -> Option<&ExtensionResult> {
        self.results.iter().find(|r| r.extension == extension)
    }
}

pub struct ExtensionChain<'e> {
    extensions: &'e [Box<dyn Extension>],
}

impl<'e> ExtensionChain<'e> {
    pub fn new(extensions: &'e [Box<dyn Extension>]) -> Self {
        Self { extensions }
    }

    /// Run every extension against `context`.
    ///
    /// On success `context` holds the final consumption state, which the
    /// base generator reads.
    pub fn run(
        &self,
        context: &mut Context<'_>,
        names: &ChainNames,
    ) -> Result<ChainOutcome, ChainFailure> {
        let span = tracing::debug_span!(
            "extension_chain",
            class = %context.value_class().qualified_name
        );
        let _guard = span.enter();

        let mut results = self.consume(context)?;
        let context: &Context<'_> = context;

        let mut links = Vec::new();
        let mut class_to_extend = names.base();
        for result in results.iter_mut().filter(|r| !r.is_final) {
            let class_name = names.link(links.len() + 1);
            let generated = non_blank(self.extensions[result.index].generate_class(
                context,
                &class_name,
                &class_to_extend,
                false,
            ));
            if let Some(source) = &generated {
                tracing::debug!(extension = %result.extension, class = %class_name, "generated link");
                links.push(ChainLink {
                    extension: result.extension.clone(),
                    class_name: class_name.clone(),
                    extends: class_to_extend.clone(),
                    source: source.clone(),
                    is_final: false,
                });
                class_to_extend = class_name;
            } else {
                tracing::debug!(extension = %result.extension, "no class generated");
            }
            result.generated = generated;
        }

        if let Some(result) = results.iter_mut().find(|r| r.is_final) {
            let generated = non_blank(self.extensions[result.index].generate_class(
                context,
                names.terminal(),
                &class_to_extend,
                true,
            ));
            if let Some(source) = &generated {
                tracing::debug!(extension = %result.extension, class = names.terminal(), "generated final class");
                links.push(ChainLink {
                    extension: result.extension.clone(),
                    class_name: names.terminal().to_string(),
                    extends: class_to_extend,
                    source: source.clone(),
                    is_final: true,
                });
            }
            result.generated = generated;
        }

        for method in context.abstract_methods() {
            context.processing_env().messager().warning(
                &format!("{}: {}", UNCONSUMED_WARNING, method.name),
                &method.location,
            );
        }

        Ok(ChainOutcome {
            names: names.clone(),
            links,
            results,
        })
    }

    fn consume(&self, context: &mut Context<'_>) -> Result<Vec<ExtensionResult>, ChainFailure> {
        let mut results = Vec::new();
        let mut errors = Vec::new();

        for (index, extension) in self.extensions.iter().enumerate() {
            if !extension.applicable(context) {
                tracing::debug!(extension = extension.name(), "not applicable");
                continue;
            }
            let properties = extension.consume_properties(context);
            let methods = extension.consume_methods(context);
            let claim = match context.validate_claims(extension.name(), &properties, &methods) {
                Ok(claim) => claim,
                Err(mut rejected) => {
                    errors.append(&mut rejected);
                    continue;
                }
            };
            let consumed_properties = claim.properties.clone();
            let consumed_methods = claim.methods.clone();
            context.commit(claim);
            let is_final = extension.must_be_final(context);
            tracing::debug!(
                extension = extension.name(),
                properties = consumed_properties.len(),
                methods = consumed_methods.len(),
                is_final,
                "extension consumed"
            );
            results.push(ExtensionResult {
                extension: extension.name().to_string(),
                is_final,
                consumed_properties,
                consumed_methods,
                generated: None,
                index,
            });
        }

        let finals: Vec<String> = results
            .iter()
            .filter(|r| r.is_final)
            .map(|r| r.extension.clone())
            .collect();
        if finals.len() > 1 {
            errors.push(ChainError::MultipleFinal { extensions: finals });
        }

        if errors.is_empty() {
            Ok(results)
        } else {
            Err(ChainFailure {
                errors,
                location: context.location().clone(),
            })
        }
    }
}

fn non_blank(source: Option<String>) -> Option<String> {
    source.filter(|s| !s.trim().is_empty())
}
