// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # valuegen: value class implementation generator
//!
//! Generates implementations of abstract *value classes*: classes whose
//! abstract zero-argument methods are properties, and which may declare a
//! nested builder. The generated implementation is a chain of classes:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                                                              │
//! │  DECLARATIONS (YAML)                                         │
//! │       │                                                      │
//! │       └──► TypeUniverse ──► property::extract ──► Properties │
//! │                   │                                │         │
//! │                   └──► builder::classify ──► BuilderModel    │
//! │                                                    │         │
//! │  Context ◄─────────────────────────────────────────┘         │
//! │       │                                                      │
//! │       ├──► ExtensionChain::run ──► $$Value_Baz ...           │
//! │       │                                                      │
//! │       └──► JavaGenerator ──► $Value_Baz, Value_Baz           │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Extensions implement [`Extension`]. Each may claim properties and
//! abstract methods it implements itself, and may contribute one class to
//! the chain. At most one extension may generate the terminal class.
//!
//! ## Quick Start
//!
//! ```rust
//! use valuegen::*;
//!
//! let decls = Declarations::from_yaml(r#"
//! types:
//!   - name: Baz
//!     package: foo.bar
//!     value: true
//!     methods:
//!       - { name: foo, returns: String, modifiers: [abstract] }
//!       - { name: bar, returns: int, modifiers: [abstract] }
//! "#)?;
//! let universe = TypeUniverse::from_decls(&decls)?;
//!
//! let env = Env::new(CollectingMessager::new(), InMemoryFiler::new());
//! let processor = Processor::new(Vec::new(), ProcessorConfig::default());
//! let report = processor.process(&universe, &env);
//!
//! assert!(!report.has_failures());
//! assert_eq!(env.filer.names(), vec!["foo.bar.$Value_Baz", "foo.bar.Value_Baz"]);
//! # Ok::<(), valuegen::Error>(())
//! ```

// Input model
pub mod decl;
pub mod error;
pub mod types;
pub mod universe;

// Analysis
pub mod builder;
pub mod property;

// Extension framework
pub mod chain;
pub mod context;
pub mod extension;

// Output and batch driving
pub mod builtin;
pub mod config;
pub mod diagnostics;
pub mod filer;
pub mod processor;
pub mod render;
pub mod util;

// Re-exports
pub use builder::{BuilderError, BuilderModel};
pub use chain::{
    ChainError, ChainFailure, ChainLink, ChainNames, ChainOutcome, ExtensionChain,
    ExtensionResult,
};
pub use config::{NamingConfig, ProcessorConfig, RenderOptions};
pub use context::Context;
pub use decl::{DeclKind, Declarations, MethodDecl, Modifier, ParamDecl, TypeDecl};
pub use diagnostics::{
    CollectingMessager, Diagnostic, Messager, Severity, SourceLocation, TracingMessager,
};
pub use error::{Error, Result};
pub use extension::{merged_supported_options, Extension};
pub use filer::{Env, Filer, FilerError, FsFiler, InMemoryFiler, ProcessingEnv};
pub use processor::{ClassReport, ProcessingReport, Processor};
pub use property::{PropertyDescriptor, PropertyError, PropertyModel};
pub use render::{pass_through_class, JavaGenerator, RenderConfig};
pub use types::{Primitive, TypeBindings, TypeRef};
pub use universe::{Method, MethodRef, TypeElement, TypeUniverse, Visibility};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
