//! Batch driver: runs the whole pipeline for every value class
//!
//! Each value class is processed independently. A failure is reported at
//! the offending declaration and the rest of the batch carries on. Failures
//! before file output leave nothing behind for that class; a failed write
//! keeps whatever the filer already accepted.

use crate::builder;
use crate::chain::{ChainNames, ChainOutcome, ExtensionChain};
use crate::config::{validate_prefix, ProcessorConfig};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::extension::{merged_supported_options, Extension};
use crate::filer::ProcessingEnv;
use crate::property;
use crate::render::{JavaGenerator, RenderConfig};
use crate::universe::{TypeElement, TypeUniverse};
use std::collections::BTreeSet;

/// Option overriding `naming.prefix` for one run
pub const PREFIX_OPTION: &str = "valuegen.prefix";

/// Options the processor itself understands
pub const PROCESSOR_OPTIONS: &[&str] = &[PREFIX_OPTION];

pub struct Processor {
    extensions: Vec<Box<dyn Extension>>,
    config: ProcessorConfig,
    render: RenderConfig,
}

/// What was generated for one value class
#[derive(Debug, Clone)]
pub struct ClassReport {
    pub value_class: String,
    /// Qualified names of the files written, base class first
    pub files: Vec<String>,
    pub outcome: ChainOutcome,
}

#[derive(Debug, Default)]
pub struct ProcessingReport {
    pub generated: Vec<ClassReport>,
    /// Value classes that failed; diagnostics went to the messager
    pub failed: Vec<String>,
}

impl ProcessingReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn class(&self, qualified_name: &str) -> Option<&ClassReport> {
        self.generated
            .iter()
            .find(|c| c.value_class == qualified_name)
    }
}

impl Processor {
    pub fn new(extensions: Vec<Box<dyn Extension>>, config: ProcessorConfig) -> Self {
        let render = config.render_config();
        Self {
            extensions,
            config,
            render,
        }
    }

    /// Replace the render configuration, e.g. to add provenance details
    pub fn with_render_config(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    pub fn extensions(&self) -> &[Box<dyn Extension>] {
        &self.extensions
    }

    /// The processor's own options plus every extension's
    pub fn supported_options(&self) -> BTreeSet<String> {
        merged_supported_options(PROCESSOR_OPTIONS, &self.extensions)
    }

    pub fn process(&self, universe: &TypeUniverse, env: &dyn ProcessingEnv) -> ProcessingReport {
        let mut report = ProcessingReport::default();
        for class in universe.value_classes() {
            let span = tracing::info_span!("process", class = %class.qualified_name);
            let _guard = span.enter();
            match self.process_class(universe, class, env) {
                Ok(generated) => {
                    tracing::info!(files = generated.files.len(), "generated value class");
                    report.generated.push(generated);
                }
                Err(err) => {
                    tracing::debug!(error = %err, "value class failed");
                    report_failure(env, class, &err);
                    report.failed.push(class.qualified_name.clone());
                }
            }
        }
        report
    }

    fn prefix<'e>(&'e self, env: &'e dyn ProcessingEnv) -> Result<&'e str> {
        match env.options().get(PREFIX_OPTION) {
            Some(prefix) => {
                validate_prefix(PREFIX_OPTION, prefix)?;
                Ok(prefix.as_str())
            }
            None => Ok(self.config.naming.prefix.as_str()),
        }
    }

    /// Files are written base class first. A write that fails leaves the
    /// files already written for this class in the filer.
    fn process_class(
        &self,
        universe: &TypeUniverse,
        class: &TypeElement,
        env: &dyn ProcessingEnv,
    ) -> Result<ClassReport> {
        let model = property::extract(universe, class)?;
        let builder_model = match universe.builder_of(class) {
            Some(b) => Some(builder::classify(universe, class, b, &model)?),
            None => None,
        };
        let mut context = Context::new(universe, class, model, builder_model, env);
        let names = ChainNames::for_class(class, self.prefix(env)?);
        let outcome = ExtensionChain::new(&self.extensions).run(&mut context, &names)?;

        let generator = JavaGenerator::new(&self.render);
        let mut sources = vec![(names.base(), generator.base_class(&context, &names))];
        sources.extend(
            outcome
                .links
                .iter()
                .map(|l| (l.class_name.clone(), l.source.clone())),
        );
        if outcome.needs_default_terminal() {
            let terminal = generator.default_terminal(
                &context,
                names.terminal(),
                &outcome.terminal_parent(),
            );
            sources.push((names.terminal().to_string(), terminal));
        }

        let mut files = Vec::with_capacity(sources.len());
        for (name, source) in &sources {
            let qualified = qualify(&class.package, name);
            env.filer()
                .create_source_file(&qualified, source, &class.location)?;
            files.push(qualified);
        }
        Ok(ClassReport {
            value_class: class.qualified_name.clone(),
            files,
            outcome,
        })
    }
}

fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", package, name)
    }
}

fn report_failure(env: &dyn ProcessingEnv, class: &TypeElement, err: &Error) {
    let messager = env.messager();
    match err {
        Error::Property(e) => messager.error(&e.to_string(), e.location()),
        Error::Builder(e) => messager.error(&e.to_string(), e.location()),
        Error::Chain(failure) => {
            for e in &failure.errors {
                messager.error(&e.to_string(), &failure.location);
            }
        }
        other => messager.error(&other.to_string(), &class.location),
    }
}
