//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use valuegen::*;

pub type TestEnv = Env<CollectingMessager, InMemoryFiler>;

/// `foo.bar.Baz` with properties `foo: String` and `bar: int`
pub const BAZ: &str = r#"
source: Baz.java
types:
  - name: Baz
    package: foo.bar
    value: true
    line: 6
    methods:
      - { name: foo, returns: String, modifiers: [abstract], line: 7 }
      - { name: bar, returns: int, modifiers: [abstract], line: 8 }
"#;

pub fn universe(yaml: &str) -> TypeUniverse {
    TypeUniverse::from_decls(&Declarations::from_yaml(yaml).unwrap()).unwrap()
}

pub fn env() -> TestEnv {
    Env::new(CollectingMessager::new(), InMemoryFiler::new())
}

fn quiet_config() -> ProcessorConfig {
    let mut config = ProcessorConfig::default();
    config.render.provenance = false;
    config.render.generated_annotation = false;
    config
}

/// Run the processor over `yaml` with `extensions`
pub fn process(yaml: &str, extensions: Vec<Box<dyn Extension>>) -> (ProcessingReport, TestEnv) {
    let universe = universe(yaml);
    let env = env();
    let report = Processor::new(extensions, quiet_config()).process(&universe, &env);
    (report, env)
}

pub fn error_messages(env: &TestEnv) -> Vec<String> {
    env.messager.errors().into_iter().map(|d| d.message).collect()
}

pub fn warning_messages(env: &TestEnv) -> Vec<String> {
    env.messager.warnings().into_iter().map(|d| d.message).collect()
}

/// Log of calls made to test extensions, shared between them
pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

type MethodPicker = Box<dyn Fn(&Context<'_>) -> BTreeSet<MethodRef>>;

/// What a test extension returns from `generate_class`
pub enum Output {
    /// `None`
    Nothing,
    /// A pass-through class
    PassThrough,
    /// Whitespace only
    Blank,
    /// A side file written through the filer, and no class
    SideFile(&'static str),
}

/// An extension configured field by field
pub struct TestExtension {
    pub name: &'static str,
    pub applicable: bool,
    pub is_final: bool,
    pub properties: Vec<&'static str>,
    pub methods: Option<MethodPicker>,
    pub output: Output,
    pub options: Vec<&'static str>,
    pub log: CallLog,
}

impl TestExtension {
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            applicable: true,
            is_final: false,
            properties: Vec::new(),
            methods: None,
            output: Output::PassThrough,
            options: Vec::new(),
            log: Rc::clone(log),
        }
    }

    pub fn final_(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn consuming(mut self, properties: &[&'static str]) -> Self {
        self.properties = properties.to_vec();
        self
    }

    pub fn consuming_methods(
        mut self,
        picker: impl Fn(&Context<'_>) -> BTreeSet<MethodRef> + 'static,
    ) -> Self {
        self.methods = Some(Box::new(picker));
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn boxed(self) -> Box<dyn Extension> {
        Box::new(self)
    }
}

impl Extension for TestExtension {
    fn name(&self) -> &str {
        self.name
    }

    fn applicable(&self, _context: &Context<'_>) -> bool {
        self.applicable
    }

    fn must_be_final(&self, _context: &Context<'_>) -> bool {
        self.is_final
    }

    fn consume_properties(&self, _context: &Context<'_>) -> BTreeSet<String> {
        self.properties.iter().map(|s| s.to_string()).collect()
    }

    fn consume_methods(&self, context: &Context<'_>) -> BTreeSet<MethodRef> {
        self.methods
            .as_ref()
            .map(|pick| pick(context))
            .unwrap_or_default()
    }

    fn generate_class(
        &self,
        context: &Context<'_>,
        class_name: &str,
        class_to_extend: &str,
        is_final: bool,
    ) -> Option<String> {
        self.log.borrow_mut().push(format!(
            "{}: {} extends {}{}",
            self.name,
            class_name,
            class_to_extend,
            if is_final { " (final)" } else { "" }
        ));
        match &self.output {
            Output::Nothing => None,
            Output::Blank => Some("  \n\t".to_string()),
            Output::PassThrough => Some(pass_through_class(
                context,
                class_name,
                class_to_extend,
                is_final,
                &[],
            )),
            Output::SideFile(name) => {
                let qualified = format!("{}.{}", context.package_name(), name);
                let source = format!("package {};\n\nclass {} {{}}\n", context.package_name(), name);
                context
                    .processing_env()
                    .filer()
                    .create_source_file(&qualified, &source, context.location())
                    .unwrap();
                None
            }
        }
    }

    fn supported_options(&self) -> BTreeSet<String> {
        self.options.iter().map(|s| s.to_string()).collect()
    }
}

/// Reference of the abstract method `name` of the value class
pub fn abstract_method(context: &Context<'_>, name: &str) -> MethodRef {
    context
        .all_abstract_methods()
        .iter()
        .find(|m| m.name == name)
        .map(|m| m.reference().clone())
        .unwrap()
}
