//! Extension capability set
//!
//! An extension takes part in generating a value class: it may claim
//! properties and abstract methods so the base generator leaves them alone,
//! and it may contribute a class to the inheritance chain between the base
//! implementation and the terminal class.
//!
//! Extensions see the `Context` read-only. Consumption happens by
//! declaring claims, which the chain runner validates and commits.

use crate::context::Context;
use crate::universe::MethodRef;
use std::collections::BTreeSet;

pub trait Extension {
    /// Identifier used in diagnostics. Defaults to the implementing type's path.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether the extension takes part in generating this class at all
    fn applicable(&self, _context: &Context<'_>) -> bool {
        false
    }

    /// Whether the extension must generate the terminal class
    fn must_be_final(&self, _context: &Context<'_>) -> bool {
        false
    }

    /// Properties the extension implements itself
    fn consume_properties(&self, _context: &Context<'_>) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Abstract methods the extension implements itself
    fn consume_methods(&self, _context: &Context<'_>) -> BTreeSet<MethodRef> {
        BTreeSet::new()
    }

    /// Source of a class named `class_name` extending `class_to_extend`.
    ///
    /// `None` means the extension contributes no class; it may still have
    /// written other files through the context's `ProcessingEnv`.
    fn generate_class(
        &self,
        context: &Context<'_>,
        class_name: &str,
        class_to_extend: &str,
        is_final: bool,
    ) -> Option<String>;

    /// Option keys the extension understands
    fn supported_options(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// Every option key understood by `extensions`, plus `own`
pub fn merged_supported_options(
    own: &[&str],
    extensions: &[Box<dyn Extension>],
) -> BTreeSet<String> {
    let mut options: BTreeSet<String> = own.iter().map(|s| s.to_string()).collect();
    for extension in extensions {
        options.extend(extension.supported_options());
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quiet;

    impl Extension for Quiet {
        fn generate_class(&self, _: &Context<'_>, _: &str, _: &str, _: bool) -> Option<String> {
            None
        }
    }

    struct WithOption;

    impl Extension for WithOption {
        fn name(&self) -> &str {
            "with-option"
        }

        fn generate_class(&self, _: &Context<'_>, _: &str, _: &str, _: bool) -> Option<String> {
            None
        }

        fn supported_options(&self) -> BTreeSet<String> {
            BTreeSet::from(["customAnnotation.customOption".to_string()])
        }
    }

    #[test]
    fn test_default_name_is_type_path() {
        assert!(Quiet.name().ends_with("Quiet"));
        assert_eq!(WithOption.name(), "with-option");
    }

    #[test]
    fn test_merged_supported_options() {
        let extensions: Vec<Box<dyn Extension>> = vec![Box::new(Quiet), Box::new(WithOption)];
        let options = merged_supported_options(&["valuegen.debug"], &extensions);
        assert!(options.contains("customAnnotation.customOption"));
        assert!(options.contains("valuegen.debug"));
        assert_eq!(options.len(), 2);
    }
}
