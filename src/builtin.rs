//! Built-in extensions, selectable by id from the CLI and config

use crate::context::Context;
use crate::error::{Error, Result};
use crate::extension::Extension;
use crate::render::pass_through_class;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Ids accepted by [`by_name`]
pub const BUILTIN_NAMES: &[&str] = &["serializable", "final-marker"];

/// Option overriding the derived `serialVersionUID`
pub const SERIAL_VERSION_OPTION: &str = "valuegen.serializable.serialVersionUID";

pub fn by_name(name: &str) -> Option<Box<dyn Extension>> {
    match name {
        "serializable" => Some(Box::new(SerializableExtension)),
        "final-marker" => Some(Box::new(FinalMarkerExtension)),
        _ => None,
    }
}

/// Instantiate built-ins in the given order
pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<Box<dyn Extension>>> {
    names
        .iter()
        .map(|n| {
            by_name(n.as_ref()).ok_or_else(|| {
                Error::Config(format!(
                    "unknown extension `{}` (known: {})",
                    n.as_ref(),
                    BUILTIN_NAMES.join(", ")
                ))
            })
        })
        .collect()
}

/// Adds `serialVersionUID` to value classes implementing `java.io.Serializable`
#[derive(Debug, Default, Clone, Copy)]
pub struct SerializableExtension;

impl Extension for SerializableExtension {
    fn name(&self) -> &str {
        "serializable"
    }

    fn applicable(&self, context: &Context<'_>) -> bool {
        context
            .types()
            .is_subtype_of(context.value_class(), "java.io.Serializable")
    }

    fn generate_class(
        &self,
        context: &Context<'_>,
        class_name: &str,
        class_to_extend: &str,
        is_final: bool,
    ) -> Option<String> {
        let env = context.processing_env();
        let uid = match env.options().get(SERIAL_VERSION_OPTION) {
            Some(value) => match value.trim().trim_end_matches(['L', 'l']).parse::<i64>() {
                Ok(uid) => uid,
                Err(_) => {
                    env.messager().warning(
                        &format!(
                            "Option {} is not a long value, using the derived serialVersionUID: {}",
                            SERIAL_VERSION_OPTION, value
                        ),
                        context.location(),
                    );
                    serial_version_uid(context)
                }
            },
            None => serial_version_uid(context),
        };
        let member = format!("private static final long serialVersionUID = {}L;", uid);
        Some(pass_through_class(
            context,
            class_name,
            class_to_extend,
            is_final,
            &[member],
        ))
    }

    fn supported_options(&self) -> BTreeSet<String> {
        BTreeSet::from([SERIAL_VERSION_OPTION.to_string()])
    }
}

/// Stable across runs: depends only on the class name and its properties
pub fn serial_version_uid(context: &Context<'_>) -> i64 {
    let mut hasher = Sha256::new();
    hasher.update(context.value_class().qualified_name.as_bytes());
    for p in context.all_properties() {
        hasher.update(format!(";{}:{}", p.name, p.ty).as_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}

/// Always applicable and always final: closes the chain itself
#[derive(Debug, Default, Clone, Copy)]
pub struct FinalMarkerExtension;

impl Extension for FinalMarkerExtension {
    fn name(&self) -> &str {
        "final-marker"
    }

    fn applicable(&self, _context: &Context<'_>) -> bool {
        true
    }

    fn must_be_final(&self, _context: &Context<'_>) -> bool {
        true
    }

    fn generate_class(
        &self,
        context: &Context<'_>,
        class_name: &str,
        class_to_extend: &str,
        is_final: bool,
    ) -> Option<String> {
        Some(pass_through_class(
            context,
            class_name,
            class_to_extend,
            is_final,
            &[],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_names() {
        let extensions = from_names(&["final-marker", "serializable"]).unwrap();
        let names: Vec<_> = extensions.iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["final-marker", "serializable"]);
    }

    #[test]
    fn test_unknown_name() {
        let err = from_names(&["nope"]).err().unwrap();
        assert!(err.to_string().contains("unknown extension `nope`"));
    }
}
