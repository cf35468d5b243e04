//! Declaration file format
//!
//! The generator does not parse Java itself. A front end hands it the
//! abstract declarations it found, as YAML or JSON:
//!
//! ```yaml
//! types:
//!   - name: Baz
//!     package: foo.bar
//!     value: true
//!     line: 6
//!     methods:
//!       - name: foo
//!         returns: String
//!         modifiers: [abstract]
//!       - name: builder
//!         returns: Builder
//!         modifiers: [static]
//!     nested:
//!       - name: Builder
//!         builder: true
//!         methods:
//!           - name: setFoo
//!             returns: Builder
//!             params: [{ name: foo, type: String }]
//!             modifiers: [abstract]
//!           - name: build
//!             returns: Baz
//!             modifiers: [abstract]
//! ```
//!
//! Types are kept as text here; `TypeUniverse::from_decls` parses and
//! resolves them.

use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A declaration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "valuegen declarations", description = "Abstract type declarations")]
pub struct Declarations {
    /// Source file the declarations came from, used in diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Top-level types
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

/// Class or interface
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    #[default]
    Class,
    Interface,
}

/// A type declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TypeDecl {
    /// Simple name
    pub name: String,

    /// Package (inherited from the enclosing type for nested declarations)
    #[serde(default)]
    pub package: String,

    #[serde(default)]
    pub kind: DeclKind,

    /// Type parameter names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<String>,

    /// Superclass and interfaces, e.g. `Parent<String>`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<String>,

    /// Marks the value class whose implementation is generated
    #[serde(default)]
    pub value: bool,

    /// Marks the nested builder of a value class
    #[serde(default)]
    pub builder: bool,

    /// Declaration line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    #[serde(default)]
    pub methods: Vec<MethodDecl>,

    /// Nested types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<TypeDecl>,
}

/// A method declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MethodDecl {
    pub name: String,

    /// Return type text; `void` when omitted
    #[serde(default = "default_returns")]
    pub returns: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDecl>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

fn default_returns() -> String {
    "void".to_string()
}

/// A method parameter
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ParamDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub typ: String,
}

/// Method modifiers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Static,
    Default,
    Final,
}

impl Declarations {
    /// Parse declarations from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_norway::from_str(yaml).map_err(|e| Error::DeclParse(e.to_string()))
    }

    /// Parse declarations from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::DeclParse(e.to_string()))
    }

    /// Serialize declarations to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_norway::to_string(self).map_err(|e| Error::DeclParse(e.to_string()))
    }

    /// Load a `.yaml`/`.yml`/`.json` file, recording its path as the source
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut decls = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_yaml(&content)?,
        };
        if decls.source.is_none() {
            decls.source = Some(path.display().to_string());
        }
        Ok(decls)
    }

    /// Hash of the declarations for provenance headers
    pub fn hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let content = self.to_yaml().unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("sha256:{}", hex::encode(&hasher.finalize()[..8]))
    }
}

impl MethodDecl {
    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
types:
  - name: Baz
    package: foo.bar
    value: true
    line: 3
    methods:
      - name: foo
        returns: String
        modifiers: [abstract]
      - name: frob
        params: [{ name: x, type: int }]
"#;
        let decls = Declarations::from_yaml(yaml).unwrap();
        assert_eq!(decls.types.len(), 1);
        let baz = &decls.types[0];
        assert!(baz.value);
        assert_eq!(baz.kind, DeclKind::Class);
        assert_eq!(baz.line, Some(3));
        assert!(baz.methods[0].has(Modifier::Abstract));
        assert_eq!(baz.methods[1].returns, "void");
        assert_eq!(baz.methods[1].params[0].typ, "int");
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"types":[{"name":"Parent","package":"foo.bar","kind":"interface","type_params":["T"]}]}"#;
        let decls = Declarations::from_json(json).unwrap();
        assert_eq!(decls.types[0].kind, DeclKind::Interface);
        assert_eq!(decls.types[0].type_params, vec!["T".to_string()]);
    }

    #[test]
    fn test_bad_yaml_is_decl_parse_error() {
        let err = Declarations::from_yaml("types: [{ name: 3, methods: 7 }]").unwrap_err();
        assert!(matches!(err, Error::DeclParse(_)));
    }

    #[test]
    fn test_hash_is_stable() {
        let decls = Declarations::from_yaml("types: [{ name: Baz, package: p }]").unwrap();
        assert_eq!(decls.hash(), decls.clone().hash());
        assert!(decls.hash().starts_with("sha256:"));
    }
}
