//! Type descriptors
//!
//! `TypeRef` is the resolved shape of a Java type as seen by the generator:
//! primitives, `void`, declared (possibly parameterized) types, arrays, type
//! variables and wildcards. Declaration files spell types textually; `parse`
//! turns that text into an unresolved `TypeRef` whose bare identifiers are
//! later bound to type variables or qualified names by the universe.
//!
//! Generic substitution is an explicit `TypeBindings` map from type-variable
//! name to concrete type, applied structurally.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl Primitive {
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Char => "char",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        Some(match s {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "short" => Primitive::Short,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "char" => Primitive::Char,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            _ => return None,
        })
    }

    /// Simple name of the `java.lang` wrapper class
    pub fn boxed(self) -> &'static str {
        match self {
            Primitive::Boolean => "Boolean",
            Primitive::Byte => "Byte",
            Primitive::Short => "Short",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Char => "Character",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
        }
    }
}

/// Wildcard bound (`?`, `? extends T`, `? super T`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<TypeRef>),
    Super(Box<TypeRef>),
}

/// A type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    Primitive(Primitive),
    Void,
    /// Declared type by qualified name, with type arguments (empty when raw)
    Declared { name: String, args: Vec<TypeRef> },
    Array(Box<TypeRef>),
    /// Type variable
    Var(String),
    Wildcard(WildcardBound),
}

impl TypeRef {
    pub fn declared(name: impl Into<String>) -> Self {
        TypeRef::Declared {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Declared {
            name: name.into(),
            args,
        }
    }

    pub fn array_of(component: TypeRef) -> Self {
        TypeRef::Array(Box::new(component))
    }

    pub fn var(name: impl Into<String>) -> Self {
        TypeRef::Var(name.into())
    }

    pub fn string() -> Self {
        TypeRef::declared("java.lang.String")
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }

    /// Array component type
    pub fn component(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(c) => Some(c),
            _ => None,
        }
    }

    /// Qualified name of a declared type, without type arguments
    pub fn raw_name(&self) -> Option<&str> {
        match self {
            TypeRef::Declared { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Type arguments of a declared type
    pub fn type_args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Declared { args, .. } => args,
            _ => &[],
        }
    }

    /// True if this is the declared type `name`, with any arguments
    pub fn is_declared(&self, name: &str) -> bool {
        self.raw_name() == Some(name)
    }

    /// Substitute type variables through `bindings`, recursively
    pub fn substitute(&self, bindings: &TypeBindings) -> TypeRef {
        match self {
            TypeRef::Var(v) => bindings.get(v).cloned().unwrap_or_else(|| self.clone()),
            TypeRef::Declared { name, args } => TypeRef::Declared {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            TypeRef::Array(c) => TypeRef::Array(Box::new(c.substitute(bindings))),
            TypeRef::Wildcard(WildcardBound::Extends(b)) => {
                TypeRef::Wildcard(WildcardBound::Extends(Box::new(b.substitute(bindings))))
            }
            TypeRef::Wildcard(WildcardBound::Super(b)) => {
                TypeRef::Wildcard(WildcardBound::Super(Box::new(b.substitute(bindings))))
            }
            TypeRef::Primitive(_) | TypeRef::Void | TypeRef::Wildcard(WildcardBound::Unbounded) => {
                self.clone()
            }
        }
    }

    /// Render as Java source relative to `package`: `java.lang` and
    /// same-package top-level names are written simply.
    pub fn to_source(&self, package: &str) -> String {
        match self {
            TypeRef::Primitive(p) => p.keyword().to_string(),
            TypeRef::Void => "void".to_string(),
            TypeRef::Var(v) => v.clone(),
            TypeRef::Array(c) => format!("{}[]", c.to_source(package)),
            TypeRef::Wildcard(WildcardBound::Unbounded) => "?".to_string(),
            TypeRef::Wildcard(WildcardBound::Extends(b)) => {
                format!("? extends {}", b.to_source(package))
            }
            TypeRef::Wildcard(WildcardBound::Super(b)) => {
                format!("? super {}", b.to_source(package))
            }
            TypeRef::Declared { name, args } => {
                let mut out = short_name(name, package).to_string();
                if !args.is_empty() {
                    let rendered: Vec<_> = args.iter().map(|a| a.to_source(package)).collect();
                    out.push('<');
                    out.push_str(&rendered.join(", "));
                    out.push('>');
                }
                out
            }
        }
    }

    /// Collect free type variables, in order of first appearance
    pub fn type_vars(&self, out: &mut Vec<String>) {
        match self {
            TypeRef::Var(v) => {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
            TypeRef::Declared { args, .. } => args.iter().for_each(|a| a.type_vars(out)),
            TypeRef::Array(c) => c.type_vars(out),
            TypeRef::Wildcard(WildcardBound::Extends(b) | WildcardBound::Super(b)) => {
                b.type_vars(out)
            }
            _ => {}
        }
    }

    /// Parse textual type syntax into an unresolved descriptor.
    ///
    /// Identifiers are kept as written in `Declared` names; binding them to
    /// type variables or qualified names is the universe's job.
    pub fn parse(input: &str) -> Result<TypeRef, TypeParseError> {
        let mut parser = Parser::new(input);
        parser.skip_ws();
        if parser.at_end() {
            return Err(TypeParseError::Empty);
        }
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(TypeParseError::Trailing {
                input: input.to_string(),
                pos: parser.pos,
            });
        }
        Ok(ty)
    }
}

fn short_name<'a>(qualified: &'a str, package: &str) -> &'a str {
    if let Some(rest) = qualified.strip_prefix("java.lang.") {
        if !rest.contains('.') {
            return rest;
        }
    }
    if !package.is_empty() {
        if let Some(rest) = qualified.strip_prefix(package) {
            if let Some(rest) = rest.strip_prefix('.') {
                return rest;
            }
        }
    }
    qualified
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => write!(f, "{}", p.keyword()),
            TypeRef::Void => write!(f, "void"),
            TypeRef::Var(v) => write!(f, "{}", v),
            TypeRef::Array(c) => write!(f, "{}[]", c),
            TypeRef::Wildcard(WildcardBound::Unbounded) => write!(f, "?"),
            TypeRef::Wildcard(WildcardBound::Extends(b)) => write!(f, "? extends {}", b),
            TypeRef::Wildcard(WildcardBound::Super(b)) => write!(f, "? super {}", b),
            TypeRef::Declared { name, args } => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    let rendered: Vec<_> = args.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", rendered.join(","))?;
                }
                Ok(())
            }
        }
    }
}

impl std::str::FromStr for TypeRef {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeRef::parse(s)
    }
}

/// Type-variable substitution map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeBindings {
    map: HashMap<String, TypeRef>,
}

impl TypeBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, var: impl Into<String>, ty: TypeRef) {
        self.map.insert(var.into(), ty);
    }

    pub fn get(&self, var: &str) -> Option<&TypeRef> {
        self.map.get(var)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Bindings seen inside a supertype instantiation.
    ///
    /// `params` are the supertype's declared type parameters and `args` the
    /// arguments it was instantiated with in the subtype, which may mention
    /// the subtype's own variables, so they are resolved through `self`
    /// first. A raw instantiation binds nothing.
    pub fn for_supertype(&self, params: &[String], args: &[TypeRef]) -> TypeBindings {
        let mut next = TypeBindings::new();
        if params.len() == args.len() {
            for (param, arg) in params.iter().zip(args) {
                next.bind(param.clone(), arg.substitute(self));
            }
        }
        next
    }
}

/// Type syntax errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeParseError {
    #[error("empty type")]
    Empty,

    #[error("unexpected '{ch}' at {pos} in `{input}`")]
    Unexpected { ch: char, pos: usize, input: String },

    #[error("unexpected end of `{input}`")]
    UnexpectedEnd { input: String },

    #[error("trailing input at {pos} in `{input}`")]
    Trailing { input: String, pos: usize },
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> TypeParseError {
        match self.peek() {
            Some(ch) => TypeParseError::Unexpected {
                ch,
                pos: self.pos,
                input: self.input.to_string(),
            },
            None => TypeParseError::UnexpectedEnd {
                input: self.input.to_string(),
            },
        }
    }

    fn expect(&mut self, ch: char) -> Result<(), TypeParseError> {
        self.skip_ws();
        if self.peek() == Some(ch) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn ident(&mut self) -> Result<String, TypeParseError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            let ok = if self.pos == start {
                c.is_alphabetic() || c == '_' || c == '$'
            } else {
                c.is_alphanumeric() || c == '_' || c == '$'
            };
            if !ok {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_type(&mut self) -> Result<TypeRef, TypeParseError> {
        self.skip_ws();
        if self.peek() == Some('?') {
            self.pos += 1;
            return self.parse_wildcard();
        }

        let mut name = self.ident()?;
        loop {
            self.skip_ws();
            if self.peek() != Some('.') {
                break;
            }
            self.pos += 1;
            name.push('.');
            name.push_str(&self.ident()?);
        }

        let mut ty = if name == "void" {
            TypeRef::Void
        } else if let Some(p) = Primitive::from_keyword(&name) {
            TypeRef::Primitive(p)
        } else {
            let mut args = Vec::new();
            self.skip_ws();
            if self.peek() == Some('<') {
                self.pos += 1;
                loop {
                    args.push(self.parse_type()?);
                    self.skip_ws();
                    match self.peek() {
                        Some(',') => self.pos += 1,
                        Some('>') => {
                            self.pos += 1;
                            break;
                        }
                        _ => return Err(self.unexpected()),
                    }
                }
            }
            TypeRef::Declared { name, args }
        };

        loop {
            self.skip_ws();
            if self.peek() != Some('[') {
                break;
            }
            self.pos += 1;
            self.expect(']')?;
            ty = TypeRef::array_of(ty);
        }
        Ok(ty)
    }

    fn parse_wildcard(&mut self) -> Result<TypeRef, TypeParseError> {
        self.skip_ws();
        let save = self.pos;
        match self.ident() {
            Ok(kw) if kw == "extends" => Ok(TypeRef::Wildcard(WildcardBound::Extends(Box::new(
                self.parse_type()?,
            )))),
            Ok(kw) if kw == "super" => Ok(TypeRef::Wildcard(WildcardBound::Super(Box::new(
                self.parse_type()?,
            )))),
            _ => {
                self.pos = save;
                Ok(TypeRef::Wildcard(WildcardBound::Unbounded))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_generics() {
        let ty = TypeRef::parse("java.util.Map<String, java.util.List<T>>").unwrap();
        assert_eq!(
            ty,
            TypeRef::generic(
                "java.util.Map",
                vec![
                    TypeRef::declared("String"),
                    TypeRef::generic("java.util.List", vec![TypeRef::declared("T")]),
                ]
            )
        );
    }

    #[test]
    fn test_parse_arrays_and_primitives() {
        assert_eq!(
            TypeRef::parse("int[]").unwrap(),
            TypeRef::array_of(TypeRef::Primitive(Primitive::Int))
        );
        assert_eq!(
            TypeRef::parse("String [] []").unwrap(),
            TypeRef::array_of(TypeRef::array_of(TypeRef::declared("String")))
        );
        assert_eq!(TypeRef::parse("void").unwrap(), TypeRef::Void);
    }

    #[test]
    fn test_parse_wildcards() {
        let ty = TypeRef::parse("Iterable<? extends E>").unwrap();
        assert_eq!(
            ty.type_args(),
            &[TypeRef::Wildcard(WildcardBound::Extends(Box::new(
                TypeRef::declared("E")
            )))]
        );
        let ty = TypeRef::parse("List<?>").unwrap();
        assert_eq!(ty.type_args(), &[TypeRef::Wildcard(WildcardBound::Unbounded)]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(TypeRef::parse("  "), Err(TypeParseError::Empty));
        assert!(matches!(
            TypeRef::parse("List<String"),
            Err(TypeParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            TypeRef::parse("List<String>>"),
            Err(TypeParseError::Trailing { .. })
        ));
        assert!(matches!(
            TypeRef::parse("int[)"),
            Err(TypeParseError::Unexpected { ch: ')', .. })
        ));
    }

    #[test]
    fn test_substitute_nested() {
        let mut bindings = TypeBindings::new();
        bindings.bind("T", TypeRef::string());
        let list_t = TypeRef::generic("java.util.List", vec![TypeRef::var("T")]);
        assert_eq!(
            list_t.substitute(&bindings).to_string(),
            "java.util.List<java.lang.String>"
        );
        let arr = TypeRef::array_of(TypeRef::var("T"));
        assert_eq!(arr.substitute(&bindings).to_string(), "java.lang.String[]");
        assert_eq!(TypeRef::var("U").substitute(&bindings), TypeRef::var("U"));
    }

    #[test]
    fn test_for_supertype_chains_bindings() {
        // class Baz<X> implements Parent<List<X>>, instantiated as Baz<String>
        let mut outer = TypeBindings::new();
        outer.bind("X", TypeRef::string());
        let inner = outer.for_supertype(
            &["T".to_string()],
            &[TypeRef::generic("java.util.List", vec![TypeRef::var("X")])],
        );
        assert_eq!(
            inner.get("T").map(|t| t.to_string()),
            Some("java.util.List<java.lang.String>".to_string())
        );
        assert!(outer.for_supertype(&["T".to_string()], &[]).is_empty());
    }

    #[test]
    fn test_to_source_shortens_names() {
        let ty = TypeRef::generic(
            "java.util.List",
            vec![TypeRef::string(), TypeRef::declared("foo.bar.Baz.Builder")],
        );
        assert_eq!(ty.to_source("foo.bar"), "java.util.List<String, Baz.Builder>");
    }
}
