//! Resolved type universe
//!
//! `TypeUniverse` holds every known declaration by qualified name, with all
//! textual types parsed and resolved. It answers the questions the property
//! and builder models ask: which methods does a type declare or inherit, and
//! what are their types once the supertype's type arguments are substituted.

use crate::decl::{DeclKind, Declarations, MethodDecl, Modifier, TypeDecl};
use crate::diagnostics::SourceLocation;
use crate::error::{Error, Result};
use crate::types::{Primitive, TypeBindings, TypeRef, WildcardBound};
use std::collections::{HashMap, HashSet};
use std::fmt;

const JAVA_LANG: &[&str] = &[
    "Boolean",
    "Byte",
    "CharSequence",
    "Character",
    "Class",
    "Comparable",
    "Double",
    "Enum",
    "Float",
    "Integer",
    "Iterable",
    "Long",
    "Number",
    "Object",
    "Override",
    "Short",
    "String",
    "Void",
];

/// Method visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    Package,
    Private,
}

impl Visibility {
    /// Keyword with trailing space, empty for package-private
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public ",
            Visibility::Protected => "protected ",
            Visibility::Package => "",
            Visibility::Private => "private ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub is_abstract: bool,
    pub is_static: bool,
    pub is_final: bool,
    pub visibility: Visibility,
}

/// A method parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
}

/// Stable identity of a method: declaring type, name and declared
/// parameter types. Substitution never changes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub params: Vec<TypeRef>,
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<_> = self.params.iter().map(|p| p.to_string()).collect();
        write!(f, "{}.{}({})", self.owner, self.name, params.join(","))
    }
}

/// A method as seen from some type: types are substituted for the
/// instantiation it was reached through.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub owner: String,
    pub name: String,
    pub return_type: TypeRef,
    pub params: Vec<Parameter>,
    pub modifiers: Modifiers,
    pub location: SourceLocation,
    reference: MethodRef,
}

impl Method {
    pub fn reference(&self) -> &MethodRef {
        &self.reference
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Override-equivalence key: name plus substituted parameter types
    pub fn signature_key(&self) -> String {
        let params: Vec<_> = self.params.iter().map(|p| p.ty.to_string()).collect();
        format!("{}({})", self.name, params.join(","))
    }

    pub fn substitute(&self, bindings: &TypeBindings) -> Method {
        if bindings.is_empty() {
            return self.clone();
        }
        Method {
            return_type: self.return_type.substitute(bindings),
            params: self
                .params
                .iter()
                .map(|p| Parameter {
                    name: p.name.clone(),
                    ty: p.ty.substitute(bindings),
                })
                .collect(),
            ..self.clone()
        }
    }

    /// `toString()`, `hashCode()` or `equals(Object)`
    pub fn is_object_method(&self) -> bool {
        match (self.name.as_str(), self.params.as_slice()) {
            ("toString", []) | ("hashCode", []) => true,
            ("equals", [p]) => p.ty.is_declared("java.lang.Object"),
            _ => false,
        }
    }
}

/// A resolved type declaration
#[derive(Debug, Clone)]
pub struct TypeElement {
    pub qualified_name: String,
    pub simple_name: String,
    pub package: String,
    pub kind: DeclKind,
    pub type_params: Vec<String>,
    pub supertypes: Vec<TypeRef>,
    pub methods: Vec<Method>,
    /// Qualified name of the enclosing type, for nested declarations
    pub enclosing: Option<String>,
    /// Qualified names of nested types
    pub nested: Vec<String>,
    pub is_value: bool,
    pub is_builder: bool,
    pub location: SourceLocation,
}

impl TypeElement {
    /// The type as used from inside its own body: `Baz<T>`
    pub fn as_type(&self) -> TypeRef {
        TypeRef::generic(
            self.qualified_name.clone(),
            self.type_params.iter().map(TypeRef::var).collect(),
        )
    }

    /// Name relative to the package with nesting flattened: `Outer_Inner`
    pub fn flat_name(&self) -> String {
        let relative = if self.package.is_empty() {
            self.qualified_name.as_str()
        } else {
            self.qualified_name
                .strip_prefix(&self.package)
                .and_then(|r| r.strip_prefix('.'))
                .unwrap_or(&self.qualified_name)
        };
        relative.replace('.', "_")
    }

    pub fn is_interface(&self) -> bool {
        self.kind == DeclKind::Interface
    }
}

/// All known declarations
#[derive(Debug, Clone)]
pub struct TypeUniverse {
    types: HashMap<String, TypeElement>,
    order: Vec<String>,
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeUniverse {
    /// A universe holding only the library declarations
    pub fn new() -> Self {
        let mut universe = Self {
            types: HashMap::new(),
            order: Vec::new(),
        };
        for element in library_types() {
            universe.insert(element);
        }
        universe
    }

    pub fn from_decls(decls: &Declarations) -> Result<Self> {
        let mut universe = Self::new();
        universe.add(decls)?;
        Ok(universe)
    }

    /// Resolve and add declarations
    pub fn add(&mut self, decls: &Declarations) -> Result<()> {
        let mut known: HashSet<String> = self.types.keys().cloned().collect();
        let mut flat = Vec::new();
        for decl in &decls.types {
            flatten(decl, &decl.package, None, &mut flat);
        }
        for entry in &flat {
            if !known.insert(entry.qualified.clone()) {
                return Err(Error::DeclParse(format!(
                    "duplicate type declaration: {}",
                    entry.qualified
                )));
            }
        }

        for entry in &flat {
            let element = resolve_entry(entry, &known, decls.source.as_deref())?;
            self.insert(element);
        }
        tracing::debug!(types = flat.len(), "resolved declarations");
        Ok(())
    }

    fn insert(&mut self, element: TypeElement) {
        self.order.push(element.qualified_name.clone());
        self.types.insert(element.qualified_name.clone(), element);
    }

    pub fn get(&self, qualified_name: &str) -> Option<&TypeElement> {
        self.types.get(qualified_name)
    }

    /// Value classes in declaration order
    pub fn value_classes(&self) -> Vec<&TypeElement> {
        self.order
            .iter()
            .filter_map(|n| self.types.get(n))
            .filter(|t| t.is_value)
            .collect()
    }

    /// Methods declared directly on a type
    pub fn declared_methods(&self, qualified_name: &str) -> &[Method] {
        self.get(qualified_name)
            .map(|t| t.methods.as_slice())
            .unwrap_or(&[])
    }

    /// The nested builder declaration of a value class, if any
    pub fn builder_of(&self, value_class: &TypeElement) -> Option<&TypeElement> {
        value_class
            .nested
            .iter()
            .filter_map(|n| self.get(n))
            .find(|t| t.is_builder)
    }

    /// Declared and inherited methods of `element`, with types substituted
    /// through each supertype instantiation.
    ///
    /// Own methods come first, then each supertype's in declaration order.
    /// Of several override-equivalent methods only the closest is kept.
    /// Static methods of supertypes are not inherited.
    pub fn all_methods(&self, element: &TypeElement) -> Vec<Method> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.collect_methods(element, &TypeBindings::new(), true, &mut out, &mut visited);
        if !element.is_interface() {
            if let Some(object) = self.get("java.lang.Object") {
                if !visited.contains(&object.qualified_name) {
                    self.collect_methods(object, &TypeBindings::new(), false, &mut out, &mut visited);
                }
            }
        }
        out
    }

    fn collect_methods(
        &self,
        element: &TypeElement,
        bindings: &TypeBindings,
        is_self: bool,
        out: &mut Vec<Method>,
        visited: &mut HashSet<String>,
    ) {
        if !visited.insert(element.qualified_name.clone()) {
            return;
        }
        for method in &element.methods {
            if method.is_static() && !is_self {
                continue;
            }
            let method = method.substitute(bindings);
            let key = method.signature_key();
            if !out.iter().any(|m: &Method| m.signature_key() == key) {
                out.push(method);
            }
        }
        for supertype in &element.supertypes {
            let Some(name) = supertype.raw_name() else {
                continue;
            };
            match self.get(name) {
                Some(parent) => {
                    let next = bindings.for_supertype(&parent.type_params, supertype.type_args());
                    self.collect_methods(parent, &next, false, out, visited);
                }
                None => tracing::debug!(supertype = name, "supertype not in universe"),
            }
        }
    }

    /// True if `element` is, extends or implements `qualified_name`
    pub fn is_subtype_of(&self, element: &TypeElement, qualified_name: &str) -> bool {
        let mut stack = vec![element.qualified_name.clone()];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == qualified_name {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(t) = self.get(&current) {
                stack.extend(t.supertypes.iter().filter_map(|s| s.raw_name().map(String::from)));
            }
        }
        false
    }
}

struct FlatDecl<'a> {
    decl: &'a TypeDecl,
    qualified: String,
    package: String,
    enclosing: Option<String>,
    /// Innermost first: this type, then its enclosing types
    scope_types: Vec<String>,
    /// Type variables in scope, including enclosing types'
    scope_vars: Vec<String>,
}

fn flatten<'a>(
    decl: &'a TypeDecl,
    package: &str,
    enclosing: Option<&FlatDecl<'a>>,
    out: &mut Vec<FlatDecl<'a>>,
) {
    let package = if decl.package.is_empty() {
        package.to_string()
    } else {
        decl.package.clone()
    };
    let qualified = match enclosing {
        Some(e) => format!("{}.{}", e.qualified, decl.name),
        None if package.is_empty() => decl.name.clone(),
        None => format!("{}.{}", package, decl.name),
    };
    let mut scope_types = vec![qualified.clone()];
    let mut scope_vars = decl.type_params.clone();
    if let Some(e) = enclosing {
        scope_types.extend(e.scope_types.iter().cloned());
        scope_vars.extend(e.scope_vars.iter().cloned());
    }
    let entry = FlatDecl {
        decl,
        qualified,
        package,
        enclosing: enclosing.map(|e| e.qualified.clone()),
        scope_types,
        scope_vars,
    };
    let mut children = Vec::new();
    for nested in &decl.nested {
        flatten(nested, &entry.package, Some(&entry), &mut children);
    }
    out.push(entry);
    out.extend(children);
}

struct Scope<'a> {
    known: &'a HashSet<String>,
    package: &'a str,
    types: &'a [String],
    vars: &'a [String],
}

impl Scope<'_> {
    fn resolve(&self, ty: TypeRef) -> Result<TypeRef> {
        Ok(match ty {
            TypeRef::Declared { name, args } => {
                if args.is_empty() && !name.contains('.') && self.vars.contains(&name) {
                    return Ok(TypeRef::Var(name));
                }
                let args = args
                    .into_iter()
                    .map(|a| self.resolve(a))
                    .collect::<Result<Vec<_>>>()?;
                TypeRef::Declared {
                    name: self.resolve_name(&name)?,
                    args,
                }
            }
            TypeRef::Array(c) => TypeRef::array_of(self.resolve(*c)?),
            TypeRef::Wildcard(WildcardBound::Extends(b)) => {
                TypeRef::Wildcard(WildcardBound::Extends(Box::new(self.resolve(*b)?)))
            }
            TypeRef::Wildcard(WildcardBound::Super(b)) => {
                TypeRef::Wildcard(WildcardBound::Super(Box::new(self.resolve(*b)?)))
            }
            other => other,
        })
    }

    fn resolve_name(&self, name: &str) -> Result<String> {
        let (head, rest) = match name.split_once('.') {
            Some((h, r)) => (h, Some(r)),
            None => (name, None),
        };
        if let Some(resolved) = self.resolve_simple(head) {
            return Ok(match rest {
                Some(r) => format!("{}.{}", resolved, r),
                None => resolved,
            });
        }
        match rest {
            Some(_) => Ok(name.to_string()),
            None if JAVA_LANG.contains(&name) => Ok(format!("java.lang.{}", name)),
            None => Err(Error::UnknownType(name.to_string())),
        }
    }

    fn resolve_simple(&self, name: &str) -> Option<String> {
        for scope_type in self.types {
            if scope_type.ends_with(&format!(".{}", name)) || scope_type == name {
                return Some(scope_type.clone());
            }
            let member = format!("{}.{}", scope_type, name);
            if self.known.contains(&member) {
                return Some(member);
            }
        }
        let candidate = if self.package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.package, name)
        };
        self.known.contains(&candidate).then_some(candidate)
    }
}

fn resolve_entry(
    entry: &FlatDecl<'_>,
    known: &HashSet<String>,
    source: Option<&str>,
) -> Result<TypeElement> {
    let decl = entry.decl;
    let scope = Scope {
        known,
        package: &entry.package,
        types: &entry.scope_types,
        vars: &entry.scope_vars,
    };
    let location = SourceLocation::new(entry.qualified.clone())
        .with_line(decl.line)
        .with_file(source.map(String::from));

    let supertypes = decl
        .supertypes
        .iter()
        .map(|s| scope.resolve(TypeRef::parse(s)?))
        .collect::<Result<Vec<_>>>()?;

    let methods = decl
        .methods
        .iter()
        .map(|m| resolve_method(m, entry, &scope, source))
        .collect::<Result<Vec<_>>>()?;

    let nested = decl
        .nested
        .iter()
        .map(|n| format!("{}.{}", entry.qualified, n.name))
        .collect();

    Ok(TypeElement {
        qualified_name: entry.qualified.clone(),
        simple_name: decl.name.clone(),
        package: entry.package.clone(),
        kind: decl.kind,
        type_params: decl.type_params.clone(),
        supertypes,
        methods,
        enclosing: entry.enclosing.clone(),
        nested,
        is_value: decl.value,
        is_builder: decl.builder,
        location,
    })
}

fn resolve_method(
    m: &MethodDecl,
    entry: &FlatDecl<'_>,
    scope: &Scope<'_>,
    source: Option<&str>,
) -> Result<Method> {
    let return_type = scope.resolve(TypeRef::parse(&m.returns)?)?;
    let params = m
        .params
        .iter()
        .map(|p| {
            Ok(Parameter {
                name: p.name.clone(),
                ty: scope.resolve(TypeRef::parse(&p.typ)?)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let interface = entry.decl.kind == DeclKind::Interface;
    let is_static = m.has(Modifier::Static);
    let is_abstract = if interface {
        !is_static && !m.has(Modifier::Default)
    } else {
        m.has(Modifier::Abstract)
    };
    let visibility = if m.has(Modifier::Public) || interface {
        Visibility::Public
    } else if m.has(Modifier::Protected) {
        Visibility::Protected
    } else if m.has(Modifier::Private) {
        Visibility::Private
    } else {
        Visibility::Package
    };

    let reference = MethodRef {
        owner: entry.qualified.clone(),
        name: m.name.clone(),
        params: params.iter().map(|p| p.ty.clone()).collect(),
    };
    Ok(Method {
        owner: entry.qualified.clone(),
        name: m.name.clone(),
        return_type,
        params,
        modifiers: Modifiers {
            is_abstract,
            is_static,
            is_final: m.has(Modifier::Final),
            visibility,
        },
        location: SourceLocation::new(format!("{}.{}", entry.qualified, m.name))
            .with_line(m.line)
            .with_file(source.map(String::from)),
        reference,
    })
}

fn library_method(owner: &str, name: &str, ret: TypeRef, params: Vec<Parameter>) -> Method {
    let reference = MethodRef {
        owner: owner.to_string(),
        name: name.to_string(),
        params: params.iter().map(|p| p.ty.clone()).collect(),
    };
    Method {
        owner: owner.to_string(),
        name: name.to_string(),
        return_type: ret,
        params,
        modifiers: Modifiers {
            visibility: Visibility::Public,
            ..Modifiers::default()
        },
        location: SourceLocation::new(format!("{}.{}", owner, name)),
        reference,
    }
}

fn library_class(qualified: &str, kind: DeclKind, methods: Vec<Method>) -> TypeElement {
    let (package, simple) = qualified.rsplit_once('.').unwrap_or(("", qualified));
    TypeElement {
        qualified_name: qualified.to_string(),
        simple_name: simple.to_string(),
        package: package.to_string(),
        kind,
        type_params: Vec::new(),
        supertypes: Vec::new(),
        methods,
        enclosing: None,
        nested: Vec::new(),
        is_value: false,
        is_builder: false,
        location: SourceLocation::new(qualified),
    }
}

fn library_types() -> Vec<TypeElement> {
    let object = "java.lang.Object";
    let integer = "java.lang.Integer";
    vec![
        library_class(
            object,
            DeclKind::Class,
            vec![
                library_method(
                    object,
                    "equals",
                    TypeRef::Primitive(Primitive::Boolean),
                    vec![Parameter {
                        name: "o".into(),
                        ty: TypeRef::declared(object),
                    }],
                ),
                library_method(object, "hashCode", TypeRef::Primitive(Primitive::Int), vec![]),
                library_method(object, "toString", TypeRef::string(), vec![]),
            ],
        ),
        library_class(
            integer,
            DeclKind::Class,
            vec![library_method(
                integer,
                "intValue",
                TypeRef::Primitive(Primitive::Int),
                vec![],
            )],
        ),
        library_class("java.io.Serializable", DeclKind::Interface, vec![]),
    ]
}
