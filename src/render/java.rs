//! Java code generation using genco
#![allow(for_loops_over_fallibles)]

use crate::builder::{BuilderModel, IMMUTABLE_COLLECTIONS, IMMUTABLE_MAPS, OPTIONALS};
use crate::chain::ChainNames;
use crate::context::Context;
use crate::property::PropertyDescriptor;
use crate::types::{Primitive, TypeRef};
use crate::universe::{Method, TypeElement};
use chrono::Utc;
use genco::prelude::*;

use super::RenderConfig;

const GENERATED_ANNOTATION: &str = "@javax.annotation.processing.Generated(\"valuegen\")";
const OVERRIDE: &str = "@Override";

/// Renders the classes the processor itself owns: the abstract base
/// implementation and, when no extension closes the chain, the terminal class.
pub struct JavaGenerator<'a> {
    config: &'a RenderConfig,
}

impl<'a> JavaGenerator<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    /// The abstract base class over every unconsumed property
    pub fn base_class(&self, context: &Context<'_>, names: &ChainNames) -> String {
        let value_class = context.value_class();
        let package = context.package_name();
        let properties = context.properties();
        let base = names.base();

        let header = format!(
            "abstract class {}{} {} {}",
            base,
            type_parameters(value_class),
            inherits(value_class),
            value_class.as_type().to_source(package)
        );
        let fields: Vec<String> = properties
            .iter()
            .map(|p| format!("private final {} {};", p.ty.to_source(package), p.name))
            .collect();
        let constructor = format!("{}({})", base, constructor_params(context).join(", "));

        let object_methods: Vec<java::Tokens> = [
            ("equals", self.equals(context)),
            ("hashCode", self.hash_code(context)),
            ("toString", self.to_string_method(context)),
        ]
        .into_iter()
        .filter(|(name, _)| implements_object_method(context, name))
        .map(|(_, tokens)| tokens)
        .collect();
        let to_builder = context
            .builder()
            .map(|_| self.to_builder_methods(context))
            .unwrap_or_default();
        let builder = context
            .builder()
            .map(|model| self.builder_class(context, model, names));

        let class: java::Tokens = quote! {
            $header {
                $(for f in &fields join ($['\r']) => $f)
                $['\n']
                $constructor {
                    $(for p in &properties join ($['\r']) => $(assignment(p)))
                }
                $(for p in &properties => $['\n']$(getter(p, package)))
                $(for m in object_methods => $['\n']$m)
                $(for t in to_builder => $['\n']$t)
                $(for b in builder => $['\n']$b)
            }
        };
        self.file(package, class)
    }

    /// A final pass-through class that closes the chain
    pub fn default_terminal(
        &self,
        context: &Context<'_>,
        class_name: &str,
        class_to_extend: &str,
    ) -> String {
        self.file(
            context.package_name(),
            pass_through_tokens(context, class_name, class_to_extend, true, &[]),
        )
    }

    fn file(&self, package: &str, class: java::Tokens) -> String {
        let package_decl = (!package.is_empty()).then(|| format!("package {};", package));
        let mut provenance = Vec::new();
        if self.config.provenance {
            provenance.push(format!(
                "// GENERATED FROM: {}",
                self.config.source.as_deref().unwrap_or("declarations")
            ));
            if let Some(hash) = &self.config.hash {
                provenance.push(format!("// DECLARATIONS HASH: {}", hash));
            }
            provenance.push(format!("// GENERATED: {}", Utc::now().to_rfc3339()));
            provenance.push("// DO NOT EDIT: regenerate from declarations".to_string());
        }
        let annotation = self.config.generated_annotation.then_some(GENERATED_ANNOTATION);

        let tokens: java::Tokens = quote! {
            $(for p in &package_decl => $p$['\n'])
            $(for line in &provenance join ($['\r']) => $line)
            $(if !provenance.is_empty() { $['\n'] })
            $(for a in &annotation => $(*a)$['\r'])
            $class
        };
        tokens.to_file_string().unwrap_or_default()
    }

    fn equals(&self, context: &Context<'_>) -> java::Tokens {
        let value_class = context.value_class();
        let package = context.package_name();
        let raw = TypeRef::declared(value_class.qualified_name.clone()).to_source(package);
        let wildcard = if value_class.type_params.is_empty() {
            raw.clone()
        } else {
            let args = vec!["?"; value_class.type_params.len()].join(", ");
            format!("{}<{}>", raw, args)
        };

        let comparisons: Vec<String> = context
            .properties()
            .iter()
            .map(|p| equality(p))
            .collect();
        let result = if comparisons.is_empty() {
            "return true;".to_string()
        } else {
            format!("return {};", comparisons.join(" && "))
        };
        let instance_check = format!("if (o instanceof {})", raw);
        let cast = format!("{} that = ({}) o;", wildcard, wildcard);

        quote! {
            $OVERRIDE
            $("public boolean equals(Object o)") {
                $("if (o == this)") {
                    $("return true;")
                }
                $instance_check {
                    $(if !comparisons.is_empty() { $cast$['\r'] })
                    $result
                }
                $("return false;")
            }
        }
    }

    fn hash_code(&self, context: &Context<'_>) -> java::Tokens {
        let mixes: Vec<String> = context
            .properties()
            .iter()
            .map(|p| format!("h ^= {};", hash_expr(p)))
            .collect();

        let mix = "h *= 1000003;";
        quote! {
            $OVERRIDE
            $("public int hashCode()") {
                $("int h = 1;")
                $(for m in &mixes join ($['\r']) => $mix$['\r']$m)
                $("return h;")
            }
        }
    }

    fn to_string_method(&self, context: &Context<'_>) -> java::Tokens {
        let parts: Vec<String> = context
            .properties()
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let sep = if i == 0 { "" } else { ", " };
                format!("\"{}{}=\" + {}", sep, p.name, string_expr(p))
            })
            .collect();
        let mut pieces = vec![format!("\"{}{{\"", context.value_class().simple_name)];
        pieces.extend(parts);
        pieces.push("\"}\"".to_string());
        let body = format!("return {};", pieces.join(" + "));

        quote! {
            $OVERRIDE
            $("public String toString()") {
                $body
            }
        }
    }

    fn to_builder_methods(&self, context: &Context<'_>) -> Vec<java::Tokens> {
        let package = context.package_name();
        let diamond = diamond(context.value_class());
        context
            .to_builder_methods()
            .into_iter()
            .map(|m| {
                let signature = format!(
                    "{}{} {}()",
                    m.modifiers.visibility.keyword(),
                    m.return_type.to_source(package),
                    m.name
                );
                let body = format!("return new Builder{}(this);", diamond);
                quote! {
                    $OVERRIDE
                    $signature {
                        $body
                    }
                }
            })
            .collect()
    }

    fn builder_class(
        &self,
        context: &Context<'_>,
        model: &BuilderModel,
        names: &ChainNames,
    ) -> java::Tokens {
        let package = context.package_name();
        let value_class = context.value_class();
        let builder_type = model.builder_type.as_type().to_source(package);
        let value_type = value_class.as_type().to_source(package);
        let properties = context.properties();

        let header = format!(
            "static final class Builder{} {} {}",
            type_parameters(&model.builder_type),
            inherits(&model.builder_type),
            builder_type
        );

        let mut fields = Vec::new();
        for p in &properties {
            fields.push(format!("private {} {};", field_type(&p.ty, package), p.name));
            if let Some(m) = sub_builder(context, model, &p.name) {
                fields.push(format!(
                    "private {} {};",
                    m.return_type.to_source(package),
                    sub_builder_field(&p.name)
                ));
            }
        }

        let defaults: Vec<String> = properties
            .iter()
            .filter_map(|p| {
                optional_empty(&p.ty, package).map(|empty| format!("this.{} = {};", p.name, empty))
            })
            .collect();

        let copy = (!context.to_builder_methods().is_empty()).then(|| {
            let signature = format!("Builder({} source)", value_type);
            let copies: Vec<String> = properties
                .iter()
                .map(|p| format!("this.{} = source.{}();", p.name, p.method.name))
                .collect();
            quote! {
                $signature {
                    $(for c in &copies join ($['\r']) => $c)
                }
            }
        });

        let setters: Vec<java::Tokens> = properties
            .iter()
            .flat_map(|p| {
                model
                    .setters_for(&p.name)
                    .iter()
                    .map(|m| setter(context, model, p, m, &builder_type))
                    .collect::<Vec<_>>()
            })
            .collect();

        let sub_builders: Vec<java::Tokens> = properties
            .iter()
            .filter_map(|p| {
                sub_builder(context, model, &p.name).map(|m| sub_builder_method(p, m, package))
            })
            .collect();

        let build = self.auto_build(context, model, names);

        quote! {
            $header {
                $(for f in &fields join ($['\r']) => $f)
                $['\n']
                $("Builder()") {
                    $(for d in &defaults join ($['\r']) => $d)
                }
                $(for c in copy => $['\n']$c)
                $(for s in setters => $['\n']$s)
                $(for s in sub_builders => $['\n']$s)
                $['\n']
                $build
            }
        }
    }

    fn auto_build(
        &self,
        context: &Context<'_>,
        model: &BuilderModel,
        names: &ChainNames,
    ) -> java::Tokens {
        let package = context.package_name();
        let method = &model.auto_build_method;
        let properties = context.properties();

        let mut finishing = Vec::new();
        for p in &properties {
            if sub_builder(context, model, &p.name).is_some() {
                let field = sub_builder_field(&p.name);
                let fallback = match p.ty.raw_name() {
                    Some(raw) if is_immutable_collection(raw) => {
                        format!("{}.of()", TypeRef::declared(raw).to_source(package))
                    }
                    Some(raw) => format!("{}.builder().build()", TypeRef::declared(raw).to_source(package)),
                    None => "null".to_string(),
                };
                let built = format!("this.{} = this.{}.build();", p.name, field);
                let unset = format!("this.{} = {};", p.name, fallback);
                let check = format!("if (this.{} != null)", field);
                let else_check = format!("else if (this.{} == null)", p.name);
                finishing.push(quote! {
                    $check {
                        $built
                    } $else_check {
                        $unset
                    }
                });
            }
        }

        let required: Vec<(String, String)> = properties
            .iter()
            .filter(|p| {
                sub_builder(context, model, &p.name).is_none()
                    && optional_empty(&p.ty, package).is_none()
            })
            .map(|p| {
                (
                    format!("if (this.{} == null)", p.name),
                    format!("missing += \" {}\";", p.name),
                )
            })
            .collect();

        let signature = format!(
            "{}{} {}()",
            method.modifiers.visibility.keyword(),
            method.return_type.to_source(package),
            method.name
        );
        let args: Vec<String> = properties.iter().map(|p| format!("this.{}", p.name)).collect();
        let construct = format!(
            "return new {}{}({});",
            names.terminal(),
            diamond(context.value_class()),
            args.join(", ")
        );

        quote! {
            $OVERRIDE
            $signature {
                $(for f in finishing join ($['\r']) => $f)
                $(if !required.is_empty() {
                    $("String missing = \"\";")
                    $(for (check, add) in &required join ($['\r']) => $check {
                        $add
                    })
                    $("if (!missing.isEmpty())") {
                        $("throw new IllegalStateException(\"Missing required properties:\" + missing);")
                    }
                })
                $construct
            }
        }
    }
}

/// Source of a pass-through class: a constructor forwarding every
/// unconsumed property to `class_to_extend`, plus `members`.
///
/// Non-final links are abstract; the terminal class is final.
pub fn pass_through_class(
    context: &Context<'_>,
    class_name: &str,
    class_to_extend: &str,
    is_final: bool,
    members: &[String],
) -> String {
    let package = context.package_name();
    let package_decl = (!package.is_empty()).then(|| format!("package {};", package));
    let class = pass_through_tokens(context, class_name, class_to_extend, is_final, members);
    let tokens: java::Tokens = quote! {
        $(for p in &package_decl => $p$['\n'])
        $class
    };
    tokens.to_file_string().unwrap_or_default()
}

fn pass_through_tokens(
    context: &Context<'_>,
    class_name: &str,
    class_to_extend: &str,
    is_final: bool,
    members: &[String],
) -> java::Tokens {
    let params = type_parameters(context.value_class());
    let header = format!(
        "{} class {}{} extends {}{}",
        if is_final { "final" } else { "abstract" },
        class_name,
        params,
        class_to_extend,
        params
    );
    let constructor = format!("{}({})", class_name, constructor_params(context).join(", "));
    let args: Vec<&str> = context
        .properties()
        .into_iter()
        .map(|p| p.name.as_str())
        .collect();
    let super_call = format!("super({});", args.join(", "));

    quote! {
        $header {
            $(for m in members => $m$['\r'])
            $(if !members.is_empty() { $['\n'] })
            $constructor {
                $super_call
            }
        }
    }
}

/// `<T, U>` for a generic class, empty otherwise
pub fn type_parameters(element: &TypeElement) -> String {
    if element.type_params.is_empty() {
        String::new()
    } else {
        format!("<{}>", element.type_params.join(", "))
    }
}

/// `Type name` for each unconsumed property, in order
pub fn constructor_params(context: &Context<'_>) -> Vec<String> {
    let package = context.package_name();
    context
        .properties()
        .into_iter()
        .map(|p| format!("{} {}", p.ty.to_source(package), p.name))
        .collect()
}

fn inherits(element: &TypeElement) -> &'static str {
    if element.is_interface() {
        "implements"
    } else {
        "extends"
    }
}

fn diamond(element: &TypeElement) -> &'static str {
    if element.type_params.is_empty() {
        ""
    } else {
        "<>"
    }
}

/// Whether the base class should implement `name`: it is left abstract
/// or inherited from `Object`, and no extension consumed it.
fn implements_object_method(context: &Context<'_>, name: &str) -> bool {
    let inherited = context
        .types()
        .all_methods(context.value_class())
        .into_iter()
        .find(|m| m.name == name && m.is_object_method());
    match inherited {
        Some(m) => {
            (m.is_abstract() || m.owner == "java.lang.Object")
                && !context.is_method_consumed(m.reference())
        }
        None => true,
    }
}

fn assignment(p: &PropertyDescriptor) -> java::Tokens {
    let assign = format!("this.{} = {};", p.name, p.name);
    if p.ty.is_primitive() {
        return quote!($assign);
    }
    let check = format!("if ({} == null)", p.name);
    quote! {
        $check {
            $(null_pointer(&p.name))
        }
        $assign
    }
}

fn null_pointer(property: &str) -> String {
    format!("throw new NullPointerException(\"Null {}\");", property)
}

fn getter(p: &PropertyDescriptor, package: &str) -> java::Tokens {
    let signature = format!(
        "{}{} {}()",
        p.method.modifiers.visibility.keyword(),
        p.ty.to_source(package),
        p.method.name
    );
    let body = format!("return {};", p.name);
    quote! {
        $OVERRIDE
        $signature {
            $body
        }
    }
}

fn equality(p: &PropertyDescriptor) -> String {
    let this = format!("this.{}", p.name);
    let that = format!("that.{}()", p.method.name);
    match &p.ty {
        TypeRef::Primitive(Primitive::Float) => format!(
            "Float.floatToIntBits({}) == Float.floatToIntBits({})",
            this, that
        ),
        TypeRef::Primitive(Primitive::Double) => format!(
            "Double.doubleToLongBits({}) == Double.doubleToLongBits({})",
            this, that
        ),
        TypeRef::Primitive(_) => format!("{} == {}", this, that),
        TypeRef::Array(_) => format!("java.util.Arrays.equals({}, {})", this, that),
        _ => format!("{}.equals({})", this, that),
    }
}

fn hash_expr(p: &PropertyDescriptor) -> String {
    let this = format!("this.{}", p.name);
    match &p.ty {
        TypeRef::Primitive(Primitive::Boolean) => format!("({} ? 1231 : 1237)", this),
        TypeRef::Primitive(Primitive::Long) => format!("(int) (({} >>> 32) ^ {})", this, this),
        TypeRef::Primitive(Primitive::Float) => format!("Float.floatToIntBits({})", this),
        TypeRef::Primitive(Primitive::Double) => format!(
            "(int) ((Double.doubleToLongBits({0}) >>> 32) ^ Double.doubleToLongBits({0}))",
            this
        ),
        TypeRef::Primitive(_) => this,
        TypeRef::Array(_) => format!("java.util.Arrays.hashCode({})", this),
        _ => format!("{}.hashCode()", this),
    }
}

fn string_expr(p: &PropertyDescriptor) -> String {
    if p.ty.is_array() {
        format!("java.util.Arrays.toString(this.{})", p.name)
    } else {
        format!("this.{}", p.name)
    }
}

/// Builder fields box primitives so that "unset" is representable
fn field_type(ty: &TypeRef, package: &str) -> String {
    match ty {
        TypeRef::Primitive(p) => p.boxed().to_string(),
        other => other.to_source(package),
    }
}

fn is_immutable_collection(raw: &str) -> bool {
    IMMUTABLE_COLLECTIONS.contains(&raw) || IMMUTABLE_MAPS.contains(&raw)
}

fn optional_empty(ty: &TypeRef, package: &str) -> Option<String> {
    let raw = ty.raw_name().filter(|r| OPTIONALS.contains(r))?;
    let factory = if raw == "java.util.Optional" {
        "empty"
    } else {
        "absent"
    };
    Some(format!("{}.{}()", TypeRef::declared(raw).to_source(package), factory))
}

/// Expression storing `var`, of setter parameter type `param`, into a
/// property of type `property`
fn conversion(param: &TypeRef, property: &TypeRef, var: &str, package: &str) -> String {
    if param == property {
        return var.to_string();
    }
    match property.raw_name() {
        Some(raw) if OPTIONALS.contains(&raw) => {
            format!("{}.of({})", TypeRef::declared(raw).to_source(package), var)
        }
        Some(raw) if is_immutable_collection(raw) => {
            format!("{}.copyOf({})", TypeRef::declared(raw).to_source(package), var)
        }
        _ => var.to_string(),
    }
}

fn sub_builder<'m>(
    context: &Context<'_>,
    model: &'m BuilderModel,
    property: &str,
) -> Option<&'m Method> {
    model
        .property_builders
        .get(property)
        .filter(|m| !context.is_method_consumed(m.reference()))
}

fn sub_builder_field(property: &str) -> String {
    format!("{}Builder$", property)
}

fn setter(
    context: &Context<'_>,
    model: &BuilderModel,
    p: &PropertyDescriptor,
    m: &Method,
    builder_type: &str,
) -> java::Tokens {
    let package = context.package_name();
    let Some(param) = m.params.first() else {
        return java::Tokens::new();
    };
    let returns = if m.return_type.is_void() {
        "void".to_string()
    } else {
        builder_type.to_string()
    };
    let signature = format!(
        "{}{} {}({} {})",
        m.modifiers.visibility.keyword(),
        returns,
        m.name,
        param.ty.to_source(package),
        param.name
    );
    let null_check = (!param.ty.is_primitive()).then(|| {
        let check = format!("if ({} == null)", param.name);
        quote! {
            $check {
                $(null_pointer(&p.name))
            }
        }
    });
    let already_built = sub_builder(context, model, &p.name).map(|_| {
        let check = format!("if (this.{} != null)", sub_builder_field(&p.name));
        let throw = format!(
            "throw new IllegalStateException(\"Cannot set {} after calling {}Builder()\");",
            p.name, p.name
        );
        quote! {
            $check {
                $throw
            }
        }
    });
    let assign = format!(
        "this.{} = {};",
        p.name,
        conversion(&param.ty, &p.ty, &param.name, package)
    );
    let ret = (!m.return_type.is_void()).then_some("return this;");

    quote! {
        $OVERRIDE
        $signature {
            $(for c in null_check => $c$['\r'])
            $(for c in already_built => $c$['\r'])
            $assign
            $(for r in ret => $['\r']$r)
        }
    }
}

fn sub_builder_method(p: &PropertyDescriptor, m: &Method, package: &str) -> java::Tokens {
    let field = sub_builder_field(&p.name);
    let raw = p
        .ty
        .raw_name()
        .map(|r| TypeRef::declared(r).to_source(package))
        .unwrap_or_default();
    let signature = format!(
        "{}{} {}()",
        m.modifiers.visibility.keyword(),
        m.return_type.to_source(package),
        m.name
    );
    let create = format!("this.{} = {}.builder();", field, raw);
    let seed = match p.ty.raw_name() {
        Some(r) if IMMUTABLE_MAPS.contains(&r) => {
            vec![create.clone(), format!("this.{}.putAll(this.{});", field, p.name)]
        }
        Some(r) if IMMUTABLE_COLLECTIONS.contains(&r) => {
            vec![create.clone(), format!("this.{}.addAll(this.{});", field, p.name)]
        }
        _ => vec![format!("this.{} = this.{}.toBuilder();", field, p.name)],
    };
    let unbuilt = format!("if (this.{} == null)", field);
    let unset = format!("if (this.{} == null)", p.name);
    let clear = format!("this.{} = null;", p.name);
    let ret = format!("return this.{};", field);

    quote! {
        $OVERRIDE
        $signature {
            $unbuilt {
                $unset {
                    $create
                } $("else") {
                    $(for s in &seed join ($['\r']) => $s)
                    $clear
                }
            }
            $ret
        }
    }
}
