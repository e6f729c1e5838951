//! Extraction: TOML header descriptions → declaration tree.
//!
//! A header description stands in for a parsed translation unit:
//!
//! ```toml
//! file = "shapes.h"
//!
//! [[decl]]
//! kind = "class"
//! name = "Shape"
//!
//! [[decl.field]]
//! name = "area"
//! type = "double"
//!
//! [[decl]]
//! kind = "function"
//! name = "ShapeCreate"
//! returns = "Shape*"
//! param = [{ name = "kind", type = "int32" }]
//! ```
//!
//! Types are written in a small C-like syntax: primitives (`int32`, `double`,
//! `unsigned int`, …), `*` / `&` / `&&` suffixes, `const` qualifiers,
//! arrays (`int32[4]`, `int32[]`), template specializations
//! (`std::vector<int32>`), function types (`fn(int32, double) -> void`,
//! parenthesized when pointed to: `(fn(int32) -> void)*`), member pointers
//! (`memberptr<int32>`) and template parameters (`$T`).
//!
//! Extraction runs in two phases: every declaration of every unit is created
//! first, then type references are resolved by name. A name that matches
//! nothing becomes an incomplete class so later stages (type maps, the
//! resolve pass) can still deal with it.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, info, trace, warn};

use crate::model::*;
use crate::types::*;

// ---------------------------------------------------------------------------
// Description schema
// ---------------------------------------------------------------------------

/// One translation unit.
#[derive(Debug, Deserialize)]
pub struct UnitDesc {
    pub file: String,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default, rename = "decl")]
    pub decls: Vec<DeclDesc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescKind {
    Namespace,
    Class,
    Function,
    Typedef,
    Enum,
    ClassTemplate,
    FunctionTemplate,
    Macro,
    Event,
}

/// A namespace-level (or class-nested) declaration. Which fields apply
/// depends on `kind`.
#[derive(Debug, Deserialize)]
pub struct DeclDesc {
    pub kind: DescKind,
    #[serde(default)]
    pub name: String,
    pub comment: Option<String>,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub incomplete: bool,
    #[serde(default)]
    pub exclude_passes: Vec<PassKind>,

    // class / class_template
    #[serde(default)]
    pub semantics: ClassSemantics,
    #[serde(default)]
    pub union: bool,
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default, rename = "field")]
    pub fields: Vec<MemberDesc>,
    #[serde(default, rename = "method")]
    pub methods: Vec<MethodDesc>,

    // namespace / class nesting
    #[serde(default, rename = "decl")]
    pub decls: Vec<DeclDesc>,

    // function / function_template / event
    pub returns: Option<String>,
    #[serde(default, rename = "param")]
    pub params: Vec<MemberDesc>,
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub inline: bool,
    #[serde(default)]
    pub calling_convention: CallConv,

    // typedef
    #[serde(rename = "type")]
    pub ty: Option<String>,

    // enum
    #[serde(default, rename = "item")]
    pub items: Vec<ItemDesc>,
    pub integer_type: Option<Primitive>,

    // templates
    #[serde(default)]
    pub parameters: Vec<String>,

    // macro
    pub value: Option<String>,
}

/// A field or parameter.
#[derive(Debug, Deserialize)]
pub struct MemberDesc {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub comment: Option<String>,
    #[serde(default)]
    pub ignore: bool,
}

#[derive(Debug, Deserialize)]
pub struct MethodDesc {
    pub name: String,
    pub comment: Option<String>,
    pub returns: Option<String>,
    #[serde(default, rename = "param")]
    pub params: Vec<MemberDesc>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub access: AccessSpecifier,
    #[serde(default)]
    pub kind: MethodKind,
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub exclude_passes: Vec<PassKind>,
}

#[derive(Debug, Deserialize)]
pub struct ItemDesc {
    pub name: String,
    pub value: i64,
    pub comment: Option<String>,
}

/// Read one header description file.
pub fn load_unit(path: &Path) -> Result<UnitDesc> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading header description {}", path.display()))?;
    let unit: UnitDesc = toml::from_str(&content)
        .with_context(|| format!("parsing header description {}", path.display()))?;
    Ok(unit)
}

// ---------------------------------------------------------------------------
// Type expressions
// ---------------------------------------------------------------------------

/// A parsed, not yet resolved, type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Builtin(Primitive),
    Pointer(Box<QualExpr>, PointerModifier),
    Array(Box<QualExpr>, ArraySize),
    Function { ret: Box<QualExpr>, args: Vec<QualExpr> },
    MemberPointer(Box<QualExpr>),
    Named(String),
    Template { name: String, args: Vec<QualExpr> },
    Param(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualExpr {
    pub expr: TypeExpr,
    pub qualifiers: TypeQualifiers,
}

fn primitive_by_name(name: &str) -> Option<Primitive> {
    let p = match name {
        "void" => Primitive::Void,
        "bool" => Primitive::Bool,
        "char" => Primitive::Char,
        "wchar" | "wchar_t" => Primitive::WideChar,
        "int8" | "int8_t" | "signed char" => Primitive::Int8,
        "uint8" | "uint8_t" | "unsigned char" => Primitive::UInt8,
        "int16" | "int16_t" | "short" => Primitive::Int16,
        "uint16" | "uint16_t" | "unsigned short" => Primitive::UInt16,
        "int32" | "int32_t" | "int" => Primitive::Int32,
        "uint32" | "uint32_t" | "unsigned int" | "unsigned" => Primitive::UInt32,
        "int64" | "int64_t" | "long long" => Primitive::Int64,
        "uint64" | "uint64_t" | "unsigned long long" => Primitive::UInt64,
        "float" => Primitive::Float,
        "double" => Primitive::Double,
        _ => return None,
    };
    Some(p)
}

/// Split on commas that are not nested inside `<>` or `()`.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut prev = ' ';
    for (i, c) in s.char_indices() {
        // `->` in a function type is not a closing bracket.
        let arrow = c == '>' && prev == '-';
        prev = c;
        match c {
            '<' | '(' => depth += 1,
            '>' if arrow => {}
            '>' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = s[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Index of the bracket closing the one opened at `open`.
fn matching_close(s: &str, open: usize, open_c: char, close_c: char) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in s[open..].char_indices() {
        if c == open_c {
            depth += 1;
        } else if c == close_c {
            depth -= 1;
            if depth == 0 {
                return Some(open + i);
            }
        }
    }
    None
}

fn parse_list(s: &str) -> Result<Vec<QualExpr>> {
    split_top_level(s).into_iter().map(parse_type).collect()
}

/// Parse the type syntax described in the module docs.
pub fn parse_type(s: &str) -> Result<QualExpr> {
    let s = s.trim();
    if s.is_empty() {
        bail!("empty type");
    }

    if s.starts_with("fn(") {
        let close = matching_close(s, 2, '(', ')')
            .with_context(|| format!("unbalanced parentheses in `{s}`"))?;
        let args = parse_list(&s[3..close])?;
        let tail = s[close + 1..].trim();
        let ret = match tail.strip_prefix("->") {
            Some(ret) => parse_type(ret)?,
            None if tail.is_empty() => QualExpr::plain(TypeExpr::Builtin(Primitive::Void)),
            None => bail!("expected `->` after the arguments of `{s}`"),
        };
        return Ok(QualExpr::plain(TypeExpr::Function {
            ret: Box::new(ret),
            args,
        }));
    }

    if let Some(rest) = s.strip_suffix(" const") {
        let mut inner = parse_type(rest)?;
        inner.qualifiers.is_const = true;
        return Ok(inner);
    }
    if let Some(rest) = s.strip_suffix(" volatile") {
        let mut inner = parse_type(rest)?;
        inner.qualifiers.is_volatile = true;
        return Ok(inner);
    }

    let pointer = if let Some(rest) = s.strip_suffix("&&") {
        Some((rest, PointerModifier::RValueReference))
    } else if let Some(rest) = s.strip_suffix('&') {
        Some((rest, PointerModifier::LValueReference))
    } else {
        s.strip_suffix('*').map(|rest| (rest, PointerModifier::Pointer))
    };
    if let Some((rest, modifier)) = pointer {
        let pointee = parse_type(rest)?;
        return Ok(QualExpr::plain(TypeExpr::Pointer(Box::new(pointee), modifier)));
    }

    if s.ends_with(']') {
        let open = s
            .rfind('[')
            .with_context(|| format!("unbalanced brackets in `{s}`"))?;
        let size = s[open + 1..s.len() - 1].trim();
        let size = if size.is_empty() {
            ArraySize::Variable
        } else {
            ArraySize::Constant(
                size.parse()
                    .with_context(|| format!("invalid array size in `{s}`"))?,
            )
        };
        let element = parse_type(&s[..open])?;
        return Ok(QualExpr::plain(TypeExpr::Array(Box::new(element), size)));
    }

    if s.starts_with('(') && matching_close(s, 0, '(', ')') == Some(s.len() - 1) {
        return parse_type(&s[1..s.len() - 1]);
    }

    if let Some(rest) = s.strip_prefix("const ") {
        let mut inner = parse_type(rest)?;
        inner.qualifiers.is_const = true;
        return Ok(inner);
    }
    if let Some(rest) = s.strip_prefix("volatile ") {
        let mut inner = parse_type(rest)?;
        inner.qualifiers.is_volatile = true;
        return Ok(inner);
    }

    if let Some(name) = s.strip_prefix('$') {
        return Ok(QualExpr::plain(TypeExpr::Param(name.to_string())));
    }
    if let Some(p) = primitive_by_name(s) {
        return Ok(QualExpr::plain(TypeExpr::Builtin(p)));
    }
    if let Some(open) = s.find('<') {
        if !s.ends_with('>') {
            bail!("unbalanced template brackets in `{s}`");
        }
        let name = s[..open].trim();
        let args = parse_list(&s[open + 1..s.len() - 1])?;
        if name == "memberptr" {
            let [pointee] = <[QualExpr; 1]>::try_from(args)
                .map_err(|_| anyhow::anyhow!("memberptr takes one argument in `{s}`"))?;
            return Ok(QualExpr::plain(TypeExpr::MemberPointer(Box::new(pointee))));
        }
        return Ok(QualExpr::plain(TypeExpr::Template {
            name: name.to_string(),
            args,
        }));
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
    {
        bail!("cannot parse type `{s}`");
    }
    Ok(QualExpr::plain(TypeExpr::Named(s.to_string())))
}

impl QualExpr {
    fn plain(expr: TypeExpr) -> Self {
        Self {
            expr,
            qualifiers: TypeQualifiers::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Phase 1: declarations
// ---------------------------------------------------------------------------

/// Where a resolved type is stored.
#[derive(Debug, Clone, Copy)]
enum TypeSlot {
    /// Field, parameter or typedef type.
    Typed,
    /// Function or method return type.
    Return,
}

#[derive(Debug)]
struct PendingType {
    decl: DeclId,
    slot: TypeSlot,
    /// Scope names are looked up from.
    scope: DeclId,
    ty: QualExpr,
}

#[derive(Debug)]
struct PendingBase {
    class: DeclId,
    name: String,
}

/// Collects the work of phase 1 across every unit.
#[derive(Default)]
struct Extractor {
    types: Vec<PendingType>,
    bases: Vec<PendingBase>,
    /// Classes owned by a class template; never looked up by name.
    templated: HashSet<DeclId>,
    diagnostics: Vec<Diagnostic>,
}

fn placeholder() -> QualifiedType {
    QualifiedType::new(Type::Builtin(Primitive::Void))
}

impl Extractor {
    fn pend(&mut self, decl: DeclId, slot: TypeSlot, scope: DeclId, ty: &str) -> Result<()> {
        let parsed = parse_type(ty).with_context(|| format!("type of declaration {decl}"))?;
        self.types.push(PendingType {
            decl,
            slot,
            scope,
            ty: parsed,
        });
        Ok(())
    }

    fn apply_common(lib: &mut Library, id: DeclId, desc: &DeclDesc) {
        let decl = lib.decl_mut(id);
        decl.comment = desc.comment.clone();
        decl.is_incomplete = desc.incomplete;
        decl.exclude_from_passes = desc.exclude_passes.iter().copied().collect();
        if desc.ignore {
            decl.set_explicitly_ignored(true);
        }
    }

    fn add_params(
        &mut self,
        lib: &mut Library,
        owner: DeclId,
        scope: DeclId,
        params: &[MemberDesc],
    ) -> Result<()> {
        for param in params {
            let kind = DeclKind::Parameter(Parameter { ty: placeholder() });
            let id = lib.add_decl(owner, &param.name, kind);
            lib.decl_mut(id).comment = param.comment.clone();
            if param.ignore {
                lib.decl_mut(id).set_explicitly_ignored(true);
            }
            self.pend(id, TypeSlot::Typed, scope, &param.ty)?;
        }
        Ok(())
    }

    fn add_function(
        &mut self,
        lib: &mut Library,
        parent: DeclId,
        desc: &DeclDesc,
    ) -> Result<DeclId> {
        let mut function = Function::new(placeholder());
        function.is_variadic = desc.variadic;
        function.is_inline = desc.inline;
        function.calling_convention = desc.calling_convention;
        let id = lib.add_decl(parent, &desc.name, DeclKind::Function(function));
        Self::apply_common(lib, id, desc);
        self.pend(id, TypeSlot::Return, parent, desc.returns.as_deref().unwrap_or("void"))?;
        self.add_params(lib, id, parent, &desc.params)?;
        Ok(id)
    }

    fn add_method(&mut self, lib: &mut Library, class: DeclId, desc: &MethodDesc) -> Result<()> {
        let mut function = Function::new(placeholder());
        function.is_variadic = desc.variadic;
        let method = Method {
            function,
            is_static: desc.is_static,
            access: desc.access,
            kind: desc.kind,
            conversion: MethodConversion::None,
        };
        let id = lib.add_decl(class, &desc.name, DeclKind::Method(method));
        let decl = lib.decl_mut(id);
        decl.comment = desc.comment.clone();
        decl.exclude_from_passes = desc.exclude_passes.iter().copied().collect();
        if desc.ignore {
            decl.set_explicitly_ignored(true);
        }
        self.pend(id, TypeSlot::Return, class, desc.returns.as_deref().unwrap_or("void"))?;
        self.add_params(lib, id, class, &desc.params)
    }

    /// Fill in fields, methods, nested declarations and bases of a class.
    fn fill_class(&mut self, lib: &mut Library, id: DeclId, desc: &DeclDesc) -> Result<()> {
        for field in &desc.fields {
            let kind = DeclKind::Field(Field { ty: placeholder() });
            let fid = lib.add_decl(id, &field.name, kind);
            lib.decl_mut(fid).comment = field.comment.clone();
            if field.ignore {
                lib.decl_mut(fid).set_explicitly_ignored(true);
            }
            self.pend(fid, TypeSlot::Typed, id, &field.ty)?;
        }
        for method in &desc.methods {
            self.add_method(lib, id, method)?;
        }
        for nested in &desc.decls {
            self.add_decl(lib, id, nested)?;
        }
        for base in &desc.bases {
            self.bases.push(PendingBase {
                class: id,
                name: base.clone(),
            });
        }
        Ok(())
    }

    fn new_class(desc: &DeclDesc) -> Class {
        Class {
            semantics: desc.semantics,
            is_union: desc.union,
            ..Class::default()
        }
    }

    fn add_decl(&mut self, lib: &mut Library, parent: DeclId, desc: &DeclDesc) -> Result<DeclId> {
        let id = match desc.kind {
            DescKind::Namespace => {
                let id = lib.add_decl(parent, &desc.name, DeclKind::Namespace(Namespace::default()));
                Self::apply_common(lib, id, desc);
                for child in &desc.decls {
                    self.add_decl(lib, id, child)?;
                }
                id
            }
            DescKind::Class => {
                let id = lib.add_decl(parent, &desc.name, DeclKind::Class(Self::new_class(desc)));
                Self::apply_common(lib, id, desc);
                self.fill_class(lib, id, desc)?;
                id
            }
            DescKind::Function => self.add_function(lib, parent, desc)?,
            DescKind::Typedef => {
                let ty = desc
                    .ty
                    .as_deref()
                    .with_context(|| format!("typedef `{}` has no type", desc.name))?;
                let kind = DeclKind::Typedef(Typedef { ty: placeholder() });
                let id = lib.add_decl(parent, &desc.name, kind);
                Self::apply_common(lib, id, desc);
                self.pend(id, TypeSlot::Typed, parent, ty)?;
                id
            }
            DescKind::Enum => {
                let integer_type = desc.integer_type.unwrap_or(Primitive::Int32);
                if !integer_type.is_integer() {
                    bail!("enum `{}` has a non-integer underlying type", desc.name);
                }
                let items = desc
                    .items
                    .iter()
                    .map(|i| EnumItem {
                        name: i.name.clone(),
                        value: i.value,
                        comment: i.comment.clone(),
                    })
                    .collect();
                let en = Enumeration {
                    items,
                    integer_type,
                    is_flags: false,
                };
                let id = lib.add_decl(parent, &desc.name, DeclKind::Enum(en));
                Self::apply_common(lib, id, desc);
                id
            }
            DescKind::ClassTemplate => {
                let mut class = Decl::new(&desc.name, DeclKind::Class(Self::new_class(desc)));
                class.namespace = Some(parent);
                let templated = lib.insert(class);
                self.templated.insert(templated);
                self.fill_class(lib, templated, desc)?;
                let template = ClassTemplate {
                    templated,
                    parameters: desc.parameters.clone(),
                };
                let id = lib.add_decl(parent, &desc.name, DeclKind::ClassTemplate(template));
                Self::apply_common(lib, id, desc);
                id
            }
            DescKind::FunctionTemplate => {
                let mut function = Decl::new(
                    &desc.name,
                    DeclKind::Function(Function::new(placeholder())),
                );
                function.namespace = Some(parent);
                let templated = lib.insert(function);
                self.pend(
                    templated,
                    TypeSlot::Return,
                    parent,
                    desc.returns.as_deref().unwrap_or("void"),
                )?;
                self.add_params(lib, templated, parent, &desc.params)?;
                let template = FunctionTemplate {
                    templated,
                    parameters: desc.parameters.clone(),
                };
                let id = lib.add_decl(parent, &desc.name, DeclKind::FunctionTemplate(template));
                Self::apply_common(lib, id, desc);
                id
            }
            DescKind::Macro => {
                let expression = desc.value.clone().unwrap_or_default();
                let id = lib.add_decl(parent, &desc.name, DeclKind::Macro(MacroDefinition { expression }));
                Self::apply_common(lib, id, desc);
                id
            }
            DescKind::Event => {
                let id = lib.add_decl(parent, &desc.name, DeclKind::Event(Event::default()));
                Self::apply_common(lib, id, desc);
                self.add_params(lib, id, parent, &desc.params)?;
                id
            }
        };
        trace!(id = %id, name = %desc.name, kind = ?desc.kind, "extracted declaration");
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Phase 2: name resolution
// ---------------------------------------------------------------------------

/// Named types visible for resolution, keyed by qualified original name.
struct NameIndex {
    tags: HashMap<String, DeclId>,
    templates: HashMap<String, DeclId>,
}

impl NameIndex {
    fn build(lib: &Library, templated: &HashSet<DeclId>) -> Self {
        let mut tags: HashMap<String, DeclId> = HashMap::new();
        let mut templates = HashMap::new();
        for decl in lib.iter() {
            let id = decl.id();
            match decl.kind {
                DeclKind::Class(_) if templated.contains(&id) => {}
                DeclKind::Class(_) | DeclKind::Enum(_) | DeclKind::Typedef(_) => {
                    let name = lib.qualified_original_name(id);
                    // Definitions win over forward declarations.
                    let replace = match tags.get(&name) {
                        None => true,
                        Some(&existing) => {
                            lib.decl(existing).is_incomplete && !decl.is_incomplete
                        }
                    };
                    if replace {
                        tags.insert(name, id);
                    }
                }
                DeclKind::ClassTemplate(_) => {
                    templates
                        .entry(lib.qualified_original_name(id))
                        .or_insert(id);
                }
                _ => {}
            }
        }
        Self { tags, templates }
    }

    /// Look `name` up from `scope` outwards, as C++ unqualified lookup does.
    fn lookup(
        map: &HashMap<String, DeclId>,
        lib: &Library,
        scope: DeclId,
        name: &str,
    ) -> Option<DeclId> {
        let mut current = Some(scope);
        while let Some(cur) = current {
            let decl = lib.decl(cur);
            if decl.namespace.is_none() {
                break;
            }
            let key = format!("{}::{name}", lib.qualified_original_name(cur));
            if let Some(&id) = map.get(&key) {
                return Some(id);
            }
            current = decl.namespace;
        }
        map.get(name).copied()
    }
}

fn root_of(lib: &Library, mut id: DeclId) -> DeclId {
    while let Some(parent) = lib.decl(id).namespace {
        id = parent;
    }
    id
}

struct Resolver<'e> {
    index: NameIndex,
    diagnostics: &'e mut Vec<Diagnostic>,
}

impl Resolver<'_> {
    fn unresolved(&mut self, lib: &Library, scope: DeclId, name: &str) {
        let file = lib
            .unit_of(scope)
            .map(|u| u.file_name.clone())
            .unwrap_or_default();
        warn!(file = %file, name, "unresolved type; assuming an incomplete class");
        self.diagnostics.push(Diagnostic {
            file,
            level: DiagnosticLevel::Warning,
            message: format!("unresolved type `{name}`; assuming an incomplete class"),
        });
    }

    fn resolve_tag(&mut self, lib: &mut Library, scope: DeclId, name: &str) -> Type {
        if let Some(id) = NameIndex::lookup(&self.index.tags, lib, scope, name) {
            return match lib.decl(id).kind {
                DeclKind::Typedef(_) => Type::typedef(id),
                _ => Type::tag(id),
            };
        }
        self.unresolved(lib, scope, name);
        let root = root_of(lib, scope);
        let id = lib.add_decl(root, name, DeclKind::Class(Class::default()));
        lib.decl_mut(id).is_incomplete = true;
        self.index.tags.insert(name.to_string(), id);
        Type::tag(id)
    }

    fn resolve_template(&mut self, lib: &mut Library, scope: DeclId, name: &str) -> DeclId {
        if let Some(id) = NameIndex::lookup(&self.index.templates, lib, scope, name) {
            return id;
        }
        self.unresolved(lib, scope, name);
        let root = root_of(lib, scope);
        let mut class = Decl::new(name, DeclKind::Class(Class::default()));
        class.namespace = Some(root);
        class.is_incomplete = true;
        let templated = lib.insert(class);
        let template = ClassTemplate {
            templated,
            parameters: Vec::new(),
        };
        let id = lib.add_decl(root, name, DeclKind::ClassTemplate(template));
        lib.decl_mut(id).is_incomplete = true;
        self.index.templates.insert(name.to_string(), id);
        id
    }

    fn resolve(&mut self, lib: &mut Library, scope: DeclId, expr: &QualExpr) -> QualifiedType {
        let ty = match &expr.expr {
            TypeExpr::Builtin(p) => Type::Builtin(*p),
            TypeExpr::Pointer(pointee, modifier) => Type::Pointer(PointerType {
                pointee: Box::new(self.resolve(lib, scope, pointee)),
                modifier: *modifier,
            }),
            TypeExpr::Array(element, size) => Type::Array(ArrayType {
                element: Box::new(self.resolve(lib, scope, element)),
                size: *size,
            }),
            TypeExpr::Function { ret, args } => Type::Function(FunctionType {
                return_type: Box::new(self.resolve(lib, scope, ret)),
                arguments: args.iter().map(|a| self.resolve(lib, scope, a)).collect(),
            }),
            TypeExpr::MemberPointer(pointee) => Type::MemberPointer(MemberPointerType {
                pointee: Box::new(self.resolve(lib, scope, pointee)),
            }),
            TypeExpr::Named(name) => self.resolve_tag(lib, scope, name),
            TypeExpr::Template { name, args } => {
                let template = self.resolve_template(lib, scope, name);
                Type::TemplateSpecialization(TemplateSpecializationType {
                    template,
                    arguments: args.iter().map(|a| self.resolve(lib, scope, a)).collect(),
                })
            }
            TypeExpr::Param(name) => Type::TemplateParameter(TemplateParameterType {
                name: name.clone(),
            }),
        };
        QualifiedType {
            ty,
            qualifiers: expr.qualifiers,
        }
    }
}

fn store_type(lib: &mut Library, id: DeclId, slot: TypeSlot, ty: QualifiedType) {
    match (slot, &mut lib.decl_mut(id).kind) {
        (TypeSlot::Typed, DeclKind::Field(f)) => f.ty = ty,
        (TypeSlot::Typed, DeclKind::Parameter(p)) => p.ty = ty,
        (TypeSlot::Typed, DeclKind::Typedef(t)) => t.ty = ty,
        (TypeSlot::Return, DeclKind::Function(f)) => f.return_type = ty,
        (TypeSlot::Return, DeclKind::Method(m)) => m.function.return_type = ty,
        (slot, kind) => warn!(decl = %id, ?slot, kind = kind.label(), "no slot for resolved type"),
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Add every unit to `library`, resolve type names across all of them, and
/// return the front-end diagnostics (those listed in the descriptions plus
/// those produced by resolution).
pub fn extract_units(library: &mut Library, units: &[UnitDesc]) -> Result<Vec<Diagnostic>> {
    let mut extractor = Extractor::default();

    for unit in units {
        let root = library.add_unit(&unit.file, unit.system);
        for desc in &unit.decls {
            extractor
                .add_decl(library, root, desc)
                .with_context(|| format!("extracting `{}` in {}", desc.name, unit.file))?;
        }
        for diag in &unit.diagnostics {
            let mut diag = diag.clone();
            if diag.file.is_empty() {
                diag.file = unit.file.clone();
            }
            extractor.diagnostics.push(diag);
        }
        debug!(file = %unit.file, system = unit.system, decls = unit.decls.len(), "added unit");
    }

    let Extractor {
        types,
        bases,
        templated,
        mut diagnostics,
    } = extractor;
    let mut resolver = Resolver {
        index: NameIndex::build(library, &templated),
        diagnostics: &mut diagnostics,
    };

    for pending in &types {
        let ty = resolver.resolve(library, pending.scope, &pending.ty);
        store_type(library, pending.decl, pending.slot, ty);
    }
    for base in &bases {
        let scope = library.decl(base.class).namespace.unwrap_or(base.class);
        match resolver.resolve_tag(library, scope, &base.name) {
            Type::Tag(tag) => {
                if let Some(class) = library.decl_mut(base.class).as_class_mut() {
                    class.bases.push(tag.decl);
                }
            }
            _ => warn!(class = %library.decl(base.class), base = %base.name, "base is not a class"),
        }
    }

    info!(
        units = units.len(),
        decls = library.len(),
        resolved_types = types.len(),
        diagnostics = diagnostics.len(),
        "extraction complete"
    );
    Ok(diagnostics)
}

/// Convenience wrapper: load the description files and extract them.
pub fn extract_files(library: &mut Library, paths: &[&Path]) -> Result<Vec<Diagnostic>> {
    let units = paths
        .iter()
        .map(|p| load_unit(p))
        .collect::<Result<Vec<_>>>()?;
    extract_units(library, &units)
}
