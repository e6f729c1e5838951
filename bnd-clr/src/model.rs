//! Declaration model: the arena-backed tree shared by extraction, the pass
//! pipeline and the generators.
//!
//! Every declaration lives in a single [`Library`] arena and is addressed by
//! a [`DeclId`]. Parent links (`Decl::namespace`), complete-counterpart links
//! and template links are plain handles, so the tree has no ownership cycles
//! and passes can re-flag nodes without invalidating anything.

use std::collections::BTreeSet;
use std::fmt;

use bitflags::bitflags;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::*;

/// Stable handle of a declaration inside a [`Library`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Independent reasons a declaration is left out.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct IgnoreFlags: u8 {
        /// Not emitted by the generators.
        const GENERATION = 1 << 0;
        /// Not visited by the pass pipeline.
        const PROCESSING = 1 << 1;
        /// Ignored on request (by a pass or by the user).
        const EXPLICIT = 1 << 2;
    }
}

/// Identifies a pass for per-declaration exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    ResolveIncompleteDecls,
    CleanInvalidDeclNames,
    CheckFlagEnums,
    FunctionToStaticMethod,
    RenameCase,
}

#[derive(Debug, Clone)]
pub struct TranslationUnit {
    pub file_name: String,
    /// System headers never need forward references collected.
    pub is_system_header: bool,
}

/// A namespace. Translation units are namespaces with `unit` set.
#[derive(Debug, Default)]
pub struct Namespace {
    pub declarations: Vec<DeclId>,
    pub unit: Option<TranslationUnit>,
}

/// Managed-side representation policy of a class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassSemantics {
    /// Copied/embedded by value.
    Value,
    /// Wrapper aliasing a retained native pointer.
    #[default]
    Reference,
}

#[derive(Debug, Default)]
pub struct Class {
    pub fields: Vec<DeclId>,
    pub methods: Vec<DeclId>,
    /// Nested classes, enums and typedefs.
    pub declarations: Vec<DeclId>,
    pub bases: Vec<DeclId>,
    pub semantics: ClassSemantics,
    pub is_union: bool,
}

impl Class {
    pub fn is_value_type(&self) -> bool {
        self.semantics == ClassSemantics::Value
    }

    pub fn is_ref_type(&self) -> bool {
        self.semantics == ClassSemantics::Reference
    }
}

#[derive(Debug)]
pub struct Field {
    pub ty: QualifiedType,
}

/// Calling convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallConv {
    /// Platform default (cdecl on most platforms).
    #[default]
    Cdecl,
    Stdcall,
    Fastcall,
    Thiscall,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub return_type: QualifiedType,
    pub parameters: Vec<DeclId>,
    pub is_variadic: bool,
    pub is_inline: bool,
    pub calling_convention: CallConv,
}

impl Function {
    pub fn new(return_type: QualifiedType) -> Self {
        Self {
            return_type,
            parameters: Vec::new(),
            is_variadic: false,
            is_inline: false,
            calling_convention: CallConv::Cdecl,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessSpecifier {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    #[default]
    Normal,
    Constructor,
    Destructor,
    Operator,
}

/// Records how a synthesized method forwards to native code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MethodConversion {
    #[default]
    None,
    /// Forwards to a plain function call, not a `this`-bound call.
    FunctionToStaticMethod,
    FunctionToInstanceMethod,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub function: Function,
    pub is_static: bool,
    pub access: AccessSpecifier,
    pub kind: MethodKind,
    pub conversion: MethodConversion,
}

#[derive(Debug)]
pub struct Parameter {
    pub ty: QualifiedType,
}

#[derive(Debug)]
pub struct Typedef {
    pub ty: QualifiedType,
}

#[derive(Debug, Clone)]
pub struct EnumItem {
    pub name: String,
    pub value: i64,
    pub comment: Option<String>,
}

#[derive(Debug)]
pub struct Enumeration {
    pub items: Vec<EnumItem>,
    pub integer_type: Primitive,
    /// Set by the flag-enum check; generators attach bitwise operators.
    pub is_flags: bool,
}

#[derive(Debug)]
pub struct ClassTemplate {
    /// The primary (templated) class declaration.
    pub templated: DeclId,
    pub parameters: Vec<String>,
}

#[derive(Debug)]
pub struct FunctionTemplate {
    pub templated: DeclId,
    pub parameters: Vec<String>,
}

#[derive(Debug)]
pub struct MacroDefinition {
    pub expression: String,
}

#[derive(Debug, Default)]
pub struct Event {
    pub parameters: Vec<DeclId>,
}

/// The closed set of declaration variants.
#[derive(Debug)]
pub enum DeclKind {
    Namespace(Namespace),
    Class(Class),
    Field(Field),
    Function(Function),
    Method(Method),
    Parameter(Parameter),
    Typedef(Typedef),
    Enum(Enumeration),
    ClassTemplate(ClassTemplate),
    FunctionTemplate(FunctionTemplate),
    Macro(MacroDefinition),
    Event(Event),
}

impl DeclKind {
    pub fn label(&self) -> &'static str {
        match self {
            DeclKind::Namespace(_) => "namespace",
            DeclKind::Class(_) => "class",
            DeclKind::Field(_) => "field",
            DeclKind::Function(_) => "function",
            DeclKind::Method(_) => "method",
            DeclKind::Parameter(_) => "parameter",
            DeclKind::Typedef(_) => "typedef",
            DeclKind::Enum(_) => "enum",
            DeclKind::ClassTemplate(_) => "class template",
            DeclKind::FunctionTemplate(_) => "function template",
            DeclKind::Macro(_) => "macro",
            DeclKind::Event(_) => "event",
        }
    }
}

/// A C++ declaration.
#[derive(Debug)]
pub struct Decl {
    id: DeclId,
    /// Enclosing scope. `None` only for translation-unit roots.
    pub namespace: Option<DeclId>,
    name: String,
    original_name: String,
    /// Doxygen-style brief comment.
    pub comment: Option<String>,
    pub ignore: IgnoreFlags,
    /// True if the declaration has no definition.
    pub is_incomplete: bool,
    pub complete_decl: Option<DeclId>,
    pub definition_order: u32,
    pub exclude_from_passes: BTreeSet<PassKind>,
    pub kind: DeclKind,
}

impl Decl {
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        let mut decl = Self {
            id: DeclId(u32::MAX),
            namespace: None,
            name: String::new(),
            original_name: String::new(),
            comment: None,
            ignore: IgnoreFlags::empty(),
            is_incomplete: false,
            complete_decl: None,
            definition_order: 0,
            exclude_from_passes: BTreeSet::new(),
            kind,
        };
        decl.set_name(name);
        decl
    }

    pub fn id(&self) -> DeclId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name before any pass rewrote it.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Renames the declaration. The first non-empty name also becomes the
    /// original name; later renames leave it alone.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        if self.original_name.is_empty() {
            self.original_name = self.name.clone();
        }
    }

    /// Only meaningful for synthesized declarations that must keep pointing
    /// at an existing native symbol.
    pub fn set_original_name(&mut self, name: impl Into<String>) {
        self.original_name = name.into();
    }

    pub fn is_ignored(&self) -> bool {
        !self.ignore.is_empty()
    }

    pub fn is_explicitly_ignored(&self) -> bool {
        self.ignore.contains(IgnoreFlags::EXPLICIT)
    }

    pub fn set_explicitly_ignored(&mut self, value: bool) {
        self.ignore.set(IgnoreFlags::EXPLICIT, value);
    }

    pub fn set_generated(&mut self, value: bool) {
        self.ignore.set(IgnoreFlags::GENERATION, !value);
    }

    pub fn set_processed(&mut self, value: bool) {
        self.ignore.set(IgnoreFlags::PROCESSING, !value);
    }

    pub fn as_namespace(&self) -> Option<&Namespace> {
        match &self.kind {
            DeclKind::Namespace(ns) => Some(ns),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Class> {
        match &self.kind {
            DeclKind::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_class_mut(&mut self) -> Option<&mut Class> {
        match &mut self.kind {
            DeclKind::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Enumeration> {
        match &self.kind {
            DeclKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// The signature part of a function or method.
    pub fn as_function(&self) -> Option<&Function> {
        match &self.kind {
            DeclKind::Function(f) => Some(f),
            DeclKind::Method(m) => Some(&m.function),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match &self.kind {
            DeclKind::Method(m) => Some(m),
            _ => None,
        }
    }

    /// The qualified type of a field, parameter or typedef.
    pub fn qualified_type(&self) -> Option<&QualifiedType> {
        match &self.kind {
            DeclKind::Field(f) => Some(&f.ty),
            DeclKind::Parameter(p) => Some(&p.ty),
            DeclKind::Typedef(t) => Some(&t.ty),
            _ => None,
        }
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original_name)
    }
}

/// Severity of a front-end diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Ignored,
    Note,
    Warning,
    Error,
    Fatal,
}

/// A message reported by the front end for one file.
#[derive(Debug, Clone, Deserialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub file: String,
    pub level: DiagnosticLevel,
    pub message: String,
}

/// Where a child is stored inside its parent.
enum Slot {
    Field,
    Method,
    Parameter,
    Other,
}

/// The declaration arena plus the ordered list of translation units.
#[derive(Debug, Default)]
pub struct Library {
    decls: Vec<Decl>,
    units: Vec<DeclId>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a translation-unit root namespace.
    pub fn add_unit(&mut self, file_name: &str, is_system_header: bool) -> DeclId {
        let ns = Namespace {
            declarations: Vec::new(),
            unit: Some(TranslationUnit {
                file_name: file_name.to_string(),
                is_system_header,
            }),
        };
        let id = self.insert(Decl::new(file_name, DeclKind::Namespace(ns)));
        self.units.push(id);
        id
    }

    /// Create a declaration under `parent` and link it into the parent's
    /// member lists.
    pub fn add_decl(&mut self, parent: DeclId, name: &str, kind: DeclKind) -> DeclId {
        let mut decl = Decl::new(name, kind);
        decl.namespace = Some(parent);
        let id = self.insert(decl);
        self.attach(parent, id);
        id
    }

    /// Move a declaration into the arena, assigning its id and definition
    /// order. The declaration is not linked into any parent.
    pub fn insert(&mut self, mut decl: Decl) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        decl.id = id;
        decl.definition_order = id.0;
        self.decls.push(decl);
        id
    }

    /// Link `child` into the member list of `parent` that matches its kind.
    pub fn attach(&mut self, parent: DeclId, child: DeclId) {
        let slot = match &self.decls[child.index()].kind {
            DeclKind::Field(_) => Slot::Field,
            DeclKind::Method(_) => Slot::Method,
            DeclKind::Parameter(_) => Slot::Parameter,
            _ => Slot::Other,
        };
        let parent_decl = &mut self.decls[parent.index()];
        match (&mut parent_decl.kind, slot) {
            (DeclKind::Namespace(ns), Slot::Other) => ns.declarations.push(child),
            (DeclKind::Class(c), Slot::Field) => c.fields.push(child),
            (DeclKind::Class(c), Slot::Method) => c.methods.push(child),
            (DeclKind::Class(c), Slot::Other) => c.declarations.push(child),
            (DeclKind::Function(f), Slot::Parameter) => f.parameters.push(child),
            (DeclKind::Method(m), Slot::Parameter) => m.function.parameters.push(child),
            (DeclKind::Event(e), Slot::Parameter) => e.parameters.push(child),
            (kind, _) => warn!(
                parent = %parent,
                parent_kind = kind.label(),
                child = %child,
                "declaration cannot hold this kind of child; left detached"
            ),
        }
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }

    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decl> {
        self.decls.iter()
    }

    /// Translation-unit roots in the order they were added.
    pub fn units(&self) -> &[DeclId] {
        &self.units
    }

    /// The translation unit a declaration belongs to.
    pub fn unit_of(&self, id: DeclId) -> Option<&TranslationUnit> {
        let mut current = Some(id);
        while let Some(cur) = current {
            let decl = self.decl(cur);
            if let Some(unit) = decl.as_namespace().and_then(|ns| ns.unit.as_ref()) {
                return Some(unit);
            }
            current = decl.namespace;
        }
        None
    }

    /// Direct children in storage order: namespace declarations, class
    /// fields, methods and nested declarations, function parameters.
    pub fn children(&self, id: DeclId) -> Vec<DeclId> {
        match &self.decl(id).kind {
            DeclKind::Namespace(ns) => ns.declarations.clone(),
            DeclKind::Class(c) => c
                .fields
                .iter()
                .chain(&c.methods)
                .chain(&c.declarations)
                .copied()
                .collect(),
            DeclKind::Function(f) => f.parameters.clone(),
            DeclKind::Method(m) => m.function.parameters.clone(),
            DeclKind::Event(e) => e.parameters.clone(),
            _ => Vec::new(),
        }
    }

    /// Enclosing named scopes (outermost first), excluding the translation
    /// unit root.
    fn scope_chain(&self, id: DeclId) -> Vec<DeclId> {
        let mut chain = Vec::new();
        let mut current = self.decl(id).namespace;
        while let Some(cur) = current {
            let decl = self.decl(cur);
            if decl.namespace.is_none() {
                break;
            }
            chain.push(cur);
            current = decl.namespace;
        }
        chain.reverse();
        chain
    }

    /// Namespace-qualified original name, e.g. `ns::Foo`.
    pub fn qualified_original_name(&self, id: DeclId) -> String {
        let mut parts: Vec<&str> = self
            .scope_chain(id)
            .into_iter()
            .map(|s| self.decl(s).original_name())
            .collect();
        parts.push(self.decl(id).original_name());
        parts.join("::")
    }

    /// Namespace-qualified current name, as seen from managed code.
    pub fn qualified_name(&self, id: DeclId) -> String {
        let mut parts: Vec<&str> = self
            .scope_chain(id)
            .into_iter()
            .map(|s| self.decl(s).name())
            .collect();
        parts.push(self.decl(id).name());
        parts.join("::")
    }

    /// A declaration is generated when neither it nor any enclosing scope
    /// carries [`IgnoreFlags::GENERATION`].
    pub fn is_generated(&self, id: DeclId) -> bool {
        self.composed_status(id, IgnoreFlags::GENERATION)
    }

    /// Same composition as [`Library::is_generated`] for
    /// [`IgnoreFlags::PROCESSING`].
    pub fn is_processed(&self, id: DeclId) -> bool {
        self.composed_status(id, IgnoreFlags::PROCESSING)
    }

    fn composed_status(&self, id: DeclId, flag: IgnoreFlags) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            let decl = self.decl(cur);
            if decl.ignore.contains(flag) {
                return false;
            }
            current = decl.namespace;
        }
        true
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Find the first declaration (in definition order) named `name` that
    /// satisfies `pred`. `name` may be qualified.
    pub fn find_decl(&self, name: &str, pred: impl Fn(&Decl) -> bool) -> Option<DeclId> {
        let qualified = name.contains("::");
        self.decls
            .iter()
            .filter(|d| pred(d))
            .find(|d| {
                if qualified {
                    self.qualified_original_name(d.id) == name || self.qualified_name(d.id) == name
                } else {
                    d.name() == name || d.original_name() == name
                }
            })
            .map(|d| d.id)
    }

    pub fn find_class(&self, name: &str) -> Option<DeclId> {
        self.find_decl(name, |d| d.as_class().is_some())
    }

    /// A class with a definition, matched against its current name.
    pub fn find_complete_class(&self, name: &str) -> Option<DeclId> {
        self.decls
            .iter()
            .find(|d| d.as_class().is_some() && !d.is_incomplete && d.name() == name)
            .map(|d| d.id)
    }

    pub fn find_enum(&self, name: &str) -> Option<DeclId> {
        self.find_decl(name, |d| d.as_enum().is_some())
    }

    pub fn find_typedef(&self, name: &str) -> Option<DeclId> {
        self.find_decl(name, |d| matches!(d.kind, DeclKind::Typedef(_)))
    }

    pub fn find_function(&self, name: &str) -> Option<DeclId> {
        self.find_decl(name, |d| matches!(d.kind, DeclKind::Function(_)))
    }

    /// Find the complete definition matching a forward declaration: same
    /// qualified original name and kind, not itself incomplete.
    pub fn find_complete_decl(&self, id: DeclId) -> Option<DeclId> {
        let target = self.decl(id);
        let name = self.qualified_original_name(id);
        self.decls
            .iter()
            .filter(|d| d.id != id && !d.is_incomplete)
            .filter(|d| d.kind.label() == target.kind.label())
            .find(|d| self.qualified_original_name(d.id) == name)
            .map(|d| d.id)
    }

    // -----------------------------------------------------------------------
    // Ordering helpers
    // -----------------------------------------------------------------------

    /// Restore definition order inside every namespace and class.
    pub fn sort_declarations(&mut self) {
        let orders: Vec<u32> = self.decls.iter().map(|d| d.definition_order).collect();
        let by_order = |ids: &mut Vec<DeclId>| ids.sort_by_key(|id| orders[id.index()]);
        for decl in &mut self.decls {
            match &mut decl.kind {
                DeclKind::Namespace(ns) => by_order(&mut ns.declarations),
                DeclKind::Class(c) => {
                    by_order(&mut c.fields);
                    by_order(&mut c.methods);
                    by_order(&mut c.declarations);
                }
                _ => {}
            }
        }
    }

    /// Build an enumeration from the integer `#define`s of `unit` whose
    /// names start with `prefix`. Returns `None` when no macro matches.
    pub fn generate_enum_from_macros(
        &mut self,
        unit: DeclId,
        name: &str,
        prefix: &str,
    ) -> Option<DeclId> {
        let mut items = Vec::new();
        for child in self.children(unit) {
            let decl = self.decl(child);
            let DeclKind::Macro(m) = &decl.kind else {
                continue;
            };
            if !decl.name().starts_with(prefix) {
                continue;
            }
            match parse_integer_literal(&m.expression) {
                Some(value) => items.push(EnumItem {
                    name: decl.name().to_string(),
                    value,
                    comment: decl.comment.clone(),
                }),
                None => debug!(name = decl.name(), "macro is not an integer literal"),
            }
        }
        if items.is_empty() {
            return None;
        }
        let en = Enumeration {
            items,
            integer_type: Primitive::Int32,
            is_flags: false,
        };
        let id = self.add_decl(unit, name, DeclKind::Enum(en));
        debug!(name, prefix, "generated enum from macros");
        Some(id)
    }

    // -----------------------------------------------------------------------
    // Type queries
    // -----------------------------------------------------------------------

    /// Strip typedef layers.
    pub fn desugar<'a>(&'a self, ty: &'a Type) -> &'a Type {
        let mut current = ty;
        while let Type::Typedef(td) = current {
            match self.decl(td.decl).qualified_type() {
                Some(qt) => current = &qt.ty,
                None => break,
            }
        }
        current
    }

    pub fn primitive_of(&self, ty: &Type, walk_typedefs: bool) -> Option<Primitive> {
        let ty = if walk_typedefs { self.desugar(ty) } else { ty };
        ty.as_primitive()
    }

    pub fn is_primitive(&self, ty: &Type, primitive: Primitive, walk_typedefs: bool) -> bool {
        self.primitive_of(ty, walk_typedefs) == Some(primitive)
    }

    /// If `ty` is (an alias of) a pointer to a function, return the function.
    pub fn pointee_function<'a>(&'a self, ty: &'a Type) -> Option<&'a FunctionType> {
        let pointee = self.desugar(ty).pointee()?;
        match self.desugar(&pointee.ty) {
            Type::Function(f) => Some(f),
            _ => None,
        }
    }

    /// C++ source spelling of a qualified type.
    pub fn native_spelling(&self, qt: &QualifiedType) -> String {
        let mut out = String::new();
        if qt.qualifiers.is_const {
            out.push_str("const ");
        }
        if qt.qualifiers.is_volatile {
            out.push_str("volatile ");
        }
        out.push_str(&self.type_spelling(&qt.ty));
        out
    }

    fn type_spelling(&self, ty: &Type) -> String {
        match ty {
            Type::Builtin(p) => p.native_name().to_string(),
            Type::Pointer(p) => {
                let suffix = match p.modifier {
                    PointerModifier::Pointer => "*",
                    PointerModifier::LValueReference => "&",
                    PointerModifier::RValueReference => "&&",
                };
                if let Type::Function(f) = &p.pointee.ty {
                    return format!(
                        "{}({suffix})({})",
                        self.native_spelling(&f.return_type),
                        self.argument_spelling(&f.arguments)
                    );
                }
                format!("{}{suffix}", self.native_spelling(&p.pointee))
            }
            Type::Array(a) => match a.size {
                ArraySize::Constant(n) => format!("{}[{n}]", self.native_spelling(&a.element)),
                ArraySize::Variable => format!("{}[]", self.native_spelling(&a.element)),
            },
            Type::Function(f) => format!(
                "{}({})",
                self.native_spelling(&f.return_type),
                self.argument_spelling(&f.arguments)
            ),
            Type::MemberPointer(m) => format!("{}::*", self.native_spelling(&m.pointee)),
            Type::Tag(t) => self.qualified_original_name(t.decl),
            Type::Typedef(t) => self.qualified_original_name(t.decl),
            Type::TemplateSpecialization(t) => format!(
                "{}<{}>",
                self.qualified_original_name(t.template),
                self.argument_spelling(&t.arguments)
            ),
            Type::TemplateParameter(p) => p.name.clone(),
        }
    }

    fn argument_spelling(&self, args: &[QualifiedType]) -> String {
        args.iter()
            .map(|a| self.native_spelling(a))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parse a decimal, hex (`0x1F`), octal or suffixed (`1U`, `0x10UL`) integer
/// literal, optionally negated and parenthesized. Also accepts `1 << N`.
fn parse_integer_literal(s: &str) -> Option<i64> {
    let s = s.trim().trim_start_matches('(').trim_end_matches(')').trim();
    if let Some((lhs, rhs)) = s.split_once("<<") {
        let base = parse_integer_literal(lhs)?;
        let shift = parse_integer_literal(rhs)?;
        return base.checked_shl(u32::try_from(shift).ok()?);
    }
    let (negated, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim()),
        None => (false, s),
    };
    let s = s.trim_end_matches(['u', 'U', 'l', 'L']);
    let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(octal) = s.strip_prefix('0') {
        if octal.is_empty() {
            0
        } else {
            i64::from_str_radix(octal, 8).ok()?
        }
    } else {
        s.parse::<i64>().ok()?
    };
    Some(if negated { -value } else { value })
}
