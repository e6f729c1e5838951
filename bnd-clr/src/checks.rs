//! Read-only semantic checkers over the declaration tree.

use std::collections::BTreeSet;

use tracing::trace;

use crate::model::*;
use crate::typemap::TypeMapDatabase;
use crate::types::*;
use crate::visit::{DeclVisitor, TypeVisitor};

// ---------------------------------------------------------------------------
// Completeness
// ---------------------------------------------------------------------------

/// Answers "can this be used as a concrete value?". A declaration is
/// complete unless it is marked incomplete and has no complete counterpart;
/// function signatures are complete only if every part is.
pub struct TypeCompletionChecker<'a> {
    library: &'a Library,
    type_maps: Option<&'a TypeMapDatabase>,
}

impl<'a> TypeCompletionChecker<'a> {
    pub fn new(library: &'a Library) -> Self {
        Self {
            library,
            type_maps: None,
        }
    }

    /// Also treat declarations covered by a type map as complete.
    pub fn with_type_maps(mut self, type_maps: &'a TypeMapDatabase) -> Self {
        self.type_maps = Some(type_maps);
        self
    }

    fn is_mapped(&self, id: DeclId) -> bool {
        self.type_maps
            .is_some_and(|db| db.find_for_decl(self.library, id).is_some())
    }

    pub fn is_complete_type(&mut self, ty: &QualifiedType) -> bool {
        ty.visit(self)
    }

    pub fn is_complete_decl(&mut self, id: DeclId) -> bool {
        let library = self.library;
        library.visit_decl(id, self)
    }

    fn own_status(decl: &Decl) -> bool {
        decl.complete_decl.is_some() || !decl.is_incomplete
    }

    fn signature_complete(&mut self, function: &Function) -> bool {
        function.return_type.visit(self)
            && function
                .parameters
                .iter()
                .all(|&p| self.is_complete_decl(p))
    }
}

impl TypeVisitor for TypeCompletionChecker<'_> {
    type Output = bool;

    fn visit_builtin_type(&mut self, _primitive: Primitive, _quals: TypeQualifiers) -> bool {
        true
    }

    fn visit_pointer_type(&mut self, pointer: &PointerType, _quals: TypeQualifiers) -> bool {
        pointer.pointee.visit(self)
    }

    fn visit_array_type(&mut self, array: &ArrayType, _quals: TypeQualifiers) -> bool {
        array.element.visit(self)
    }

    fn visit_function_type(&mut self, function: &FunctionType, _quals: TypeQualifiers) -> bool {
        function.return_type.visit(self) && function.arguments.iter().all(|a| a.visit(self))
    }

    fn visit_member_pointer_type(
        &mut self,
        member: &MemberPointerType,
        _quals: TypeQualifiers,
    ) -> bool {
        member.pointee.visit(self)
    }

    fn visit_tag_type(&mut self, tag: &TagType, _quals: TypeQualifiers) -> bool {
        self.is_complete_decl(tag.decl)
    }

    fn visit_typedef_type(&mut self, typedef: &TypedefType, _quals: TypeQualifiers) -> bool {
        self.is_complete_decl(typedef.decl)
    }

    fn visit_template_specialization_type(
        &mut self,
        template: &TemplateSpecializationType,
        _quals: TypeQualifiers,
    ) -> bool {
        self.is_complete_decl(template.template)
            && template.arguments.iter().all(|a| a.visit(self))
    }

    fn visit_template_parameter_type(
        &mut self,
        _param: &TemplateParameterType,
        _quals: TypeQualifiers,
    ) -> bool {
        true
    }
}

impl DeclVisitor for TypeCompletionChecker<'_> {
    type Output = bool;

    fn visit_class_decl(&mut self, decl: &Decl, _class: &Class) -> bool {
        Self::own_status(decl) || self.is_mapped(decl.id())
    }

    fn visit_field_decl(&mut self, _decl: &Decl, field: &Field) -> bool {
        field.ty.visit(self)
    }

    fn visit_function_decl(&mut self, _decl: &Decl, function: &Function) -> bool {
        self.signature_complete(function)
    }

    fn visit_method_decl(&mut self, _decl: &Decl, method: &Method) -> bool {
        self.signature_complete(&method.function)
    }

    fn visit_parameter_decl(&mut self, _decl: &Decl, parameter: &Parameter) -> bool {
        parameter.ty.visit(self)
    }

    fn visit_typedef_decl(&mut self, decl: &Decl, typedef: &Typedef) -> bool {
        self.is_mapped(decl.id()) || (Self::own_status(decl) && typedef.ty.visit(self))
    }

    fn visit_enum_decl(&mut self, decl: &Decl, _enumeration: &Enumeration) -> bool {
        Self::own_status(decl) || self.is_mapped(decl.id())
    }

    fn visit_class_template_decl(&mut self, decl: &Decl, template: &ClassTemplate) -> bool {
        self.is_mapped(decl.id())
            || (Self::own_status(decl) && self.is_complete_decl(template.templated))
    }

    fn visit_function_template_decl(&mut self, decl: &Decl, template: &FunctionTemplate) -> bool {
        Self::own_status(decl) && self.is_complete_decl(template.templated)
    }

    fn visit_macro_definition(&mut self, decl: &Decl, _mac: &MacroDefinition) -> bool {
        Self::own_status(decl)
    }

    fn visit_namespace(&mut self, decl: &Decl, _namespace: &Namespace) -> bool {
        Self::own_status(decl)
    }

    fn visit_event(&mut self, _decl: &Decl, event: &Event) -> bool {
        event.parameters.iter().all(|&p| self.is_complete_decl(p))
    }
}

// ---------------------------------------------------------------------------
// Ignore status
// ---------------------------------------------------------------------------

/// Answers "must this be left out of the generated code?". Registered type
/// maps take precedence over the declaration's own flags; an ignoring map
/// stops the recursion, while template arguments of a kept map are still
/// checked.
pub struct TypeIgnoreChecker<'a> {
    library: &'a Library,
    type_maps: &'a TypeMapDatabase,
}

impl<'a> TypeIgnoreChecker<'a> {
    pub fn new(library: &'a Library, type_maps: &'a TypeMapDatabase) -> Self {
        Self { library, type_maps }
    }

    pub fn is_ignored_type(&mut self, ty: &QualifiedType) -> bool {
        ty.visit(self)
    }

    pub fn is_ignored_decl(&mut self, id: DeclId) -> bool {
        let library = self.library;
        library.visit_decl(id, self)
    }

    fn own_status(&self, decl: &Decl) -> bool {
        decl.is_ignored() || !self.library.is_generated(decl.id())
    }

    fn mapped_status(&self, id: DeclId) -> Option<bool> {
        self.type_maps
            .find_for_decl(self.library, id)
            .map(|map| map.is_ignored())
    }

    fn signature_ignored(&mut self, function: &Function) -> bool {
        function.return_type.visit(self)
            || function
                .parameters
                .iter()
                .any(|&p| self.is_ignored_decl(p))
    }
}

impl TypeVisitor for TypeIgnoreChecker<'_> {
    type Output = bool;

    fn visit_builtin_type(&mut self, _primitive: Primitive, _quals: TypeQualifiers) -> bool {
        false
    }

    fn visit_pointer_type(&mut self, pointer: &PointerType, _quals: TypeQualifiers) -> bool {
        pointer.pointee.visit(self)
    }

    fn visit_array_type(&mut self, array: &ArrayType, _quals: TypeQualifiers) -> bool {
        array.element.visit(self)
    }

    fn visit_function_type(&mut self, function: &FunctionType, _quals: TypeQualifiers) -> bool {
        function.return_type.visit(self) || function.arguments.iter().any(|a| a.visit(self))
    }

    fn visit_member_pointer_type(
        &mut self,
        member: &MemberPointerType,
        _quals: TypeQualifiers,
    ) -> bool {
        member.pointee.visit(self)
    }

    fn visit_tag_type(&mut self, tag: &TagType, _quals: TypeQualifiers) -> bool {
        self.is_ignored_decl(tag.decl)
    }

    fn visit_typedef_type(&mut self, typedef: &TypedefType, _quals: TypeQualifiers) -> bool {
        if let Some(ignored) = self.mapped_status(typedef.decl) {
            trace!(decl = %typedef.decl, ignored, "typedef ignore status from type map");
            return ignored;
        }
        self.is_ignored_decl(typedef.decl)
    }

    fn visit_template_specialization_type(
        &mut self,
        template: &TemplateSpecializationType,
        _quals: TypeQualifiers,
    ) -> bool {
        // Only an ignoring map short-circuits; otherwise the arguments
        // still decide.
        let own = match self.mapped_status(template.template) {
            Some(true) => {
                trace!(decl = %template.template, "template ignored by type map");
                return true;
            }
            Some(false) => false,
            None => self.is_ignored_decl(template.template),
        };
        own || template.arguments.iter().any(|a| a.visit(self))
    }

    fn visit_template_parameter_type(
        &mut self,
        _param: &TemplateParameterType,
        _quals: TypeQualifiers,
    ) -> bool {
        false
    }
}

impl DeclVisitor for TypeIgnoreChecker<'_> {
    type Output = bool;

    fn visit_class_decl(&mut self, decl: &Decl, _class: &Class) -> bool {
        if let Some(ignored) = self.mapped_status(decl.id()) {
            return ignored;
        }
        self.own_status(decl)
    }

    fn visit_field_decl(&mut self, decl: &Decl, field: &Field) -> bool {
        self.own_status(decl) || field.ty.visit(self)
    }

    fn visit_function_decl(&mut self, decl: &Decl, function: &Function) -> bool {
        self.own_status(decl) || self.signature_ignored(function)
    }

    fn visit_method_decl(&mut self, decl: &Decl, method: &Method) -> bool {
        self.own_status(decl) || self.signature_ignored(&method.function)
    }

    fn visit_parameter_decl(&mut self, decl: &Decl, parameter: &Parameter) -> bool {
        decl.is_ignored() || parameter.ty.visit(self)
    }

    fn visit_typedef_decl(&mut self, decl: &Decl, typedef: &Typedef) -> bool {
        self.own_status(decl) || typedef.ty.visit(self)
    }

    fn visit_enum_decl(&mut self, decl: &Decl, _enumeration: &Enumeration) -> bool {
        if let Some(ignored) = self.mapped_status(decl.id()) {
            return ignored;
        }
        self.own_status(decl)
    }

    fn visit_class_template_decl(&mut self, decl: &Decl, template: &ClassTemplate) -> bool {
        self.own_status(decl) || self.is_ignored_decl(template.templated)
    }

    fn visit_function_template_decl(&mut self, decl: &Decl, template: &FunctionTemplate) -> bool {
        self.own_status(decl) || self.is_ignored_decl(template.templated)
    }

    fn visit_macro_definition(&mut self, decl: &Decl, _mac: &MacroDefinition) -> bool {
        self.own_status(decl)
    }

    fn visit_namespace(&mut self, decl: &Decl, _namespace: &Namespace) -> bool {
        self.own_status(decl)
    }

    fn visit_event(&mut self, decl: &Decl, event: &Event) -> bool {
        self.own_status(decl) || event.parameters.iter().any(|&p| self.is_ignored_decl(p))
    }
}

// ---------------------------------------------------------------------------
// Forward references
// ---------------------------------------------------------------------------

/// Collects the declarations a class's generated header has to
/// forward-declare: referenced classes, enums and delegate typedefs, plus
/// its bases. Declarations from system headers are never collected.
pub struct ForwardRefsCollector<'a> {
    library: &'a Library,
    owner: Option<DeclId>,
    refs: BTreeSet<DeclId>,
}

impl<'a> ForwardRefsCollector<'a> {
    pub fn new(library: &'a Library) -> Self {
        Self {
            library,
            owner: None,
            refs: BTreeSet::new(),
        }
    }

    /// Forward references of `class`, in declaration id order.
    pub fn collect(mut self, class: DeclId) -> Vec<DeclId> {
        self.owner = Some(class);
        let library = self.library;
        library.visit_decl(class, &mut self);
        self.refs.into_iter().collect()
    }

    fn add(&mut self, id: DeclId) {
        if Some(id) == self.owner {
            return;
        }
        let id = self.library.decl(id).complete_decl.unwrap_or(id);
        if self
            .library
            .unit_of(id)
            .is_some_and(|unit| unit.is_system_header)
        {
            return;
        }
        self.refs.insert(id);
    }

    fn visit_members(&mut self, ids: &[DeclId]) {
        for &id in ids {
            let library = self.library;
            library.visit_decl(id, self);
        }
    }
}

impl TypeVisitor for ForwardRefsCollector<'_> {
    type Output = ();

    fn visit_builtin_type(&mut self, _primitive: Primitive, _quals: TypeQualifiers) {}

    fn visit_pointer_type(&mut self, pointer: &PointerType, _quals: TypeQualifiers) {
        pointer.pointee.visit(self)
    }

    fn visit_array_type(&mut self, array: &ArrayType, _quals: TypeQualifiers) {
        array.element.visit(self)
    }

    fn visit_function_type(&mut self, function: &FunctionType, _quals: TypeQualifiers) {
        function.return_type.visit(self);
        for arg in &function.arguments {
            arg.visit(self);
        }
    }

    fn visit_member_pointer_type(&mut self, member: &MemberPointerType, _quals: TypeQualifiers) {
        member.pointee.visit(self)
    }

    fn visit_tag_type(&mut self, tag: &TagType, _quals: TypeQualifiers) {
        self.add(tag.decl)
    }

    fn visit_typedef_type(&mut self, typedef: &TypedefType, _quals: TypeQualifiers) {
        let lib = self.library;
        match lib.decl(typedef.decl).qualified_type() {
            Some(aliased) if lib.pointee_function(&aliased.ty).is_some() => self.add(typedef.decl),
            Some(aliased) => aliased.visit(self),
            None => {}
        }
    }

    fn visit_template_specialization_type(
        &mut self,
        template: &TemplateSpecializationType,
        _quals: TypeQualifiers,
    ) {
        for arg in &template.arguments {
            arg.visit(self);
        }
    }

    fn visit_template_parameter_type(
        &mut self,
        _param: &TemplateParameterType,
        _quals: TypeQualifiers,
    ) {
    }
}

impl DeclVisitor for ForwardRefsCollector<'_> {
    type Output = ();

    fn visit_class_decl(&mut self, decl: &Decl, class: &Class) {
        if Some(decl.id()) != self.owner {
            self.add(decl.id());
            return;
        }
        for &base in &class.bases {
            self.add(base);
        }
        self.visit_members(&class.fields);
        self.visit_members(&class.methods);
    }

    fn visit_field_decl(&mut self, _decl: &Decl, field: &Field) {
        field.ty.visit(self)
    }

    fn visit_function_decl(&mut self, _decl: &Decl, function: &Function) {
        function.return_type.visit(self);
        self.visit_members(&function.parameters);
    }

    fn visit_method_decl(&mut self, decl: &Decl, method: &Method) {
        self.visit_function_decl(decl, &method.function)
    }

    fn visit_parameter_decl(&mut self, _decl: &Decl, parameter: &Parameter) {
        parameter.ty.visit(self)
    }

    fn visit_typedef_decl(&mut self, _decl: &Decl, typedef: &Typedef) {
        typedef.ty.visit(self)
    }

    fn visit_enum_decl(&mut self, decl: &Decl, _enumeration: &Enumeration) {
        self.add(decl.id())
    }

    fn visit_class_template_decl(&mut self, _decl: &Decl, _template: &ClassTemplate) {}

    fn visit_function_template_decl(&mut self, _decl: &Decl, _template: &FunctionTemplate) {}

    fn visit_macro_definition(&mut self, _decl: &Decl, _mac: &MacroDefinition) {}

    fn visit_namespace(&mut self, _decl: &Decl, _namespace: &Namespace) {}

    fn visit_event(&mut self, _decl: &Decl, event: &Event) {
        self.visit_members(&event.parameters)
    }
}
