//! Double-dispatch visitor protocol over declarations and types.
//!
//! Every checker, printer and marshaler implements one or both traits. The
//! traits have no default methods: a visitor has to give an answer for
//! every variant, and a variant it cannot handle reports that through its
//! `Output` (usually a [`GenError::Unsupported`](crate::error::GenError)).

use crate::model::*;
use crate::types::*;

/// One method per declaration variant.
pub trait DeclVisitor {
    type Output;

    fn visit_class_decl(&mut self, decl: &Decl, class: &Class) -> Self::Output;
    fn visit_field_decl(&mut self, decl: &Decl, field: &Field) -> Self::Output;
    fn visit_function_decl(&mut self, decl: &Decl, function: &Function) -> Self::Output;
    fn visit_method_decl(&mut self, decl: &Decl, method: &Method) -> Self::Output;
    fn visit_parameter_decl(&mut self, decl: &Decl, parameter: &Parameter) -> Self::Output;
    fn visit_typedef_decl(&mut self, decl: &Decl, typedef: &Typedef) -> Self::Output;
    fn visit_enum_decl(&mut self, decl: &Decl, enumeration: &Enumeration) -> Self::Output;
    fn visit_class_template_decl(&mut self, decl: &Decl, template: &ClassTemplate)
    -> Self::Output;
    fn visit_function_template_decl(
        &mut self,
        decl: &Decl,
        template: &FunctionTemplate,
    ) -> Self::Output;
    fn visit_macro_definition(&mut self, decl: &Decl, mac: &MacroDefinition) -> Self::Output;
    fn visit_namespace(&mut self, decl: &Decl, namespace: &Namespace) -> Self::Output;
    fn visit_event(&mut self, decl: &Decl, event: &Event) -> Self::Output;
}

/// One method per type variant; qualifiers of the visited use are passed
/// alongside.
pub trait TypeVisitor {
    type Output;

    fn visit_builtin_type(&mut self, primitive: Primitive, quals: TypeQualifiers)
    -> Self::Output;
    fn visit_pointer_type(&mut self, pointer: &PointerType, quals: TypeQualifiers)
    -> Self::Output;
    fn visit_array_type(&mut self, array: &ArrayType, quals: TypeQualifiers) -> Self::Output;
    fn visit_function_type(&mut self, function: &FunctionType, quals: TypeQualifiers)
    -> Self::Output;
    fn visit_member_pointer_type(
        &mut self,
        member: &MemberPointerType,
        quals: TypeQualifiers,
    ) -> Self::Output;
    fn visit_tag_type(&mut self, tag: &TagType, quals: TypeQualifiers) -> Self::Output;
    fn visit_typedef_type(&mut self, typedef: &TypedefType, quals: TypeQualifiers)
    -> Self::Output;
    fn visit_template_specialization_type(
        &mut self,
        template: &TemplateSpecializationType,
        quals: TypeQualifiers,
    ) -> Self::Output;
    fn visit_template_parameter_type(
        &mut self,
        param: &TemplateParameterType,
        quals: TypeQualifiers,
    ) -> Self::Output;
}

impl Decl {
    /// Dispatch to the visitor method matching this declaration's variant.
    pub fn visit<V: DeclVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match &self.kind {
            DeclKind::Namespace(ns) => visitor.visit_namespace(self, ns),
            DeclKind::Class(c) => visitor.visit_class_decl(self, c),
            DeclKind::Field(f) => visitor.visit_field_decl(self, f),
            DeclKind::Function(f) => visitor.visit_function_decl(self, f),
            DeclKind::Method(m) => visitor.visit_method_decl(self, m),
            DeclKind::Parameter(p) => visitor.visit_parameter_decl(self, p),
            DeclKind::Typedef(t) => visitor.visit_typedef_decl(self, t),
            DeclKind::Enum(e) => visitor.visit_enum_decl(self, e),
            DeclKind::ClassTemplate(t) => visitor.visit_class_template_decl(self, t),
            DeclKind::FunctionTemplate(t) => visitor.visit_function_template_decl(self, t),
            DeclKind::Macro(m) => visitor.visit_macro_definition(self, m),
            DeclKind::Event(e) => visitor.visit_event(self, e),
        }
    }
}

impl Library {
    pub fn visit_decl<V: DeclVisitor + ?Sized>(&self, id: DeclId, visitor: &mut V) -> V::Output {
        self.decl(id).visit(visitor)
    }
}

impl Type {
    /// Dispatch to the visitor method matching this type's variant.
    pub fn visit<V: TypeVisitor + ?Sized>(&self, visitor: &mut V, quals: TypeQualifiers) -> V::Output {
        match self {
            Type::Builtin(p) => visitor.visit_builtin_type(*p, quals),
            Type::Pointer(p) => visitor.visit_pointer_type(p, quals),
            Type::Array(a) => visitor.visit_array_type(a, quals),
            Type::Function(f) => visitor.visit_function_type(f, quals),
            Type::MemberPointer(m) => visitor.visit_member_pointer_type(m, quals),
            Type::Tag(t) => visitor.visit_tag_type(t, quals),
            Type::Typedef(t) => visitor.visit_typedef_type(t, quals),
            Type::TemplateSpecialization(t) => {
                visitor.visit_template_specialization_type(t, quals)
            }
            Type::TemplateParameter(p) => visitor.visit_template_parameter_type(p, quals),
        }
    }
}

impl QualifiedType {
    pub fn visit<V: TypeVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        self.ty.visit(visitor, self.qualifiers)
    }
}
