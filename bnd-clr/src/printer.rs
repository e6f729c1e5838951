//! Managed (C++/CLI) signature printer.

use crate::context::BindingContext;
use crate::error::{GenError, GenResult};
use crate::model::*;
use crate::types::*;
use crate::visit::{DeclVisitor, TypeVisitor};

const GENERATOR: &str = "type printer";

/// Prints the C++/CLI spelling of a type as it appears in a generated
/// signature.
pub struct CliTypePrinter<'a> {
    cx: BindingContext<'a>,
}

impl<'a> CliTypePrinter<'a> {
    pub fn new(cx: BindingContext<'a>) -> Self {
        Self { cx }
    }

    pub fn print(&mut self, ty: &QualifiedType) -> GenResult<String> {
        ty.visit(self)
    }

    pub fn print_decl(&mut self, id: DeclId) -> GenResult<String> {
        let library = self.cx.library;
        library.visit_decl(id, self)
    }

    fn print_mapped(&self, id: DeclId, ty: &Type) -> Option<GenResult<String>> {
        let map = self.cx.type_maps.find_for_decl(self.cx.library, id)?;
        Some(map.bind(self.cx.library, Some(ty)).signature())
    }
}

fn primitive_name(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::Void => "void",
        Primitive::Bool => "bool",
        Primitive::Char | Primitive::Int8 => "char",
        Primitive::WideChar => "System::Char",
        Primitive::UInt8 => "unsigned char",
        Primitive::Int16 => "short",
        Primitive::UInt16 => "unsigned short",
        Primitive::Int32 => "int",
        Primitive::UInt32 => "unsigned int",
        Primitive::Int64 => "long long",
        Primitive::UInt64 => "unsigned long long",
        Primitive::Float => "float",
        Primitive::Double => "double",
    }
}

impl TypeVisitor for CliTypePrinter<'_> {
    type Output = GenResult<String>;

    fn visit_builtin_type(&mut self, primitive: Primitive, _quals: TypeQualifiers) -> Self::Output {
        Ok(primitive_name(primitive).to_string())
    }

    fn visit_pointer_type(&mut self, pointer: &PointerType, _quals: TypeQualifiers) -> Self::Output {
        let lib = self.cx.library;
        let pointee = &pointer.pointee;
        if let Type::Function(function) = lib.desugar(&pointee.ty) {
            return self.visit_function_type(function, pointee.qualifiers);
        }
        match lib.primitive_of(&pointee.ty, true) {
            Some(Primitive::Void | Primitive::UInt8) => Ok("System::IntPtr".to_string()),
            Some(Primitive::Char) => Ok("System::String^".to_string()),
            _ => pointee.visit(self),
        }
    }

    fn visit_array_type(&mut self, array: &ArrayType, _quals: TypeQualifiers) -> Self::Output {
        Ok(format!("cli::array<{}>^", array.element.visit(self)?))
    }

    fn visit_function_type(&mut self, function: &FunctionType, _quals: TypeQualifiers) -> Self::Output {
        let mut args = function
            .arguments
            .iter()
            .map(|arg| arg.visit(self))
            .collect::<GenResult<Vec<_>>>()?;
        if self
            .cx
            .library
            .is_primitive(&function.return_type.ty, Primitive::Void, true)
        {
            return Ok(if args.is_empty() {
                "System::Action^".to_string()
            } else {
                format!("System::Action<{}>^", args.join(", "))
            });
        }
        args.push(function.return_type.visit(self)?);
        Ok(format!("System::Func<{}>^", args.join(", ")))
    }

    fn visit_member_pointer_type(
        &mut self,
        _member: &MemberPointerType,
        _quals: TypeQualifiers,
    ) -> Self::Output {
        Err(GenError::unsupported("member pointer", GENERATOR))
    }

    fn visit_tag_type(&mut self, tag: &TagType, _quals: TypeQualifiers) -> Self::Output {
        self.print_decl(tag.decl)
    }

    fn visit_typedef_type(&mut self, typedef: &TypedefType, _quals: TypeQualifiers) -> Self::Output {
        if let Some(sig) = self.print_mapped(typedef.decl, &Type::Typedef(*typedef)) {
            return sig;
        }
        let lib = self.cx.library;
        let decl = lib.decl(typedef.decl);
        match decl.qualified_type() {
            // Function pointer typedefs become named delegates.
            Some(aliased) if lib.pointee_function(&aliased.ty).is_some() => {
                Ok(format!("{}^", self.cx.managed_name(typedef.decl)))
            }
            Some(aliased) => aliased.visit(self),
            None => self.print_decl(typedef.decl),
        }
    }

    fn visit_template_specialization_type(
        &mut self,
        template: &TemplateSpecializationType,
        _quals: TypeQualifiers,
    ) -> Self::Output {
        let ty = Type::TemplateSpecialization(template.clone());
        if let Some(sig) = self.print_mapped(template.template, &ty) {
            return sig;
        }
        self.print_decl(template.template)
    }

    fn visit_template_parameter_type(
        &mut self,
        _param: &TemplateParameterType,
        _quals: TypeQualifiers,
    ) -> Self::Output {
        Err(GenError::unsupported("template parameter", GENERATOR))
    }
}

impl DeclVisitor for CliTypePrinter<'_> {
    type Output = GenResult<String>;

    fn visit_class_decl(&mut self, decl: &Decl, class: &Class) -> Self::Output {
        if let Some(sig) = self.print_mapped(decl.id(), &Type::tag(decl.id())) {
            return sig;
        }
        let name = self.cx.managed_name(decl.id());
        Ok(if class.is_value_type() {
            name
        } else {
            format!("{name}^")
        })
    }

    fn visit_field_decl(&mut self, _decl: &Decl, field: &Field) -> Self::Output {
        field.ty.visit(self)
    }

    fn visit_function_decl(&mut self, _decl: &Decl, _function: &Function) -> Self::Output {
        Err(GenError::unsupported("function declaration", GENERATOR))
    }

    fn visit_method_decl(&mut self, _decl: &Decl, _method: &Method) -> Self::Output {
        Err(GenError::unsupported("method declaration", GENERATOR))
    }

    fn visit_parameter_decl(&mut self, _decl: &Decl, parameter: &Parameter) -> Self::Output {
        parameter.ty.visit(self)
    }

    fn visit_typedef_decl(&mut self, _decl: &Decl, typedef: &Typedef) -> Self::Output {
        typedef.ty.visit(self)
    }

    fn visit_enum_decl(&mut self, decl: &Decl, _enumeration: &Enumeration) -> Self::Output {
        if let Some(sig) = self.print_mapped(decl.id(), &Type::tag(decl.id())) {
            return sig;
        }
        Ok(self.cx.managed_name(decl.id()))
    }

    fn visit_class_template_decl(&mut self, _decl: &Decl, template: &ClassTemplate) -> Self::Output {
        self.print_decl(template.templated)
    }

    fn visit_function_template_decl(
        &mut self,
        _decl: &Decl,
        _template: &FunctionTemplate,
    ) -> Self::Output {
        Err(GenError::unsupported("function template", GENERATOR))
    }

    fn visit_macro_definition(&mut self, _decl: &Decl, _mac: &MacroDefinition) -> Self::Output {
        Err(GenError::unsupported("macro", GENERATOR))
    }

    fn visit_namespace(&mut self, _decl: &Decl, _namespace: &Namespace) -> Self::Output {
        Err(GenError::unsupported("namespace", GENERATOR))
    }

    fn visit_event(&mut self, _decl: &Decl, _event: &Event) -> Self::Output {
        Err(GenError::unsupported("event", GENERATOR))
    }
}
