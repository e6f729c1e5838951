use tracing::trace;

use crate::context::BindingContext;
use crate::error::{GenError, GenResult};
use crate::model::*;
use crate::printer::CliTypePrinter;
use crate::types::*;
use crate::visit::{DeclVisitor, TypeVisitor};

use super::MarshalContext;

const GENERATOR: &str = "native-to-managed marshaler";

/// Writes the managed expression for the native value named by
/// `ctx.return_var_name`.
pub struct NativeToManaged<'a, 'c> {
    cx: BindingContext<'a>,
    ctx: &'c mut MarshalContext,
}

impl<'a, 'c> NativeToManaged<'a, 'c> {
    pub fn new(cx: BindingContext<'a>, ctx: &'c mut MarshalContext) -> Self {
        Self { cx, ctx }
    }

    pub fn marshal_type(&mut self, ty: &QualifiedType) -> GenResult<()> {
        trace!(ty = %self.cx.library.native_spelling(ty), "marshal to managed");
        ty.visit(self)
    }

    pub fn marshal_decl(&mut self, id: DeclId) -> GenResult<()> {
        let library = self.cx.library;
        library.visit_decl(id, self)
    }

    /// Defer to a registered map, if any. `None` means no map matched.
    fn try_type_map(&mut self, id: DeclId, ty: &Type) -> Option<GenResult<()>> {
        let lib = self.cx.library;
        let map = self.cx.type_maps.find_for_decl(lib, id)?;
        Some(map.bind(lib, Some(ty)).marshal_to_managed(self.ctx))
    }

    fn returns_pointer(&self) -> bool {
        self.ctx
            .return_type
            .as_ref()
            .is_some_and(|ret| self.cx.library.desugar(&ret.ty).is_pointer())
    }
}

impl TypeVisitor for NativeToManaged<'_, '_> {
    type Output = GenResult<()>;

    fn visit_builtin_type(&mut self, primitive: Primitive, _quals: TypeQualifiers) -> Self::Output {
        match primitive {
            Primitive::Void => Ok(()),
            Primitive::WideChar => Err(GenError::unsupported("wide character", GENERATOR)),
            _ => {
                self.ctx.ret.write(&self.ctx.return_var_name.clone());
                Ok(())
            }
        }
    }

    fn visit_pointer_type(&mut self, pointer: &PointerType, _quals: TypeQualifiers) -> Self::Output {
        let lib = self.cx.library;
        let pointee = &pointer.pointee;
        if matches!(lib.desugar(&pointee.ty), Type::Function(_)) {
            return Err(GenError::unsupported("function pointer", GENERATOR));
        }
        let var = self.ctx.return_var_name.clone();
        match lib.primitive_of(&pointee.ty, true) {
            Some(Primitive::Void | Primitive::UInt8) => {
                self.ctx.ret.write(&format!("::System::IntPtr({var})"));
                Ok(())
            }
            Some(Primitive::Char) => {
                self.ctx
                    .ret
                    .write(&format!("clix::marshalString<clix::E_UTF8>({var})"));
                Ok(())
            }
            Some(_) => {
                self.ctx.ret.write("*");
                pointee.visit(self)
            }
            None => pointee.visit(self),
        }
    }

    fn visit_array_type(&mut self, _array: &ArrayType, _quals: TypeQualifiers) -> Self::Output {
        self.ctx.ret.write("nullptr");
        Ok(())
    }

    fn visit_function_type(&mut self, _function: &FunctionType, _quals: TypeQualifiers) -> Self::Output {
        Err(GenError::unsupported("function type", GENERATOR))
    }

    fn visit_member_pointer_type(
        &mut self,
        _member: &MemberPointerType,
        _quals: TypeQualifiers,
    ) -> Self::Output {
        Err(GenError::unsupported("member pointer", GENERATOR))
    }

    fn visit_tag_type(&mut self, tag: &TagType, _quals: TypeQualifiers) -> Self::Output {
        self.marshal_decl(tag.decl)
    }

    fn visit_typedef_type(&mut self, typedef: &TypedefType, _quals: TypeQualifiers) -> Self::Output {
        if let Some(result) = self.try_type_map(typedef.decl, &Type::Typedef(*typedef)) {
            return result;
        }
        self.marshal_decl(typedef.decl)
    }

    fn visit_template_specialization_type(
        &mut self,
        template: &TemplateSpecializationType,
        _quals: TypeQualifiers,
    ) -> Self::Output {
        let ty = Type::TemplateSpecialization(template.clone());
        if let Some(result) = self.try_type_map(template.template, &ty) {
            return result;
        }
        self.marshal_decl(template.template)
    }

    fn visit_template_parameter_type(
        &mut self,
        _param: &TemplateParameterType,
        _quals: TypeQualifiers,
    ) -> Self::Output {
        Err(GenError::unsupported("template parameter", GENERATOR))
    }
}

impl DeclVisitor for NativeToManaged<'_, '_> {
    type Output = GenResult<()>;

    fn visit_class_decl(&mut self, decl: &Decl, class: &Class) -> Self::Output {
        if let Some(result) = self.try_type_map(decl.id(), &Type::tag(decl.id())) {
            return result;
        }
        let var = self.ctx.return_var_name.clone();
        let instance = if self.returns_pointer() {
            var
        } else {
            format!("&{var}")
        };
        let native = self.cx.native_name(decl.id());
        let managed = self.cx.managed_name(decl.id());
        if class.is_ref_type() {
            self.ctx
                .ret
                .write(&format!("gcnew {managed}(({native}*){instance})"));
        } else {
            self.ctx.ret.write(&format!("{managed}(({native}*){instance})"));
        }
        Ok(())
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
        if let Some(result) = self.try_type_map(decl.id(), &Type::tag(decl.id())) {
            return result;
        }
        let target = CliTypePrinter::new(self.cx).print_decl(decl.id())?;
        let var = self.ctx.return_var_name.clone();
        self.ctx.ret.write(&format!("({target}){var}"));
        Ok(())
    }

    fn visit_class_template_decl(&mut self, _decl: &Decl, template: &ClassTemplate) -> Self::Output {
        self.marshal_decl(template.templated)
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
