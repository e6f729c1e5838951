use tracing::trace;

use crate::context::BindingContext;
use crate::error::{GenError, GenResult};
use crate::model::*;
use crate::types::*;
use crate::visit::{DeclVisitor, TypeVisitor};

use super::{MarshalContext, MarshalParameter};

const GENERATOR: &str = "managed-to-native marshaler";

/// Writes the native argument expression for the managed parameter in
/// `ctx.parameter`, plus any statements it needs before and after the call.
pub struct ManagedToNative<'a, 'c> {
    cx: BindingContext<'a>,
    ctx: &'c mut MarshalContext,
}

impl<'a, 'c> ManagedToNative<'a, 'c> {
    pub fn new(cx: BindingContext<'a>, ctx: &'c mut MarshalContext) -> Self {
        Self { cx, ctx }
    }

    pub fn marshal_type(&mut self, ty: &QualifiedType) -> GenResult<()> {
        trace!(ty = %self.cx.library.native_spelling(ty), "marshal to native");
        ty.visit(self)
    }

    pub fn marshal_decl(&mut self, id: DeclId) -> GenResult<()> {
        let library = self.cx.library;
        library.visit_decl(id, self)
    }

    fn try_type_map(&mut self, id: DeclId, ty: &Type) -> Option<GenResult<()>> {
        let lib = self.cx.library;
        let map = self.cx.type_maps.find_for_decl(lib, id)?;
        Some(map.bind(lib, Some(ty)).marshal_to_native(self.ctx))
    }

    fn parameter_name(&self) -> GenResult<String> {
        Ok(self.ctx.parameter()?.name.clone())
    }

    /// Convert a managed delegate into a native function pointer of type
    /// `target`.
    fn marshal_delegate(&mut self, target: &str) -> GenResult<()> {
        let param = self.parameter_name()?;
        self.ctx.ret.write(&format!(
            "static_cast<{target}>(System::Runtime::InteropServices::Marshal::GetFunctionPointerForDelegate({param}).ToPointer())"
        ));
        Ok(())
    }

    /// Whether the class is the implicit instance of a method hoisted out
    /// of a free function.
    fn is_hoisted_instance(&self) -> bool {
        if self.ctx.parameter_index != 0 {
            return false;
        }
        self.ctx
            .function
            .and_then(|f| self.cx.library.decl(f).as_method())
            .is_some_and(|m| m.conversion == MethodConversion::FunctionToStaticMethod)
    }

    fn marshal_ref_class(&mut self, decl: &Decl) -> GenResult<()> {
        let param = self.ctx.parameter()?.clone();
        let native = self.cx.native_name(decl.id());
        let param_ty = self.cx.library.desugar(&param.ty.ty);
        if !param_ty.is_pointer() {
            self.ctx.ret.write("*");
            if param_ty.is_reference() {
                self.ctx.var_prefix.write("&");
            }
        }
        if self.is_hoisted_instance() {
            self.ctx.ret.write(&format!("({native}*)NativePtr"));
        } else {
            self.ctx
                .ret
                .write(&format!("({native}*){}->NativePtr", param.name));
        }
        Ok(())
    }

    fn marshal_value_class(&mut self, decl: &Decl, class: &Class) -> GenResult<()> {
        let param = self.ctx.parameter()?.clone();
        let native = self.cx.native_name(decl.id());
        let temp = self.ctx.temp_name();
        let param_ty = self.cx.library.desugar(&param.ty.ty);

        if param_ty.is_reference() {
            self.ctx
                .support_before
                .write_line(&format!("auto {temp} = ({native}*)&{};", param.name));
            self.ctx.ret.write(&format!("*{temp}"));
            return Ok(());
        }

        self.ctx
            .support_before
            .write_line(&format!("auto {temp} = {native}();"));
        for &field_id in &class.fields {
            let field = self.cx.library.decl(field_id);
            let field_ref = format!("{}.{}", param.name, field.name());
            // Fresh context: the hoisted-instance rule applies to the
            // parameter itself, never to its fields.
            let mut nested = MarshalContext {
                arg_name: field_ref,
                ..MarshalContext::default()
            };
            ManagedToNative::new(self.cx, &mut nested).marshal_decl(field_id)?;
            for line in nested.support_before.lines() {
                self.ctx.support_before.write_line(&line);
            }
            self.ctx.support_before.write_line(&format!(
                "{temp}.{} = {};",
                field.original_name(),
                nested.ret
            ));
            for line in nested.support_after.lines() {
                self.ctx.support_after.write_line(&line);
            }
        }
        self.ctx.ret.write(&temp);
        if param_ty.is_pointer() {
            self.ctx.argument_prefix.write("&");
        }
        Ok(())
    }
}

impl TypeVisitor for ManagedToNative<'_, '_> {
    type Output = GenResult<()>;

    fn visit_builtin_type(&mut self, primitive: Primitive, _quals: TypeQualifiers) -> Self::Output {
        match primitive {
            Primitive::Void => Ok(()),
            Primitive::WideChar => Err(GenError::unsupported("wide character", GENERATOR)),
            _ => {
                let param = self.parameter_name()?;
                self.ctx.ret.write(&param);
                Ok(())
            }
        }
    }

    fn visit_pointer_type(&mut self, pointer: &PointerType, _quals: TypeQualifiers) -> Self::Output {
        let lib = self.cx.library;
        let pointee = &pointer.pointee;
        if matches!(lib.desugar(&pointee.ty), Type::Function(_)) {
            let target = lib.native_spelling(&QualifiedType::new(Type::Pointer(pointer.clone())));
            return self.marshal_delegate(&target);
        }
        match lib.primitive_of(&pointee.ty, true) {
            Some(Primitive::Void) => {
                let param = self.parameter_name()?;
                self.ctx.ret.write(&format!("{param}.ToPointer()"));
                Ok(())
            }
            Some(Primitive::UInt8) => {
                let param = self.parameter_name()?;
                self.ctx.ret.write(&format!("(uint8*){param}.ToPointer()"));
                Ok(())
            }
            Some(Primitive::Char) => {
                let param = self.parameter_name()?;
                let temp = self.ctx.temp_name();
                self.ctx.support_before.write_line(&format!(
                    "auto {temp} = clix::marshalString<clix::E_UTF8>({param});"
                ));
                self.ctx.ret.write(&format!("{temp}.c_str()"));
                Ok(())
            }
            Some(_) if pointer.modifier == PointerModifier::Pointer => {
                self.ctx.argument_prefix.write("&");
                pointee.visit(self)
            }
            _ => pointee.visit(self),
        }
    }

    fn visit_array_type(&mut self, _array: &ArrayType, _quals: TypeQualifiers) -> Self::Output {
        Err(GenError::unsupported("array", GENERATOR))
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

    fn visit_typedef_type(&mut self, typedef: &TypedefType, quals: TypeQualifiers) -> Self::Output {
        if let Some(result) = self.try_type_map(typedef.decl, &Type::Typedef(*typedef)) {
            return result;
        }
        let lib = self.cx.library;
        let Some(aliased) = lib.decl(typedef.decl).qualified_type() else {
            return self.marshal_decl(typedef.decl);
        };
        if lib.pointee_function(&aliased.ty).is_some() {
            let target = self.cx.native_name(typedef.decl);
            return self.marshal_delegate(&target);
        }
        if lib.primitive_of(&aliased.ty, true).is_some() {
            let target = self.cx.native_name(typedef.decl);
            self.ctx.ret.write(&format!("({target})"));
            return lib.desugar(&aliased.ty).visit(self, quals);
        }
        aliased.visit(self)
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

impl DeclVisitor for ManagedToNative<'_, '_> {
    type Output = GenResult<()>;

    fn visit_class_decl(&mut self, decl: &Decl, class: &Class) -> Self::Output {
        if let Some(result) = self.try_type_map(decl.id(), &Type::tag(decl.id())) {
            return result;
        }
        if class.is_value_type() {
            self.marshal_value_class(decl, class)
        } else {
            self.marshal_ref_class(decl)
        }
    }

    fn visit_field_decl(&mut self, _decl: &Decl, field: &Field) -> Self::Output {
        self.ctx.parameter = Some(MarshalParameter {
            name: self.ctx.arg_name.clone(),
            ty: field.ty.clone(),
        });
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
        let param = self.parameter_name()?;
        let target = self.cx.native_name(decl.id());
        self.ctx.ret.write(&format!("({target}){param}"));
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
