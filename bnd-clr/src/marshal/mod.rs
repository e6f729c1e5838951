//! Marshaling generators: type-directed synthesis of the C++/CLI code that
//! moves one value across the native/managed boundary.
//!
//! [`NativeToManaged`] turns a native value (usually a return value) into a
//! managed expression; [`ManagedToNative`] turns a managed argument into a
//! native one. Both write into a fresh [`MarshalContext`] per value and
//! consult the type-map registry before any built-in rule.

use serde::Serialize;

use crate::context::BindingContext;
use crate::error::{GenError, GenResult};
use crate::model::DeclId;
use crate::text::TextGenerator;
use crate::types::QualifiedType;

mod to_managed;
mod to_native;

pub use to_managed::NativeToManaged;
pub use to_native::ManagedToNative;

/// The managed-side value being converted to native.
#[derive(Debug, Clone)]
pub struct MarshalParameter {
    pub name: String,
    pub ty: QualifiedType,
}

/// State of one marshaling occasion. Never shared between two values.
#[derive(Debug, Clone, Default)]
pub struct MarshalContext {
    /// Function or method the code is generated for.
    pub function: Option<DeclId>,
    pub parameter_index: usize,
    pub parameter: Option<MarshalParameter>,
    /// Native variable holding the value to convert to managed.
    pub return_var_name: String,
    pub return_type: Option<QualifiedType>,
    /// Name used to derive temporaries.
    pub arg_name: String,
    pub support_before: TextGenerator,
    pub support_after: TextGenerator,
    pub ret: TextGenerator,
    pub var_prefix: TextGenerator,
    pub argument_prefix: TextGenerator,
}

impl MarshalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for converting the native variable `var_name` of type `ty`.
    pub fn for_return(function: Option<DeclId>, var_name: &str, ty: QualifiedType) -> Self {
        Self {
            function,
            return_var_name: var_name.to_string(),
            arg_name: var_name.to_string(),
            return_type: Some(ty),
            ..Self::default()
        }
    }

    /// Context for converting the managed argument `name` at `index`.
    pub fn for_parameter(
        function: Option<DeclId>,
        index: usize,
        name: &str,
        ty: QualifiedType,
    ) -> Self {
        Self {
            function,
            parameter_index: index,
            arg_name: name.to_string(),
            parameter: Some(MarshalParameter {
                name: name.to_string(),
                ty,
            }),
            ..Self::default()
        }
    }

    pub fn parameter(&self) -> GenResult<&MarshalParameter> {
        self.parameter
            .as_ref()
            .ok_or(GenError::MissingContext("parameter"))
    }

    /// Temporary variable name derived from the argument name.
    ///
    /// Member access becomes `__`, so the field `p.name` and a parameter
    /// `p_name` of the same call get distinct temporaries (`_p__name`,
    /// `_p_name`).
    pub fn temp_name(&self) -> String {
        let mut temp = String::from("_");
        for c in self.arg_name.chars() {
            match c {
                '.' => temp.push_str("__"),
                c if c.is_ascii_alphanumeric() || c == '_' => temp.push(c),
                _ => temp.push('_'),
            }
        }
        temp
    }

    pub fn into_fragment(self) -> MarshalFragment {
        MarshalFragment {
            expression: self.ret.to_string(),
            before: self.support_before.lines(),
            after: self.support_after.lines(),
            var_prefix: self.var_prefix.to_string(),
            argument_prefix: self.argument_prefix.to_string(),
        }
    }
}

/// Generated code for one value, ready to be spliced into a function body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarshalFragment {
    pub expression: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub before: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub var_prefix: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub argument_prefix: String,
}

impl MarshalFragment {
    /// The expression as it appears in an argument list.
    pub fn argument(&self) -> String {
        format!("{}{}", self.argument_prefix, self.expression)
    }
}

/// Convert the native value described by `ctx.return_type`.
pub fn marshal_to_managed(cx: BindingContext<'_>, ctx: &mut MarshalContext) -> GenResult<()> {
    let ty = ctx
        .return_type
        .clone()
        .ok_or(GenError::MissingContext("return type"))?;
    NativeToManaged::new(cx, ctx).marshal_type(&ty)
}

/// Convert the managed argument described by `ctx.parameter`.
pub fn marshal_to_native(cx: BindingContext<'_>, ctx: &mut MarshalContext) -> GenResult<()> {
    let ty = ctx.parameter()?.ty.clone();
    ManagedToNative::new(cx, ctx).marshal_type(&ty)
}
