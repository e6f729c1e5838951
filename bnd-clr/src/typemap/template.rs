//! Data-driven type maps declared in `bnd-clr.toml`.
//!
//! ```toml
//! [[type_map]]
//! name = "QString"
//! signature = "System::String^"
//! to_managed = "QtInterop::ToManaged({value})"
//! to_native = "QtInterop::ToNative({value})"
//! ```
//!
//! Placeholders: `{value}` is the marshaled variable (the native return
//! variable or the managed parameter), `{type}` the native spelling of the
//! bound type, `{arg0}`, `{arg1}`… the native spellings of template
//! arguments.

use serde::Deserialize;

use crate::error::GenResult;
use crate::marshal::MarshalContext;

use super::{TypeMap, TypeMapBinding};

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateTypeMap {
    /// Native qualified name the map is registered under.
    pub name: String,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub value_type: bool,
    pub signature: Option<String>,
    pub to_managed: Option<String>,
    pub to_native: Option<String>,
}

impl TemplateTypeMap {
    fn expand(&self, template: &str, binding: &TypeMapBinding<'_>, value: &str) -> String {
        let mut out = template.replace("{value}", value);
        if let Some(ty) = binding.ty {
            let spelling = binding
                .library
                .native_spelling(&ty.clone().into());
            out = out.replace("{type}", &spelling);
        }
        let mut index = 0;
        while let Some(arg) = binding.template_argument(index) {
            let placeholder = format!("{{arg{index}}}");
            out = out.replace(&placeholder, &binding.library.native_spelling(arg));
            index += 1;
        }
        out
    }
}

impl TypeMap for TemplateTypeMap {
    fn is_ignored(&self) -> bool {
        self.ignore
    }

    fn is_value_type(&self) -> bool {
        self.value_type
    }

    fn signature(&self, binding: &TypeMapBinding<'_>) -> GenResult<String> {
        match &self.signature {
            Some(sig) => Ok(self.expand(sig, binding, "")),
            None => Err(binding.unimplemented("signature")),
        }
    }

    fn marshal_to_managed(
        &self,
        binding: &TypeMapBinding<'_>,
        ctx: &mut MarshalContext,
    ) -> GenResult<()> {
        let Some(template) = &self.to_managed else {
            return Err(binding.unimplemented("marshal_to_managed"));
        };
        let code = self.expand(template, binding, &ctx.return_var_name);
        ctx.ret.write(&code);
        Ok(())
    }

    fn marshal_to_native(
        &self,
        binding: &TypeMapBinding<'_>,
        ctx: &mut MarshalContext,
    ) -> GenResult<()> {
        let Some(template) = &self.to_native else {
            return Err(binding.unimplemented("marshal_to_native"));
        };
        let param = ctx.parameter()?.name.clone();
        let code = self.expand(template, binding, &param);
        ctx.ret.write(&code);
        Ok(())
    }
}
