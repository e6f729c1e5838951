//! Emitter: post-pass declaration tree → per-member binding fragments.
//!
//! For every generated class, free function, enum and delegate typedef the
//! emitter records the managed signature plus the marshaling fragments of
//! each argument and return value. A member the generators cannot express
//! is recorded as [`Omitted`] instead of being emitted wrong.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::checks::{ForwardRefsCollector, TypeCompletionChecker, TypeIgnoreChecker};
use crate::context::BindingContext;
use crate::error::{GenError, GenResult};
use crate::marshal::{self, MarshalContext, MarshalFragment};
use crate::model::*;
use crate::printer::CliTypePrinter;
use crate::types::*;

const GENERATOR: &str = "emitter";

/// Native variable the result of a call is stored in.
pub const RETURN_VAR: &str = "__ret";

/// Everything generated for one run.
#[derive(Debug, Default, Serialize)]
pub struct BindingSet {
    pub namespace: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<ClassBinding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumBinding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub delegates: Vec<DelegateBinding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionBinding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub omitted: Vec<Omitted>,
}

impl BindingSet {
    pub fn class(&self, name: &str) -> Option<&ClassBinding> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionBinding> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumBinding> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn is_omitted(&self, site: &str) -> bool {
        self.omitted.iter().any(|o| o.site == site)
    }
}

/// A member that could not be generated.
#[derive(Debug, Clone, Serialize)]
pub struct Omitted {
    /// Native qualified name of the member.
    pub site: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ClassBinding {
    /// Fully qualified managed name.
    pub name: String,
    pub native: String,
    pub value_type: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub forward_refs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldBinding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<FunctionBinding>,
}

#[derive(Debug, Serialize)]
pub struct FieldBinding {
    pub name: String,
    pub signature: String,
    /// Native field value → managed. Absent for value classes, whose fields
    /// are plain managed fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<MarshalFragment>,
    /// Managed `value` → native field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<MarshalFragment>,
}

#[derive(Debug, Serialize)]
pub struct FunctionBinding {
    /// Managed name (unqualified for methods).
    pub name: String,
    /// Full managed declaration, e.g. `static int Add(int a, int b)`.
    pub signature: String,
    /// Native call expression with marshaled arguments.
    pub call: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Native copy of `this` for value-class instance methods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<MarshalFragment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterBinding>,
    /// Conversion of [`RETURN_VAR`]; absent for `void`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<MarshalFragment>,
}

#[derive(Debug, Serialize)]
pub struct ParameterBinding {
    pub name: String,
    pub signature: String,
    pub marshal: MarshalFragment,
}

#[derive(Debug, Serialize)]
pub struct EnumBinding {
    pub name: String,
    pub native: String,
    pub underlying: String,
    pub flags: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub items: Vec<EnumItemBinding>,
}

#[derive(Debug, Serialize)]
pub struct EnumItemBinding {
    pub name: String,
    pub value: i64,
}

/// A managed delegate type for a function pointer typedef.
#[derive(Debug, Serialize)]
pub struct DelegateBinding {
    pub name: String,
    pub native: String,
    pub returns: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

/// Walk every non-system translation unit and collect its bindings.
pub fn emit_bindings(cx: BindingContext<'_>) -> BindingSet {
    let mut emitter = Emitter {
        cx,
        set: BindingSet {
            namespace: cx.namespace.to_string(),
            ..BindingSet::default()
        },
    };
    for &unit in cx.library.units() {
        if cx.library.unit_of(unit).is_some_and(|u| u.is_system_header) {
            debug!(unit = %cx.library.decl(unit), "skipping system header");
            continue;
        }
        emitter.emit_scope(unit);
    }
    let set = emitter.set;
    info!(
        classes = set.classes.len(),
        enums = set.enums.len(),
        delegates = set.delegates.len(),
        functions = set.functions.len(),
        omitted = set.omitted.len(),
        "emitted bindings"
    );
    set
}

/// Serialize a [`BindingSet`] to TOML.
pub fn to_toml(set: &BindingSet) -> Result<String> {
    toml::to_string_pretty(set).context("serializing bindings to TOML")
}

struct Emitter<'a> {
    cx: BindingContext<'a>,
    set: BindingSet,
}

impl<'a> Emitter<'a> {
    fn lib(&self) -> &'a Library {
        self.cx.library
    }

    fn omit(&mut self, id: DeclId, err: &GenError) {
        let site = self.lib().qualified_original_name(id);
        warn!(site = %site, reason = %err, "omitting member");
        self.set.omitted.push(Omitted {
            site,
            reason: err.to_string(),
        });
    }

    /// Generated, and not ignored through its own flags or its types.
    fn is_emitted(&self, id: DeclId) -> bool {
        let lib = self.lib();
        if !lib.is_generated(id) || TypeIgnoreChecker::new(lib, self.cx.type_maps).is_ignored_decl(id)
        {
            debug!(decl = %lib.decl(id), "ignored");
            return false;
        }
        true
    }

    fn emit_scope(&mut self, scope: DeclId) {
        for child in self.lib().children(scope) {
            self.emit_decl(child);
        }
    }

    fn emit_decl(&mut self, id: DeclId) {
        let lib = self.lib();
        let decl = lib.decl(id);
        match &decl.kind {
            DeclKind::Namespace(_) => {
                if lib.is_generated(id) {
                    self.emit_scope(id);
                }
            }
            DeclKind::Class(class) => {
                if decl.is_incomplete {
                    debug!(decl = %decl, "forward declaration");
                    return;
                }
                if self.is_emitted(id) {
                    let binding = self.emit_class(decl, class);
                    self.set.classes.push(binding);
                    for &nested in &class.declarations {
                        self.emit_decl(nested);
                    }
                }
            }
            DeclKind::Enum(enumeration) => {
                if !decl.is_incomplete && self.is_emitted(id) {
                    let binding = self.emit_enum(decl, enumeration);
                    self.set.enums.push(binding);
                }
            }
            DeclKind::Function(_) => {
                if self.is_emitted(id) {
                    if let Some(binding) = self.emit_function(id, None) {
                        self.set.functions.push(binding);
                    }
                }
            }
            DeclKind::Typedef(typedef) => {
                if lib.pointee_function(&typedef.ty.ty).is_some() && self.is_emitted(id) {
                    match self.delegate(decl, &typedef.ty) {
                        Ok(binding) => self.set.delegates.push(binding),
                        Err(err) => self.omit(id, &err),
                    }
                }
            }
            _ => debug!(decl = %decl, kind = decl.kind.label(), "nothing to emit"),
        }
    }

    fn emit_class(&mut self, decl: &Decl, class: &Class) -> ClassBinding {
        let lib = self.lib();
        let id = decl.id();
        let forward_refs = ForwardRefsCollector::new(lib)
            .collect(id)
            .into_iter()
            .map(|r| self.cx.managed_name(r))
            .collect();
        let mut fields = Vec::new();
        for &field in &class.fields {
            if !self.is_emitted(field) {
                continue;
            }
            match self.field(decl, class, field) {
                Ok(binding) => fields.push(binding),
                Err(err) => self.omit(field, &err),
            }
        }
        let mut methods = Vec::new();
        for &method in &class.methods {
            if self.is_emitted(method) {
                methods.extend(self.emit_function(method, Some(id)));
            }
        }
        debug!(class = %decl, fields = fields.len(), methods = methods.len(), "emitted class");
        ClassBinding {
            name: self.cx.managed_name(id),
            native: self.cx.native_name(id),
            value_type: class.is_value_type(),
            comment: decl.comment.clone(),
            bases: class.bases.iter().map(|&b| self.cx.managed_name(b)).collect(),
            forward_refs,
            fields,
            methods,
        }
    }

    fn field(&self, owner: &Decl, class: &Class, id: DeclId) -> GenResult<FieldBinding> {
        let decl = self.lib().decl(id);
        let ty = decl
            .qualified_type()
            .ok_or(GenError::unsupported("field without a type", GENERATOR))?;
        let signature = CliTypePrinter::new(self.cx).print(ty)?;
        if class.is_value_type() {
            return Ok(FieldBinding {
                name: decl.name().to_string(),
                signature,
                get: None,
                set: None,
            });
        }
        let native_field = format!(
            "(({}*)NativePtr)->{}",
            self.cx.native_name(owner.id()),
            decl.original_name()
        );
        let mut get = MarshalContext::for_return(None, &native_field, ty.clone());
        marshal::marshal_to_managed(self.cx, &mut get)?;
        let mut set = MarshalContext::for_parameter(None, 0, "value", ty.clone());
        marshal::marshal_to_native(self.cx, &mut set)?;
        Ok(FieldBinding {
            name: decl.name().to_string(),
            signature,
            get: Some(get.into_fragment()),
            set: Some(set.into_fragment()),
        })
    }

    fn emit_function(&mut self, id: DeclId, owner: Option<DeclId>) -> Option<FunctionBinding> {
        let lib = self.lib();
        if lib
            .decl(id)
            .as_method()
            .is_some_and(|m| m.kind == MethodKind::Destructor)
        {
            return None;
        }
        let complete = TypeCompletionChecker::new(lib)
            .with_type_maps(self.cx.type_maps)
            .is_complete_decl(id);
        let result = if complete {
            self.function(id, owner)
        } else {
            Err(GenError::unsupported("incomplete type in signature", GENERATOR))
        };
        match result {
            Ok(binding) => Some(binding),
            Err(err) => {
                self.omit(id, &err);
                None
            }
        }
    }

    fn function(&self, id: DeclId, owner: Option<DeclId>) -> GenResult<FunctionBinding> {
        let lib = self.lib();
        let decl = lib.decl(id);
        let function = decl
            .as_function()
            .ok_or(GenError::unsupported(decl.kind.label(), GENERATOR))?;
        let method = decl.as_method();
        let mut printer = CliTypePrinter::new(self.cx);

        let mut parameters = Vec::new();
        for (index, &param) in function.parameters.iter().enumerate() {
            let pdecl = lib.decl(param);
            let ty = pdecl
                .qualified_type()
                .ok_or(GenError::MissingContext("parameter type"))?;
            let signature = printer.print(ty)?;
            let mut ctx = MarshalContext::for_parameter(Some(id), index, pdecl.name(), ty.clone());
            marshal::marshal_to_native(self.cx, &mut ctx)?;
            parameters.push(ParameterBinding {
                name: pdecl.name().to_string(),
                signature,
                marshal: ctx.into_fragment(),
            });
        }
        let args = parameters
            .iter()
            .map(|p| p.marshal.argument())
            .collect::<Vec<_>>()
            .join(", ");
        let params = parameters
            .iter()
            .map(|p| format!("{} {}", p.signature, p.name))
            .collect::<Vec<_>>()
            .join(", ");

        let is_constructor = method.is_some_and(|m| m.kind == MethodKind::Constructor);
        let is_static = method.is_some_and(|m| m.is_static);
        let mut instance = None;
        let call = match (owner, method) {
            (Some(class), Some(m)) if m.conversion == MethodConversion::FunctionToStaticMethod => {
                format!("{}::{}({args})", native_scope(lib, class), decl.original_name())
            }
            (Some(class), Some(_)) if is_constructor => {
                format!("new {}({args})", self.cx.native_name(class))
            }
            (Some(class), Some(_)) if is_static => {
                format!("{}::{}({args})", self.cx.native_name(class), decl.original_name())
            }
            (Some(class), Some(_)) => {
                let class_decl = lib.decl(class);
                if class_decl.as_class().is_some_and(|c| c.is_value_type()) {
                    // Value classes hold no native pointer; call through a copy.
                    let mut ctx =
                        MarshalContext::for_parameter(Some(id), 0, "(*this)", Type::tag(class).into());
                    ctx.arg_name = "this".to_string();
                    marshal::marshal_to_native(self.cx, &mut ctx)?;
                    let fragment = ctx.into_fragment();
                    let call = format!("{}.{}({args})", fragment.expression, decl.original_name());
                    instance = Some(fragment);
                    call
                } else {
                    format!(
                        "(({}*)NativePtr)->{}({args})",
                        self.cx.native_name(class),
                        decl.original_name()
                    )
                }
            }
            _ => format!("::{}({args})", lib.qualified_original_name(id)),
        };

        let (result, signature) = if is_constructor {
            (None, format!("{}({params})", decl.name()))
        } else {
            let returns = printer.print(&function.return_type)?;
            let result = if lib.is_primitive(&function.return_type.ty, Primitive::Void, true) {
                None
            } else {
                let mut ctx =
                    MarshalContext::for_return(Some(id), RETURN_VAR, function.return_type.clone());
                marshal::marshal_to_managed(self.cx, &mut ctx)?;
                Some(ctx.into_fragment())
            };
            let prefix = if is_static { "static " } else { "" };
            (result, format!("{prefix}{returns} {}({params})", decl.name()))
        };

        let name = match owner {
            Some(_) => decl.name().to_string(),
            None => self.cx.managed_name(id),
        };
        Ok(FunctionBinding {
            name,
            signature,
            call,
            comment: decl.comment.clone(),
            instance,
            parameters,
            result,
        })
    }

    fn emit_enum(&self, decl: &Decl, enumeration: &Enumeration) -> EnumBinding {
        EnumBinding {
            name: self.cx.managed_name(decl.id()),
            native: self.cx.native_name(decl.id()),
            underlying: enumeration.integer_type.native_name().to_string(),
            flags: enumeration.is_flags,
            comment: decl.comment.clone(),
            items: enumeration
                .items
                .iter()
                .map(|i| EnumItemBinding {
                    name: i.name.clone(),
                    value: i.value,
                })
                .collect(),
        }
    }

    fn delegate(&self, decl: &Decl, aliased: &QualifiedType) -> GenResult<DelegateBinding> {
        let lib = self.lib();
        let function = lib
            .pointee_function(&aliased.ty)
            .ok_or(GenError::unsupported("delegate without a signature", GENERATOR))?;
        let mut printer = CliTypePrinter::new(self.cx);
        let parameters = function
            .arguments
            .iter()
            .map(|a| printer.print(a))
            .collect::<GenResult<Vec<_>>>()?;
        Ok(DelegateBinding {
            name: self.cx.managed_name(decl.id()),
            native: self.cx.native_name(decl.id()),
            returns: printer.print(&function.return_type)?,
            parameters,
        })
    }
}

/// Native scope enclosing a class, e.g. `::ns` for `ns::Foo`, empty for a
/// global class.
fn native_scope(lib: &Library, class: DeclId) -> String {
    match lib.qualified_original_name(class).rsplit_once("::") {
        Some((scope, _)) => format!("::{scope}"),
        None => String::new(),
    }
}
