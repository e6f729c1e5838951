//! Type-map registry: per-type overrides of ignore status, managed
//! signature and marshaling code.
//!
//! Maps are keyed by the native qualified name of a class, typedef or class
//! template (`std::string`, `va_list`, `std::vector`). The registry is filled
//! once before the pass pipeline runs and only shared-borrowed afterwards.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::{GenError, GenResult};
use crate::marshal::MarshalContext;
use crate::model::{DeclId, Library};
use crate::types::{QualifiedType, Type};

mod stdlib;
mod template;

pub use template::TemplateTypeMap;

/// The concrete use a type map is being asked about. One map serves every
/// instantiation of a template, so the instantiation travels with the call
/// instead of being stored in the map.
#[derive(Clone, Copy)]
pub struct TypeMapBinding<'a> {
    /// Name the map was registered under.
    pub name: &'a str,
    pub library: &'a Library,
    pub ty: Option<&'a Type>,
}

impl<'a> TypeMapBinding<'a> {
    /// The `index`-th template argument of the bound specialization.
    pub fn template_argument(&self, index: usize) -> Option<&'a QualifiedType> {
        match self.ty? {
            Type::TemplateSpecialization(t) => t.arguments.get(index),
            _ => None,
        }
    }

    /// Native spelling of the `index`-th template argument.
    pub fn argument_spelling(&self, index: usize) -> GenResult<String> {
        self.template_argument(index)
            .map(|arg| self.library.native_spelling(arg))
            .ok_or(GenError::MissingContext("template argument"))
    }

    pub fn unimplemented(&self, operation: &'static str) -> GenError {
        GenError::TypeMapUnimplemented {
            name: self.name.to_string(),
            operation,
        }
    }
}

/// A registered extension for one native type.
///
/// Every callback has a default: not ignored, reference semantics, and
/// "not implemented" failures for the three code callbacks.
pub trait TypeMap {
    fn is_ignored(&self) -> bool {
        false
    }

    fn is_value_type(&self) -> bool {
        false
    }

    /// Managed signature of the type.
    fn signature(&self, binding: &TypeMapBinding<'_>) -> GenResult<String> {
        Err(binding.unimplemented("signature"))
    }

    /// Write the native→managed conversion of `ctx.return_var_name`.
    fn marshal_to_managed(
        &self,
        binding: &TypeMapBinding<'_>,
        ctx: &mut MarshalContext,
    ) -> GenResult<()> {
        let _ = ctx;
        Err(binding.unimplemented("marshal_to_managed"))
    }

    /// Write the managed→native conversion of `ctx.parameter`.
    fn marshal_to_native(
        &self,
        binding: &TypeMapBinding<'_>,
        ctx: &mut MarshalContext,
    ) -> GenResult<()> {
        let _ = ctx;
        Err(binding.unimplemented("marshal_to_native"))
    }
}

/// A registry hit.
#[derive(Clone, Copy)]
pub struct TypeMapRef<'a> {
    pub name: &'a str,
    pub map: &'a dyn TypeMap,
}

impl<'a> TypeMapRef<'a> {
    /// Attach the instantiation in play.
    pub fn bind<'b>(self, library: &'b Library, ty: Option<&'b Type>) -> BoundTypeMap<'b>
    where
        'a: 'b,
    {
        BoundTypeMap {
            map: self.map,
            binding: TypeMapBinding {
                name: self.name,
                library,
                ty,
            },
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.map.is_ignored()
    }
}

/// A type map together with the instantiation it is used for.
pub struct BoundTypeMap<'a> {
    map: &'a dyn TypeMap,
    binding: TypeMapBinding<'a>,
}

impl BoundTypeMap<'_> {
    pub fn is_ignored(&self) -> bool {
        self.map.is_ignored()
    }

    pub fn is_value_type(&self) -> bool {
        self.map.is_value_type()
    }

    pub fn signature(&self) -> GenResult<String> {
        self.map.signature(&self.binding)
    }

    pub fn marshal_to_managed(&self, ctx: &mut MarshalContext) -> GenResult<()> {
        self.map.marshal_to_managed(&self.binding, ctx)
    }

    pub fn marshal_to_native(&self, ctx: &mut MarshalContext) -> GenResult<()> {
        self.map.marshal_to_native(&self.binding, ctx)
    }
}

/// Name → type map table.
#[derive(Default)]
pub struct TypeMapDatabase {
    maps: HashMap<String, Box<dyn TypeMap>>,
}

impl fmt::Debug for TypeMapDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.maps.keys().collect();
        names.sort();
        f.debug_struct("TypeMapDatabase")
            .field("maps", &names)
            .finish()
    }
}

impl TypeMapDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// A database pre-populated with the standard library maps.
    pub fn with_std_maps() -> Self {
        let mut db = Self::new();
        db.setup_type_maps();
        db
    }

    /// Register the built-in maps for standard library types.
    pub fn setup_type_maps(&mut self) {
        stdlib::register(self);
    }

    /// Register `map` under a native qualified name. A later registration
    /// under the same name replaces the earlier one.
    pub fn register(&mut self, name: impl Into<String>, map: impl TypeMap + 'static) {
        self.register_boxed(name.into(), Box::new(map));
    }

    pub fn register_boxed(&mut self, name: String, map: Box<dyn TypeMap>) {
        if self.maps.insert(name.clone(), map).is_some() {
            debug!(name = %name, "replaced type map");
        } else {
            debug!(name = %name, "registered type map");
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.maps.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.maps.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Exact-name lookup.
    pub fn find(&self, name: &str) -> Option<TypeMapRef<'_>> {
        self.maps
            .get_key_value(name)
            .map(|(name, map)| TypeMapRef {
                name: name.as_str(),
                map: map.as_ref(),
            })
    }

    /// Lookup for a class, enum, typedef or template declaration by its
    /// qualified original name, then by its plain original name.
    pub fn find_for_decl(&self, library: &Library, id: DeclId) -> Option<TypeMapRef<'_>> {
        let qualified = library.qualified_original_name(id);
        self.find(&qualified)
            .or_else(|| self.find(library.decl(id).original_name()))
    }

    /// Lookup for a type use: typedefs and tags by their declaration,
    /// template specializations by the template declaration.
    pub fn find_for_type(&self, library: &Library, ty: &Type) -> Option<TypeMapRef<'_>> {
        match ty {
            Type::Typedef(t) => self.find_for_decl(library, t.decl),
            Type::Tag(t) => self.find_for_decl(library, t.decl),
            Type::TemplateSpecialization(t) => self.find_for_decl(library, t.template),
            _ => None,
        }
    }
}
