//! Read-only state shared by the printer, the marshalers and the emitter.

use crate::model::{DeclId, Library};
use crate::typemap::TypeMapDatabase;

/// Everything a generator may consult. Cheap to copy; holds no mutable
/// state, so generators can recurse into each other freely.
#[derive(Clone, Copy)]
pub struct BindingContext<'a> {
    pub library: &'a Library,
    pub type_maps: &'a TypeMapDatabase,
    /// Managed namespace the wrapper types are generated into. Empty means
    /// the global namespace.
    pub namespace: &'a str,
}

impl<'a> BindingContext<'a> {
    pub fn new(library: &'a Library, type_maps: &'a TypeMapDatabase, namespace: &'a str) -> Self {
        Self {
            library,
            type_maps,
            namespace,
        }
    }

    /// Fully qualified managed name of a generated declaration, e.g.
    /// `MyLib::Foo` or `::Foo` without a namespace.
    pub fn managed_name(&self, id: DeclId) -> String {
        format!("{}::{}", self.namespace, self.library.qualified_name(id))
    }

    /// Native name usable in casts, e.g. `::ns::Foo`.
    pub fn native_name(&self, id: DeclId) -> String {
        format!("::{}", self.library.qualified_original_name(id))
    }
}
