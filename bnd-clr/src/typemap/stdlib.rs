//! Built-in maps for standard library types.

use crate::error::GenResult;
use crate::marshal::MarshalContext;

use super::{TypeMap, TypeMapBinding, TypeMapDatabase};

pub(super) fn register(db: &mut TypeMapDatabase) {
    db.register("va_list", VaList);
    db.register("std::string", StdString { encoding: "E_UTF8" });
    db.register("std::wstring", StdString { encoding: "E_UTF16" });
    db.register("std::vector", Vector);
    db.register("std::map", Map);
    db.register("std::list", List);
    db.register("std::shared_ptr", SharedPtr);
}

/// `va_list` cannot cross the boundary.
struct VaList;

impl TypeMap for VaList {
    fn is_ignored(&self) -> bool {
        true
    }
}

/// `std::string` / `std::wstring` ↔ `System::String^`.
struct StdString {
    encoding: &'static str,
}

impl TypeMap for StdString {
    fn signature(&self, _binding: &TypeMapBinding<'_>) -> GenResult<String> {
        Ok("System::String^".to_string())
    }

    fn marshal_to_native(
        &self,
        _binding: &TypeMapBinding<'_>,
        ctx: &mut MarshalContext,
    ) -> GenResult<()> {
        let param = ctx.parameter()?.name.clone();
        ctx.ret.write(&format!(
            "clix::marshalString<clix::{}>({param})",
            self.encoding
        ));
        Ok(())
    }

    fn marshal_to_managed(
        &self,
        _binding: &TypeMapBinding<'_>,
        ctx: &mut MarshalContext,
    ) -> GenResult<()> {
        let value = ctx.return_var_name.clone();
        ctx.ret.write(&format!(
            "clix::marshalString<clix::{}>({value})",
            self.encoding
        ));
        Ok(())
    }
}

/// `std::vector<T>`; the signature is known but marshaling is not.
struct Vector;

impl TypeMap for Vector {
    fn is_ignored(&self) -> bool {
        true
    }

    fn signature(&self, binding: &TypeMapBinding<'_>) -> GenResult<String> {
        Ok(format!(
            "System::Collections::Generic::List<{}>^",
            binding.argument_spelling(0)?
        ))
    }
}

/// `std::map<K, V>`.
struct Map;

impl TypeMap for Map {
    fn is_ignored(&self) -> bool {
        true
    }

    fn signature(&self, binding: &TypeMapBinding<'_>) -> GenResult<String> {
        Ok(format!(
            "System::Collections::Generic::Dictionary<{}, {}>^",
            binding.argument_spelling(0)?,
            binding.argument_spelling(1)?
        ))
    }
}

struct List;

impl TypeMap for List {
    fn is_ignored(&self) -> bool {
        true
    }
}

/// Placeholder: every callback reports "not implemented".
struct SharedPtr;

impl TypeMap for SharedPtr {}
