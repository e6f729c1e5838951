use bitflags::bitflags;
use tracing::trace;

use crate::model::{DeclId, MethodKind, PassKind};

use super::{PassContext, PassOutcome, TranslationUnitPass};

bitflags! {
    /// Declaration kinds [`RenameCasePass`] applies to.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct RenameTargets: u8 {
        const FUNCTIONS = 1 << 0;
        const METHODS = 1 << 1;
        const FIELDS = 1 << 2;
        const PARAMETERS = 1 << 3;
    }
}

/// Renames declarations to UpperCamelCase, the managed naming convention.
/// `get_value` → `GetValue`, `size` → `Size`.
#[derive(Debug)]
pub struct RenameCasePass {
    targets: RenameTargets,
}

impl RenameCasePass {
    pub fn new(targets: RenameTargets) -> Self {
        Self { targets }
    }

    fn rename(&self, cx: &mut PassContext<'_>, id: DeclId, target: RenameTargets) -> PassOutcome {
        if !self.targets.contains(target) {
            return PassOutcome::NoMatch;
        }
        let decl = cx.library.decl_mut(id);
        let renamed = upper_camel_case(decl.name());
        if renamed.is_empty()
            || renamed == decl.name()
            || renamed.starts_with(|c: char| c.is_ascii_digit())
        {
            return PassOutcome::NoMatch;
        }
        trace!(from = decl.name(), to = %renamed, "renamed");
        decl.set_name(renamed);
        PassOutcome::Applied
    }
}

pub(crate) fn upper_camel_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

impl TranslationUnitPass for RenameCasePass {
    fn kind(&self) -> PassKind {
        PassKind::RenameCase
    }

    fn name(&self) -> &'static str {
        "rename-case"
    }

    fn visit_function_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        self.rename(cx, id, RenameTargets::FUNCTIONS)
    }

    fn visit_method_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        // Constructors, destructors and operators keep their spelling.
        let is_normal = cx
            .library
            .decl(id)
            .as_method()
            .is_some_and(|m| m.kind == MethodKind::Normal);
        if !is_normal {
            return PassOutcome::NoMatch;
        }
        self.rename(cx, id, RenameTargets::METHODS)
    }

    fn visit_field_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        self.rename(cx, id, RenameTargets::FIELDS)
    }

    fn visit_parameter_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        self.rename(cx, id, RenameTargets::PARAMETERS)
    }
}
