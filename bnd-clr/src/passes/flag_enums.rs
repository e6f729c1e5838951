use tracing::debug;

use crate::model::{DeclId, DeclKind, EnumItem, PassKind};

use super::{PassContext, PassOutcome, TranslationUnitPass};

/// Marks enumerations whose items form a bit-flag set.
#[derive(Debug, Default)]
pub struct CheckFlagEnumsPass;

/// Every value is zero or a distinct power of two, there are at least two
/// items and at least one value reaches 4. Plain sequences `0, 1, 2` are
/// not flags.
pub(crate) fn is_flag_set(items: &[EnumItem]) -> bool {
    if items.len() < 2 {
        return false;
    }
    let mut seen = 0u64;
    let mut max = 0i64;
    for item in items {
        if item.value == 0 {
            continue;
        }
        if item.value < 0 || (item.value & (item.value - 1)) != 0 {
            return false;
        }
        let bit = item.value as u64;
        if seen & bit != 0 {
            return false;
        }
        seen |= bit;
        max = max.max(item.value);
    }
    max >= 4
}

impl TranslationUnitPass for CheckFlagEnumsPass {
    fn kind(&self) -> PassKind {
        PassKind::CheckFlagEnums
    }

    fn name(&self) -> &'static str {
        "check-flag-enums"
    }

    fn visit_enum_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        let decl = cx.library.decl_mut(id);
        let DeclKind::Enum(enumeration) = &mut decl.kind else {
            return PassOutcome::NoMatch;
        };
        if enumeration.is_flags || !is_flag_set(&enumeration.items) {
            return PassOutcome::NoMatch;
        }
        enumeration.is_flags = true;
        debug!(decl = %decl, "marked as flags");
        PassOutcome::Applied
    }
}
