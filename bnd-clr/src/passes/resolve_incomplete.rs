use tracing::debug;

use crate::model::{DeclId, PassKind};

use super::{PassContext, PassOutcome, TranslationUnitPass};

/// Links forward declarations to their definitions. A forward declaration
/// with no definition and no type map is dropped from generation.
#[derive(Debug, Default)]
pub struct ResolveIncompleteDeclsPass;

impl ResolveIncompleteDeclsPass {
    fn resolve(&self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        let decl = cx.library.decl(id);
        if !decl.is_incomplete || decl.complete_decl.is_some() {
            return PassOutcome::NoMatch;
        }
        if let Some(complete) = cx.library.find_complete_decl(id) {
            debug!(decl = %cx.library.decl(id), complete = %complete, "resolved forward declaration");
            cx.library.decl_mut(id).complete_decl = Some(complete);
            return PassOutcome::Applied;
        }
        if cx.type_maps.find_for_decl(cx.library, id).is_some() {
            return PassOutcome::NoMatch;
        }
        debug!(decl = %cx.library.decl(id), "no definition found; not generated");
        cx.library.decl_mut(id).set_generated(false);
        PassOutcome::Applied
    }
}

impl TranslationUnitPass for ResolveIncompleteDeclsPass {
    fn kind(&self) -> PassKind {
        PassKind::ResolveIncompleteDecls
    }

    fn name(&self) -> &'static str {
        "resolve-incomplete-decls"
    }

    fn visit_class_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        self.resolve(cx, id)
    }

    fn visit_enum_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        self.resolve(cx, id)
    }

    fn visit_class_template_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        self.resolve(cx, id)
    }
}
