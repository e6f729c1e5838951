//! Pass pipeline: ordered, tree-mutating walks over every translation unit.
//!
//! A pass implements [`TranslationUnitPass`], overriding only the
//! declaration kinds it cares about. [`PassBuilder::run`] drives each pass in
//! turn over the whole tree; a later pass observes every mutation of the
//! earlier ones.

use tracing::{debug, info, trace};

use crate::model::{DeclId, DeclKind, Library, PassKind};
use crate::typemap::TypeMapDatabase;

mod clean_names;
mod flag_enums;
mod rename_case;
mod resolve_incomplete;
mod static_methods;

pub use clean_names::CleanInvalidDeclNamesPass;
pub use flag_enums::CheckFlagEnumsPass;
pub use rename_case::{RenameCasePass, RenameTargets};
pub use resolve_incomplete::ResolveIncompleteDeclsPass;
pub use static_methods::{FunctionToStaticMethodPass, split_camel_case};

/// Result of offering one declaration to a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The pass changed the tree.
    Applied,
    /// Nothing to do for this declaration.
    NoMatch,
}

/// What a pass may touch: the tree mutably, the type-map registry read-only.
pub struct PassContext<'a> {
    pub library: &'a mut Library,
    pub type_maps: &'a TypeMapDatabase,
}

/// A tree-mutating visitor. Every method defaults to
/// [`PassOutcome::NoMatch`].
pub trait TranslationUnitPass {
    fn kind(&self) -> PassKind;

    fn name(&self) -> &'static str;

    fn visit_namespace(&mut self, _cx: &mut PassContext<'_>, _id: DeclId) -> PassOutcome {
        PassOutcome::NoMatch
    }

    fn visit_class_decl(&mut self, _cx: &mut PassContext<'_>, _id: DeclId) -> PassOutcome {
        PassOutcome::NoMatch
    }

    fn visit_field_decl(&mut self, _cx: &mut PassContext<'_>, _id: DeclId) -> PassOutcome {
        PassOutcome::NoMatch
    }

    fn visit_function_decl(&mut self, _cx: &mut PassContext<'_>, _id: DeclId) -> PassOutcome {
        PassOutcome::NoMatch
    }

    fn visit_method_decl(&mut self, _cx: &mut PassContext<'_>, _id: DeclId) -> PassOutcome {
        PassOutcome::NoMatch
    }

    fn visit_parameter_decl(&mut self, _cx: &mut PassContext<'_>, _id: DeclId) -> PassOutcome {
        PassOutcome::NoMatch
    }

    fn visit_typedef_decl(&mut self, _cx: &mut PassContext<'_>, _id: DeclId) -> PassOutcome {
        PassOutcome::NoMatch
    }

    fn visit_enum_decl(&mut self, _cx: &mut PassContext<'_>, _id: DeclId) -> PassOutcome {
        PassOutcome::NoMatch
    }

    fn visit_class_template_decl(&mut self, _cx: &mut PassContext<'_>, _id: DeclId) -> PassOutcome {
        PassOutcome::NoMatch
    }

    fn visit_function_template_decl(
        &mut self,
        _cx: &mut PassContext<'_>,
        _id: DeclId,
    ) -> PassOutcome {
        PassOutcome::NoMatch
    }

    fn visit_macro_definition(&mut self, _cx: &mut PassContext<'_>, _id: DeclId) -> PassOutcome {
        PassOutcome::NoMatch
    }

    fn visit_event(&mut self, _cx: &mut PassContext<'_>, _id: DeclId) -> PassOutcome {
        PassOutcome::NoMatch
    }
}

fn dispatch(pass: &mut dyn TranslationUnitPass, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
    match cx.library.decl(id).kind {
        DeclKind::Namespace(_) => pass.visit_namespace(cx, id),
        DeclKind::Class(_) => pass.visit_class_decl(cx, id),
        DeclKind::Field(_) => pass.visit_field_decl(cx, id),
        DeclKind::Function(_) => pass.visit_function_decl(cx, id),
        DeclKind::Method(_) => pass.visit_method_decl(cx, id),
        DeclKind::Parameter(_) => pass.visit_parameter_decl(cx, id),
        DeclKind::Typedef(_) => pass.visit_typedef_decl(cx, id),
        DeclKind::Enum(_) => pass.visit_enum_decl(cx, id),
        DeclKind::ClassTemplate(_) => pass.visit_class_template_decl(cx, id),
        DeclKind::FunctionTemplate(_) => pass.visit_function_template_decl(cx, id),
        DeclKind::Macro(_) => pass.visit_macro_definition(cx, id),
        DeclKind::Event(_) => pass.visit_event(cx, id),
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct WalkStats {
    visited: usize,
    applied: usize,
    skipped: usize,
}

/// Depth-first walk in definition order. Children are read after the node
/// itself was visited, so declarations a pass synthesizes under it are
/// walked too.
fn walk(
    pass: &mut dyn TranslationUnitPass,
    cx: &mut PassContext<'_>,
    id: DeclId,
    stats: &mut WalkStats,
) {
    let decl = cx.library.decl(id);
    if decl.exclude_from_passes.contains(&pass.kind()) || !cx.library.is_processed(id) {
        trace!(pass = pass.name(), decl = %decl, "skipped");
        stats.skipped += 1;
        return;
    }
    stats.visited += 1;
    if dispatch(pass, cx, id) == PassOutcome::Applied {
        stats.applied += 1;
    }
    for child in cx.library.children(id) {
        walk(pass, cx, child, stats);
    }
}

/// Ordered list of passes.
#[derive(Default)]
pub struct PassBuilder {
    passes: Vec<Box<dyn TranslationUnitPass>>,
}

impl PassBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(&mut self, pass: impl TranslationUnitPass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Kinds of the registered passes, in run order.
    pub fn kinds(&self) -> Vec<PassKind> {
        self.passes.iter().map(|p| p.kind()).collect()
    }

    /// Run every pass, in order, over every translation unit.
    pub fn run(&mut self, library: &mut Library, type_maps: &TypeMapDatabase) {
        let mut cx = PassContext { library, type_maps };
        for pass in &mut self.passes {
            let mut stats = WalkStats::default();
            let units = cx.library.units().to_vec();
            for unit in units {
                debug!(pass = pass.name(), unit = %cx.library.decl(unit), "running pass");
                walk(pass.as_mut(), &mut cx, unit, &mut stats);
            }
            info!(
                pass = pass.name(),
                visited = stats.visited,
                applied = stats.applied,
                skipped = stats.skipped,
                "pass finished"
            );
        }
    }
}
