use tracing::debug;

use crate::model::*;

use super::{PassContext, PassOutcome, TranslationUnitPass};

/// Hoists `FooBar(...)` into a static `Foo::Bar(...)` when a complete class
/// `Foo` exists. The free function is kept but explicitly ignored.
#[derive(Debug, Default)]
pub struct FunctionToStaticMethodPass;

/// Split a name where an uppercase letter starts a new word:
/// `FooBarBaz` → `["Foo", "Bar", "Baz"]`.
pub fn split_camel_case(name: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in name.char_indices() {
        if i > start && c.is_uppercase() {
            parts.push(&name[start..i]);
            start = i;
        }
    }
    if start < name.len() {
        parts.push(&name[start..]);
    }
    parts
}

impl TranslationUnitPass for FunctionToStaticMethodPass {
    fn kind(&self) -> PassKind {
        PassKind::FunctionToStaticMethod
    }

    fn name(&self) -> &'static str {
        "function-to-static-method"
    }

    fn visit_function_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        let lib = &*cx.library;
        let decl = lib.decl(id);
        // Already hoisted, or dropped by an earlier pass.
        if decl.is_ignored() {
            return PassOutcome::NoMatch;
        }
        let Some(function) = decl.as_function() else {
            return PassOutcome::NoMatch;
        };
        let parts = split_camel_case(decl.name());
        let Some((class_name, rest)) = parts.split_first() else {
            return PassOutcome::NoMatch;
        };
        let method_name = rest.concat();
        if method_name.is_empty() {
            return PassOutcome::NoMatch;
        }
        let Some(class) = lib.find_complete_class(class_name) else {
            return PassOutcome::NoMatch;
        };

        let method = Method {
            function: function.clone(),
            is_static: true,
            access: AccessSpecifier::Public,
            kind: MethodKind::Normal,
            conversion: MethodConversion::FunctionToStaticMethod,
        };
        let mut hoisted = Decl::new(method_name, DeclKind::Method(method));
        hoisted.set_original_name(decl.original_name());
        hoisted.namespace = Some(class);
        hoisted.comment = decl.comment.clone();
        debug!(
            function = %decl,
            class = %lib.decl(class),
            method = hoisted.name(),
            "hoisted function into static method"
        );

        let method_id = cx.library.insert(hoisted);
        cx.library.attach(class, method_id);
        cx.library.decl_mut(id).set_explicitly_ignored(true);
        PassOutcome::Applied
    }
}
