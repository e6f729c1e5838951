use tracing::debug;

use crate::model::{DeclId, DeclKind, PassKind};

use super::{PassContext, PassOutcome, TranslationUnitPass};

/// Words that cannot name a C++/CLI declaration.
const RESERVED: &[&str] = &[
    "abstract", "alignas", "alignof", "asm", "auto", "bool", "break", "case", "catch", "char",
    "class", "const", "constexpr", "continue", "decltype", "default", "delegate", "delete", "do",
    "double", "else", "enum", "event", "explicit", "extern", "false", "finally", "float", "for",
    "friend", "gcnew", "generic", "goto", "if", "initonly", "inline", "int", "interface",
    "literal", "long", "mutable", "namespace", "new", "noexcept", "nullptr", "operator",
    "override", "private", "property", "protected", "public", "ref", "register", "return",
    "sealed", "short", "signed", "sizeof", "static", "struct", "switch", "template", "this",
    "throw", "true", "try", "typedef", "typeid", "typename", "union", "unsigned", "using",
    "value", "virtual", "void", "volatile", "while",
];

/// Renames declarations whose names are not valid identifiers. Original
/// names are left alone so marshaling still reaches the native symbol.
#[derive(Debug, Default)]
pub struct CleanInvalidDeclNamesPass {
    unnamed: u32,
}

/// Sanitized form of `name`, or `None` if it is already valid.
pub(crate) fn clean_identifier(name: &str) -> Option<String> {
    let mut cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.starts_with(|c: char| c.is_ascii_digit()) || RESERVED.contains(&cleaned.as_str()) {
        cleaned.insert(0, '_');
    }
    (cleaned != name).then_some(cleaned)
}

impl CleanInvalidDeclNamesPass {
    fn clean(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        let decl = cx.library.decl_mut(id);
        let new_name = if decl.name().is_empty() {
            self.unnamed += 1;
            format!("_unnamed{}", self.unnamed)
        } else {
            match clean_identifier(decl.name()) {
                Some(name) => name,
                None => return PassOutcome::NoMatch,
            }
        };
        debug!(from = decl.name(), to = %new_name, "renamed invalid declaration name");
        decl.set_name(new_name);
        PassOutcome::Applied
    }

    /// Unnamed parameters are named after their position.
    fn name_parameters(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        let params = cx
            .library
            .decl(id)
            .as_function()
            .map(|f| f.parameters.clone())
            .unwrap_or_default();
        let mut outcome = PassOutcome::NoMatch;
        for (index, param) in params.into_iter().enumerate() {
            let decl = cx.library.decl_mut(param);
            if decl.name().is_empty() {
                decl.set_name(format!("_{index}"));
                outcome = PassOutcome::Applied;
            }
        }
        outcome
    }
}

fn either(a: PassOutcome, b: PassOutcome) -> PassOutcome {
    if a == PassOutcome::Applied || b == PassOutcome::Applied {
        PassOutcome::Applied
    } else {
        PassOutcome::NoMatch
    }
}

impl TranslationUnitPass for CleanInvalidDeclNamesPass {
    fn kind(&self) -> PassKind {
        PassKind::CleanInvalidDeclNames
    }

    fn name(&self) -> &'static str {
        "clean-invalid-decl-names"
    }

    fn visit_namespace(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        // Translation-unit roots are named after their file.
        if cx.library.decl(id).namespace.is_none() {
            return PassOutcome::NoMatch;
        }
        self.clean(cx, id)
    }

    fn visit_class_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        self.clean(cx, id)
    }

    fn visit_field_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        self.clean(cx, id)
    }

    fn visit_function_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        let params = self.name_parameters(cx, id);
        either(params, self.clean(cx, id))
    }

    fn visit_method_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        let params = self.name_parameters(cx, id);
        either(params, self.clean(cx, id))
    }

    fn visit_parameter_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        self.clean(cx, id)
    }

    fn visit_typedef_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        self.clean(cx, id)
    }

    fn visit_enum_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        let mut outcome = self.clean(cx, id);
        if let DeclKind::Enum(enumeration) = &mut cx.library.decl_mut(id).kind {
            for item in &mut enumeration.items {
                if let Some(name) = clean_identifier(&item.name) {
                    debug!(from = %item.name, to = %name, "renamed invalid enum item");
                    item.name = name;
                    outcome = PassOutcome::Applied;
                }
            }
        }
        outcome
    }

    fn visit_class_template_decl(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        self.clean(cx, id)
    }

    fn visit_function_template_decl(
        &mut self,
        cx: &mut PassContext<'_>,
        id: DeclId,
    ) -> PassOutcome {
        self.clean(cx, id)
    }

    fn visit_event(&mut self, cx: &mut PassContext<'_>, id: DeclId) -> PassOutcome {
        self.clean(cx, id)
    }
}
