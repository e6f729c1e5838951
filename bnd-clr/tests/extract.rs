//! Header descriptions → declaration tree.

use bnd_clr::extract::{self, QualExpr, TypeExpr, UnitDesc, parse_type};
use bnd_clr::model::*;
use bnd_clr::types::*;

fn unit(text: &str) -> UnitDesc {
    toml::from_str(text).expect("valid unit description")
}

fn extract(units: &[&str]) -> (Library, Vec<Diagnostic>) {
    let units: Vec<UnitDesc> = units.iter().map(|t| unit(t)).collect();
    let mut lib = Library::new();
    let diags = extract::extract_units(&mut lib, &units).expect("extraction succeeds");
    (lib, diags)
}

fn ty_of(lib: &Library, id: DeclId) -> &Type {
    &lib.decl(id).qualified_type().expect("typed declaration").ty
}

fn return_of(lib: &Library, id: DeclId) -> &Type {
    &lib.decl(id).as_function().expect("function").return_type.ty
}

#[test]
fn parse_type_handles_the_type_syntax() {
    let builtin = |p| QualExpr {
        expr: TypeExpr::Builtin(p),
        qualifiers: TypeQualifiers::default(),
    };
    assert_eq!(parse_type("int32").unwrap(), builtin(Primitive::Int32));
    assert_eq!(parse_type("unsigned int").unwrap(), builtin(Primitive::UInt32));

    let cchar = parse_type("const char*").unwrap();
    let TypeExpr::Pointer(pointee, PointerModifier::Pointer) = cchar.expr else {
        panic!("expected a pointer, got {cchar:?}");
    };
    assert_eq!(pointee.expr, TypeExpr::Builtin(Primitive::Char));
    assert!(pointee.qualifiers.is_const);

    let cptr = parse_type("int32* const").unwrap();
    assert!(cptr.qualifiers.is_const);
    assert!(matches!(cptr.expr, TypeExpr::Pointer(_, PointerModifier::Pointer)));

    assert!(matches!(
        parse_type("Foo&&").unwrap().expr,
        TypeExpr::Pointer(_, PointerModifier::RValueReference)
    ));
    assert!(matches!(
        parse_type("double[3]").unwrap().expr,
        TypeExpr::Array(_, ArraySize::Constant(3))
    ));
    assert!(matches!(
        parse_type("double[]").unwrap().expr,
        TypeExpr::Array(_, ArraySize::Variable)
    ));
    assert_eq!(
        parse_type("$T").unwrap().expr,
        TypeExpr::Param("T".to_string())
    );
    assert_eq!(
        parse_type("ns::Foo").unwrap().expr,
        TypeExpr::Named("ns::Foo".to_string())
    );
}

#[test]
fn parse_type_handles_templates_and_functions() {
    let map = parse_type("std::map<std::string, std::vector<int32>>").unwrap();
    let TypeExpr::Template { name, args } = map.expr else {
        panic!("expected a template");
    };
    assert_eq!(name, "std::map");
    assert_eq!(args.len(), 2);
    assert!(matches!(&args[1].expr, TypeExpr::Template { name, .. } if name == "std::vector"));

    let callback = parse_type("(fn(int32, Foo*) -> bool)*").unwrap();
    let TypeExpr::Pointer(pointee, _) = callback.expr else {
        panic!("expected a pointer");
    };
    let TypeExpr::Function { ret, args } = pointee.expr else {
        panic!("expected a function");
    };
    assert_eq!(ret.expr, TypeExpr::Builtin(Primitive::Bool));
    assert_eq!(args.len(), 2);

    let no_ret = parse_type("fn()").unwrap();
    assert!(matches!(no_ret.expr, TypeExpr::Function { ref args, .. } if args.is_empty()));

    assert!(matches!(
        parse_type("memberptr<int32>").unwrap().expr,
        TypeExpr::MemberPointer(_)
    ));
}

#[test]
fn parse_type_rejects_garbage() {
    for bad in ["", "Foo<int32", "fn(int32) void", "a b", "int32[x]"] {
        assert!(parse_type(bad).is_err(), "`{bad}` parsed");
    }
}

#[test]
fn names_resolve_across_units_and_scopes() {
    let (lib, diags) = extract(&[
        r#"
        file = "base.h"
        [[decl]]
        kind = "typedef"
        name = "size_t"
        type = "uint64"
        "#,
        r#"
        file = "app.h"
        [[decl]]
        kind = "namespace"
        name = "app"

        [[decl.decl]]
        kind = "class"
        name = "Node"
        incomplete = true

        [[decl.decl]]
        kind = "class"
        name = "Node"
        field = [{ name = "next", type = "Node*" }, { name = "len", type = "size_t" }]

        [[decl.decl]]
        kind = "class"
        name = "Tree"
        bases = ["Node"]
        "#,
    ]);
    assert!(diags.is_empty(), "{diags:?}");

    let node = lib
        .iter()
        .find(|d| d.name() == "Node" && !d.is_incomplete)
        .unwrap()
        .id();
    let class = lib.decl(node).as_class().unwrap();
    let next = class.fields[0];
    assert_eq!(ty_of(&lib, next), &Type::pointer_to(Type::tag(node)));
    let len = class.fields[1];
    let size_t = lib.find_typedef("size_t").unwrap();
    assert_eq!(ty_of(&lib, len), &Type::typedef(size_t));

    let tree = lib.find_class("app::Tree").unwrap();
    assert_eq!(lib.decl(tree).as_class().unwrap().bases, [node]);
}

#[test]
fn unresolved_names_become_incomplete_classes() {
    let (lib, diags) = extract(&[r#"
        file = "io.h"
        [[decl]]
        kind = "function"
        name = "open"
        returns = "FILE*"
        param = [{ name = "path", type = "const std::string&" }]

        [[decl]]
        kind = "function"
        name = "close"
        param = [{ name = "f", type = "FILE*" }]

        [[decl]]
        kind = "function"
        name = "lines"
        returns = "std::vector<std::string>"
        "#]);

    let warned: Vec<&str> = diags
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Warning)
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(warned.len(), 3, "{warned:?}");
    assert!(warned.iter().any(|m| m.contains("`FILE`")));
    assert!(diags.iter().all(|d| d.file == "io.h"));

    let file = lib.find_class("FILE").unwrap();
    assert!(lib.decl(file).is_incomplete);
    let open = lib.find_function("open").unwrap();
    let close = lib.find_function("close").unwrap();
    assert_eq!(return_of(&lib, open), &Type::pointer_to(Type::tag(file)));
    let f = lib.decl(close).as_function().unwrap().parameters[0];
    // Created once, reused afterwards.
    assert_eq!(ty_of(&lib, f), &Type::pointer_to(Type::tag(file)));

    let lines = lib.find_function("lines").unwrap();
    let Type::TemplateSpecialization(spec) = return_of(&lib, lines) else {
        panic!("expected a template specialization");
    };
    assert_eq!(lib.qualified_original_name(spec.template), "std::vector");
    assert!(lib.decl(spec.template).is_incomplete);
}

#[test]
fn class_members_and_flags_are_extracted() {
    let (lib, _) = extract(&[r#"
        file = "w.h"
        [[decl]]
        kind = "class"
        name = "Window"
        semantics = "reference"
        comment = "A window."
        exclude_passes = ["clean_invalid_decl_names"]

        [[decl.method]]
        name = "Window"
        kind = "constructor"
        param = [{ name = "title", type = "const char*" }]

        [[decl.method]]
        name = "count"
        static = true
        returns = "int32"

        [[decl.method]]
        name = "secret"
        access = "private"
        ignore = true

        [[decl.decl]]
        kind = "enum"
        name = "State"
        integer_type = "uint8"
        item = [{ name = "Open", value = 0 }, { name = "Closed", value = 1 }]

        [[decl]]
        kind = "macro"
        name = "WINDOW_MAX"
        value = "8"
        "#]);

    let window = lib.find_class("Window").unwrap();
    let decl = lib.decl(window);
    assert_eq!(decl.comment.as_deref(), Some("A window."));
    assert!(decl.exclude_from_passes.contains(&PassKind::CleanInvalidDeclNames));
    let class = decl.as_class().unwrap();
    assert!(class.is_ref_type());
    assert_eq!(class.methods.len(), 3);

    let ctor = lib.decl(class.methods[0]).as_method().unwrap();
    assert_eq!(ctor.kind, MethodKind::Constructor);
    assert_eq!(ctor.function.parameters.len(), 1);
    assert!(lib.decl(class.methods[1]).as_method().unwrap().is_static);
    let secret = lib.decl(class.methods[2]);
    assert!(secret.is_explicitly_ignored());
    assert_eq!(secret.as_method().unwrap().access, AccessSpecifier::Private);

    let state = lib.find_enum("Window::State").unwrap();
    assert_eq!(lib.decl(state).namespace, Some(window));
    assert_eq!(lib.decl(state).as_enum().unwrap().integer_type, Primitive::UInt8);

    assert!(lib.iter().any(|d| matches!(&d.kind, DeclKind::Macro(m) if m.expression == "8")));
}

#[test]
fn templates_own_a_detached_templated_declaration() {
    let (lib, diags) = extract(&[r#"
        file = "t.h"
        [[decl]]
        kind = "class_template"
        name = "Box"
        parameters = ["T"]
        field = [{ name = "value", type = "$T" }]

        [[decl]]
        kind = "function"
        name = "unbox"
        returns = "int32"
        param = [{ name = "b", type = "Box<int32>" }]
        "#]);
    assert!(diags.is_empty(), "{diags:?}");

    let template = lib
        .iter()
        .find(|d| matches!(d.kind, DeclKind::ClassTemplate(_)))
        .unwrap();
    let DeclKind::ClassTemplate(t) = &template.kind else {
        unreachable!()
    };
    assert_eq!(t.parameters, ["T"]);
    let unit = lib.units()[0];
    assert!(!lib.children(unit).contains(&t.templated));
    let value = lib.decl(t.templated).as_class().unwrap().fields[0];
    assert!(matches!(ty_of(&lib, value), Type::TemplateParameter(p) if p.name == "T"));

    let unbox = lib.find_function("unbox").unwrap();
    let b = lib.decl(unbox).as_function().unwrap().parameters[0];
    assert!(matches!(ty_of(&lib, b), Type::TemplateSpecialization(s) if s.template == template.id()));
}

#[test]
fn listed_diagnostics_are_returned_with_their_file() {
    let (_, diags) = extract(&[r#"
        file = "bad.h"
        diagnostics = [{ level = "error", message = "expected ';'" }]
        "#]);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].file, "bad.h");
    assert_eq!(diags[0].level, DiagnosticLevel::Error);
}

#[test]
fn bad_type_reports_the_declaration() {
    let desc = unit(
        r#"
        file = "x.h"
        [[decl]]
        kind = "function"
        name = "broken"
        returns = "int32 int32"
        "#,
    );
    let mut lib = Library::new();
    let err = extract::extract_units(&mut lib, &[desc]).unwrap_err();
    assert!(format!("{err:#}").contains("broken"), "{err:#}");
}
