//! Marshaling generators and the managed type printer.

use bnd_clr::context::BindingContext;
use bnd_clr::error::GenError;
use bnd_clr::marshal::{self, MarshalContext, MarshalFragment};
use bnd_clr::model::*;
use bnd_clr::printer::CliTypePrinter;
use bnd_clr::typemap::TypeMapDatabase;
use bnd_clr::types::*;

/// `Point` (value class), `Widget` (ref class), `Color` (enum) and a few
/// typedefs, all inside namespace `gfx`.
struct Fixture {
    lib: Library,
    maps: TypeMapDatabase,
    point: DeclId,
    widget: DeclId,
    color: DeclId,
    handle_t: DeclId,
    callback_t: DeclId,
    buffer: DeclId,
}

impl Fixture {
    fn new() -> Self {
        let mut lib = Library::new();
        let unit = lib.add_unit("gfx.h", false);
        let ns = lib.add_decl(unit, "gfx", DeclKind::Namespace(Namespace::default()));

        let point = lib.add_decl(
            ns,
            "Point",
            DeclKind::Class(Class {
                semantics: ClassSemantics::Value,
                ..Class::default()
            }),
        );
        for name in ["x", "y"] {
            lib.add_decl(
                point,
                name,
                DeclKind::Field(Field {
                    ty: Type::Builtin(Primitive::Float).into(),
                }),
            );
        }

        let widget = lib.add_decl(ns, "Widget", DeclKind::Class(Class::default()));
        let color = lib.add_decl(
            ns,
            "Color",
            DeclKind::Enum(Enumeration {
                items: Vec::new(),
                integer_type: Primitive::Int32,
                is_flags: false,
            }),
        );
        let handle_t = lib.add_decl(
            ns,
            "handle_t",
            DeclKind::Typedef(Typedef {
                ty: Type::Builtin(Primitive::UInt32).into(),
            }),
        );
        let callback_t = lib.add_decl(
            ns,
            "callback_t",
            DeclKind::Typedef(Typedef {
                ty: Type::pointer_to(Type::Function(FunctionType {
                    return_type: Box::new(Type::Builtin(Primitive::Bool).into()),
                    arguments: vec![Type::pointer_to(Type::tag(widget)).into()],
                }))
                .into(),
            }),
        );

        // A value class that cannot be built field by field.
        let buffer = lib.add_decl(
            ns,
            "Buffer",
            DeclKind::Class(Class {
                semantics: ClassSemantics::Value,
                ..Class::default()
            }),
        );
        lib.add_decl(
            buffer,
            "data",
            DeclKind::Field(Field {
                ty: Type::Array(ArrayType {
                    element: Box::new(Type::Builtin(Primitive::UInt8).into()),
                    size: ArraySize::Constant(16),
                })
                .into(),
            }),
        );

        Self {
            lib,
            maps: TypeMapDatabase::with_std_maps(),
            point,
            widget,
            color,
            handle_t,
            callback_t,
            buffer,
        }
    }

    fn cx(&self) -> BindingContext<'_> {
        BindingContext::new(&self.lib, &self.maps, "Gfx")
    }

    fn to_native(&self, name: &str, ty: Type) -> Result<MarshalFragment, GenError> {
        let mut ctx = MarshalContext::for_parameter(None, 1, name, ty.into());
        marshal::marshal_to_native(self.cx(), &mut ctx)?;
        Ok(ctx.into_fragment())
    }

    fn to_managed(&self, ty: Type) -> Result<MarshalFragment, GenError> {
        let mut ctx = MarshalContext::for_return(None, "__ret", ty.into());
        marshal::marshal_to_managed(self.cx(), &mut ctx)?;
        Ok(ctx.into_fragment())
    }

    fn print(&self, ty: Type) -> Result<String, GenError> {
        CliTypePrinter::new(self.cx()).print(&ty.into())
    }
}

fn prim(p: Primitive) -> Type {
    Type::Builtin(p)
}

fn expression(fragment: Result<MarshalFragment, GenError>) -> String {
    fragment.expect("marshaling succeeds").expression
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

#[test]
fn primitives_round_trip_unchanged() {
    let f = Fixture::new();
    for p in [
        Primitive::Bool,
        Primitive::Char,
        Primitive::Int8,
        Primitive::UInt8,
        Primitive::Int16,
        Primitive::UInt16,
        Primitive::Int32,
        Primitive::UInt32,
        Primitive::Int64,
        Primitive::UInt64,
        Primitive::Float,
        Primitive::Double,
    ] {
        let managed = expression(f.to_managed(prim(p)));
        assert_eq!(managed, "__ret", "{p:?} to managed");

        // Feed the managed expression back as the argument.
        let native = f.to_native(&managed, prim(p)).unwrap();
        assert_eq!(native.expression, "__ret", "{p:?} to native");
        assert!(native.before.is_empty() && native.after.is_empty());
        assert_eq!(native.argument(), "__ret");
    }
}

#[test]
fn void_produces_nothing_and_wide_char_is_unsupported() {
    let f = Fixture::new();
    assert_eq!(expression(f.to_managed(prim(Primitive::Void))), "");
    assert!(matches!(
        f.to_managed(prim(Primitive::WideChar)),
        Err(GenError::Unsupported { construct: "wide character", .. })
    ));
    assert!(matches!(
        f.to_native("c", prim(Primitive::WideChar)),
        Err(GenError::Unsupported { construct: "wide character", .. })
    ));
}

#[test]
fn missing_context_is_reported() {
    let f = Fixture::new();
    let mut ctx = MarshalContext::new();
    assert_eq!(
        marshal::marshal_to_managed(f.cx(), &mut ctx),
        Err(GenError::MissingContext("return type"))
    );
    assert_eq!(
        marshal::marshal_to_native(f.cx(), &mut ctx),
        Err(GenError::MissingContext("parameter"))
    );
}

// ---------------------------------------------------------------------------
// Pointers
// ---------------------------------------------------------------------------

#[test]
fn char_pointer_becomes_a_managed_string() {
    let f = Fixture::new();
    let const_char = || Type::pointer_to(QualifiedType::constant(prim(Primitive::Char)));

    assert_eq!(
        expression(f.to_managed(const_char())),
        "clix::marshalString<clix::E_UTF8>(__ret)"
    );

    let native = f.to_native("text", const_char()).unwrap();
    assert_eq!(
        native.before,
        ["auto _text = clix::marshalString<clix::E_UTF8>(text);"]
    );
    assert_eq!(native.expression, "_text.c_str()");
    assert!(!native.expression.contains("text)"));

    assert_eq!(f.print(const_char()).unwrap(), "System::String^");
}

#[test]
fn char_pointer_field_marshals_through_the_field() {
    let mut f = Fixture::new();
    let label = f.lib.add_decl(
        f.point,
        "label",
        DeclKind::Field(Field {
            ty: Type::pointer_to(prim(Primitive::Char)).into(),
        }),
    );

    let mut ctx = MarshalContext {
        arg_name: "p.label".to_string(),
        ..MarshalContext::default()
    };
    marshal::ManagedToNative::new(f.cx(), &mut ctx)
        .marshal_decl(label)
        .unwrap();
    let fragment = ctx.into_fragment();
    assert_eq!(
        fragment.before,
        ["auto _p__label = clix::marshalString<clix::E_UTF8>(p.label);"]
    );
    assert_eq!(fragment.expression, "_p__label.c_str()");

    // A parameter spelled like the flattened field keeps its own temporary.
    let flat = f.to_native("p_label", Type::pointer_to(prim(Primitive::Char))).unwrap();
    assert_eq!(flat.expression, "_p_label.c_str()");

    let mut ctx = MarshalContext {
        return_var_name: "native.label".to_string(),
        ..MarshalContext::default()
    };
    marshal::NativeToManaged::new(f.cx(), &mut ctx)
        .marshal_decl(label)
        .unwrap();
    assert_eq!(
        ctx.ret.to_string(),
        "clix::marshalString<clix::E_UTF8>(native.label)"
    );
}

#[test]
fn opaque_pointers_become_int_ptr() {
    let f = Fixture::new();
    let void_ptr = || Type::pointer_to(prim(Primitive::Void));
    let byte_ptr = || Type::pointer_to(prim(Primitive::UInt8));

    assert_eq!(expression(f.to_managed(void_ptr())), "::System::IntPtr(__ret)");
    assert_eq!(expression(f.to_managed(byte_ptr())), "::System::IntPtr(__ret)");
    assert_eq!(expression(f.to_native("p", void_ptr())), "p.ToPointer()");
    assert_eq!(expression(f.to_native("p", byte_ptr())), "(uint8*)p.ToPointer()");
    assert_eq!(f.print(void_ptr()).unwrap(), "System::IntPtr");
    assert_eq!(f.print(byte_ptr()).unwrap(), "System::IntPtr");
}

#[test]
fn pointer_return_signatures_match_their_expressions() {
    let f = Fixture::new();
    let cases = [
        (Primitive::Void, "System::IntPtr", "::System::IntPtr(__ret)"),
        (Primitive::UInt8, "System::IntPtr", "::System::IntPtr(__ret)"),
        (
            Primitive::Char,
            "System::String^",
            "clix::marshalString<clix::E_UTF8>(__ret)",
        ),
        (Primitive::Int32, "int", "*__ret"),
        (Primitive::Double, "double", "*__ret"),
    ];
    for (pointee, signature, managed) in cases {
        let ty = || Type::pointer_to(prim(pointee));
        assert_eq!(f.print(ty()).unwrap(), signature, "{pointee:?}*");
        assert_eq!(expression(f.to_managed(ty())), managed, "{pointee:?}*");
    }
}

#[test]
fn primitive_pointers_pass_by_address() {
    let f = Fixture::new();
    let int_ptr = || Type::pointer_to(prim(Primitive::Int32));

    let native = f.to_native("count", int_ptr()).unwrap();
    assert_eq!(native.expression, "count");
    assert_eq!(native.argument_prefix, "&");
    assert_eq!(native.argument(), "&count");

    assert_eq!(expression(f.to_managed(int_ptr())), "*__ret");
    assert_eq!(f.print(int_ptr()).unwrap(), "int");
}

#[test]
fn function_pointers_go_through_delegates() {
    let f = Fixture::new();
    let raw = Type::pointer_to(Type::Function(FunctionType {
        return_type: Box::new(prim(Primitive::Void).into()),
        arguments: vec![prim(Primitive::Int32).into()],
    }));

    assert_eq!(
        expression(f.to_native("cb", raw.clone())),
        "static_cast<void(*)(int)>(System::Runtime::InteropServices::Marshal::GetFunctionPointerForDelegate(cb).ToPointer())"
    );
    assert_eq!(
        expression(f.to_native("cb", Type::typedef(f.callback_t))),
        "static_cast<::gfx::callback_t>(System::Runtime::InteropServices::Marshal::GetFunctionPointerForDelegate(cb).ToPointer())"
    );
    assert!(matches!(
        f.to_managed(raw.clone()),
        Err(GenError::Unsupported { construct: "function pointer", .. })
    ));

    assert_eq!(f.print(raw).unwrap(), "System::Action<int>^");
    assert_eq!(
        f.print(Type::typedef(f.callback_t)).unwrap(),
        "Gfx::gfx::callback_t^"
    );
}

// ---------------------------------------------------------------------------
// Arrays and other unsupported constructs
// ---------------------------------------------------------------------------

#[test]
fn arrays_are_unsupported_to_native() {
    let f = Fixture::new();
    let array = || {
        Type::Array(ArrayType {
            element: Box::new(prim(Primitive::Int32).into()),
            size: ArraySize::Constant(4),
        })
    };

    assert_eq!(
        f.to_native("values", array()),
        Err(GenError::Unsupported {
            construct: "array",
            generator: "managed-to-native marshaler",
        })
    );
    assert_eq!(expression(f.to_managed(array())), "nullptr");
    assert_eq!(f.print(array()).unwrap(), "cli::array<int>^");
}

#[test]
fn array_field_fails_the_enclosing_value_class() {
    let f = Fixture::new();
    let err = f.to_native("buf", Type::tag(f.buffer)).unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(err.to_string(), "unsupported array in managed-to-native marshaler");
}

#[test]
fn member_pointers_and_template_parameters_are_unsupported() {
    let f = Fixture::new();
    let member = || {
        Type::MemberPointer(MemberPointerType {
            pointee: Box::new(prim(Primitive::Int32).into()),
        })
    };
    let param = || {
        Type::TemplateParameter(TemplateParameterType {
            name: "T".to_string(),
        })
    };
    for result in [
        f.to_native("m", member()),
        f.to_managed(member()),
        f.to_native("t", param()),
        f.to_managed(param()),
    ] {
        assert!(result.unwrap_err().is_unsupported());
    }
    assert!(f.print(member()).is_err());
    assert!(f.print(param()).is_err());
}

// ---------------------------------------------------------------------------
// Classes, enums and typedefs
// ---------------------------------------------------------------------------

#[test]
fn ref_class_uses_the_native_pointer() {
    let f = Fixture::new();
    let w = f.widget;

    assert_eq!(
        expression(f.to_native("w", Type::pointer_to(Type::tag(w)))),
        "(::gfx::Widget*)w->NativePtr"
    );
    let by_ref = f.to_native("w", Type::reference_to(Type::tag(w))).unwrap();
    assert_eq!(by_ref.expression, "*(::gfx::Widget*)w->NativePtr");
    assert_eq!(by_ref.var_prefix, "&");

    assert_eq!(
        expression(f.to_managed(Type::pointer_to(Type::tag(w)))),
        "gcnew Gfx::gfx::Widget((::gfx::Widget*)__ret)"
    );
    assert_eq!(
        expression(f.to_managed(Type::tag(w))),
        "gcnew Gfx::gfx::Widget((::gfx::Widget*)&__ret)"
    );
    assert_eq!(f.print(Type::pointer_to(Type::tag(w))).unwrap(), "Gfx::gfx::Widget^");
}

#[test]
fn value_class_is_built_field_by_field() {
    let f = Fixture::new();
    let native = f.to_native("pt", Type::tag(f.point)).unwrap();
    assert_eq!(
        native.before,
        [
            "auto _pt = ::gfx::Point();",
            "_pt.x = pt.x;",
            "_pt.y = pt.y;",
        ]
    );
    assert_eq!(native.expression, "_pt");
    assert_eq!(native.argument(), "_pt");

    let by_ptr = f.to_native("pt", Type::pointer_to(Type::tag(f.point))).unwrap();
    assert_eq!(by_ptr.argument(), "&_pt");

    let by_ref = f.to_native("pt", Type::reference_to(Type::tag(f.point))).unwrap();
    assert_eq!(by_ref.before, ["auto _pt = (::gfx::Point*)&pt;"]);
    assert_eq!(by_ref.expression, "*_pt");

    assert_eq!(
        expression(f.to_managed(Type::tag(f.point))),
        "Gfx::gfx::Point((::gfx::Point*)&__ret)"
    );
    assert_eq!(f.print(Type::tag(f.point)).unwrap(), "Gfx::gfx::Point");
}

#[test]
fn enums_are_cast() {
    let f = Fixture::new();
    assert_eq!(expression(f.to_native("c", Type::tag(f.color))), "(::gfx::Color)c");
    assert_eq!(
        expression(f.to_managed(Type::tag(f.color))),
        "(Gfx::gfx::Color)__ret"
    );
}

#[test]
fn primitive_typedefs_are_cast_to_the_alias() {
    let f = Fixture::new();
    assert_eq!(
        expression(f.to_native("h", Type::typedef(f.handle_t))),
        "(::gfx::handle_t)h"
    );
    assert_eq!(expression(f.to_managed(Type::typedef(f.handle_t))), "__ret");
    assert_eq!(f.print(Type::typedef(f.handle_t)).unwrap(), "unsigned int");
}

#[test]
fn printer_spells_function_types_as_delegates() {
    let f = Fixture::new();
    let function = |ret: Primitive, args: &[Primitive]| {
        Type::Function(FunctionType {
            return_type: Box::new(prim(ret).into()),
            arguments: args.iter().map(|&a| prim(a).into()).collect(),
        })
    };
    assert_eq!(f.print(function(Primitive::Void, &[])).unwrap(), "System::Action^");
    assert_eq!(
        f.print(function(Primitive::Bool, &[Primitive::Int32, Primitive::Double]))
            .unwrap(),
        "System::Func<int, double, bool>^"
    );
    assert_eq!(f.print(prim(Primitive::WideChar)).unwrap(), "System::Char");
    assert_eq!(f.print(prim(Primitive::Int8)).unwrap(), "char");
}

#[test]
fn hoisted_instance_rule_stops_at_the_first_parameter() {
    let mut f = Fixture::new();
    let ns = f.lib.decl(f.point).namespace.unwrap();
    let anchor = f.lib.add_decl(
        ns,
        "Anchor",
        DeclKind::Class(Class {
            semantics: ClassSemantics::Value,
            ..Class::default()
        }),
    );
    f.lib.add_decl(
        anchor,
        "owner",
        DeclKind::Field(Field {
            ty: Type::pointer_to(Type::tag(f.widget)).into(),
        }),
    );
    let hoisted = |lib: &mut Library, class: DeclId, name: &str| {
        lib.add_decl(
            class,
            name,
            DeclKind::Method(Method {
                function: Function::new(prim(Primitive::Void).into()),
                is_static: true,
                access: AccessSpecifier::default(),
                kind: MethodKind::default(),
                conversion: MethodConversion::FunctionToStaticMethod,
            }),
        )
    };
    let on_anchor = hoisted(&mut f.lib, anchor, "Move");
    let on_widget = hoisted(&mut f.lib, f.widget, "Move");
    let cx = f.cx();

    // Fields of a value-class first parameter go through the field itself.
    let mut ctx =
        MarshalContext::for_parameter(Some(on_anchor), 0, "anchor", Type::tag(anchor).into());
    marshal::marshal_to_native(cx, &mut ctx).unwrap();
    let fragment = ctx.into_fragment();
    assert_eq!(
        fragment.before,
        [
            "auto _anchor = ::gfx::Anchor();",
            "_anchor.owner = (::gfx::Widget*)anchor.owner->NativePtr;",
        ]
    );
    assert_eq!(fragment.expression, "_anchor");

    // A ref-class first parameter is the implicit instance.
    let widget_ptr = || Type::pointer_to(Type::tag(f.widget)).into();
    let mut ctx = MarshalContext::for_parameter(Some(on_widget), 0, "w", widget_ptr());
    marshal::marshal_to_native(cx, &mut ctx).unwrap();
    assert_eq!(ctx.ret.to_string(), "(::gfx::Widget*)NativePtr");

    let mut ctx = MarshalContext::for_parameter(Some(on_widget), 1, "w", widget_ptr());
    marshal::marshal_to_native(cx, &mut ctx).unwrap();
    assert_eq!(ctx.ret.to_string(), "(::gfx::Widget*)w->NativePtr");
}
