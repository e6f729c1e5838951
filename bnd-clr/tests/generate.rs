//! End-to-end: fixture config → extraction → passes → emitted bindings.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use bnd_clr::emit::{BindingSet, ClassBinding, FunctionBinding};
use bnd_clr::model::DiagnosticLevel;
use bnd_clr::{Driver, DriverOptions, extract, typemap::TypeMapDatabase};

fn fixture(path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../tests/fixtures")
        .join(path)
}

static SHAPES: LazyLock<BindingSet> = LazyLock::new(|| {
    bnd_clr::generate(&fixture("shapes/bnd-clr.toml")).expect("generate shapes bindings")
});

fn class(name: &str) -> &'static ClassBinding {
    SHAPES
        .class(name)
        .unwrap_or_else(|| panic!("class {name} missing: {:?}", names(&SHAPES)))
}

fn method<'a>(class: &'a ClassBinding, name: &str) -> &'a FunctionBinding {
    class
        .methods
        .iter()
        .find(|m| m.name == name)
        .unwrap_or_else(|| panic!("{} has no method {name}", class.name))
}

fn function(name: &str) -> &'static FunctionBinding {
    SHAPES
        .function(name)
        .unwrap_or_else(|| panic!("function {name} missing"))
}

fn names(set: &BindingSet) -> Vec<&str> {
    set.classes.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn classes_are_emitted_in_definition_order() {
    assert_eq!(SHAPES.namespace, "Geo");
    assert_eq!(
        names(&SHAPES),
        ["Geo::geo::Point", "Geo::geo::Shape", "Geo::geo::Circle"]
    );

    let shape = class("Geo::geo::Shape");
    assert_eq!(shape.native, "::geo::Shape");
    assert!(!shape.value_type);
    assert_eq!(shape.comment.as_deref(), Some("Base of every drawable shape."));
    assert!(shape.forward_refs.contains(&"Geo::geo::Color".to_string()));
    assert!(shape.forward_refs.contains(&"Geo::geo::Point".to_string()));

    assert_eq!(class("Geo::geo::Circle").bases, ["Geo::geo::Shape"]);
}

#[test]
fn system_headers_are_not_emitted() {
    assert!(SHAPES.class("Geo::pthread_attr_t").is_none());
    assert!(SHAPES.classes.iter().all(|c| !c.name.contains("pthread")));
}

#[test]
fn ref_class_methods_call_through_the_native_pointer() {
    let shape = class("Geo::geo::Shape");

    let ctor = method(shape, "Shape");
    assert_eq!(ctor.signature, "Shape()");
    assert_eq!(ctor.call, "new ::geo::Shape()");
    assert!(ctor.result.is_none());

    // Destructors are left to the wrapper's finalizer.
    assert!(shape.methods.iter().all(|m| !m.name.contains('~')));

    let area = method(shape, "Area");
    assert_eq!(area.signature, "double Area()");
    assert_eq!(area.call, "((::geo::Shape*)NativePtr)->area()");
    assert_eq!(area.result.as_ref().unwrap().expression, "__ret");

    let set_name = method(shape, "SetName");
    let name = &set_name.parameters[0].marshal;
    assert_eq!(
        name.before,
        ["auto _name = clix::marshalString<clix::E_UTF8>(name);"]
    );
    assert_eq!(name.expression, "_name.c_str()");

    let get_name = method(shape, "Name");
    assert_eq!(
        get_name.result.as_ref().unwrap().expression,
        "clix::marshalString<clix::E_UTF8>(__ret)"
    );

    let center = method(shape, "Center");
    assert_eq!(
        center.result.as_ref().unwrap().expression,
        "Geo::geo::Point((::geo::Point*)&__ret)"
    );

    assert_eq!(method(shape, "Label").signature, "System::String^ Label()");
}

#[test]
fn unsupported_and_ignored_members() {
    let shape = class("Geo::geo::Shape");

    // std::vector is mapped as ignored: skipped silently.
    assert!(shape.methods.iter().all(|m| m.name != "Samples"));
    assert!(!SHAPES.is_omitted("geo::Shape::samples"));

    let fill = SHAPES
        .omitted
        .iter()
        .find(|o| o.site == "geo::Shape::fill")
        .expect("fill omitted");
    assert_eq!(fill.reason, "unsupported array in managed-to-native marshaler");
    assert!(shape.methods.iter().all(|m| m.name != "Fill"));

    let widget = SHAPES
        .omitted
        .iter()
        .find(|o| o.site == "geo::attachWidget")
        .expect("attachWidget omitted");
    assert_eq!(
        widget.reason,
        "unsupported incomplete type in signature in emitter"
    );

    assert!(SHAPES.function("Geo::geo::openHandle").is_none());
    assert!(!SHAPES.is_omitted("geo::openHandle"));
    assert!(SHAPES.function("Geo::geo::internalReset").is_none());
}

#[test]
fn ref_class_fields_get_accessors() {
    let shape = class("Geo::geo::Shape");

    let color = shape.fields.iter().find(|f| f.name == "color").unwrap();
    assert_eq!(color.signature, "Geo::geo::Color");
    assert_eq!(
        color.get.as_ref().unwrap().expression,
        "(Geo::geo::Color)((::geo::Shape*)NativePtr)->color"
    );
    assert_eq!(color.set.as_ref().unwrap().expression, "(::geo::Color)value");

    // Renamed away from the keyword; the native access keeps the original.
    let default = shape.fields.iter().find(|f| f.name == "_default").unwrap();
    assert_eq!(
        default.get.as_ref().unwrap().expression,
        "((::geo::Shape*)NativePtr)->default"
    );
}

#[test]
fn value_class_members_go_through_a_copy() {
    let point = class("Geo::geo::Point");
    assert!(point.value_type);
    assert_eq!(point.comment.as_deref(), Some("A 2D point."));
    assert!(point.fields.iter().all(|f| f.get.is_none() && f.set.is_none()));

    let length = method(point, "Length");
    let instance = length.instance.as_ref().expect("instance copy");
    assert_eq!(
        instance.before,
        [
            "auto _this = ::geo::Point();",
            "_this.x = (*this).x;",
            "_this.y = (*this).y;"
        ]
    );
    assert_eq!(length.call, "_this.length()");
}

#[test]
fn first_parameter_functions_become_static_methods() {
    let shape = class("Geo::geo::Shape");
    let moved = method(shape, "Move");
    assert_eq!(
        moved.signature,
        "static void Move(Geo::geo::Shape^ shape, double dx, double dy)"
    );
    assert_eq!(moved.call, "::geo::ShapeMove((::geo::Shape*)NativePtr, dx, dy)");
    assert_eq!(moved.comment.as_deref(), Some("Move a shape by an offset."));
    assert!(SHAPES.function("Geo::geo::ShapeMove").is_none());
}

#[test]
fn free_functions() {
    let distance = function("Geo::geo::distance");
    assert_eq!(distance.call, "::geo::distance(_a, _b)");
    assert_eq!(
        distance.parameters[0].marshal.before,
        [
            "auto _a = ::geo::Point();",
            "_a.x = a.x;",
            "_a.y = a.y;"
        ]
    );

    let each = function("Geo::geo::forEachShape");
    assert_eq!(
        each.parameters[0].marshal.expression,
        "static_cast<::geo::ShapeCallback>(System::Runtime::InteropServices::Marshal::GetFunctionPointerForDelegate(cb).ToPointer())"
    );
    assert_eq!(each.parameters[1].marshal.expression, "user.ToPointer()");

    // ssize_t comes from a system header and prints through its typedef.
    assert_eq!(function("Geo::geo::countShapes").signature, "long long countShapes()");
}

#[test]
fn configured_type_maps_apply() {
    let get = function("Geo::geo::getTitle");
    assert_eq!(get.signature, "System::String^ getTitle()");
    assert_eq!(
        get.result.as_ref().unwrap().expression,
        "QtInterop::ToManaged(__ret)"
    );

    let set = function("Geo::geo::setTitle");
    assert_eq!(
        set.parameters[0].marshal.expression,
        "QtInterop::ToNative(title)"
    );
}

#[test]
fn delegates_and_enums() {
    let callback = SHAPES
        .delegates
        .iter()
        .find(|d| d.name == "Geo::geo::ShapeCallback")
        .expect("callback delegate");
    assert_eq!(callback.returns, "void");
    assert_eq!(callback.parameters, ["Geo::geo::Shape^", "int"]);

    let style = SHAPES.enumeration("Geo::geo::Style").unwrap();
    assert!(style.flags);
    assert_eq!(style.underlying, "unsigned int");
    assert!(!SHAPES.enumeration("Geo::geo::Color").unwrap().flags);

    let limit = SHAPES.enumeration("Geo::ShapeLimit").expect("macro enum");
    assert!(!limit.flags);
    let items: Vec<(&str, i64)> = limit.items.iter().map(|i| (i.name.as_str(), i.value)).collect();
    assert_eq!(items, [("SHAPE_MIN", 1), ("SHAPE_MAX", 12)]);
}

#[test]
fn bindings_serialize_to_toml() {
    let text = bnd_clr::emit::to_toml(&SHAPES).unwrap();
    assert!(text.contains("namespace = \"Geo\""), "{text}");
    assert!(text.contains("[[omitted]]"));
    assert!(text.contains("site = \"geo::Shape::fill\""));
}

#[test]
fn unresolved_types_are_reported() {
    let units = ["shapes/sys_types.toml", "shapes/shapes.toml"]
        .map(|p| extract::load_unit(&fixture(p)).unwrap());
    let mut driver = Driver::new(DriverOptions::new("Geo"), TypeMapDatabase::with_std_maps());
    driver.add_units(&units).unwrap();

    let warnings: Vec<&str> = driver
        .diagnostics()
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Warning)
        .map(|d| d.message.as_str())
        .collect();
    assert!(warnings.iter().any(|m| m.contains("`Handle`")), "{warnings:?}");
    assert!(warnings.iter().any(|m| m.contains("`QString`")), "{warnings:?}");
}

#[test]
fn fatal_diagnostic_drops_the_unit() {
    let set = bnd_clr::generate(&fixture("broken/bnd-clr.toml")).unwrap();
    assert_eq!(set.namespace, "Broken");
    assert!(set.functions.is_empty(), "{:?}", set.functions);
    assert!(set.classes.is_empty());

    let unit = extract::load_unit(&fixture("broken/broken.toml")).unwrap();
    let mut driver = Driver::new(DriverOptions::new("Broken"), TypeMapDatabase::new());
    driver.add_units(&[unit]).unwrap();
    assert!(
        driver
            .diagnostics()
            .iter()
            .any(|d| d.level == DiagnosticLevel::Fatal && d.file == "broken.h")
    );
    let root = driver.library().units()[0];
    assert!(!driver.library().is_generated(root));
}

fn write_config(dir: &Path, inputs: &[PathBuf]) -> PathBuf {
    let inputs = inputs
        .iter()
        .map(|p| format!("{:?}", p.display().to_string()))
        .collect::<Vec<_>>()
        .join(", ");
    let path = dir.join("bnd-clr.toml");
    std::fs::write(
        &path,
        format!("inputs = [{inputs}]\n\n[output]\nname = \"Geo\"\nfile = \"out.toml\"\n"),
    )
    .unwrap();
    path
}

#[test]
fn run_writes_the_configured_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &[fixture("shapes/sys_types.toml"), fixture("shapes/shapes.toml")],
    );

    let written = bnd_clr::run(&config, None).unwrap();
    assert_eq!(written, dir.path().join("out.toml"));
    let text = std::fs::read_to_string(&written).unwrap();
    assert!(text.contains("namespace = \"Geo\""));
    assert!(text.contains("Geo::geo::Shape"));

    let other = dir.path().join("elsewhere.toml");
    assert_eq!(bnd_clr::run(&config, Some(&other)).unwrap(), other);
    assert!(other.exists());
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &[PathBuf::from("nowhere.toml")]);
    let err = bnd_clr::run(&config, None).unwrap_err();
    assert!(format!("{err:#}").contains("nowhere.toml"), "{err:#}");
    assert!(!dir.path().join("out.toml").exists());
}
