//! Integration tests for sessions and program images

use std::fs;
use std::path::PathBuf;

use icvm_engine::MachineConfig;
use icvm_foundation::{ErrorKind, FaultKind, Value};
use icvm_runtime::image::{self, IMAGE_VERSION};
use icvm_runtime::{ProgramImage, Session, SessionOptions, parse_params, parse_value};

const AREA: &str = "
main:
    arg 6
    arg 7
    r := call @area
    ret r
area:
    a := w * h
    ret a
";

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("icvm-{}-{name}", std::process::id()))
}

fn area_options() -> SessionOptions {
    SessionOptions::new().with_params("area", ["w", "h"])
}

#[test]
fn session_runs_with_declared_params() {
    let session = Session::from_source("area.ic", AREA, area_options()).expect("load failed");
    assert_eq!(session.name(), "area.ic");
    assert_eq!(
        session.run(MachineConfig::default()).expect("run failed"),
        Some(Value::Int(42))
    );
}

#[test]
fn session_without_params_faults_on_arity() {
    let session = Session::from_source("area.ic", AREA, SessionOptions::new()).expect("load failed");
    let err = session.run(MachineConfig::default()).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::Fault(fault) if matches!(fault.kind, FaultKind::Arity { expected: 0, actual: 2, .. })
    ));
}

#[test]
fn declared_params_need_a_label() {
    let options = SessionOptions::new().with_params("volume", ["w"]);
    let err = Session::from_source("area.ic", AREA, options).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidArgument(_)));
}

#[test]
fn build_errors_carry_location() {
    let err = Session::from_source("bad.ic", "x := 1\ngoto nowhere", SessionOptions::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Build(_)));
    let context = err.context.expect("context attached");
    assert_eq!(context.source.as_deref(), Some("bad.ic"));
    assert_eq!(context.line, Some(2));
}

#[test]
fn prelude_calls_resolve_only_when_enabled() {
    let source = "arg 'four'\nn := call @strlen\nret n";
    assert!(Session::from_source("p.ic", source, SessionOptions::new()).is_err());

    let session = Session::from_source("p.ic", source, SessionOptions::new().with_prelude())
        .expect("load failed");
    assert_eq!(
        session.run(MachineConfig::default()).expect("run failed"),
        Some(Value::Int(4))
    );
}

#[test]
fn entry_and_args_from_host() {
    let session = Session::from_source("area.ic", AREA, area_options()).expect("load failed");
    let config = MachineConfig::new()
        .with_entry("@area")
        .with_args([parse_value("3").expect("int"), parse_value("5").expect("int")]);
    assert_eq!(session.run(config).expect("run failed"), Some(Value::Int(15)));
}

#[test]
fn cli_style_param_declarations() {
    let (function, params) = parse_params("area=w,h").expect("valid declaration");
    let options = SessionOptions {
        params: vec![(function, params)],
        prelude: false,
    };
    let session = Session::from_source("area.ic", AREA, options).expect("load failed");
    assert_eq!(session.params().len(), 1);
    assert_eq!(
        session.run(MachineConfig::default()).expect("run failed"),
        Some(Value::Int(42))
    );
}

// =============================================================================
// Images
// =============================================================================

#[test]
fn image_keeps_params() {
    let session = Session::from_source("area.ic", AREA, area_options()).expect("load failed");
    let image = session.to_image();
    assert_eq!(image.version, IMAGE_VERSION);

    let bytes = image::to_bytes(&image).expect("serialize failed");
    let restored = image::from_bytes(&bytes).expect("deserialize failed");
    assert_eq!(restored, image);

    let reloaded =
        Session::from_image("area.icb", restored, SessionOptions::new()).expect("load failed");
    assert_eq!(reloaded.program(), session.program());
    assert_eq!(
        reloaded.run(MachineConfig::default()).expect("run failed"),
        Some(Value::Int(42))
    );
}

#[test]
fn image_version_is_checked() {
    let session = Session::from_source("area.ic", AREA, area_options()).expect("load failed");
    let mut image = session.to_image();
    image.version = IMAGE_VERSION + 1;
    let bytes = image::to_bytes(&image).expect("serialize failed");
    assert!(matches!(
        image::from_bytes(&bytes).unwrap_err().kind,
        ErrorKind::Serialization(_)
    ));
}

#[test]
fn garbage_is_not_an_image() {
    assert!(image::from_bytes(b"not an image").is_err());
}

#[test]
fn load_dispatches_on_extension() {
    let text = temp_path("area.ic");
    let binary = temp_path("area.icb");
    fs::write(&text, AREA).expect("write failed");

    let from_text = Session::load(&text, area_options()).expect("load failed");
    image::save_to_file(&from_text.to_image(), &binary).expect("save failed");
    let from_image = Session::load(&binary, SessionOptions::new()).expect("load failed");

    assert_eq!(from_image.program(), from_text.program());
    assert_eq!(from_image.params(), from_text.params());
    assert_eq!(
        from_image.run(MachineConfig::default()).expect("run failed"),
        Some(Value::Int(42))
    );

    let _ = fs::remove_file(text);
    let _ = fs::remove_file(binary);
}

#[test]
fn missing_file_is_io_error() {
    let err = Session::load(&temp_path("missing.ic"), SessionOptions::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Io(_)));
}

#[test]
fn image_of_unparameterized_program() {
    let image = ProgramImage::new(
        Session::from_source("t.ic", "ret 1", SessionOptions::new())
            .expect("load failed")
            .program()
            .clone(),
    );
    assert!(image.params.is_empty());
}
