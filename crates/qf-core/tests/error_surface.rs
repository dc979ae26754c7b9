use qf_core::errors::{ErrorInfo, QfError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("axis", 3)
        .with_context("symbol", "wheat")
}

#[test]
fn engine_error_surface() {
    let err = QfError::Engine(sample_info("axis-measured", "axis already collapsed"));
    assert_eq!(err.code(), "axis-measured");
    assert_eq!(err.info().context.get("axis").map(String::as_str), Some("3"));
}

#[test]
fn display_includes_context_and_hint() {
    let err = QfError::Register(
        sample_info("symbol-registered", "symbol already mapped").with_hint("pick another label"),
    );
    let rendered = err.to_string();
    assert!(rendered.starts_with("register error: symbol already mapped"));
    assert!(rendered.contains("axis=3"));
    assert!(rendered.contains("symbol=wheat"));
    assert!(rendered.contains("hint: pick another label"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = QfError::faction("closure-violation", "endpoint outside signature");
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["family"], "Faction");
    assert_eq!(json["detail"]["code"], "closure-violation");
    let decoded: QfError = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, err);
}
