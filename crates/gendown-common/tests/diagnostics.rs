use super::*;

#[test]
fn test_format_message_substitutes_positional_args() {
    assert_eq!(
        format_message("Parameter '{0}' of '{1}'", &["x", "f"]),
        "Parameter 'x' of 'f'"
    );
    assert_eq!(format_message("no args", &[]), "no args");
}

#[test]
fn test_from_message_copies_code_and_category() {
    let diag = Diagnostic::from_message(
        "a.ts",
        3,
        5,
        &diagnostic_messages::PARAMETER_DEFAULTS_NOT_SUPPORTED_IN_GENERATOR_LOWERING,
        &["x"],
    );
    assert_eq!(diag.category, DiagnosticCategory::Error);
    assert_eq!(
        diag.code,
        diagnostic_codes::PARAMETER_DEFAULTS_NOT_SUPPORTED_IN_GENERATOR_LOWERING
    );
    assert_eq!(diag.file, "a.ts");
    assert_eq!((diag.start, diag.length), (3, 5));
    assert!(diag.message_text.contains("'x'"));
}

#[test]
fn test_get_message_template() {
    assert_eq!(
        get_message_template(diagnostic_codes::YIELD_DELEGATE_REQUIRES_OPERAND),
        Some("'yield*' requires an operand.")
    );
    assert_eq!(get_message_template(1), None);
}

#[test]
fn test_diagnostic_serializes_to_json() {
    let diag = Diagnostic::error("main.ts", 0, 1, "boom", 42);
    let json = serde_json::to_string(&diag).expect("serialize diagnostic");
    assert!(json.contains("\"code\":42"));
    let back: Diagnostic = serde_json::from_str(&json).expect("deserialize diagnostic");
    assert_eq!(back, diag);
}
