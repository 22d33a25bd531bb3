use super::*;
use crate::ir_printer::IRPrinter;
use crate::locals::{GlobalNames, Locals, ScopeId};
use crate::operations::Operation;
use crate::options::LoweringOptions;
use gendown_common::{Span, diagnostic_codes};

fn nothing_bound(_: ScopeId, _: &str) -> bool {
    false
}

fn locals() -> Locals<'static> {
    gendown_common::tracing_config::init_tracing();
    Locals::new(&nothing_bound, ScopeId(0), GlobalNames::new())
}

#[test]
fn test_shape_display() {
    assert_eq!(FunctionShape::GetAccessor.to_string(), "get accessor");
    assert_eq!(FunctionShape::ArrowFunction.to_string(), "arrow function");
}

#[test]
fn test_generator_function_layout() {
    let mut g = CodeGenerator::generator_function(locals(), LoweringOptions::default());
    g.add_parameter(IRParam::new("a")).unwrap();
    g.add_function(IRNode::func_decl("helper", vec![], vec![]))
        .unwrap();
    let temp = g.declare_local(None, false);
    g.emit(Operation::Assign {
        target: IRNode::id(temp.as_str()),
        value: IRNode::id("a"),
    })
    .unwrap();
    g.emit(Operation::Yield(Some(IRNode::id(temp)))).unwrap();

    let function = g
        .build_function(FunctionShape::FunctionDeclaration, Some("f".to_string()))
        .unwrap();
    assert_eq!(
        IRPrinter::emit_to_string(&function),
        "function f(a) {
    var _a;
    function helper() { }
    return __generator(function (_state) {
        switch (_state.label) {
            case 0:
                _a = a;
                return [4 /*yield*/, _a];
            case 1: return [2 /*return*/];
        }
    });
}"
    );
}

#[test]
fn test_async_function_layout() {
    let mut g = CodeGenerator::async_function(
        locals(),
        LoweringOptions::default(),
        IRNode::id("Promise"),
    );
    g.emit(Operation::Return(Some(IRNode::id("x")))).unwrap();

    let function = g
        .build_function(FunctionShape::FunctionDeclaration, Some("g".to_string()))
        .unwrap();
    assert_eq!(
        IRPrinter::emit_to_string(&function),
        "function g() {
    return new Promise(function (_resolve) {
        _resolve(__awaiter(__generator(function (_state) {
            return [2 /*return*/, x];
        })));
    });
}"
    );
}

#[test]
fn test_custom_state_and_resolve_names() {
    let options = LoweringOptions {
        state_name: "s".to_string(),
        resolve_name: "done".to_string(),
        ..LoweringOptions::default()
    };
    let mut g = CodeGenerator::async_function(locals(), options, IRNode::prop(IRNode::id("lib"), "P"));
    g.emit(Operation::Yield(None)).unwrap();

    let out = IRPrinter::emit_to_string(
        &g.build_function(FunctionShape::FunctionExpression, None)
            .unwrap(),
    );
    assert!(out.starts_with("function () {"), "{out}");
    assert!(out.contains("new lib.P(function (done) {"), "{out}");
    assert!(out.contains("done(__awaiter(__generator(function (s) {"), "{out}");
    assert!(out.contains("switch (s.label) {"), "{out}");
}

#[test]
fn test_parameter_default_is_dropped_and_reported() {
    let mut g = CodeGenerator::generator_function(locals(), LoweringOptions::default());
    g.write_location(Span::new(5, 10));
    g.add_parameter(IRParam::new("b").with_default(IRNode::number("1")))
        .unwrap();

    let diagnostics = g.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].code,
        diagnostic_codes::PARAMETER_DEFAULTS_NOT_SUPPORTED_IN_GENERATOR_LOWERING
    );
    assert_eq!((diagnostics[0].start, diagnostics[0].length), (5, 5));

    let out = IRPrinter::emit_to_string(
        &g.build_function(FunctionShape::FunctionDeclaration, Some("f".to_string()))
            .unwrap(),
    );
    assert!(out.starts_with("function f(b) {\n    return __generator("), "{out}");
    assert!(!out.contains("void 0"), "{out}");
}

#[test]
fn test_method_and_accessor_shapes() {
    let mut g = CodeGenerator::generator_function(locals(), LoweringOptions::default());
    g.emit(Operation::Yield(None)).unwrap();
    let method = g
        .build_function(FunctionShape::Method, Some("next".to_string()))
        .unwrap();
    assert!(matches!(method, IRNode::MethodDecl { .. }));
    assert!(IRPrinter::emit_to_string(&method).starts_with("next() {"));

    let mut g = CodeGenerator::generator_function(locals(), LoweringOptions::default());
    g.emit(Operation::Return(None)).unwrap();
    let accessor = g
        .build_function(FunctionShape::GetAccessor, Some("value".to_string()))
        .unwrap();
    assert!(IRPrinter::emit_to_string(&accessor).starts_with("get value() {"));
}

#[test]
fn test_arrow_function_shape() {
    let mut g = CodeGenerator::generator_function(locals(), LoweringOptions::default());
    g.add_parameter(IRParam::rest("args")).unwrap();
    g.emit(Operation::Return(None)).unwrap();
    let arrow = g.build_function(FunctionShape::ArrowFunction, None).unwrap();
    assert_eq!(
        IRPrinter::emit_to_string(&arrow),
        "(...args) => {
    return __generator(function (_state) {
        return [2 /*return*/];
    });
}"
    );
}

#[test]
fn test_name_requirements() {
    let mut g = CodeGenerator::generator_function(locals(), LoweringOptions::default());
    assert_eq!(
        g.build_function(FunctionShape::ArrowFunction, Some("f".to_string())),
        Err(LoweringError::NamedAnonymousFunction(FunctionShape::ArrowFunction))
    );
    for shape in [
        FunctionShape::FunctionDeclaration,
        FunctionShape::Method,
        FunctionShape::GetAccessor,
    ] {
        assert_eq!(
            g.build_function(shape, None),
            Err(LoweringError::MissingFunctionName(shape))
        );
    }
}

#[test]
fn test_statement_generator_cannot_build_a_function() {
    let mut g = CodeGenerator::statements(locals(), LoweringOptions::default());
    assert_eq!(
        g.build_function(FunctionShape::FunctionExpression, None),
        Err(LoweringError::FunctionModeRequired {
            operation: "build_function"
        })
    );
    assert!(g.add_parameter(IRParam::new("a")).is_err());
    assert!(g.add_function(IRNode::func_decl("h", vec![], vec![])).is_err());
}

#[test]
fn test_unclosed_region_fails_assembly() {
    let mut g = CodeGenerator::generator_function(locals(), LoweringOptions::default());
    g.begin_with_block("_a").unwrap();
    assert_eq!(
        g.build_function(FunctionShape::FunctionExpression, None),
        Err(LoweringError::UnclosedRegions(1))
    );
}
