//! IR Printer - Emits IR nodes to JavaScript strings
//!
//! Renders the lowered tree as ES5 JavaScript. Formatting follows the usual
//! downlevel output: four-space indentation, one statement per line, and
//! single-statement `case` clauses kept on the `case` line.
//!
//! Every [`IRNode::Located`] node records a [`SourceMapping`] from the
//! generated line/column to the source span it was lowered from.

use crate::ir::{IRMethodName, IRNode, IRParam, IRProperty, IRPropertyKey, IRSwitchCase};
use gendown_common::Span;

/// Generated position of a node that carries a source span.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SourceMapping {
    /// 0-based
    pub generated_line: u32,
    /// 0-based, in UTF-16 code units
    pub generated_column: u32,
    pub span: Span,
}

/// Printer for IR nodes
#[derive(Debug, Default)]
pub struct IRPrinter {
    output: String,
    indent_level: u32,
    line: u32,
    column: u32,
    mappings: Vec<SourceMapping>,
}

impl IRPrinter {
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(1024),
            ..Self::default()
        }
    }

    /// Render `node` with a fresh printer.
    pub fn emit_to_string(node: &IRNode) -> String {
        let mut printer = Self::new();
        printer.emit(node);
        printer.output
    }

    /// Render a statement list, one statement per line.
    pub fn emit_statements_to_string(statements: &[IRNode]) -> String {
        let mut printer = Self::new();
        printer.emit_statement_list(statements);
        printer.output
    }

    pub fn set_indent_level(&mut self, level: u32) {
        self.indent_level = level;
    }

    pub fn emit(&mut self, node: &IRNode) {
        self.emit_node(node);
    }

    pub fn get_output(&self) -> &str {
        &self.output
    }

    pub fn take_mappings(&mut self) -> Vec<SourceMapping> {
        std::mem::take(&mut self.mappings)
    }

    /// Emit statements, each on its own indented line.
    pub fn emit_statement_list(&mut self, statements: &[IRNode]) {
        for (i, stmt) in statements.iter().enumerate() {
            if i > 0 {
                self.write_line();
            }
            self.write_indent();
            self.emit_node(stmt);
        }
    }

    fn emit_node(&mut self, node: &IRNode) {
        match node {
            // Literals
            IRNode::NumericLiteral(n) => self.write(n),
            IRNode::StringLiteral(s) => self.emit_string_literal(s),
            IRNode::BooleanLiteral(b) => self.write(if *b { "true" } else { "false" }),
            IRNode::NullLiteral => self.write("null"),
            IRNode::Undefined => self.write("void 0"),

            // Identifiers
            IRNode::Identifier(name) => self.write(name),

            // Expressions
            IRNode::BinaryExpr {
                left,
                operator,
                right,
            } => {
                self.emit_node(left);
                self.write(" ");
                self.write(operator);
                self.write(" ");
                self.emit_node(right);
            }
            IRNode::PrefixUnaryExpr { operator, operand } => {
                self.write(operator);
                if operator.chars().all(|c| c.is_ascii_alphabetic()) {
                    self.write(" ");
                }
                self.emit_node(operand);
            }
            IRNode::CallExpr { callee, arguments } => {
                if matches!(callee.unlocated(), IRNode::FunctionExpr { .. }) {
                    self.write("(");
                    self.emit_node(callee);
                    self.write(")");
                } else {
                    self.emit_node(callee);
                }
                self.write("(");
                self.emit_comma_separated(arguments);
                self.write(")");
            }
            IRNode::NewExpr { callee, arguments } => {
                self.write("new ");
                self.emit_node(callee);
                self.write("(");
                self.emit_comma_separated(arguments);
                self.write(")");
            }
            IRNode::PropertyAccess { object, property } => {
                self.emit_node(object);
                self.write(".");
                self.write(property);
            }
            IRNode::ElementAccess { object, index } => {
                self.emit_node(object);
                self.write("[");
                self.emit_node(index);
                self.write("]");
            }
            IRNode::ConditionalExpr {
                condition,
                when_true,
                when_false,
            } => {
                self.emit_node(condition);
                self.write(" ? ");
                self.emit_node(when_true);
                self.write(" : ");
                self.emit_node(when_false);
            }
            IRNode::Parenthesized(inner) => {
                self.write("(");
                self.emit_node(inner);
                self.write(")");
            }
            IRNode::ArrayLiteral(elements) => {
                self.write("[");
                self.emit_comma_separated(elements);
                // A trailing hole needs its own comma to count as an element.
                if matches!(elements.last().map(IRNode::unlocated), Some(IRNode::OmittedExpression)) {
                    self.write(",");
                }
                self.write("]");
            }
            IRNode::OmittedExpression => {}
            IRNode::ObjectLiteral(properties) => self.emit_object_literal(properties),
            IRNode::FunctionExpr {
                name,
                parameters,
                body,
            } => {
                self.write("function ");
                if let Some(name) = name {
                    self.write(name);
                }
                self.write("(");
                self.emit_parameters(parameters);
                self.write(") ");
                self.emit_function_body(parameters, body);
            }
            IRNode::ArrowFunction { parameters, body } => {
                self.write("(");
                self.emit_parameters(parameters);
                self.write(") => ");
                self.emit_function_body(parameters, body);
            }

            // Statements
            IRNode::VarDecl { .. } | IRNode::VarDeclList(_) => {
                self.emit_var_declarations(node);
                self.write(";");
            }
            IRNode::ExpressionStatement(expr) => {
                let needs_parens = matches!(
                    expr.unlocated(),
                    IRNode::FunctionExpr { .. } | IRNode::ObjectLiteral(_)
                );
                if needs_parens {
                    self.write("(");
                }
                self.emit_node(expr);
                if needs_parens {
                    self.write(")");
                }
                self.write(";");
            }
            IRNode::ReturnStatement(expr) => {
                self.write("return");
                if let Some(expr) = expr {
                    self.write(" ");
                    self.emit_node(expr);
                }
                self.write(";");
            }
            IRNode::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => {
                self.write("if (");
                self.emit_node(condition);
                self.write(") ");
                self.emit_node(then_branch);
                if let Some(else_branch) = else_branch {
                    if matches!(then_branch.unlocated(), IRNode::Block(_)) {
                        self.write(" else ");
                    } else {
                        self.write_line();
                        self.write_indent();
                        self.write("else ");
                    }
                    self.emit_node(else_branch);
                }
            }
            IRNode::Block(stmts) => self.emit_block(stmts),
            IRNode::EmptyStatement => self.write(";"),
            IRNode::SwitchStatement { expression, cases } => {
                self.write("switch (");
                self.emit_node(expression);
                self.write(") {");
                self.increase_indent();
                for case in cases {
                    self.write_line();
                    self.write_indent();
                    self.emit_case(case);
                }
                self.decrease_indent();
                self.write_line();
                self.write_indent();
                self.write("}");
            }
            IRNode::ForStatement {
                initializer,
                condition,
                incrementor,
                body,
            } => {
                self.write("for (");
                if let Some(init) = initializer {
                    match init.unlocated() {
                        IRNode::VarDecl { .. } | IRNode::VarDeclList(_) => {
                            self.emit_var_declarations(init.unlocated());
                        }
                        _ => self.emit_node(init),
                    }
                }
                self.write(";");
                if let Some(cond) = condition {
                    self.write(" ");
                    self.emit_node(cond);
                }
                self.write(";");
                if let Some(incr) = incrementor {
                    self.write(" ");
                    self.emit_node(incr);
                }
                self.write(") ");
                self.emit_node(body);
            }
            IRNode::WhileStatement { condition, body } => {
                self.write("while (");
                self.emit_node(condition);
                self.write(") ");
                self.emit_node(body);
            }
            IRNode::WithStatement { object, body } => {
                self.write("with (");
                self.emit_node(object);
                self.write(") ");
                self.emit_node(body);
            }
            IRNode::ThrowStatement(expr) => {
                self.write("throw ");
                self.emit_node(expr);
                self.write(";");
            }
            IRNode::BreakStatement(label) => {
                self.write("break");
                if let Some(label) = label {
                    self.write(" ");
                    self.write(label);
                }
                self.write(";");
            }
            IRNode::ContinueStatement(label) => {
                self.write("continue");
                if let Some(label) = label {
                    self.write(" ");
                    self.write(label);
                }
                self.write(";");
            }
            IRNode::LabeledStatement { label, statement } => {
                self.write(label);
                self.write(": ");
                self.emit_node(statement);
            }

            // Declarations
            IRNode::FunctionDecl {
                name,
                parameters,
                body,
            } => {
                self.write("function ");
                self.write(name);
                self.write("(");
                self.emit_parameters(parameters);
                self.write(") ");
                self.emit_function_body(parameters, body);
            }
            IRNode::MethodDecl {
                name,
                parameters,
                body,
            } => {
                self.emit_method_name(name);
                self.write("(");
                self.emit_parameters(parameters);
                self.write(") ");
                self.emit_function_body(parameters, body);
            }
            IRNode::GetAccessor { name, body } => {
                self.write("get ");
                self.emit_method_name(name);
                self.write("() ");
                self.emit_function_body(&[], body);
            }

            // Generator state machine
            IRNode::GeneratorOp {
                opcode,
                value,
                comment,
            } => {
                self.write("[");
                self.write(&opcode.to_string());
                if let Some(comment) = comment {
                    self.write(" /*");
                    self.write(comment);
                    self.write("*/");
                }
                if let Some(value) = value {
                    self.write(", ");
                    self.emit_node(value);
                }
                self.write("]");
            }
            IRNode::GeneratedLabel(label) => self.write(&label.to_string()),

            IRNode::Located { node, span } => {
                self.mappings.push(SourceMapping {
                    generated_line: self.line,
                    generated_column: self.column,
                    span: *span,
                });
                self.emit_node(node);
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn emit_comma_separated(&mut self, nodes: &[IRNode]) {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.emit_node(node);
        }
    }

    fn emit_string_literal(&mut self, s: &str) {
        let mut escaped = String::with_capacity(s.len() + 2);
        escaped.push('"');
        for ch in s.chars() {
            match ch {
                '"' => escaped.push_str("\\\""),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                '\u{2028}' => escaped.push_str("\\u2028"),
                '\u{2029}' => escaped.push_str("\\u2029"),
                c => escaped.push(c),
            }
        }
        escaped.push('"');
        self.write(&escaped);
    }

    /// `var a, b = 1` without the trailing semicolon.
    fn emit_var_declarations(&mut self, node: &IRNode) {
        self.write("var ");
        match node {
            IRNode::VarDeclList(decls) => {
                for (i, decl) in decls.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.emit_var_binding(decl.unlocated());
                }
            }
            other => self.emit_var_binding(other),
        }
    }

    fn emit_var_binding(&mut self, decl: &IRNode) {
        match decl {
            IRNode::VarDecl { name, initializer } => {
                self.write(name);
                if let Some(init) = initializer {
                    self.write(" = ");
                    self.emit_node(init);
                }
            }
            other => self.emit_node(other),
        }
    }

    fn emit_block(&mut self, stmts: &[IRNode]) {
        if stmts.is_empty() {
            self.write("{ }");
            return;
        }
        self.write("{");
        self.increase_indent();
        for stmt in stmts {
            self.write_line();
            self.write_indent();
            self.emit_node(stmt);
        }
        self.decrease_indent();
        self.write_line();
        self.write_indent();
        self.write("}");
    }

    fn emit_case(&mut self, case: &IRSwitchCase) {
        match &case.test {
            Some(test) => {
                self.write("case ");
                self.emit_node(test);
                self.write(":");
            }
            None => self.write("default:"),
        }

        if let [single] = case.statements.as_slice()
            && matches!(
                single.unlocated(),
                IRNode::ReturnStatement(_) | IRNode::ThrowStatement(_) | IRNode::ExpressionStatement(_)
            )
        {
            self.write(" ");
            self.emit_node(single);
            return;
        }

        self.increase_indent();
        for stmt in &case.statements {
            self.write_line();
            self.write_indent();
            self.emit_node(stmt);
        }
        self.decrease_indent();
    }

    fn emit_parameters(&mut self, params: &[IRParam]) {
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            if param.rest {
                self.write("...");
            }
            self.write(&param.name);
        }
    }

    /// Function body with default parameter checks prepended (ES5 style):
    /// `if (x === void 0) { x = default; }`
    fn emit_function_body(&mut self, params: &[IRParam], body: &[IRNode]) {
        let has_defaults = params.iter().any(|p| p.default_value.is_some());
        if !has_defaults && body.is_empty() {
            self.write("{ }");
            return;
        }

        self.write("{");
        self.increase_indent();
        for param in params {
            if let Some(default) = &param.default_value {
                self.write_line();
                self.write_indent();
                self.write("if (");
                self.write(&param.name);
                self.write(" === void 0) { ");
                self.write(&param.name);
                self.write(" = ");
                self.emit_node(default);
                self.write("; }");
            }
        }
        for stmt in body {
            self.write_line();
            self.write_indent();
            self.emit_node(stmt);
        }
        self.decrease_indent();
        self.write_line();
        self.write_indent();
        self.write("}");
    }

    fn emit_method_name(&mut self, name: &IRMethodName) {
        match name {
            IRMethodName::Identifier(name) => self.write(name),
            IRMethodName::StringLiteral(name) => self.emit_string_literal(name),
        }
    }

    fn emit_object_literal(&mut self, properties: &[IRProperty]) {
        if properties.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{ ");
        for (i, prop) in properties.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            match &prop.key {
                IRPropertyKey::Identifier(name) => self.write(name),
                IRPropertyKey::StringLiteral(name) => self.emit_string_literal(name),
            }
            self.write(": ");
            self.emit_node(&prop.value);
        }
        self.write(" }");
    }

    // =========================================================================
    // Output
    // =========================================================================

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
        self.advance_position(s);
    }

    fn write_line(&mut self) {
        self.output.push('\n');
        self.line += 1;
        self.column = 0;
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.output.push_str("    ");
        }
        self.column += self.indent_level * 4;
    }

    const fn increase_indent(&mut self) {
        self.indent_level += 1;
    }

    const fn decrease_indent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn advance_position(&mut self, text: &str) {
        let bytes = text.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            match memchr::memchr(b'\n', &bytes[i..]) {
                Some(offset) => {
                    self.line += 1;
                    self.column = 0;
                    i += offset + 1;
                }
                None => {
                    let segment = &text[i..];
                    if segment.is_ascii() {
                        self.column += segment.len() as u32;
                    } else {
                        self.column += segment.chars().map(|c| c.len_utf16() as u32).sum::<u32>();
                    }
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/ir_printer.rs"]
mod tests;
