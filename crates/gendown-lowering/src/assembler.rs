//! Function/Statement-List Assembler
//!
//! Wraps a lowered body into the function shape the surrounding compiler
//! asked for.
//!
//! ```javascript
//! // generator
//! function f(a) {
//!     var _a;
//!     function hoisted() { }
//!     return __generator(function (_state) {
//!         switch (_state.label) { ... }
//!     });
//! }
//!
//! // async
//! function g() {
//!     return new Promise(function (_resolve) {
//!         _resolve(__awaiter(__generator(function (_state) { ... })));
//!     });
//! }
//! ```

use crate::error::LoweringError;
use crate::generator::{CodeGenerator, GeneratorKind};
use crate::ir::{IRMethodName, IRNode, IRParam};
use crate::options::helpers;
use std::fmt;

/// Syntactic shape of the function produced by [`CodeGenerator::build_function`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FunctionShape {
    /// `function name(params) { ... }`; requires a name
    FunctionDeclaration,
    /// `function (params) { ... }` or `function name(params) { ... }`
    FunctionExpression,
    /// `name(params) { ... }`; requires a name
    Method,
    /// `get name() { ... }`; requires a name
    GetAccessor,
    /// `(params) => { ... }`; must be anonymous
    ArrowFunction,
}

impl fmt::Display for FunctionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FunctionDeclaration => "function declaration",
            Self::FunctionExpression => "function expression",
            Self::Method => "method",
            Self::GetAccessor => "get accessor",
            Self::ArrowFunction => "arrow function",
        })
    }
}

impl FunctionShape {
    fn check_name(self, name: Option<&str>) -> Result<(), LoweringError> {
        match (self, name) {
            (Self::ArrowFunction, Some(_)) => Err(LoweringError::NamedAnonymousFunction(self)),
            (Self::FunctionDeclaration | Self::Method | Self::GetAccessor, None) => {
                Err(LoweringError::MissingFunctionName(self))
            }
            _ => Ok(()),
        }
    }

    fn assemble(self, name: Option<String>, parameters: Vec<IRParam>, body: Vec<IRNode>) -> IRNode {
        match (self, name) {
            (Self::FunctionDeclaration, Some(name)) => IRNode::FunctionDecl {
                name,
                parameters,
                body,
            },
            (Self::Method, Some(name)) => IRNode::MethodDecl {
                name: IRMethodName::Identifier(name),
                parameters,
                body,
            },
            (Self::GetAccessor, Some(name)) => IRNode::GetAccessor {
                name: IRMethodName::Identifier(name),
                body,
            },
            (Self::ArrowFunction, _) => IRNode::ArrowFunction { parameters, body },
            (_, name) => IRNode::func_expr(name, parameters, body),
        }
    }
}

impl CodeGenerator<'_> {
    /// Assemble the lowered function.
    ///
    /// The outer body is, in order: the hoisted `var` list, the hoisted
    /// function declarations, and the `return` of the driven state machine.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn build_function(
        &mut self,
        shape: FunctionShape,
        name: Option<String>,
    ) -> Result<IRNode, LoweringError> {
        self.require_function_mode("build_function")?;
        shape.check_name(name.as_deref())?;

        let lowered = self.build_statements(true)?;
        let state = self.state_name();

        let mut statements = Vec::new();
        let variables = self.variables();
        if !variables.is_empty() {
            statements.push(IRNode::VarDeclList(
                variables
                    .iter()
                    .map(|variable| IRNode::var_decl(variable.as_str(), None))
                    .collect(),
            ));
        }
        statements.extend(self.functions.iter().cloned());

        // __generator(function (_state) { ... })
        let body_function = IRNode::func_expr(None, vec![IRParam::new(state)], lowered.statements);
        let generator = IRNode::call(IRNode::id(helpers::GENERATOR), vec![body_function]);

        let result = match self.kind().clone() {
            GeneratorKind::Async {
                promise_constructor,
            } => {
                let preferred = self.options().resolve_name.clone();
                let resolve = self.create_unique_identifier(Some(&preferred), false);
                let awaiter = IRNode::call(IRNode::id(helpers::AWAITER), vec![generator]);
                let executor = IRNode::func_expr(
                    None,
                    vec![IRParam::new(resolve.as_str())],
                    vec![IRNode::expr_stmt(IRNode::call(IRNode::id(resolve), vec![awaiter]))],
                );
                IRNode::new_expr(promise_constructor, vec![executor])
            }
            GeneratorKind::Generator | GeneratorKind::Statements => generator,
        };
        statements.push(IRNode::ret(Some(result)));

        tracing::debug!(
            %shape,
            name = name.as_deref().unwrap_or("<anonymous>"),
            cases = lowered.case_count,
            "assembled lowered function"
        );
        Ok(shape.assemble(name, self.parameters.clone(), statements))
    }
}

#[cfg(test)]
#[path = "../tests/assembler.rs"]
mod tests;
