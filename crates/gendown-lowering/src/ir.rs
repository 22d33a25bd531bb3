//! Lowered IR (Intermediate Representation) for generator lowering
//!
//! This module defines the tree-structured IR that the lowering consumes from
//! the desugaring driver and produces as its result. The driver hands in
//! expressions and statements as `IRNode`s; the lowering hands back a function
//! (or statement list) whose body is a state machine built from the same nodes.
//!
//! # IR Structure
//!
//! The IR is a tree of `IRNode` variants. Each variant represents a JavaScript
//! construct (expression, statement, declaration) that can be emitted by the
//! [`IRPrinter`](crate::ir_printer::IRPrinter). Two variants exist only for the
//! state machine:
//!
//! - [`IRNode::GeneratorOp`]: an instruction tuple `[4 /*yield*/, value]`
//!   returned to the runtime dispatcher
//! - [`IRNode::GeneratedLabel`]: a reference to a [`Label`] that is rewritten
//!   to the numeric case it resolves to once the body is finalized

use crate::labels::Label;
use gendown_common::Span;

/// Intermediate Representation node for transformed JavaScript
#[derive(Debug, Clone, PartialEq)]
pub enum IRNode {
    // =========================================================================
    // Literals
    // =========================================================================
    /// Numeric literal: `42`, `3.14`
    NumericLiteral(String),

    /// String literal: `"hello"`, `'world'`
    StringLiteral(String),

    /// Boolean literal: `true`, `false`
    BooleanLiteral(bool),

    /// Null literal: `null`
    NullLiteral,

    /// Undefined: `void 0`
    Undefined,

    // =========================================================================
    // Identifiers
    // =========================================================================
    /// Identifier: `foo`, `_bar`
    Identifier(String),

    // =========================================================================
    // Expressions
    // =========================================================================
    /// Binary expression: `left op right`
    BinaryExpr {
        left: Box<Self>,
        operator: String,
        right: Box<Self>,
    },

    /// Unary prefix expression: `!x`, `-x`, `++x`
    PrefixUnaryExpr {
        operator: String,
        operand: Box<Self>,
    },

    /// Call expression: `callee(args)`
    CallExpr {
        callee: Box<Self>,
        arguments: Vec<Self>,
    },

    /// New expression: `new Callee(args)`
    NewExpr {
        callee: Box<Self>,
        arguments: Vec<Self>,
    },

    /// Property access: `object.property`
    PropertyAccess { object: Box<Self>, property: String },

    /// Element access: `object[index]`
    ElementAccess { object: Box<Self>, index: Box<Self> },

    /// Conditional expression: `cond ? then : else`
    ConditionalExpr {
        condition: Box<Self>,
        when_true: Box<Self>,
        when_false: Box<Self>,
    },

    /// Parenthesized expression: `(expr)`
    Parenthesized(Box<Self>),

    /// Array literal: `[a, b, c]`
    ArrayLiteral(Vec<Self>),

    /// Hole in an array literal: the middle element of `[a, , c]`
    OmittedExpression,

    /// Object literal: `{ key: value, ... }`
    ObjectLiteral(Vec<IRProperty>),

    /// Function expression: `function name(params) { body }`
    FunctionExpr {
        name: Option<String>,
        parameters: Vec<IRParam>,
        body: Vec<Self>,
    },

    /// Arrow function with a block body: `(params) => { body }`
    ArrowFunction {
        parameters: Vec<IRParam>,
        body: Vec<Self>,
    },

    // =========================================================================
    // Statements
    // =========================================================================
    /// Variable declaration: `var x = value;`
    VarDecl {
        name: String,
        initializer: Option<Box<Self>>,
    },

    /// Multiple variable declarations: `var a = 1, b = 2;`
    VarDeclList(Vec<Self>),

    /// Expression statement: `expr;`
    ExpressionStatement(Box<Self>),

    /// Return statement: `return expr;`
    ReturnStatement(Option<Box<Self>>),

    /// If statement: `if (cond) { then } else { else }`
    IfStatement {
        condition: Box<Self>,
        then_branch: Box<Self>,
        else_branch: Option<Box<Self>>,
    },

    /// Block statement: `{ statements }`
    Block(Vec<Self>),

    /// Empty statement: `;`
    EmptyStatement,

    /// Switch statement
    SwitchStatement {
        expression: Box<Self>,
        cases: Vec<IRSwitchCase>,
    },

    /// For statement: `for (init; cond; incr) { body }`
    ForStatement {
        initializer: Option<Box<Self>>,
        condition: Option<Box<Self>>,
        incrementor: Option<Box<Self>>,
        body: Box<Self>,
    },

    /// While statement: `while (cond) { body }`
    WhileStatement {
        condition: Box<Self>,
        body: Box<Self>,
    },

    /// With statement: `with (object) { body }`
    WithStatement { object: Box<Self>, body: Box<Self> },

    /// Throw statement: `throw expr;`
    ThrowStatement(Box<Self>),

    /// Break statement: `break;` or `break label;`
    BreakStatement(Option<String>),

    /// Continue statement: `continue;` or `continue label;`
    ContinueStatement(Option<String>),

    /// Labeled statement: `label: stmt`
    LabeledStatement { label: String, statement: Box<Self> },

    // =========================================================================
    // Declarations
    // =========================================================================
    /// Function declaration: `function name(params) { body }`
    FunctionDecl {
        name: String,
        parameters: Vec<IRParam>,
        body: Vec<Self>,
    },

    /// Method in a class body or object literal: `name(params) { body }`
    MethodDecl {
        name: IRMethodName,
        parameters: Vec<IRParam>,
        body: Vec<Self>,
    },

    /// Get accessor: `get name() { body }`
    GetAccessor { name: IRMethodName, body: Vec<Self> },

    // =========================================================================
    // Generator State Machine
    // =========================================================================
    /// Instruction tuple returned to the dispatcher: `[opcode /*comment*/, value]`
    GeneratorOp {
        opcode: u32,
        value: Option<Box<Self>>,
        comment: Option<String>,
    },

    /// Reference to a label, replaced by its case number when the body is built
    GeneratedLabel(Label),

    // =========================================================================
    // Source positions
    // =========================================================================
    /// Node carrying the source span it was lowered from
    Located { node: Box<Self>, span: Span },
}

/// Property in an object literal
#[derive(Debug, Clone, PartialEq)]
pub struct IRProperty {
    pub key: IRPropertyKey,
    pub value: IRNode,
}

/// Object property key
#[derive(Debug, Clone, PartialEq)]
pub enum IRPropertyKey {
    Identifier(String),
    StringLiteral(String),
}

/// Method or accessor name
#[derive(Debug, Clone, PartialEq)]
pub enum IRMethodName {
    Identifier(String),
    StringLiteral(String),
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct IRParam {
    pub name: String,
    pub rest: bool,
    pub default_value: Option<Box<IRNode>>,
}

/// Switch case
#[derive(Debug, Clone, PartialEq)]
pub struct IRSwitchCase {
    pub test: Option<IRNode>, // None for default case
    pub statements: Vec<IRNode>,
}

// =========================================================================
// Builder helpers for IR construction
// =========================================================================

impl IRNode {
    /// Create an identifier node
    pub fn id(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// Create a string literal
    pub fn string(s: impl Into<String>) -> Self {
        Self::StringLiteral(s.into())
    }

    /// Create a numeric literal
    pub fn number(n: impl Into<String>) -> Self {
        Self::NumericLiteral(n.into())
    }

    /// Create a call expression
    pub fn call(callee: Self, args: Vec<Self>) -> Self {
        Self::CallExpr {
            callee: Box::new(callee),
            arguments: args,
        }
    }

    /// Create a property access
    pub fn prop(object: Self, property: impl Into<String>) -> Self {
        Self::PropertyAccess {
            object: Box::new(object),
            property: property.into(),
        }
    }

    /// Create an element access
    pub fn elem(object: Self, index: Self) -> Self {
        Self::ElementAccess {
            object: Box::new(object),
            index: Box::new(index),
        }
    }

    /// Create a binary expression
    pub fn binary(left: Self, op: impl Into<String>, right: Self) -> Self {
        Self::BinaryExpr {
            left: Box::new(left),
            operator: op.into(),
            right: Box::new(right),
        }
    }

    /// Create an assignment expression
    pub fn assign(target: Self, value: Self) -> Self {
        Self::BinaryExpr {
            left: Box::new(target),
            operator: "=".to_string(),
            right: Box::new(value),
        }
    }

    /// Create a prefix unary expression
    pub fn prefix(op: impl Into<String>, operand: Self) -> Self {
        Self::PrefixUnaryExpr {
            operator: op.into(),
            operand: Box::new(operand),
        }
    }

    /// Create `!(expr)`
    pub fn not(expr: Self) -> Self {
        Self::prefix("!", expr.paren())
    }

    /// Create a conditional expression
    pub fn conditional(condition: Self, when_true: Self, when_false: Self) -> Self {
        Self::ConditionalExpr {
            condition: Box::new(condition),
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
        }
    }

    /// Create a var declaration
    pub fn var_decl(name: impl Into<String>, init: Option<Self>) -> Self {
        Self::VarDecl {
            name: name.into(),
            initializer: init.map(Box::new),
        }
    }

    /// Create a return statement
    pub fn ret(expr: Option<Self>) -> Self {
        Self::ReturnStatement(expr.map(Box::new))
    }

    /// Create a throw statement
    pub fn throw(expr: Self) -> Self {
        Self::ThrowStatement(Box::new(expr))
    }

    /// Create an if statement without an else branch
    pub fn if_then(condition: Self, then_branch: Self) -> Self {
        Self::IfStatement {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: None,
        }
    }

    /// Create a with statement
    pub fn with_stmt(object: Self, body: Self) -> Self {
        Self::WithStatement {
            object: Box::new(object),
            body: Box::new(body),
        }
    }

    /// Create a switch statement
    pub fn switch(expression: Self, cases: Vec<IRSwitchCase>) -> Self {
        Self::SwitchStatement {
            expression: Box::new(expression),
            cases,
        }
    }

    /// Create a function expression
    pub const fn func_expr(name: Option<String>, params: Vec<IRParam>, body: Vec<Self>) -> Self {
        Self::FunctionExpr {
            name,
            parameters: params,
            body,
        }
    }

    /// Create a function declaration
    pub fn func_decl(name: impl Into<String>, params: Vec<IRParam>, body: Vec<Self>) -> Self {
        Self::FunctionDecl {
            name: name.into(),
            parameters: params,
            body,
        }
    }

    /// Create `void 0`
    pub const fn void_0() -> Self {
        Self::Undefined
    }

    /// Wrap in parentheses
    pub fn paren(self) -> Self {
        Self::Parenthesized(Box::new(self))
    }

    /// Attach a source span
    pub fn located(self, span: Span) -> Self {
        Self::Located {
            node: Box::new(self),
            span,
        }
    }

    /// Create a block
    pub const fn block(stmts: Vec<Self>) -> Self {
        Self::Block(stmts)
    }

    /// Create an expression statement
    pub fn expr_stmt(expr: Self) -> Self {
        Self::ExpressionStatement(Box::new(expr))
    }

    /// Create an array literal
    pub const fn array(elements: Vec<Self>) -> Self {
        Self::ArrayLiteral(elements)
    }

    /// Create an empty array literal
    pub const fn empty_array() -> Self {
        Self::ArrayLiteral(Vec::new())
    }

    /// Create a new expression: `new Constructor(args)`
    pub fn new_expr(callee: Self, args: Vec<Self>) -> Self {
        Self::NewExpr {
            callee: Box::new(callee),
            arguments: args,
        }
    }

    /// Strip any [`IRNode::Located`] wrappers.
    pub fn unlocated(&self) -> &Self {
        match self {
            Self::Located { node, .. } => node.unlocated(),
            other => other,
        }
    }

    /// Whether this node is an expression (as opposed to a statement or
    /// declaration). Bare expressions must be wrapped in an expression
    /// statement before they can appear in a statement list.
    pub fn is_expression(&self) -> bool {
        match self {
            Self::NumericLiteral(_)
            | Self::StringLiteral(_)
            | Self::BooleanLiteral(_)
            | Self::NullLiteral
            | Self::Undefined
            | Self::Identifier(_)
            | Self::BinaryExpr { .. }
            | Self::PrefixUnaryExpr { .. }
            | Self::CallExpr { .. }
            | Self::NewExpr { .. }
            | Self::PropertyAccess { .. }
            | Self::ElementAccess { .. }
            | Self::ConditionalExpr { .. }
            | Self::Parenthesized(_)
            | Self::ArrayLiteral(_)
            | Self::OmittedExpression
            | Self::ObjectLiteral(_)
            | Self::FunctionExpr { .. }
            | Self::ArrowFunction { .. }
            | Self::GeneratorOp { .. }
            | Self::GeneratedLabel(_) => true,
            Self::Located { node, .. } => node.is_expression(),
            _ => false,
        }
    }

    /// Visit every direct child node mutably, in source order.
    ///
    /// Stops at the first error returned by `f`.
    pub fn try_for_each_child_mut<E>(
        &mut self,
        f: &mut impl FnMut(&mut Self) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            Self::NumericLiteral(_)
            | Self::StringLiteral(_)
            | Self::BooleanLiteral(_)
            | Self::NullLiteral
            | Self::Undefined
            | Self::Identifier(_)
            | Self::OmittedExpression
            | Self::EmptyStatement
            | Self::BreakStatement(_)
            | Self::ContinueStatement(_)
            | Self::GeneratedLabel(_) => Ok(()),

            Self::BinaryExpr { left, right, .. } => {
                f(left)?;
                f(right)
            }
            Self::PrefixUnaryExpr { operand, .. } => f(operand),
            Self::CallExpr { callee, arguments } | Self::NewExpr { callee, arguments } => {
                f(callee)?;
                arguments.iter_mut().try_for_each(|arg| f(arg))
            }
            Self::PropertyAccess { object, .. } => f(object),
            Self::ElementAccess { object, index } => {
                f(object)?;
                f(index)
            }
            Self::ConditionalExpr {
                condition,
                when_true,
                when_false,
            } => {
                f(condition)?;
                f(when_true)?;
                f(when_false)
            }
            Self::Parenthesized(inner)
            | Self::ExpressionStatement(inner)
            | Self::ThrowStatement(inner) => f(inner),
            Self::ArrayLiteral(nodes) | Self::VarDeclList(nodes) | Self::Block(nodes) => {
                nodes.iter_mut().try_for_each(|node| f(node))
            }
            Self::ObjectLiteral(properties) => properties
                .iter_mut()
                .try_for_each(|prop| f(&mut prop.value)),
            Self::FunctionExpr {
                parameters, body, ..
            }
            | Self::ArrowFunction { parameters, body }
            | Self::FunctionDecl {
                parameters, body, ..
            }
            | Self::MethodDecl {
                parameters, body, ..
            } => {
                for param in parameters.iter_mut() {
                    if let Some(default) = &mut param.default_value {
                        f(default)?;
                    }
                }
                body.iter_mut().try_for_each(|stmt| f(stmt))
            }
            Self::GetAccessor { body, .. } => body.iter_mut().try_for_each(|stmt| f(stmt)),
            Self::VarDecl { initializer, .. } => match initializer {
                Some(init) => f(init),
                None => Ok(()),
            },
            Self::ReturnStatement(expr) => match expr {
                Some(expr) => f(expr),
                None => Ok(()),
            },
            Self::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => {
                f(condition)?;
                f(then_branch)?;
                match else_branch {
                    Some(branch) => f(branch),
                    None => Ok(()),
                }
            }
            Self::SwitchStatement { expression, cases } => {
                f(expression)?;
                for case in cases.iter_mut() {
                    if let Some(test) = &mut case.test {
                        f(test)?;
                    }
                    case.statements.iter_mut().try_for_each(|stmt| f(stmt))?;
                }
                Ok(())
            }
            Self::ForStatement {
                initializer,
                condition,
                incrementor,
                body,
            } => {
                for part in [initializer, condition, incrementor].into_iter().flatten() {
                    f(part)?;
                }
                f(body)
            }
            Self::WhileStatement { condition, body } => {
                f(condition)?;
                f(body)
            }
            Self::WithStatement { object, body } => {
                f(object)?;
                f(body)
            }
            Self::LabeledStatement { statement, .. } => f(statement),
            Self::GeneratorOp { value, .. } => match value {
                Some(value) => f(value),
                None => Ok(()),
            },
            Self::Located { node, .. } => f(node),
        }
    }
}

impl IRParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rest: false,
            default_value: None,
        }
    }

    pub fn rest(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rest: true,
            default_value: None,
        }
    }

    pub fn with_default(mut self, default: IRNode) -> Self {
        self.default_value = Some(Box::new(default));
        self
    }
}

impl IRProperty {
    /// Create a simple property with identifier key: `{ key: value }`
    pub fn init(key: impl Into<String>, value: IRNode) -> Self {
        Self {
            key: IRPropertyKey::Identifier(key.into()),
            value,
        }
    }

    /// Create a property with string literal key: `{ "key": value }`
    pub fn init_string(key: impl Into<String>, value: IRNode) -> Self {
        Self {
            key: IRPropertyKey::StringLiteral(key.into()),
            value,
        }
    }
}

#[cfg(test)]
#[path = "../tests/ir.rs"]
mod tests;
