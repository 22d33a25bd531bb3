//! Operation Recorder
//!
//! The driver describes a function body as a flat, source-ordered list of
//! abstract operations. Structured control flow has already been reduced to
//! branches between labels; the builder later cuts this list into the cases
//! of the dispatch switch.

use crate::error::LoweringError;
use crate::ir::IRNode;
use crate::labels::Label;
use gendown_common::Span;
use std::fmt;

/// Which lowering a generator is performing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoweringMode {
    /// Flat statement list for a single protected construct; no branches or
    /// suspension points.
    Statements,
    /// Full state machine for a generator or async function body.
    StateMachine,
}

/// Operation discriminant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpCode {
    Assign,
    Statement,
    Break,
    BreakIfTrue,
    BreakIfFalse,
    Yield,
    YieldStar,
    Return,
    Throw,
    Endfinally,
}

impl OpCode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Assign => "Assign",
            Self::Statement => "Statement",
            Self::Break => "Break",
            Self::BreakIfTrue => "BreakIfTrue",
            Self::BreakIfFalse => "BreakIfFalse",
            Self::Yield => "Yield",
            Self::YieldStar => "YieldStar",
            Self::Return => "Return",
            Self::Throw => "Throw",
            Self::Endfinally => "Endfinally",
        }
    }

    /// Whether `mode` can express this operation.
    pub const fn is_legal_in(self, mode: LoweringMode) -> bool {
        match self {
            Self::Assign | Self::Statement | Self::Return | Self::Throw => true,
            Self::Break
            | Self::BreakIfTrue
            | Self::BreakIfFalse
            | Self::Yield
            | Self::YieldStar
            | Self::Endfinally => matches!(mode, LoweringMode::StateMachine),
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One abstract operation with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// `target = value;`
    Assign { target: IRNode, value: IRNode },
    /// A statement (or bare expression) copied into the current case.
    Statement(IRNode),
    /// Unconditional jump.
    Break(Label),
    /// Jump when `condition` is truthy.
    BreakIfTrue { label: Label, condition: IRNode },
    /// Jump when `condition` is falsy.
    BreakIfFalse { label: Label, condition: IRNode },
    /// Suspend, producing an optional value.
    Yield(Option<IRNode>),
    /// Delegate to another iterator.
    YieldStar(Option<IRNode>),
    /// Complete with an optional value.
    Return(Option<IRNode>),
    Throw(IRNode),
    /// Resume whatever completion was pending when the finally block was entered.
    Endfinally,
}

impl Operation {
    pub const fn opcode(&self) -> OpCode {
        match self {
            Self::Assign { .. } => OpCode::Assign,
            Self::Statement(_) => OpCode::Statement,
            Self::Break(_) => OpCode::Break,
            Self::BreakIfTrue { .. } => OpCode::BreakIfTrue,
            Self::BreakIfFalse { .. } => OpCode::BreakIfFalse,
            Self::Yield(_) => OpCode::Yield,
            Self::YieldStar(_) => OpCode::YieldStar,
            Self::Return(_) => OpCode::Return,
            Self::Throw(_) => OpCode::Throw,
            Self::Endfinally => OpCode::Endfinally,
        }
    }

    /// Label this operation branches to, if any.
    pub const fn branch_target(&self) -> Option<Label> {
        match self {
            Self::Break(label)
            | Self::BreakIfTrue { label, .. }
            | Self::BreakIfFalse { label, .. } => Some(*label),
            _ => None,
        }
    }
}

/// An operation together with the source span it was lowered from.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOperation {
    pub operation: Operation,
    pub location: Option<Span>,
}

/// Source-ordered operation list for one function.
#[derive(Debug)]
pub struct OperationRecorder {
    mode: LoweringMode,
    operations: Vec<RecordedOperation>,
    pending_location: Option<Span>,
}

impl OperationRecorder {
    pub fn new(mode: LoweringMode) -> Self {
        Self {
            mode,
            operations: Vec::new(),
            pending_location: None,
        }
    }

    pub const fn mode(&self) -> LoweringMode {
        self.mode
    }

    /// Set the location attached to the next recorded operation.
    pub fn write_location(&mut self, span: Span) {
        self.pending_location = Some(span);
    }

    /// Location that the next recorded operation will carry.
    pub const fn pending_location(&self) -> Option<Span> {
        self.pending_location
    }

    /// Take the pending location, clearing it.
    pub fn read_location(&mut self) -> Option<Span> {
        self.pending_location.take()
    }

    /// Index the next recorded operation will get.
    pub fn position(&self) -> u32 {
        self.operations.len() as u32
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[RecordedOperation] {
        &self.operations
    }

    /// Check that the current mode can express `opcode`.
    pub fn validate(&self, opcode: OpCode) -> Result<(), LoweringError> {
        if opcode.is_legal_in(self.mode) {
            Ok(())
        } else {
            Err(LoweringError::UnexpectedOperation(opcode))
        }
    }

    /// Validate and append `operation`, consuming the pending location.
    ///
    /// An empty statement contributes nothing and is dropped; returns whether
    /// the operation was recorded.
    pub fn record(&mut self, operation: Operation) -> Result<bool, LoweringError> {
        self.validate(operation.opcode())?;
        let location = self.read_location();
        if let Operation::Statement(node) = &operation
            && matches!(node.unlocated(), IRNode::EmptyStatement)
        {
            return Ok(false);
        }
        self.operations.push(RecordedOperation {
            operation,
            location,
        });
        Ok(true)
    }
}

#[cfg(test)]
#[path = "../tests/operations.rs"]
mod tests;
