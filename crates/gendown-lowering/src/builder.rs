//! State-Machine Builder
//!
//! Turns a recorded operation list into either a flat statement list or a
//! single `switch (<state>.label) { ... }` whose cases are the contiguous runs
//! of operations between control-flow boundaries.
//!
//! # Algorithm
//!
//! The list is walked once, as a fold over [`BodyBuilder`]. At each
//! operation index:
//!
//! 1. If a marked label resolves to the index, or the previous operation was
//!    an abrupt completion (state machine mode only), the case being built is
//!    closed. A case that could fall through gets a trailing
//!    `<state>.label = N + 1`.
//! 2. Region open/close events recorded at or before the index are replayed,
//!    keeping the current protected region and the stack of `with` scopes.
//! 3. The operation is translated into statements of the current case.
//!
//! Closing a case wraps its statements in the active `with` scopes and, for
//! the first case closed inside a newly entered protected region, prefixes
//! `<state>.trys.push([start, catch, finally, end])`.
//!
//! ```javascript
//! switch (_state.label) {
//!     case 0:
//!         _state.trys = [];
//!         _state.trys.push([0, , 2, 3]);
//!         return [4 /*yield*/, a];
//!     case 1: return [3 /*break*/, 3];
//!     case 2:
//!         b();
//!         return [6 /*endfinally*/];
//!     case 3: return [2 /*return*/];
//! }
//! ```
//!
//! Label references are emitted as [`IRNode::GeneratedLabel`] and rewritten
//! to case numbers after the walk, since forward branches point at cases that
//! do not exist yet when the branch is translated.

use crate::blocks::{BlockAction, BlockStack, Region, RegionId};
use crate::error::LoweringError;
use crate::ir::{IRNode, IRSwitchCase};
use crate::labels::{Label, LabelTable};
use crate::operations::{Operation, RecordedOperation};
use crate::options::state_fields;
use gendown_common::Span;
use smallvec::SmallVec;

/// Numeric instruction tags understood by the runtime dispatcher.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Instruction {
    Return = 2,
    Break = 3,
    Yield = 4,
    YieldStar = 5,
    Endfinally = 6,
}

impl Instruction {
    pub const fn tag(self) -> u32 {
        self as u32
    }

    pub const fn comment(self) -> &'static str {
        match self {
            Self::Return => "return",
            Self::Break => "break",
            Self::Yield => "yield",
            Self::YieldStar => "yield*",
            Self::Endfinally => "endfinally",
        }
    }
}

/// Everything the builder reads. Owned by the generator; borrowed for one build.
pub struct BuildInput<'g> {
    pub operations: &'g [RecordedOperation],
    pub labels: &'g LabelTable,
    pub blocks: &'g BlockStack,
    /// Name of the state parameter
    pub state: &'g str,
    /// Split cases after abrupt completions (state machine mode)
    pub split_on_abrupt: bool,
    /// Synthesize a trailing return when the body can run off its end
    pub force_return: bool,
    pub instruction_comments: bool,
}

/// Result of one build.
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredBody {
    /// Either the flat statements or exactly one dispatch switch
    pub statements: Vec<IRNode>,
    /// Number of dispatch cases; 0 when the body is flat
    pub case_count: usize,
    /// A yield was lowered, so the body reads `<state>.sent` on resumption
    pub resumes: bool,
}

impl LoweredBody {
    pub const fn is_state_machine(&self) -> bool {
        self.case_count > 0
    }
}

/// Build the body described by `input`.
#[tracing::instrument(level = "trace", skip(input), fields(operations = input.operations.len()))]
pub fn build_body(input: BuildInput<'_>) -> Result<LoweredBody, LoweringError> {
    if let Some(label) = input.labels.first_unmarked() {
        return Err(LoweringError::UnresolvedLabel(label));
    }

    let operations = input.operations;
    let builder = operations
        .iter()
        .enumerate()
        .fold(BodyBuilder::new(input), |mut builder, (index, op)| {
            builder.write_operation(index as u32, op);
            builder
        });
    let body = builder.finish()?;

    tracing::debug!(
        operations = operations.len(),
        cases = body.case_count,
        state_machine = body.is_state_machine(),
        "built generator body"
    );
    Ok(body)
}

/// Accumulator threaded through the walk.
struct BodyBuilder<'g> {
    input: BuildInput<'g>,
    /// Labels bucketed by the operation index they resolve to
    labels_by_position: Vec<SmallVec<[Label; 2]>>,
    /// Case number assigned to each label, indexed by `Label::0`
    label_numbers: Vec<Option<u32>>,
    /// Next unreplayed region event
    block_index: usize,
    /// Number of the case being built
    label_number: u32,
    last_operation_was_abrupt: bool,
    last_operation_was_completion: bool,
    /// Statements of the case being built
    statements: Vec<IRNode>,
    clauses: Vec<IRSwitchCase>,
    /// Statements that lead case 0
    prologue: Vec<IRNode>,
    /// Protected region whose bookkeeping tuple has not been pushed yet
    current_exception: Option<RegionId>,
    exception_stack: Vec<Option<RegionId>>,
    with_stack: Vec<RegionId>,
    resumes: bool,
}

impl<'g> BodyBuilder<'g> {
    fn new(input: BuildInput<'g>) -> Self {
        let end = input.operations.len();
        let mut labels_by_position: Vec<SmallVec<[Label; 2]>> = vec![SmallVec::new(); end + 1];
        for label in input.labels.iter() {
            if let Some(position) = input.labels.position(label)
                && let Some(bucket) = labels_by_position.get_mut(position as usize)
            {
                bucket.push(label);
            }
        }

        let mut prologue = Vec::new();
        if input.blocks.has_protected_regions() {
            // <state>.trys = [];
            let trys = IRNode::prop(IRNode::id(input.state), state_fields::TRYS);
            prologue.push(IRNode::expr_stmt(IRNode::assign(trys, IRNode::empty_array())));
        }

        Self {
            label_numbers: vec![None; input.labels.len() + 1],
            labels_by_position,
            input,
            block_index: 0,
            label_number: 0,
            last_operation_was_abrupt: false,
            last_operation_was_completion: false,
            statements: Vec::new(),
            clauses: Vec::new(),
            prologue,
            current_exception: None,
            exception_stack: Vec::new(),
            with_stack: Vec::new(),
            resumes: false,
        }
    }

    fn state(&self) -> IRNode {
        IRNode::id(self.input.state)
    }

    // =========================================================================
    // Case boundaries
    // =========================================================================

    fn has_labels_at(&self, index: u32) -> bool {
        self.labels_by_position
            .get(index as usize)
            .is_some_and(|labels| !labels.is_empty())
    }

    /// Assign the current case number to every label resolving to `index`.
    fn number_labels_at(&mut self, index: u32) {
        if let Some(labels) = self.labels_by_position.get(index as usize) {
            for label in labels {
                self.label_numbers[label.0 as usize] = Some(self.label_number);
            }
        }
    }

    /// Close the case being built and start the next one.
    fn flush_case(&mut self) {
        if self.statements.is_empty() {
            return;
        }

        let falls_through = !self.last_operation_was_abrupt;
        self.append_case(falls_through);
        self.last_operation_was_abrupt = false;
        self.last_operation_was_completion = false;
        self.label_number += 1;
    }

    fn append_case(&mut self, falls_through: bool) {
        let mut statements = std::mem::take(&mut self.statements);

        for region in self.with_stack.iter().rev() {
            if let Region::With(with) = self.input.blocks.get(*region) {
                statements = vec![IRNode::with_stmt(
                    IRNode::id(with.expression.as_str()),
                    IRNode::block(statements),
                )];
            }
        }

        if let Some(region) = self.current_exception.take() {
            statements.insert(0, self.trys_push(region));
        }

        if self.label_number == 0 && !self.prologue.is_empty() {
            let mut prologue = std::mem::take(&mut self.prologue);
            prologue.append(&mut statements);
            statements = prologue;
        }

        if falls_through {
            // <state>.label = N + 1;
            let label = IRNode::prop(self.state(), state_fields::LABEL);
            let next = IRNode::number((self.label_number + 1).to_string());
            statements.push(IRNode::expr_stmt(IRNode::assign(label, next)));
        }

        tracing::trace!(
            case = self.label_number,
            statements = statements.len(),
            falls_through,
            "flushed case"
        );
        self.clauses.push(IRSwitchCase {
            test: Some(IRNode::number(self.label_number.to_string())),
            statements,
        });
    }

    /// `<state>.trys.push([start, catch, finally, end]);`
    fn trys_push(&self, region: RegionId) -> IRNode {
        let Region::Exception(exception) = self.input.blocks.get(region) else {
            return IRNode::EmptyStatement;
        };
        let label_or_hole = |label: Label| {
            if label.is_some() {
                IRNode::GeneratedLabel(label)
            } else {
                IRNode::OmittedExpression
            }
        };
        let tuple = IRNode::array(vec![
            IRNode::GeneratedLabel(exception.start_label),
            label_or_hole(exception.catch_label),
            label_or_hole(exception.finally_label),
            IRNode::GeneratedLabel(exception.end_label),
        ]);
        let push = IRNode::prop(
            IRNode::prop(self.state(), state_fields::TRYS),
            "push",
        );
        IRNode::expr_stmt(IRNode::call(push, vec![tuple]))
    }

    /// Open a new case at `index` if a label resolves there or the previous
    /// operation cannot fall through.
    fn enter_position(&mut self, index: u32) {
        let split = self.has_labels_at(index)
            || (self.input.split_on_abrupt && self.last_operation_was_abrupt);
        if split {
            self.flush_case();
        }
        self.number_labels_at(index);
    }

    /// Replay region events recorded at or before `index`.
    fn enter_or_leave_blocks(&mut self, index: u32) {
        let events = self.input.blocks.events();
        while let Some(event) = events.get(self.block_index) {
            if event.offset > index {
                break;
            }
            self.block_index += 1;
            match (event.action, self.input.blocks.get(event.region)) {
                (BlockAction::Open, Region::Exception(_)) => {
                    self.exception_stack.push(self.current_exception);
                    self.current_exception = Some(event.region);
                }
                (BlockAction::Close, Region::Exception(_)) => {
                    self.current_exception = self.exception_stack.pop().flatten();
                }
                (BlockAction::Open, Region::With(_)) => self.with_stack.push(event.region),
                (BlockAction::Close, Region::With(_)) => {
                    self.with_stack.pop();
                }
                _ => {}
            }
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    fn write_operation(&mut self, index: u32, recorded: &RecordedOperation) {
        self.enter_position(index);
        self.enter_or_leave_blocks(index);

        // Without case splitting nothing after an abrupt completion is reachable.
        if self.last_operation_was_abrupt {
            return;
        }

        let location = recorded.location;
        match &recorded.operation {
            Operation::Statement(node) => self.write_statement(node.clone(), location),
            Operation::Assign { target, value } => {
                let assign = IRNode::assign(target.clone(), value.clone());
                self.write_statement(assign, location);
            }
            Operation::Break(label) => {
                self.last_operation_was_abrupt = true;
                let jump = self.instruction(Instruction::Break, Some(IRNode::GeneratedLabel(*label)));
                self.write_statement(IRNode::ret(Some(jump)), location);
            }
            Operation::BreakIfTrue { label, condition } => {
                let jump = self.instruction(Instruction::Break, Some(IRNode::GeneratedLabel(*label)));
                let guarded = IRNode::if_then(condition.clone(), IRNode::ret(Some(jump)));
                self.write_statement(guarded, location);
            }
            Operation::BreakIfFalse { label, condition } => {
                let jump = self.instruction(Instruction::Break, Some(IRNode::GeneratedLabel(*label)));
                let guarded = IRNode::if_then(IRNode::not(condition.clone()), IRNode::ret(Some(jump)));
                self.write_statement(guarded, location);
            }
            Operation::Yield(value) => {
                self.last_operation_was_abrupt = true;
                self.resumes = true;
                let op = self.instruction(Instruction::Yield, value.clone());
                self.write_statement(IRNode::ret(Some(op)), location);
            }
            Operation::YieldStar(value) => {
                self.last_operation_was_abrupt = true;
                self.resumes = true;
                let op = self.instruction(Instruction::YieldStar, value.clone());
                self.write_statement(IRNode::ret(Some(op)), location);
            }
            Operation::Return(value) => self.write_return(value.clone(), location),
            Operation::Throw(value) => {
                self.last_operation_was_abrupt = true;
                self.last_operation_was_completion = true;
                self.write_statement(IRNode::throw(value.clone()), location);
            }
            Operation::Endfinally => {
                self.last_operation_was_abrupt = true;
                let op = self.instruction(Instruction::Endfinally, None);
                self.write_statement(IRNode::ret(Some(op)), location);
            }
        }
    }

    fn instruction(&self, instruction: Instruction, value: Option<IRNode>) -> IRNode {
        IRNode::GeneratorOp {
            opcode: instruction.tag(),
            value: value.map(Box::new),
            comment: self
                .input
                .instruction_comments
                .then(|| instruction.comment().to_string()),
        }
    }

    fn write_statement(&mut self, node: IRNode, location: Option<Span>) {
        let statement = if node.is_expression() {
            IRNode::expr_stmt(node)
        } else {
            node
        };
        let statement = match location {
            Some(span) => statement.located(span),
            None => statement,
        };
        self.statements.push(statement);
    }

    fn write_return(&mut self, value: Option<IRNode>, location: Option<Span>) {
        self.last_operation_was_abrupt = true;
        self.last_operation_was_completion = true;
        let op = self.instruction(Instruction::Return, value);
        self.write_statement(IRNode::ret(Some(op)), location);
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    fn finish(mut self) -> Result<LoweredBody, LoweringError> {
        let end = self.input.operations.len() as u32;
        let needs_return = self.input.force_return && !self.last_operation_was_completion;

        // Labels that resolve past the last operation still need a case to land on.
        let targeted_end = self.has_labels_at(end);
        if targeted_end || (needs_return && self.last_operation_was_abrupt && self.input.split_on_abrupt) {
            self.flush_case();
        }
        self.number_labels_at(end);
        self.enter_or_leave_blocks(end);

        if self.input.force_return && !self.last_operation_was_completion {
            self.write_return(None, None);
        }

        let mut statements = if self.clauses.is_empty() {
            let mut flat = std::mem::take(&mut self.prologue);
            flat.append(&mut self.statements);
            flat
        } else {
            if !self.statements.is_empty() || targeted_end {
                self.append_case(false);
            }
            let label = IRNode::prop(self.state(), state_fields::LABEL);
            vec![IRNode::switch(label, std::mem::take(&mut self.clauses))]
        };

        let case_count = match statements.first() {
            Some(IRNode::SwitchStatement { cases, .. }) => cases.len(),
            _ => 0,
        };

        for statement in &mut statements {
            resolve_labels(statement, &self.label_numbers)?;
        }

        Ok(LoweredBody {
            statements,
            case_count,
            resumes: self.resumes,
        })
    }
}

/// Rewrite every [`IRNode::GeneratedLabel`] under `node` to its case number.
fn resolve_labels(node: &mut IRNode, label_numbers: &[Option<u32>]) -> Result<(), LoweringError> {
    if let IRNode::GeneratedLabel(label) = node {
        let number = label_numbers
            .get(label.0 as usize)
            .copied()
            .flatten()
            .ok_or(LoweringError::UnresolvedLabel(*label))?;
        *node = IRNode::number(number.to_string());
        return Ok(());
    }
    node.try_for_each_child_mut(&mut |child| resolve_labels(child, label_numbers))
}

#[cfg(test)]
#[path = "../tests/builder.rs"]
mod tests;
