//! Code Generator
//!
//! The facade the desugaring driver talks to while it walks a function body
//! in source order. It owns one [`LabelTable`], one [`BlockStack`] and one
//! [`OperationRecorder`] per lowered function and forwards to the builder when
//! the body is complete.
//!
//! A generator is created in one of three flavors:
//!
//! - [`CodeGenerator::statements`]: a flat statement list for a single
//!   protected construct. Only `Assign`, `Statement`, `Return` and `Throw`
//!   can be emitted and no labels or regions exist.
//! - [`CodeGenerator::generator_function`]: a generator body, wrapped by
//!   [`CodeGenerator::build_function`] in `return __generator(...)`.
//! - [`CodeGenerator::async_function`]: an async body, additionally adapted to
//!   a promise through `__awaiter`.
//!
//! # Example
//!
//! Lowering `function* f() { try { yield a; } finally { b(); } }`:
//!
//! ```ignore
//! let end = generator.begin_exception_block()?;
//! generator.emit(Operation::Yield(Some(IRNode::id("a"))))?;
//! generator.begin_finally_block()?;
//! generator.emit(Operation::Statement(IRNode::call(IRNode::id("b"), vec![])))?;
//! generator.end_exception_block()?;
//! let function = generator.build_function(FunctionShape::FunctionDeclaration, Some("f".into()))?;
//! ```

use crate::blocks::{
    BlockStack, BreakRegion, ContinueRegion, ExceptionPhase, ExceptionRegion, Region, RegionKind,
    WithRegion,
};
use crate::builder::{BuildInput, Instruction, LoweredBody, build_body};
use crate::error::LoweringError;
use crate::ir::{IRNode, IRParam};
use crate::labels::{Label, LabelTable};
use crate::locals::Locals;
use crate::operations::{LoweringMode, Operation, OperationRecorder};
use crate::options::{LoweringOptions, state_fields};
use gendown_common::{Diagnostic, Span, diagnostic_messages};

/// What the generator is lowering.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorKind {
    Statements,
    Generator,
    /// Async function; the promise constructor is an entity-name expression
    Async { promise_constructor: IRNode },
}

/// Where a `break` or `continue` lands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JumpTarget {
    /// The enclosing construct stays native; emit a native `break`/`continue`
    Native,
    /// Branch to this label through the dispatcher
    Label(Label),
}

pub struct CodeGenerator<'a> {
    kind: GeneratorKind,
    options: LoweringOptions,
    pub(crate) locals: Locals<'a>,
    labels: LabelTable,
    blocks: BlockStack,
    operations: OperationRecorder,
    pub(crate) parameters: Vec<IRParam>,
    pub(crate) functions: Vec<IRNode>,
    /// Name of the state parameter, allocated on first use
    state: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> CodeGenerator<'a> {
    fn new(kind: GeneratorKind, locals: Locals<'a>, options: LoweringOptions) -> Self {
        let mode = match kind {
            GeneratorKind::Statements => LoweringMode::Statements,
            GeneratorKind::Generator | GeneratorKind::Async { .. } => LoweringMode::StateMachine,
        };
        Self {
            kind,
            options,
            locals,
            labels: LabelTable::new(),
            blocks: BlockStack::new(),
            operations: OperationRecorder::new(mode),
            parameters: Vec::new(),
            functions: Vec::new(),
            state: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn statements(locals: Locals<'a>, options: LoweringOptions) -> Self {
        Self::new(GeneratorKind::Statements, locals, options)
    }

    pub fn generator_function(locals: Locals<'a>, options: LoweringOptions) -> Self {
        Self::new(GeneratorKind::Generator, locals, options)
    }

    pub fn async_function(
        locals: Locals<'a>,
        options: LoweringOptions,
        promise_constructor: IRNode,
    ) -> Self {
        Self::new(
            GeneratorKind::Async {
                promise_constructor,
            },
            locals,
            options,
        )
    }

    pub const fn kind(&self) -> &GeneratorKind {
        &self.kind
    }

    pub const fn mode(&self) -> LoweringMode {
        self.operations.mode()
    }

    pub const fn options(&self) -> &LoweringOptions {
        &self.options
    }

    pub const fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub const fn blocks(&self) -> &BlockStack {
        &self.blocks
    }

    pub const fn operations(&self) -> &OperationRecorder {
        &self.operations
    }

    pub(crate) fn require_function_mode(&self, operation: &'static str) -> Result<(), LoweringError> {
        match self.mode() {
            LoweringMode::StateMachine => Ok(()),
            LoweringMode::Statements => Err(LoweringError::FunctionModeRequired { operation }),
        }
    }

    // =========================================================================
    // Locations and diagnostics
    // =========================================================================

    /// Attach `span` to the next emitted operation or created statement.
    pub fn write_location(&mut self, span: Span) {
        self.operations.write_location(span);
    }

    fn report(&mut self, span: Option<Span>, message: &gendown_common::DiagnosticMessage, args: &[&str]) {
        let span = span.unwrap_or_default();
        self.diagnostics.push(Diagnostic::from_message(
            self.options.file_name.as_str(),
            span.start,
            span.len(),
            message,
            args,
        ));
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // =========================================================================
    // Locals, parameters and hoisting
    // =========================================================================

    pub fn create_unique_identifier(&mut self, preferred: Option<&str>, globally_unique: bool) -> String {
        self.locals.create_unique_identifier(preferred, globally_unique)
    }

    /// Allocate a name and hoist it into the outer function's `var` list.
    pub fn declare_local(&mut self, preferred: Option<&str>, globally_unique: bool) -> String {
        let name = self.locals.create_unique_identifier(preferred, globally_unique);
        self.locals.record_variable(name.clone());
        name
    }

    pub fn add_variable(&mut self, name: impl Into<String>) -> Result<(), LoweringError> {
        self.require_function_mode("add_variable")?;
        self.locals.record_variable(name);
        Ok(())
    }

    /// Hoisted locals, in declaration order.
    pub fn variables(&self) -> &[String] {
        self.locals.variables()
    }

    /// Append a parameter to the outer function's signature.
    ///
    /// A default value cannot be expressed once the body runs inside the
    /// dispatcher; it is dropped and reported.
    pub fn add_parameter(&mut self, mut param: IRParam) -> Result<(), LoweringError> {
        self.require_function_mode("add_parameter")?;
        let location = self.operations.read_location();
        if param.default_value.take().is_some() {
            self.report(
                location,
                &diagnostic_messages::PARAMETER_DEFAULTS_NOT_SUPPORTED_IN_GENERATOR_LOWERING,
                &[param.name.as_str()],
            );
        }
        self.parameters.push(param);
        Ok(())
    }

    /// Hoist a function declaration ahead of the lowered body.
    pub fn add_function(&mut self, declaration: IRNode) -> Result<(), LoweringError> {
        self.require_function_mode("add_function")?;
        self.functions.push(declaration);
        Ok(())
    }

    /// Return `expression` if it is an identifier, otherwise evaluate it once
    /// into a fresh hoisted temp and return the temp.
    pub fn ensure_identifier(&mut self, expression: IRNode) -> Result<IRNode, LoweringError> {
        let mut assignments = Vec::new();
        let identifier = self
            .locals
            .ensure_identifier(expression, &mut |target, value| assignments.push((target, value)));
        for (target, value) in assignments {
            self.emit(Operation::Assign { target, value })?;
        }
        Ok(identifier)
    }

    /// `value === void 0 ? default_value : value`, evaluating `value` once.
    pub fn value_or_default(
        &mut self,
        value: IRNode,
        default_value: IRNode,
    ) -> Result<IRNode, LoweringError> {
        let mut assignments = Vec::new();
        let expression = self.locals.value_or_default(value, default_value, &mut |target, value| {
            assignments.push((target, value));
        });
        for (target, value) in assignments {
            self.emit(Operation::Assign { target, value })?;
        }
        Ok(expression)
    }

    /// Name of the state parameter of the inner body function.
    pub fn state_name(&mut self) -> String {
        if let Some(state) = &self.state {
            return state.clone();
        }
        let preferred = self.options.state_name.clone();
        let state = self.locals.create_unique_identifier(Some(&preferred), false);
        self.state = Some(state.clone());
        state
    }

    fn state_property(&mut self, field: &str) -> IRNode {
        IRNode::prop(IRNode::id(self.state_name()), field)
    }

    // =========================================================================
    // Labels
    // =========================================================================

    pub fn define_label(&mut self) -> Result<Label, LoweringError> {
        self.require_function_mode("define_label")?;
        Ok(self.labels.define())
    }

    /// Bind `label` to the index of the next emitted operation.
    pub fn mark_label(&mut self, label: Label) -> Result<(), LoweringError> {
        self.require_function_mode("mark_label")?;
        let position = self.operations.position();
        self.labels.mark(label, position)?;
        tracing::trace!(%label, position, "marked label");
        Ok(())
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Record `operation` at the current position.
    pub fn emit(&mut self, operation: Operation) -> Result<(), LoweringError> {
        self.operations.validate(operation.opcode())?;

        if let Some(label) = operation.branch_target() {
            self.labels.note_reference(label)?;
        }

        if matches!(operation, Operation::YieldStar(None)) {
            let location = self.operations.pending_location();
            self.report(location, &diagnostic_messages::YIELD_DELEGATE_REQUIRES_OPERAND, &[]);
        }

        if self.operations.is_empty() && self.labels.is_empty() {
            // entry point
            let entry = self.labels.define();
            self.labels.mark(entry, 0)?;
        }

        self.operations.record(operation)?;
        Ok(())
    }

    /// `return [3 /*break*/, label];` for use inside a native statement.
    pub fn create_inline_break(&mut self, label: Label) -> Result<IRNode, LoweringError> {
        self.require_function_mode("create_inline_break")?;
        self.labels.note_reference(label)?;
        let jump = self.instruction(Instruction::Break, Some(IRNode::GeneratedLabel(label)));
        Ok(self.located(IRNode::ret(Some(jump))))
    }

    /// `return [2 /*return*/, expression];` for use inside a native statement.
    pub fn create_inline_return(&mut self, expression: Option<IRNode>) -> Result<IRNode, LoweringError> {
        self.require_function_mode("create_inline_return")?;
        let completion = self.instruction(Instruction::Return, expression);
        Ok(self.located(IRNode::ret(Some(completion))))
    }

    /// `<state>.sent`: the value delivered when the body resumes.
    pub fn create_resume(&mut self) -> Result<IRNode, LoweringError> {
        self.require_function_mode("create_resume")?;
        Ok(self.state_property(state_fields::SENT))
    }

    fn instruction(&self, instruction: Instruction, value: Option<IRNode>) -> IRNode {
        IRNode::GeneratorOp {
            opcode: instruction.tag(),
            value: value.map(Box::new),
            comment: self
                .options
                .instruction_comments
                .then(|| instruction.comment().to_string()),
        }
    }

    fn located(&mut self, node: IRNode) -> IRNode {
        match self.operations.read_location() {
            Some(span) => node.located(span),
            None => node,
        }
    }

    // =========================================================================
    // Exception regions
    // =========================================================================

    /// Open a `try` region. Returns the label control reaches after the
    /// region completes.
    pub fn begin_exception_block(&mut self) -> Result<Label, LoweringError> {
        self.require_function_mode("begin_exception_block")?;
        let start_label = self.labels.define();
        let end_label = self.labels.define();
        self.mark_label(start_label)?;
        let region = self.blocks.begin(
            Region::Exception(ExceptionRegion {
                phase: ExceptionPhase::Try,
                start_label,
                catch_variable: None,
                catch_label: Label::NONE,
                finally_label: Label::NONE,
                end_label,
            }),
            self.operations.position(),
        );
        tracing::trace!(?region, %start_label, %end_label, "begin exception block");
        Ok(end_label)
    }

    fn current_exception(&self, requested: ExceptionPhase) -> Result<Label, LoweringError> {
        let id = self.blocks.peek(RegionKind::Exception)?;
        match self.blocks.get(id) {
            Region::Exception(exception) if exception.phase < requested => Ok(exception.end_label),
            Region::Exception(exception) => Err(LoweringError::InvalidExceptionTransition {
                phase: exception.phase,
                requested,
            }),
            other => Err(LoweringError::RegionMismatch {
                expected: RegionKind::Exception,
                found: Some(other.kind()),
            }),
        }
    }

    /// Leave the `try` (or nothing) and begin the `catch` block binding
    /// `variable` to the in-flight exception.
    pub fn begin_catch_block(&mut self, variable: impl Into<String>) -> Result<(), LoweringError> {
        self.require_function_mode("begin_catch_block")?;
        let variable = variable.into();
        let end_label = self.current_exception(ExceptionPhase::Catch)?;
        self.emit(Operation::Break(end_label))?;

        let catch_label = self.labels.define();
        self.mark_label(catch_label)?;
        let id = self.blocks.peek(RegionKind::Exception)?;
        if let Region::Exception(exception) = self.blocks.get_mut(id) {
            exception.phase = ExceptionPhase::Catch;
            exception.catch_variable = Some(variable.clone());
            exception.catch_label = catch_label;
        }
        tracing::trace!(region = ?id, %catch_label, variable = %variable, "begin catch block");

        let error = self.state_property(state_fields::ERROR);
        self.emit(Operation::Assign {
            target: IRNode::id(variable),
            value: error,
        })
    }

    pub fn begin_finally_block(&mut self) -> Result<(), LoweringError> {
        self.require_function_mode("begin_finally_block")?;
        let end_label = self.current_exception(ExceptionPhase::Finally)?;
        self.emit(Operation::Break(end_label))?;

        let finally_label = self.labels.define();
        self.mark_label(finally_label)?;
        let id = self.blocks.peek(RegionKind::Exception)?;
        if let Region::Exception(exception) = self.blocks.get_mut(id) {
            exception.phase = ExceptionPhase::Finally;
            exception.finally_label = finally_label;
        }
        tracing::trace!(region = ?id, %finally_label, "begin finally block");
        Ok(())
    }

    /// Close the innermost exception region.
    ///
    /// The close is recorded before the trailing jump so that the jump (or
    /// `endfinally`) belongs to the enclosing region.
    pub fn end_exception_block(&mut self) -> Result<(), LoweringError> {
        self.require_function_mode("end_exception_block")?;
        let id = self
            .blocks
            .end(RegionKind::Exception, self.operations.position())?;
        let Region::Exception(exception) = self.blocks.get(id) else {
            return Err(LoweringError::RegionMismatch {
                expected: RegionKind::Exception,
                found: Some(self.blocks.get(id).kind()),
            });
        };
        let (phase, end_label) = (exception.phase, exception.end_label);

        if phase < ExceptionPhase::Finally {
            self.emit(Operation::Break(end_label))?;
        } else {
            self.emit(Operation::Endfinally)?;
        }
        self.mark_label(end_label)?;

        if let Region::Exception(exception) = self.blocks.get_mut(id) {
            exception.phase = ExceptionPhase::Done;
        }
        tracing::trace!(region = ?id, %end_label, "end exception block");
        Ok(())
    }

    // =========================================================================
    // With regions
    // =========================================================================

    /// Open a `with` scope over the object held in `expression`.
    pub fn begin_with_block(&mut self, expression: impl Into<String>) -> Result<(), LoweringError> {
        self.require_function_mode("begin_with_block")?;
        let start_label = self.labels.define();
        let end_label = self.labels.define();
        self.mark_label(start_label)?;
        let region = self.blocks.begin(
            Region::With(WithRegion {
                expression: expression.into(),
                start_label,
                end_label,
            }),
            self.operations.position(),
        );
        tracing::trace!(?region, "begin with block");
        Ok(())
    }

    pub fn end_with_block(&mut self) -> Result<(), LoweringError> {
        self.require_function_mode("end_with_block")?;
        let id = self.blocks.end(RegionKind::With, self.operations.position())?;
        if let Region::With(with) = self.blocks.get(id) {
            let end_label = with.end_label;
            self.mark_label(end_label)?;
        }
        tracing::trace!(region = ?id, "end with block");
        Ok(())
    }

    // =========================================================================
    // Break and continue targets
    // =========================================================================

    /// Open a break target lowered through the dispatcher (a labeled block
    /// or a `switch` containing a suspension point).
    pub fn begin_break_block(
        &mut self,
        label_names: Vec<String>,
        require_label: bool,
    ) -> Result<(), LoweringError> {
        self.require_function_mode("begin_break_block")?;
        self.blocks.begin(
            Region::Break(BreakRegion {
                break_label: Label::NONE,
                label_names,
                require_label,
                native: false,
            }),
            self.operations.position(),
        );
        Ok(())
    }

    pub fn end_break_block(&mut self) -> Result<(), LoweringError> {
        self.require_function_mode("end_break_block")?;
        let id = self.blocks.end(RegionKind::Break, self.operations.position())?;
        self.mark_break_label(id)
    }

    /// Open a loop lowered through the dispatcher; `continue` jumps to
    /// `continue_label`.
    pub fn begin_continue_block(
        &mut self,
        continue_label: Label,
        label_names: Vec<String>,
    ) -> Result<(), LoweringError> {
        self.require_function_mode("begin_continue_block")?;
        self.blocks.begin(
            Region::Continue(ContinueRegion {
                target: BreakRegion {
                    break_label: Label::NONE,
                    label_names,
                    require_label: false,
                    native: false,
                },
                continue_label,
            }),
            self.operations.position(),
        );
        Ok(())
    }

    pub fn end_continue_block(&mut self) -> Result<(), LoweringError> {
        self.require_function_mode("end_continue_block")?;
        let id = self
            .blocks
            .end(RegionKind::Continue, self.operations.position())?;
        self.mark_break_label(id)
    }

    /// Mark the break label of a closed region if anything targeted it.
    fn mark_break_label(&mut self, id: crate::blocks::RegionId) -> Result<(), LoweringError> {
        let break_label = self
            .blocks
            .get(id)
            .break_target()
            .map_or(Label::NONE, |target| target.break_label);
        if break_label.is_some() {
            self.mark_label(break_label)?;
        }
        Ok(())
    }

    /// Open a break target that stays a native JavaScript construct.
    pub fn begin_script_break_block(&mut self, label_names: Vec<String>, require_label: bool) {
        self.blocks.begin(
            Region::Break(BreakRegion {
                break_label: Label::NONE,
                label_names,
                require_label,
                native: true,
            }),
            self.operations.position(),
        );
    }

    pub fn end_script_break_block(&mut self) -> Result<(), LoweringError> {
        self.blocks
            .end(RegionKind::ScriptBreak, self.operations.position())
            .map(drop)
    }

    /// Open a loop that stays a native JavaScript loop.
    pub fn begin_script_continue_block(&mut self, label_names: Vec<String>) {
        self.blocks.begin(
            Region::Continue(ContinueRegion {
                target: BreakRegion {
                    break_label: Label::NONE,
                    label_names,
                    require_label: false,
                    native: true,
                },
                continue_label: Label::NONE,
            }),
            self.operations.position(),
        );
    }

    pub fn end_script_continue_block(&mut self) -> Result<(), LoweringError> {
        self.blocks
            .end(RegionKind::ScriptContinue, self.operations.position())
            .map(drop)
    }

    /// Resolve a `break` (optionally labeled) to the innermost region it leaves.
    ///
    /// The break label of a dispatcher-lowered region is defined here on
    /// first use and marked when the region ends.
    pub fn find_break_target(&mut self, label_name: Option<&str>) -> Result<JumpTarget, LoweringError> {
        let Some(id) = self.blocks.find_break_target(label_name) else {
            return Err(LoweringError::NoBreakTarget {
                label: label_name.map(str::to_string),
            });
        };

        let labels = &mut self.labels;
        let Some(target) = self.blocks.get_mut(id).break_target_mut() else {
            return Err(LoweringError::NoBreakTarget {
                label: label_name.map(str::to_string),
            });
        };
        if target.native {
            return Ok(JumpTarget::Native);
        }
        if target.break_label.is_none() {
            target.break_label = labels.define();
        }
        let break_label = target.break_label;
        labels.note_reference(break_label)?;
        Ok(JumpTarget::Label(break_label))
    }

    /// Resolve a `continue` (optionally labeled) to the innermost loop it restarts.
    pub fn find_continue_target(
        &mut self,
        label_name: Option<&str>,
    ) -> Result<JumpTarget, LoweringError> {
        let not_found = || LoweringError::NoContinueTarget {
            label: label_name.map(str::to_string),
        };
        let id = self.blocks.find_continue_target(label_name).ok_or_else(not_found)?;
        let Region::Continue(region) = self.blocks.get(id) else {
            return Err(not_found());
        };
        if region.target.native {
            return Ok(JumpTarget::Native);
        }
        let continue_label = region.continue_label;
        self.labels.note_reference(continue_label)?;
        Ok(JumpTarget::Label(continue_label))
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Lower the recorded operations into a statement list.
    ///
    /// In statement mode the result is always flat. In function mode the
    /// result is the dispatch switch (or the flat list if the body never
    /// needed a second case).
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn build_statements(&mut self, force_return: bool) -> Result<LoweredBody, LoweringError> {
        if self.blocks.depth() > 0 {
            return Err(LoweringError::UnclosedRegions(self.blocks.depth()));
        }

        let split_on_abrupt = matches!(self.mode(), LoweringMode::StateMachine);
        let state = if split_on_abrupt {
            self.state_name()
        } else {
            self.state
                .clone()
                .unwrap_or_else(|| self.options.state_name.clone())
        };

        build_body(BuildInput {
            operations: self.operations.operations(),
            labels: &self.labels,
            blocks: &self.blocks,
            state: &state,
            split_on_abrupt,
            force_return,
            instruction_comments: self.options.instruction_comments,
        })
    }
}

impl std::fmt::Debug for CodeGenerator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenerator")
            .field("kind", &self.kind)
            .field("operations", &self.operations.len())
            .field("labels", &self.labels.len())
            .field("regions", &self.blocks.depth())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/generator.rs"]
mod tests;
