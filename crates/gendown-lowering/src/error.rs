//! Internal-consistency errors raised by the lowering.
//!
//! Every variant signals a bug in the desugaring driver (mismatched region
//! calls, a branch to a label that does not exist, an operation the current
//! mode cannot express). None of them describe a problem in user source; those
//! are reported as [`gendown_common::Diagnostic`]s instead. Lowering of the
//! function stops at the first error.

use crate::assembler::FunctionShape;
use crate::blocks::{ExceptionPhase, RegionKind};
use crate::labels::Label;
use crate::operations::OpCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoweringError {
    #[error("label {0} was never defined")]
    UndefinedLabel(Label),

    #[error("label {0} is already marked at operation {1}")]
    LabelAlreadyMarked(Label, u32),

    #[error("label {0} was defined but never marked")]
    UnresolvedLabel(Label),

    #[error("Unexpected OpCode: {0}")]
    UnexpectedOperation(OpCode),

    #[error("{operation} is not available when lowering a statement list")]
    FunctionModeRequired { operation: &'static str },

    #[error("expected the innermost region to be {expected}, found {}", .found.map_or("no open region".to_string(), |kind| kind.to_string()))]
    RegionMismatch {
        expected: RegionKind,
        found: Option<RegionKind>,
    },

    #[error("cannot begin a {requested} block in an exception region that is already in its {phase} phase")]
    InvalidExceptionTransition {
        phase: ExceptionPhase,
        requested: ExceptionPhase,
    },

    #[error("{0} region(s) are still open")]
    UnclosedRegions(usize),

    #[error("no enclosing break target{}", .label.as_ref().map_or(String::new(), |l| format!(" for label '{l}'")))]
    NoBreakTarget { label: Option<String> },

    #[error("no enclosing continue target{}", .label.as_ref().map_or(String::new(), |l| format!(" for label '{l}'")))]
    NoContinueTarget { label: Option<String> },

    #[error("a {0} cannot have a name")]
    NamedAnonymousFunction(FunctionShape),

    #[error("a {0} requires a name")]
    MissingFunctionName(FunctionShape),
}
