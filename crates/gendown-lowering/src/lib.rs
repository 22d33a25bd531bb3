//! Generator and async function lowering.
//!
//! Rewrites a function body containing suspension points into a resumable
//! state machine: one `switch` over a program counter held on a state object
//! that the runtime dispatcher passes back in on every resumption.
//!
//! The desugaring driver walks the original body in source order and
//! describes it to a [`CodeGenerator`]: it emits abstract [`Operation`]s,
//! defines and marks [`Label`]s, and brackets protected regions, `with`
//! scopes and loop targets with begin/end calls. When the body is complete
//! the generator builds either a flat statement list or a full function.
//!
//! Pipeline:
//! - `locals` / `labels` back the region stack
//! - `blocks` and `operations` feed the `builder`
//! - `assembler` wraps the builder output in the requested function shape

// IR node model and its JavaScript printer
pub mod ir;
pub mod ir_printer;

// Identifier Allocator
pub mod locals;

// Label Table
pub mod labels;

// Block Region Stack
pub mod blocks;

// Operation Recorder
pub mod operations;

// State-Machine Builder
pub mod builder;

// Driver-facing facade
pub mod generator;

// Function/Statement-List Assembler
pub mod assembler;

pub mod error;
pub mod options;

pub use assembler::FunctionShape;
pub use builder::{Instruction, LoweredBody};
pub use error::LoweringError;
pub use generator::{CodeGenerator, GeneratorKind, JumpTarget};
pub use ir::{IRNode, IRParam};
pub use ir_printer::IRPrinter;
pub use labels::Label;
pub use locals::{GlobalNames, Locals, NameResolver, ScopeId};
pub use operations::{LoweringMode, OpCode, Operation};
pub use options::LoweringOptions;
