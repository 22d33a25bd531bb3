//! Lowering configuration.
//!
//! The instruction tags, the field names on the state object and the runtime
//! helper names are part of the contract with the runtime dispatcher, so they
//! are constants below rather than options.

use serde::{Deserialize, Serialize};

/// Names of the runtime helpers the lowered function calls.
pub mod helpers {
    /// Drives a state-machine body: `__generator(function (_state) { ... })`
    pub const GENERATOR: &str = "__generator";
    /// Adapts a driven generator to a promise resolver
    pub const AWAITER: &str = "__awaiter";
}

/// Fields of the per-invocation state object the dispatcher passes in.
pub mod state_fields {
    /// Program counter selecting the next case
    pub const LABEL: &str = "label";
    /// Stack of `[start, catch, finally, end]` protected-region tuples
    pub const TRYS: &str = "trys";
    /// Exception value delivered to a catch block
    pub const ERROR: &str = "error";
    /// Value sent in when the body resumes after a suspension
    pub const SENT: &str = "sent";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoweringOptions {
    /// Preferred name of the state parameter of the inner body function
    pub state_name: String,
    /// Preferred name of the resolve parameter of the promise executor
    pub resolve_name: String,
    /// Emit `/*yield*/`-style comments after instruction tags
    pub instruction_comments: bool,
    /// File name stamped on reported diagnostics
    pub file_name: String,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self {
            state_name: "_state".to_string(),
            resolve_name: "_resolve".to_string(),
            instruction_comments: true,
            file_name: String::new(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/options.rs"]
mod tests;
