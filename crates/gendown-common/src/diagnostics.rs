//! Diagnostics reported against user source.
//!
//! Internal-consistency failures of the lowering are not diagnostics; they are
//! returned as errors by the lowering crate. The types here describe problems
//! in the *input program* that the lowering can report and then continue past.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub mod diagnostic_codes {
    pub const PARAMETER_DEFAULTS_NOT_SUPPORTED_IN_GENERATOR_LOWERING: u32 = 9001;
    pub const YIELD_DELEGATE_REQUIRES_OPERAND: u32 = 9002;
}

pub mod diagnostic_messages {
    use super::{DiagnosticCategory, DiagnosticMessage, diagnostic_codes};

    pub const PARAMETER_DEFAULTS_NOT_SUPPORTED_IN_GENERATOR_LOWERING: DiagnosticMessage =
        DiagnosticMessage {
            code: diagnostic_codes::PARAMETER_DEFAULTS_NOT_SUPPORTED_IN_GENERATOR_LOWERING,
            category: DiagnosticCategory::Error,
            message: "Default value for parameter '{0}' is not supported when lowering a generator function.",
        };

    pub const YIELD_DELEGATE_REQUIRES_OPERAND: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::YIELD_DELEGATE_REQUIRES_OPERAND,
        category: DiagnosticCategory::Error,
        message: "'yield*' requires an operand.",
    };

    pub const ALL: &[DiagnosticMessage] = &[
        PARAMETER_DEFAULTS_NOT_SUPPORTED_IN_GENERATOR_LOWERING,
        YIELD_DELEGATE_REQUIRES_OPERAND,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            message_text: message.into(),
            code,
            file: file.into(),
            start,
            length,
        }
    }

    /// Build a diagnostic from a message template, substituting `{0}`, `{1}`, ...
    pub fn from_message(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            category: message.category,
            code: message.code,
            file: file.into(),
            start,
            length,
            message_text: format_message(message.message, args),
        }
    }
}

pub fn get_message_template(code: u32) -> Option<&'static str> {
    diagnostic_messages::ALL
        .iter()
        .find(|m| m.code == code)
        .map(|m| m.message)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
#[path = "../tests/diagnostics.rs"]
mod tests;
