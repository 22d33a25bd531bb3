//! Common types and utilities for the gendown generator lowering.
//!
//! This crate provides foundational types used across all gendown crates:
//! - Source spans (`Span`) attached to operations and synthesized statements
//! - Collected user-source diagnostics (`Diagnostic`, `DiagnosticCategory`)
//! - Opt-in tracing subscriber setup for debugging lowering output

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostics reported against user source
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticMessage, diagnostic_codes, diagnostic_messages,
    format_message,
};

// Tracing subscriber configuration
pub mod tracing_config;
