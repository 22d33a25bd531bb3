//! Tracing configuration for debugging lowering output.
//!
//! Supports three output formats controlled by `GENDOWN_LOG_FORMAT`:
//!
//! - `text` (default): Standard `tracing-subscriber` flat output
//! - `tree`: Hierarchical indented output via `tracing-tree`
//! - `json`: One JSON object per span/event
//!
//! ## Quick start
//!
//! ```bash
//! # Trace every case flush while running the lowering tests
//! GENDOWN_LOG=gendown_lowering=trace GENDOWN_LOG_FORMAT=tree cargo test -p gendown-lowering
//!
//! # Plain text
//! GENDOWN_LOG=debug cargo test
//! ```
//!
//! The subscriber is only initialised when `GENDOWN_LOG` (or `RUST_LOG`) is set.

use std::sync::Once;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard flat text lines (default).
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parse a `GENDOWN_LOG_FORMAT` value. Unknown values fall back to `Text`.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("GENDOWN_LOG_FORMAT").unwrap_or_default())
    }
}

/// Build an `EnvFilter` from `GENDOWN_LOG`, falling back to `RUST_LOG`.
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("GENDOWN_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

static INSTALL: Once = Once::new();

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `GENDOWN_LOG` nor `RUST_LOG` is set. Safe to call
/// more than once (every test calls it); only the first call installs a
/// subscriber. Output goes to stderr.
pub fn init_tracing() {
    let has_gendown_log = std::env::var("GENDOWN_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_gendown_log && !has_rust_log {
        return;
    }

    INSTALL.call_once(|| {
        if let Err(err) = install(build_filter(), LogFormat::from_env()) {
            // The host already installed its own subscriber; keep it.
            tracing::debug!(%err, "gendown tracing subscriber not installed");
        }
    });
}

fn install(filter: EnvFilter, format: LogFormat) -> Result<(), TryInitError> {
    match format {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);

            Registry::default().with(filter).with(tree_layer).try_init()
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default().with(filter).with(json_layer).try_init()
        }
        LogFormat::Text => {
            let text_layer = fmt::layer().with_writer(std::io::stderr);

            Registry::default().with(filter).with(text_layer).try_init()
        }
    }
}

#[cfg(test)]
#[path = "../tests/tracing_config.rs"]
mod tests;
