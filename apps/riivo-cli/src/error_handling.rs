use riivo_core::{CoreError, ErrorKind};
use serde::Serialize;
use std::error::Error;

/// Error message followed by every `source`, one per line.
pub fn format_error_chain(error: &(dyn Error + 'static)) -> String {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();

    while let Some(err) = source {
        chain.push(format!("  caused by: {}", err));
        source = err.source();
    }

    chain.join("\n")
}

/// Failure payload printed with `--json`.
#[derive(Serialize, Clone)]
pub struct ErrorInfo {
    /// Stable tag, `None` for failures outside the core.
    pub kind: Option<ErrorKind>,
    pub message: String,
    pub chain: Vec<String>,
}

impl ErrorInfo {
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        let kind = error.downcast_ref::<CoreError>().map(CoreError::kind);
        let chain = error.chain().skip(1).map(|e| e.to_string()).collect();
        Self {
            kind,
            message: error.to_string(),
            chain,
        }
    }

    pub fn tag(&self) -> &'static str {
        self.kind.map(|k| k.as_str()).unwrap_or("other")
    }
}

pub fn log_error(context: &str, error: &anyhow::Error) {
    let error_chain = format_error_chain(&**error);
    tracing::debug!(context = context, error = %error_chain, "command failed");
}
