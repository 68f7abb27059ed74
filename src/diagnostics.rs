//! One-way notification channel for warnings and recoverable errors.
//!
//! The reader and the generator report through this trait and never consult
//! it for control decisions.

pub trait DiagnosticHandler {
    fn warning(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// Forwards diagnostics to the process log.
pub struct ConsoleDiagnostics;

impl DiagnosticHandler for ConsoleDiagnostics {
    fn warning(&mut self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&mut self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Keeps diagnostics in memory for later inspection.
#[derive(Default)]
pub struct CollectedDiagnostics {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl DiagnosticHandler for CollectedDiagnostics {
    fn warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}
