use crate::loc::Loc;

/// How bad a reported problem is. Warnings and errors never stop the parse;
/// fatal conditions abort the whole unit via [`FatalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub loc: Loc,
}

/// Side channel collecting recoverable diagnostics for one unit.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warning(&mut self, loc: Loc, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            loc,
        });
    }

    pub fn error(&mut self, loc: Loc, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            loc,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Structural violations of the input contract. These abort the unit parse
/// immediately; nothing partial is kept.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("token stream is empty")]
    EmptyTokenStream,
    #[error("token stream is not terminated by an end sentinel")]
    MissingEndSentinel,
}
