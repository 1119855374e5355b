//! Diagnostic sink shared by the static passes.
//!
//! The driver owns one [`Diagnostics`] and lends it (`&mut`) to the scanner,
//! parser and resolver in turn.  Every report sets `had_error`; the driver
//! consults the flag between stages and calls [`Diagnostics::reset`] between
//! independent runs (REPL lines).

use std::fmt;

use log::{debug, info};
use serde::Serialize;

use crate::error::LoxError;
use crate::token::{Token, TokenType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// Scan, parse or resolve.
    Static,
    Runtime,
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,

    pub line: usize,

    /// `""`, `" at end"` or `" at '<lexeme>'"`.
    pub location: String,

    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::Static => write!(
                f,
                "[line {}] Error{}: {}",
                self.line, self.location, self.message
            ),
            DiagnosticKind::Runtime => write!(f, "{}\n[line {}]", self.message, self.line),
        }
    }
}

/// Location suffix for an error reported at `token`.
pub fn location_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report<L: Into<String>, M: Into<String>>(&mut self, line: usize, location: L, message: M) {
        let diagnostic = Diagnostic {
            kind: DiagnosticKind::Static,
            line,
            location: location.into(),
            message: message.into(),
        };

        debug!("Diagnostic reported: {}", diagnostic);

        self.entries.push(diagnostic);
        self.had_error = true;
    }

    pub fn scan_error<M: Into<String>>(&mut self, line: usize, message: M) {
        self.report(line, "", message);
    }

    pub fn error_at<M: Into<String>>(&mut self, token: &Token, message: M) {
        self.report(token.line, location_of(token), message);
    }

    /// Record an error produced by one of the static passes.
    pub fn push_error(&mut self, error: &LoxError) {
        match error {
            LoxError::Parse {
                message,
                location,
                line,
            }
            | LoxError::Resolve {
                message,
                location,
                line,
            } => self.report(*line, location.as_str(), message.as_str()),
            LoxError::Lex { message, line } => self.scan_error(*line, message.as_str()),
            other => self.runtime_error(other),
        }
    }

    /// Record the error that aborted an `interpret` call.
    pub fn runtime_error(&mut self, error: &LoxError) {
        debug!("Runtime error reported: {}", error);

        self.entries.push(Diagnostic {
            kind: DiagnosticKind::Runtime,
            line: error.line().unwrap_or(0),
            location: String::new(),
            message: error.message(),
        });
        self.had_runtime_error = true;
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Take the collected entries, leaving the flags untouched.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    pub fn reset(&mut self) {
        info!("Resetting diagnostics ({} entries)", self.entries.len());

        self.entries.clear();
        self.had_error = false;
        self.had_runtime_error = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_at_eof_reports_at_end() {
        let mut diagnostics = Diagnostics::new();
        let eof = Token::new(TokenType::EOF, "", None, 3);

        diagnostics.error_at(&eof, "Expect expression.");

        assert!(diagnostics.had_error());
        assert_eq!(
            diagnostics.diagnostics()[0].to_string(),
            "[line 3] Error at end: Expect expression."
        );
    }

    #[test]
    fn error_at_token_quotes_lexeme() {
        let mut diagnostics = Diagnostics::new();
        let token = Token::new(TokenType::IDENTIFIER, "foo", None, 1);

        diagnostics.error_at(&token, "Boom.");

        assert_eq!(
            diagnostics.diagnostics()[0].to_string(),
            "[line 1] Error at 'foo': Boom."
        );
    }

    #[test]
    fn reset_clears_flags_and_entries() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.scan_error(1, "Unexpected character.");
        diagnostics.runtime_error(&LoxError::runtime(2, "Operands must be numbers."));

        assert!(diagnostics.had_error());
        assert!(diagnostics.had_runtime_error());

        diagnostics.reset();

        assert!(!diagnostics.had_error());
        assert!(!diagnostics.had_runtime_error());
        assert!(diagnostics.diagnostics().is_empty());
    }

    #[test]
    fn runtime_error_does_not_set_static_flag() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.runtime_error(&LoxError::runtime(4, "Undefined variable 'x'."));

        assert!(!diagnostics.had_error());
        assert_eq!(
            diagnostics.diagnostics()[0].to_string(),
            "Undefined variable 'x'.\n[line 4]"
        );
        assert_eq!(diagnostics.diagnostics()[0].line, 4);
        assert_eq!(diagnostics.diagnostics()[0].message, "Undefined variable 'x'.");
    }
}
