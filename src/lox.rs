//! Pipeline driver: scan → parse → resolve → interpret.
//!
//! One [`Lox`] owns the interpreter (so globals survive between REPL lines)
//! and the diagnostic sink.  The caller decides what to do with the
//! collected diagnostics and the returned [`RunStatus`].

use log::{debug, info};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    /// Scan, parse or resolve errors; nothing was executed.
    StaticError,
    /// Execution started and was aborted by a runtime error.
    RuntimeError,
}

impl RunStatus {
    /// Conventional process exit code (sysexits `EX_DATAERR` / `EX_SOFTWARE`).
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Ok => 0,
            RunStatus::StaticError => 65,
            RunStatus::RuntimeError => 70,
        }
    }
}

pub struct Lox {
    interpreter: Interpreter,
    diagnostics: Diagnostics,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn run(&mut self, source: &str) -> RunStatus {
        info!("Running {} bytes of source", source.len());

        let tokens = scan_tokens(source, &mut self.diagnostics);
        let statements = Parser::new(&tokens, &mut self.diagnostics).parse();

        let statements = match statements {
            Some(statements) if !self.diagnostics.had_error() => statements,
            _ => {
                debug!("Stopping after parse: static errors reported");
                return RunStatus::StaticError;
            }
        };

        let locals = Resolver::new(&mut self.diagnostics).resolve_program(&statements);

        if self.diagnostics.had_error() {
            debug!("Stopping after resolve: static errors reported");
            return RunStatus::StaticError;
        }

        self.interpreter.resolve(locals);

        match self.interpreter.interpret(&statements) {
            Ok(()) => RunStatus::Ok,
            Err(e) => {
                debug!("Runtime error: {}", e);
                self.diagnostics.runtime_error(&e);
                RunStatus::RuntimeError
            }
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Hand over everything reported so far and clear the error flags, ready
    /// for the next independent run.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        let drained = self.diagnostics.drain();
        self.diagnostics.reset();
        drained
    }
}
