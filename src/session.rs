//! Interpreter session: the single logical entry point of the core.
//!
//! `run(source)` drives the four-stage pipeline — scan, parse, resolve,
//! evaluate — over one chunk of source text. Static errors (lexical,
//! syntactic, resolution) are accumulated so a single run reports every one
//! it finds, and execution is withheld entirely if any was recorded.
//! Runtime errors are fail-fast: the first aborts interpretation.
//!
//! All formerly process-wide interpreter state (accumulated diagnostics,
//! the global environment) lives in this session value, owned by the
//! caller; interpreter state persists across `run` calls so a REPL can
//! build on earlier lines.

use std::io::{self, Write};

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// Result of running one chunk of source.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Outcome {
    /// The program ran to completion.
    Ok,

    /// One or more static errors were recorded; nothing was executed.
    StaticError,

    /// Execution started and was aborted by a runtime error.
    RuntimeError,
}

pub struct Lox {
    interpreter: Interpreter,

    /// Ordered diagnostics from the most recent `run`.
    diagnostics: Vec<LoxError>,

    /// First unused expression id, carried across runs so side-table keys
    /// from earlier REPL lines are never reused.
    next_expr_id: u32,
}

impl Lox {
    /// A session printing program output to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// A session printing program output to `output` (used by tests and
    /// embedders).
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Lox {
            interpreter: Interpreter::new(output),
            diagnostics: Vec::new(),
            next_expr_id: 0,
        }
    }

    /// Run one chunk of source text through the full pipeline.
    pub fn run(&mut self, source: &[u8]) -> Outcome {
        self.diagnostics.clear();

        // 1. Scan. Lexical errors are collected and scanning continues, so
        //    several can surface from one run.
        let mut tokens = Vec::new();
        for result in Scanner::new(source) {
            match result {
                Ok(token) => tokens.push(token),
                Err(e) => self.diagnostics.push(e),
            }
        }

        // 2. Parse. The parser resynchronizes at statement boundaries and
        //    reports everything it hit.
        let parser = Parser::starting_at(tokens, self.next_expr_id);
        let (statements, parse_errors, next_id) = parser.parse();
        self.next_expr_id = next_id;
        self.diagnostics.extend(parse_errors);

        // 3. Resolve. Also accumulating.
        let (locals, resolve_errors) = Resolver::new().resolve(&statements);
        self.diagnostics.extend(resolve_errors);

        // Execution is withheld entirely when any static error was
        // recorded.
        if !self.diagnostics.is_empty() {
            debug!(
                "{} static error(s); skipping execution",
                self.diagnostics.len()
            );
            return Outcome::StaticError;
        }

        self.interpreter.add_locals(locals);

        // 4. Evaluate. Fail-fast on the first runtime error.
        match self.interpreter.interpret(&statements) {
            Ok(()) => {
                info!("Program executed successfully");
                Outcome::Ok
            }
            Err(e) => {
                self.diagnostics.push(e);
                Outcome::RuntimeError
            }
        }
    }

    /// Scan only: the token sequence plus any lexical errors, in source
    /// order. Used by the `tokenize` command.
    pub fn tokenize(source: &[u8]) -> Vec<crate::error::Result<Token>> {
        Scanner::new(source).collect()
    }

    /// Ordered diagnostic messages from the most recent `run`.
    pub fn diagnostics(&self) -> &[LoxError] {
        &self.diagnostics
    }
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}
