//! Centralised error hierarchy for the interpreter.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! failure modes into one of the variants defined here, enabling a uniform
//! `Result<T>` alias throughout the crate while preserving the diagnostic
//! format the language mandates:
//!
//! * static errors:  `[line N] Error at 'lexeme': message` (or ` at end`,
//!   or no location phrase for lexical errors), and
//! * runtime errors: the message followed by `[line N]` on its own line.
//!
//! The module does not print diagnostics itself.

use std::io;
use thiserror::Error;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information. No token
    /// exists yet, so there is no location phrase.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error, located at a token.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,

        /// ` at 'lexeme'` or ` at end` for the EOF token.
        location: String,
    },

    /// Static-analysis (resolution) failure, located at a token.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error. First one aborts interpretation.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error`. Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        LoxError::Lex {
            message: msg.into(),
            line,
        }
    }

    /// Helper constructor for the **parser**. `lexeme` is the offending
    /// token's text; an empty lexeme means the EOF token.
    pub fn parse<S: Into<String>>(line: usize, lexeme: &str, msg: S) -> Self {
        LoxError::Parse {
            message: msg.into(),
            line,
            location: location_phrase(lexeme),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, lexeme: &str, msg: S) -> Self {
        LoxError::Resolve {
            message: msg.into(),
            line,
            location: location_phrase(lexeme),
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        LoxError::Runtime {
            message: msg.into(),
            line,
        }
    }

    /// True for the statically-detected variants (lex/parse/resolve).
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

fn location_phrase(lexeme: &str) -> String {
    if lexeme.is_empty() {
        " at end".to_string()
    } else {
        format!(" at '{}'", lexeme)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
