//! Error types for lexing, parsing, lowering and planning.

use super::types::Strategy;
use thiserror::Error;

/// Non-fatal validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Raised by the strict lexer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("{line}:{column}: unexpected character '{ch}'")]
    UnexpectedChar { ch: char, line: usize, column: usize },

    #[error("{line}:{column}: unterminated string literal")]
    UnterminatedString { line: usize, column: usize },
}

/// Fatal parse failure. There is no recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: expected {expected}, got {found}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub expected: String,
    pub found: String,
}

/// AST → IR failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoweringError {
    #[error("expected an intent declaration at the root, got {0}")]
    NotAnIntent(String),

    #[error("field '{field}' must be {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// The single error surfaced by `parse_intent`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    #[error("intent parsing failed: {0}")]
    Lex(#[from] LexError),

    #[error("intent parsing failed: {0}")]
    Parse(#[from] ParseError),

    #[error("intent parsing failed: {0}")]
    Lowering(#[from] LoweringError),
}

/// Planning failures. The built-in templates never produce these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    #[error("step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    #[error("step '{step}' depends on '{dependency}', which does not precede it")]
    ForwardDependency { step: String, dependency: String },

    #[error("dependency cycle detected involving: {0}")]
    Cycle(String),

    #[error("strategy {0} produced no steps")]
    EmptyPlan(Strategy),
}
