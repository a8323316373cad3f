// src/error.rs
use thiserror::Error;

/// Compile-time failures. All of them abort table generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("grammar has no rules")]
    EmptyGrammar,

    #[error("start condition '{0}' declared twice")]
    DuplicateCondition(String),

    #[error("rule #{rule} ({token}): no such start condition '{condition}'")]
    UnknownCondition {
        rule: usize,
        token: String,
        condition: String,
    },

    #[error("fragment '{0}' declared twice")]
    DuplicateFragment(String),

    #[error("no such fragment '{name}' (referenced by {referenced_by})")]
    UnknownFragment { name: String, referenced_by: String },

    #[error("fragment '{0}' refers to itself")]
    FragmentCycle(String),

    #[error("rule #{rule} ({token}): exactly one of `pattern` or `literal` is required")]
    MissingPattern { rule: usize, token: String },

    #[error("rule #{rule} ({token}): {message}")]
    Pattern {
        rule: usize,
        token: String,
        message: String,
    },

    #[error("rule #{rule} ({token}): pattern can never match")]
    Unsatisfiable { rule: usize, token: String },

    #[error("rule #{rule} ({token}): repetition upper bound is below its lower bound")]
    InvalidRepeat { rule: usize, token: String },

    #[error("{count} token kinds exceed the 12-bit kind field (max {max})")]
    TooManyTokenKinds { count: usize, max: usize },

    #[error("{count} automaton states exceed the 16-bit state field (max {max})")]
    TooManyStates { count: usize, max: usize },
}

/// Failures while saving, loading or validating a table artifact.
#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse tables JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad magic in tables .bin")]
    BadMagic,

    #[error("truncated tables .bin: {0}")]
    Truncated(&'static str),

    #[error("inconsistent tables: {0}")]
    Invalid(String),
}
