// src/lib.rs
//! Byte-level lexer generator: rules -> minimized DFA -> packed tables, plus
//! the allocation-free scanner that runs them.

pub mod error;
pub mod grammar;
pub mod lexer;

pub use error::{SpecError, TableError};
pub use grammar::{BuildOptions, Grammar, GrammarFile, RuleSpec};
pub use lexer::{
    Scanner, Token,
    tables::{BuildReport, ConditionId, Diagnostic, NO_MATCH, Tables, TokenKind, build_grammar},
};
