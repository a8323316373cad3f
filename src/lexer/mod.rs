// src/lexer/mod.rs
pub mod collect;
pub mod scanner;
pub mod tables;

pub use collect::{Token, lex, lex_chunked, lex_from};
pub use scanner::{Phase, Scanner};
