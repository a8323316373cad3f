// src/lexer/tables/tokens.rs
use core::fmt;

use serde::{Deserialize, Serialize};

/// Token kind id as stored in the 12-bit field of a transition word.
///
/// Ids are assigned by the table builder in order of first declaration; id 0
/// is reserved for input that no rule matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct TokenKind(pub u16);

impl TokenKind {
    #[inline]
    pub const fn id(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn is_no_match(self) -> bool {
        self.0 == NO_MATCH.0
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind recorded for bytes that no rule matches.
pub const NO_MATCH: TokenKind = TokenKind(0);

/// Diagnostic name of [`NO_MATCH`] in the token name table.
pub const NO_MATCH_NAME: &str = "no_match";

/// Capacity of the 12-bit kind field (including [`NO_MATCH`]).
pub const MAX_TOKEN_KINDS: usize = 1 << 12;

/// Capacity of the 16-bit next-state field.
pub const MAX_STATES: usize = 1 << 16;

/// Index of a start condition in the artifact's condition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ConditionId(pub u16);

impl ConditionId {
    /// The implicit `default` condition is always declared first.
    pub const DEFAULT: ConditionId = ConditionId(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
