// src/lexer/tables/mod.rs
pub mod build;
pub mod classes;
pub mod dfa;
pub mod io;
pub mod minimize;
pub mod nfa;
pub mod pack;
pub mod resolve;
pub mod tokens;
pub mod word;

pub use build::{BuildReport, BuildStats, build_grammar, build_tables};
pub use io::{
    load_tables_bin_bytes, load_tables_json_bytes, load_tables_path, save_tables_bin,
    save_tables_json,
};
pub use resolve::Diagnostic;
pub use tokens::{ConditionId, NO_MATCH, TokenKind};
pub use word::TransitionWord;

use crate::error::TableError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartCondition {
    pub name: String,
    pub state: u16,
}

/// Packed scanner tables. Immutable once built; share freely between scanners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    /// byte -> class * n_states (column offset into `transitions`).
    pub class_offset: [u32; 256],
    /// Class-major transition words, n_classes * n_states.
    pub transitions: Vec<u32>,
    /// One word per state, applied once at end of input.
    pub eof: Vec<u32>,
    /// Indexed by token kind; `token_names[0]` is `no_match`.
    pub token_names: Vec<String>,
    /// Declaration order; `conditions[0]` is `default`.
    pub conditions: Vec<StartCondition>,
    pub n_states: u32,
    pub n_classes: u32,
}

impl Tables {
    #[inline(always)]
    pub fn word(&self, state: u16, byte: u8) -> TransitionWord {
        TransitionWord::from_bits(
            self.transitions[self.class_offset[byte as usize] as usize + state as usize],
        )
    }

    #[inline]
    pub fn eof_word(&self, state: u16) -> TransitionWord {
        TransitionWord::from_bits(self.eof[state as usize])
    }

    pub fn class_of(&self, byte: u8) -> u32 {
        self.class_offset[byte as usize] / self.n_states.max(1)
    }

    pub fn token_name(&self, kind: TokenKind) -> Option<&str> {
        self.token_names.get(kind.0 as usize).map(String::as_str)
    }

    /// First kind declared under `name`.
    pub fn token_kind(&self, name: &str) -> Option<TokenKind> {
        self.token_names
            .iter()
            .position(|n| n == name)
            .map(|i| TokenKind(i as u16))
    }

    pub fn condition_id(&self, name: &str) -> Option<ConditionId> {
        self.conditions
            .iter()
            .position(|c| c.name == name)
            .map(|i| ConditionId(i as u16))
    }

    /// Panics if `id` is not a condition of these tables.
    pub fn condition_state(&self, id: ConditionId) -> u16 {
        match self.conditions.get(id.index()) {
            Some(c) => c.state,
            None => panic!(
                "condition {} out of range ({} declared)",
                id.0,
                self.conditions.len()
            ),
        }
    }

    /// Start state of the first declared condition.
    pub fn initial_state(&self) -> u16 {
        self.condition_state(ConditionId::DEFAULT)
    }

    /// Check internal consistency. Loaders call this; the builder's output
    /// always passes.
    pub fn validate(&self) -> Result<(), TableError> {
        let bad = |msg: String| Err(TableError::Invalid(msg));
        let n = self.n_states as usize;
        let classes = self.n_classes as usize;
        if n == 0 || n > tokens::MAX_STATES {
            return bad(format!("state count {n} out of range"));
        }
        if classes == 0 || classes > 256 {
            return bad(format!("class count {classes} out of range"));
        }
        if self.transitions.len() != n * classes {
            return bad(format!(
                "transition matrix has {} words, expected {} x {}",
                self.transitions.len(),
                classes,
                n
            ));
        }
        if self.eof.len() != n {
            return bad(format!("EOF table has {} words, expected {n}", self.eof.len()));
        }
        if self.token_names.is_empty() || self.token_names.len() > tokens::MAX_TOKEN_KINDS {
            return bad(format!("{} token names", self.token_names.len()));
        }
        if self.conditions.is_empty() {
            return bad("no start conditions".into());
        }
        for (b, &off) in self.class_offset.iter().enumerate() {
            if off as usize % n != 0 || off as usize / n >= classes {
                return bad(format!("byte {b:#04x}: bad class offset {off}"));
            }
        }
        for c in &self.conditions {
            if c.state as usize >= n {
                return bad(format!("condition '{}' starts at state {}", c.name, c.state));
            }
        }
        for (i, &bits) in self.transitions.iter().chain(&self.eof).enumerate() {
            let w = TransitionWord::from_bits(bits);
            if !w.is_well_formed() {
                return bad(format!("word {i}: reserved bits set ({bits:#010x})"));
            }
            if w.next_state() as usize >= n {
                return bad(format!("word {i}: next state {} >= {n}", w.next_state()));
            }
            if w.kind().0 as usize >= self.token_names.len() {
                return bad(format!("word {i}: unknown token kind {}", w.kind().0));
            }
        }
        Ok(())
    }
}
