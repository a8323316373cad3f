// src/lexer/tables/pack.rs
// Resolved automaton -> transition words.
//
// An accepting state's missing edges become committing edges that continue
// exactly like the target condition's start state would on the same byte.
// That folds "emit, reset, re-read the byte" into a single table lookup.

use super::dfa::DEAD;
use super::resolve::Automaton;
use super::tokens::{MAX_STATES, MAX_TOKEN_KINDS, NO_MATCH};
use super::word::TransitionWord;
use crate::error::SpecError;

/// State-major packed words, before alphabet compression.
#[derive(Debug, Clone)]
pub struct Packed {
    /// `rows[state * 256 + byte]`.
    pub rows: Vec<TransitionWord>,
    pub eof: Vec<TransitionWord>,
    /// Initial state per condition.
    pub starts: Vec<u16>,
}

impl Packed {
    pub fn n_states(&self) -> usize {
        self.eof.len()
    }

    #[inline]
    pub fn word(&self, state: usize, byte: u8) -> TransitionWord {
        self.rows[state * 256 + byte as usize]
    }
}

pub fn pack(a: &Automaton, n_token_kinds: usize) -> Result<Packed, SpecError> {
    let n = a.states.len();
    if n > MAX_STATES {
        return Err(SpecError::TooManyStates {
            count: n,
            max: MAX_STATES,
        });
    }
    if n_token_kinds > MAX_TOKEN_KINDS {
        return Err(SpecError::TooManyTokenKinds {
            count: n_token_kinds,
            max: MAX_TOKEN_KINDS,
        });
    }

    let mut rows = Vec::with_capacity(n * 256);
    let mut eof = Vec::with_capacity(n);
    for (s, st) in a.states.iter().enumerate() {
        let resume = st
            .accept
            .map(|acc| a.starts[acc.next_condition.index()] as usize);
        for b in 0..256 {
            let t = st.next[b];
            let w = match (t != DEAD, st.accept, resume) {
                (true, _, _) => TransitionWord::shift(NO_MATCH, t as u16),
                (false, Some(acc), Some(r)) => {
                    // Start states are total thanks to the catch-all rule.
                    let via = a.states[r].next[b];
                    let via = if via == DEAD { r as u32 } else { via };
                    TransitionWord::commit(acc.kind, via as u16)
                }
                _ => TransitionWord::shift(NO_MATCH, s as u16),
            };
            rows.push(w);
        }
        eof.push(match (st.accept, resume) {
            (Some(acc), Some(r)) => TransitionWord::commit(acc.kind, r as u16),
            _ => TransitionWord::shift(NO_MATCH, s as u16),
        });

        #[cfg(feature = "table-debug")]
        log::debug!(
            "[tables] state {s}: accept={:?} eof={:#010x} row={:08x?}",
            st.accept,
            eof[s].bits(),
            rows[s * 256..].iter().map(|w| w.bits()).collect::<Vec<_>>()
        );
    }

    Ok(Packed {
        rows,
        eof,
        starts: a.starts.iter().map(|&s| s as u16).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tables::resolve::{Accept, State};
    use crate::lexer::tables::tokens::{ConditionId, TokenKind};

    // Condition 0: 0 -a-> 1 (kind 1). Catch-all elsewhere goes to 2 (no_match).
    fn tiny() -> Automaton {
        let mut start = vec![2; 256];
        start[b'a' as usize] = 1;
        let accept = |k| {
            Some(Accept {
                kind: TokenKind(k),
                next_condition: ConditionId::DEFAULT,
            })
        };
        Automaton {
            states: vec![
                State {
                    next: start,
                    accept: None,
                },
                State {
                    next: vec![DEAD; 256],
                    accept: accept(1),
                },
                State {
                    next: vec![DEAD; 256],
                    accept: accept(0),
                },
            ],
            starts: vec![0],
        }
    }

    #[test]
    fn missing_edges_commit_and_restart() {
        let p = pack(&tiny(), 2).unwrap();
        let w = p.word(1, b'a');
        assert!(w.is_commit());
        assert_eq!(w.kind(), TokenKind(1));
        assert_eq!(w.next_state(), 1);

        let w = p.word(1, b'z');
        assert!(w.is_commit());
        assert_eq!(w.next_state(), 2);

        let w = p.word(0, b'a');
        assert!(!w.is_commit());
        assert_eq!(w.next_state(), 1);
    }

    #[test]
    fn eof_words() {
        let p = pack(&tiny(), 2).unwrap();
        assert_eq!(p.eof[0], TransitionWord::shift(NO_MATCH, 0));
        assert_eq!(p.eof[1], TransitionWord::commit(TokenKind(1), 0));
        assert_eq!(p.eof[2], TransitionWord::commit(NO_MATCH, 0));
    }

    #[test]
    fn capacity_errors() {
        assert_eq!(
            pack(&tiny(), MAX_TOKEN_KINDS + 1).unwrap_err(),
            SpecError::TooManyTokenKinds {
                count: MAX_TOKEN_KINDS + 1,
                max: MAX_TOKEN_KINDS,
            }
        );
        // Rejected before any row is read, so the filler rows can stay empty.
        let mut big = tiny();
        let filler = State {
            next: Vec::new(),
            accept: None,
        };
        big.states.resize(MAX_STATES + 1, filler);
        assert!(matches!(
            pack(&big, 2),
            Err(SpecError::TooManyStates { .. })
        ));
    }
}
