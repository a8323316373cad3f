// src/lexer/tables/resolve.rs
// Compile-time conflict resolution: exactly one accept annotation per DFA state.

use core::fmt;

use super::dfa::{DEAD, Dfa};
use super::tokens::{ConditionId, NO_MATCH, TokenKind};
use crate::grammar::Rule;

/// What a state commits when the next byte has no transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Accept {
    pub kind: TokenKind,
    pub next_condition: ConditionId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// `next[byte]`: state index or [`DEAD`].
    pub next: Vec<u32>,
    pub accept: Option<Accept>,
}

/// Resolved states of every condition in one index space.
#[derive(Debug, Clone)]
pub struct Automaton {
    pub states: Vec<State>,
    /// Start state per condition.
    pub starts: Vec<u32>,
}

impl Automaton {
    /// Concatenate per-condition state lists (each with its start at 0).
    pub fn merge(parts: Vec<Vec<State>>) -> Self {
        let mut states = Vec::with_capacity(parts.iter().map(Vec::len).sum());
        let mut starts = Vec::with_capacity(parts.len());
        for part in parts {
            let base = states.len() as u32;
            starts.push(base);
            states.extend(part.into_iter().map(|mut s| {
                for t in s.next.iter_mut().filter(|t| **t != DEAD) {
                    *t += base;
                }
                s
            }));
        }
        Self { states, starts }
    }
}

/// Build warnings. None of these stop table generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The rule never wins a state in `condition`.
    UnreachableRule {
        rule: usize,
        token: String,
        condition: String,
    },
    /// The rule only wins states that continue on every byte, so it can only
    /// be committed by end of input.
    EofOnlyRule {
        rule: usize,
        token: String,
        condition: String,
    },
    /// After the rule's match, some byte leads into states that accept
    /// nothing; input that dead-ends there yields `no_match` instead of the
    /// shorter match.
    NoBacktrack {
        rule: usize,
        token: String,
        condition: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnreachableRule {
                rule,
                token,
                condition,
            } => write!(f, "rule #{rule} ({token}) is unused in condition '{condition}'"),
            Diagnostic::EofOnlyRule {
                rule,
                token,
                condition,
            } => write!(
                f,
                "rule #{rule} ({token}) in condition '{condition}' only matches at end of input"
            ),
            Diagnostic::NoBacktrack {
                rule,
                token,
                condition,
            } => write!(
                f,
                "rule #{rule} ({token}) in condition '{condition}' can be overrun by a longer \
                 partial match; the scanner does not backtrack"
            ),
        }
    }
}

/// Annotate each state of one condition's DFA. `rules[rank]` must be the
/// condition's rules in priority order; ranks past the end are the
/// catch-all and resolve to `no_match`.
pub fn resolve_condition(
    dfa: &Dfa,
    condition: ConditionId,
    condition_name: &str,
    rules: &[&Rule],
) -> (Vec<State>, Vec<Diagnostic>) {
    let fallback = Accept {
        kind: NO_MATCH,
        next_condition: condition,
    };

    let mut wins = vec![0usize; rules.len()];
    let mut wins_incomplete = vec![false; rules.len()];
    let mut overrun = vec![false; rules.len()];

    let states: Vec<State> = dfa
        .states
        .iter()
        .enumerate()
        .map(|(i, s)| {
            // The start state never accepts: an empty match is no token.
            let accept = if i == 0 {
                None
            } else {
                match s.winner.and_then(|r| rules.get(r).map(|rule| (r, rule))) {
                    Some((r, rule)) => {
                        wins[r] += 1;
                        if !s.is_complete() {
                            wins_incomplete[r] = true;
                        }
                        let dead_ends = s.next.iter().any(|&t| {
                            t != DEAD && dfa.states[t as usize].winner.is_none()
                        });
                        if dead_ends {
                            overrun[r] = true;
                        }
                        Some(Accept {
                            kind: rule.kind,
                            next_condition: rule.next_condition,
                        })
                    }
                    None => Some(fallback),
                }
            };
            State {
                next: s.next.clone(),
                accept,
            }
        })
        .collect();

    let mut diags = Vec::new();
    for (r, rule) in rules.iter().enumerate() {
        let (id, token, condition) = (rule.source, &rule.token, condition_name);
        if wins[r] == 0 {
            diags.push(Diagnostic::UnreachableRule {
                rule: id,
                token: token.clone(),
                condition: condition.to_string(),
            });
            continue;
        }
        if !wins_incomplete[r] {
            diags.push(Diagnostic::EofOnlyRule {
                rule: id,
                token: token.clone(),
                condition: condition.to_string(),
            });
        }
        if overrun[r] {
            diags.push(Diagnostic::NoBacktrack {
                rule: id,
                token: token.clone(),
                condition: condition.to_string(),
            });
        }
    }
    (states, diags)
}
