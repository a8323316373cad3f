// src/lexer/tables/minimize.rs
// Moore-style partition refinement over the merged automaton.
use hashbrown::HashMap;

use super::dfa::DEAD;
use super::resolve::{Accept, Automaton, State};

/// Merge states that commit the same thing and agree, byte for byte, on the
/// block they move to. Block ids are assigned in state order, so state 0
/// stays state 0.
pub fn minimize(a: &Automaton) -> Automaton {
    let n = a.states.len();

    let mut block = vec![0u32; n];
    let mut count = {
        let mut ids: HashMap<Option<Accept>, u32> = HashMap::new();
        for (s, st) in a.states.iter().enumerate() {
            let next_id = ids.len() as u32;
            block[s] = *ids.entry(st.accept).or_insert(next_id);
        }
        ids.len()
    };

    let mut sig = Vec::with_capacity(257);
    loop {
        let mut ids: HashMap<Vec<u32>, u32> = HashMap::with_capacity(count);
        let mut refined = vec![0u32; n];
        for (s, st) in a.states.iter().enumerate() {
            sig.clear();
            sig.push(block[s]);
            sig.extend(
                st.next
                    .iter()
                    .map(|&t| if t == DEAD { DEAD } else { block[t as usize] }),
            );
            let next_id = ids.len() as u32;
            refined[s] = match ids.get(&sig) {
                Some(&id) => id,
                None => {
                    ids.insert(sig.clone(), next_id);
                    next_id
                }
            };
        }
        block = refined;
        let stable = ids.len() == count;
        count = ids.len();
        if stable {
            break;
        }
    }

    let mut rep: Vec<Option<usize>> = vec![None; count];
    for (s, &b) in block.iter().enumerate() {
        rep[b as usize].get_or_insert(s);
    }
    let states = rep
        .into_iter()
        .flatten()
        .map(|s| {
            let st = &a.states[s];
            State {
                next: st
                    .next
                    .iter()
                    .map(|&t| if t == DEAD { DEAD } else { block[t as usize] })
                    .collect(),
                accept: st.accept,
            }
        })
        .collect();

    Automaton {
        states,
        starts: a.starts.iter().map(|&s| block[s as usize]).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tables::tokens::{ConditionId, TokenKind};

    fn state(edges: &[(u8, u32)], accept: Option<u16>) -> State {
        let mut next = vec![DEAD; 256];
        for &(b, t) in edges {
            next[b as usize] = t;
        }
        State {
            next,
            accept: accept.map(|k| Accept {
                kind: TokenKind(k),
                next_condition: ConditionId::DEFAULT,
            }),
        }
    }

    #[test]
    fn equivalent_tails_merge() {
        // 0 -a-> 1 -x-> 3, 0 -b-> 2 -x-> 4; 1~2 and 3~4.
        let a = Automaton {
            states: vec![
                state(&[(b'a', 1), (b'b', 2)], None),
                state(&[(b'x', 3)], Some(1)),
                state(&[(b'x', 4)], Some(1)),
                state(&[], Some(2)),
                state(&[], Some(2)),
            ],
            starts: vec![0],
        };
        let m = minimize(&a);
        assert_eq!(m.states.len(), 3);
        assert_eq!(m.starts, [0]);
        assert_eq!(m.states[0].next[b'a' as usize], m.states[0].next[b'b' as usize]);
    }

    #[test]
    fn different_accepts_stay_apart() {
        let a = Automaton {
            states: vec![
                state(&[(b'a', 1), (b'b', 2)], None),
                state(&[], Some(1)),
                state(&[], Some(2)),
            ],
            starts: vec![0],
        };
        assert_eq!(minimize(&a).states.len(), 3);
    }

    #[test]
    fn identical_conditions_share_states() {
        let a = Automaton {
            states: vec![
                state(&[(b'a', 1)], None),
                state(&[], Some(1)),
                state(&[(b'a', 3)], None),
                state(&[], Some(1)),
            ],
            starts: vec![0, 2],
        };
        let m = minimize(&a);
        assert_eq!(m.states.len(), 2);
        assert_eq!(m.starts, [0, 0]);
    }
}
