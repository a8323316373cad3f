// src/lexer/tables/dfa.rs
// Subset construction over one condition's NFA.
use hashbrown::HashMap;

use super::nfa::Nfa;

/// Missing transition.
pub const DEAD: u32 = u32::MAX;

#[derive(Debug, Clone)]
pub struct DfaState {
    /// `next[byte]` is a state index or [`DEAD`].
    pub next: Vec<u32>,
    /// Lowest rule rank among the NFA terminals in this state.
    pub winner: Option<usize>,
}

impl DfaState {
    pub fn is_complete(&self) -> bool {
        self.next.iter().all(|&t| t != DEAD)
    }
}

/// Deterministic automaton; state 0 is the start state.
#[derive(Debug, Clone)]
pub struct Dfa {
    pub states: Vec<DfaState>,
}

pub fn determinize(nfa: &Nfa) -> Dfa {
    let mut seen = vec![false; nfa.len()];
    let mut ids: HashMap<Vec<usize>, u32> = HashMap::new();
    let mut sets: Vec<Vec<usize>> = Vec::new();
    let mut states: Vec<DfaState> = Vec::new();

    let start = nfa.closure(&[nfa.entry], &mut seen);
    ids.insert(start.clone(), 0);
    sets.push(start);

    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); 256];
    let mut work = 0;
    while work < sets.len() {
        for b in buckets.iter_mut() {
            b.clear();
        }
        for &n in &sets[work] {
            for &(range, to) in &nfa.nodes[n].edges {
                for b in range.start..=range.end {
                    buckets[b as usize].push(to);
                }
            }
        }

        for bucket in buckets.iter_mut() {
            bucket.sort_unstable();
            bucket.dedup();
        }

        // Many bytes share the same move set; close each distinct one once.
        let mut local: HashMap<&[usize], u32> = HashMap::new();
        let mut next = vec![DEAD; 256];
        for (b, bucket) in buckets.iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            if let Some(&id) = local.get(bucket.as_slice()) {
                next[b] = id;
                continue;
            }
            let set = nfa.closure(bucket, &mut seen);
            let id = match ids.get(&set) {
                Some(&id) => id,
                None => {
                    let id = sets.len() as u32;
                    ids.insert(set.clone(), id);
                    sets.push(set);
                    id
                }
            };
            local.insert(bucket.as_slice(), id);
            next[b] = id;
        }

        let winner = sets[work]
            .iter()
            .filter_map(|&n| nfa.nodes[n].terminal)
            .min();
        states.push(DfaState { next, winner });
        work += 1;
    }

    Dfa { states }
}
