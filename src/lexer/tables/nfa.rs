// src/lexer/tables/nfa.rs
// Thompson construction: one NFA per start condition, every rule hung off a
// shared entry node.

use crate::grammar::pattern::{ByteRange, PatternExpr};

#[derive(Debug, Clone, Default)]
pub struct NfaNode {
    pub eps: Vec<usize>,
    pub edges: Vec<(ByteRange, usize)>,
    /// Rank of the rule that ends here (lower wins).
    pub terminal: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Nfa {
    pub nodes: Vec<NfaNode>,
    pub entry: usize,
}

impl Nfa {
    /// `patterns[i]` becomes rank `i`. A catch-all single-byte rule is added
    /// with rank `patterns.len()` so every byte has somewhere to go.
    pub fn for_condition<'a>(patterns: impl IntoIterator<Item = &'a PatternExpr>) -> Self {
        let mut nfa = Nfa {
            nodes: Vec::new(),
            entry: 0,
        };
        nfa.entry = nfa.add_node();

        let mut rank = 0;
        for pattern in patterns {
            let (start, end) = nfa.compile(pattern);
            nfa.nodes[nfa.entry].eps.push(start);
            nfa.nodes[end].terminal = Some(rank);
            rank += 1;
        }

        let end = nfa.add_node();
        nfa.nodes[nfa.entry].edges.push((ByteRange::ANY, end));
        nfa.nodes[end].terminal = Some(rank);
        nfa
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn add_node(&mut self) -> usize {
        self.nodes.push(NfaNode::default());
        self.nodes.len() - 1
    }

    fn add_eps(&mut self, from: usize, to: usize) {
        self.nodes[from].eps.push(to);
    }

    fn add_edge(&mut self, from: usize, range: ByteRange, to: usize) {
        self.nodes[from].edges.push((range, to));
    }

    fn empty_fragment(&mut self) -> (usize, usize) {
        let start = self.add_node();
        let end = self.add_node();
        self.add_eps(start, end);
        (start, end)
    }

    fn compile(&mut self, pattern: &PatternExpr) -> (usize, usize) {
        match pattern {
            PatternExpr::Empty => self.empty_fragment(),
            PatternExpr::Literal(bytes) => {
                let start = self.add_node();
                let mut prev = start;
                for &b in bytes {
                    let next = self.add_node();
                    self.add_edge(prev, ByteRange::single(b), next);
                    prev = next;
                }
                (start, prev)
            }
            PatternExpr::Class(ranges) => {
                let start = self.add_node();
                let end = self.add_node();
                for &r in ranges {
                    self.add_edge(start, r, end);
                }
                (start, end)
            }
            PatternExpr::Sequence(parts) => {
                let Some((first, rest)) = parts.split_first() else {
                    return self.empty_fragment();
                };
                let (start, mut end) = self.compile(first);
                for part in rest {
                    let (s, e) = self.compile(part);
                    self.add_eps(end, s);
                    end = e;
                }
                (start, end)
            }
            PatternExpr::Alternate(parts) => {
                let start = self.add_node();
                let end = self.add_node();
                for part in parts {
                    let (s, e) = self.compile(part);
                    self.add_eps(start, s);
                    self.add_eps(e, end);
                }
                (start, end)
            }
            PatternExpr::Repeat { inner, min, max } => self.compile_repeat(inner, *min, *max),
        }
    }

    fn compile_repeat(&mut self, inner: &PatternExpr, min: u32, max: Option<u32>) -> (usize, usize) {
        let start = self.add_node();
        let end = self.add_node();
        let mut current = start;
        for _ in 0..min {
            let (s, e) = self.compile(inner);
            self.add_eps(current, s);
            current = e;
        }
        self.add_eps(current, end);
        match max {
            Some(limit) => {
                for _ in min..limit {
                    let (s, e) = self.compile(inner);
                    self.add_eps(current, s);
                    self.add_eps(e, end);
                    current = e;
                }
            }
            None => {
                let (s, e) = self.compile(inner);
                self.add_eps(current, s);
                self.add_eps(e, s);
                self.add_eps(e, end);
            }
        }
        (start, end)
    }

    /// Epsilon closure of `seeds`, returned sorted and deduplicated.
    pub fn closure(&self, seeds: &[usize], seen: &mut [bool]) -> Vec<usize> {
        let mut stack: Vec<usize> = seeds.to_vec();
        let mut out = Vec::new();
        while let Some(n) = stack.pop() {
            if seen[n] {
                continue;
            }
            seen[n] = true;
            out.push(n);
            stack.extend(self.nodes[n].eps.iter().copied().filter(|&m| !seen[m]));
        }
        for &n in &out {
            seen[n] = false;
        }
        out.sort_unstable();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::pattern::parse_pattern;

    fn matches(nfa: &Nfa, input: &[u8]) -> Option<usize> {
        let mut seen = vec![false; nfa.len()];
        let mut set = nfa.closure(&[nfa.entry], &mut seen);
        for &b in input {
            let next: Vec<usize> = set
                .iter()
                .flat_map(|&n| nfa.nodes[n].edges.iter())
                .filter(|(r, _)| r.contains(b))
                .map(|&(_, t)| t)
                .collect();
            set = nfa.closure(&next, &mut seen);
        }
        set.iter().filter_map(|&n| nfa.nodes[n].terminal).min()
    }

    #[test]
    fn bounded_and_unbounded_repeats() {
        let a = parse_pattern("ab{2,3}").unwrap();
        let b = parse_pattern("c+").unwrap();
        let nfa = Nfa::for_condition([&a, &b]);
        assert_eq!(matches(&nfa, b"ab"), None);
        assert_eq!(matches(&nfa, b"abb"), Some(0));
        assert_eq!(matches(&nfa, b"abbb"), Some(0));
        assert_eq!(matches(&nfa, b"abbbb"), None);
        assert_eq!(matches(&nfa, b"cccc"), Some(1));
        assert_eq!(matches(&nfa, b""), None);
    }

    #[test]
    fn catch_all_ranks_last() {
        let a = parse_pattern("x").unwrap();
        let nfa = Nfa::for_condition([&a]);
        let last = nfa.nodes.iter().filter_map(|n| n.terminal).max();
        assert_eq!(last, Some(1));
        assert_eq!(matches(&nfa, b"x"), Some(0));
        assert_eq!(matches(&nfa, b"y"), Some(1));
        assert_eq!(matches(&nfa, b"yy"), None);
    }
}
