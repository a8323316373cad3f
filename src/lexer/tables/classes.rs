// src/lexer/tables/classes.rs
// Alphabet compression: bytes whose column of transition words is identical
// in every state share one equivalence class.
use hashbrown::HashMap;
use rayon::prelude::*;

use super::pack::Packed;

#[derive(Debug, Clone)]
pub struct ClassMap {
    /// Class id per byte.
    pub class_of: [u32; 256],
    pub n_classes: usize,
    /// Class-major: `transitions[class * n_states + state]`.
    pub transitions: Vec<u32>,
}

/// Intern per-byte columns. Classes are numbered by the first byte that
/// uses them. With `compress == false` every byte is its own class.
pub fn compress(packed: &Packed, compress: bool) -> ClassMap {
    let n = packed.n_states();

    let columns: Vec<Vec<u32>> = (0..256usize)
        .into_par_iter()
        .map(|b| (0..n).map(|s| packed.word(s, b as u8).bits()).collect())
        .collect();

    let mut class_of = [0u32; 256];
    let mut transitions = Vec::new();
    if !compress {
        for (b, col) in columns.iter().enumerate() {
            class_of[b] = b as u32;
            transitions.extend_from_slice(col);
        }
        return ClassMap {
            class_of,
            n_classes: 256,
            transitions,
        };
    }

    let mut ids: HashMap<&[u32], u32> = HashMap::new();
    for (b, col) in columns.iter().enumerate() {
        let next_id = ids.len() as u32;
        let id = *ids.entry(col.as_slice()).or_insert_with(|| {
            transitions.extend_from_slice(col);
            next_id
        });
        class_of[b] = id;
    }
    ClassMap {
        class_of,
        n_classes: ids.len(),
        transitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::lexer::tables::build::build_automaton;
    use crate::lexer::tables::pack::pack;

    fn packed(g: &Grammar) -> Packed {
        let parsed = g.parse().unwrap();
        let (a, _) = build_automaton(&parsed);
        pack(&a, parsed.token_names.len()).unwrap()
    }

    #[test]
    fn digits_and_letters_form_classes() {
        let mut g = Grammar::new();
        g.pattern("num", "[0-9]+").pattern("id", "[a-z]+");
        let p = packed(&g);
        let m = compress(&p, true);
        assert_eq!(m.class_of[b'0' as usize], m.class_of[b'9' as usize]);
        assert_eq!(m.class_of[b'a' as usize], m.class_of[b'z' as usize]);
        assert_ne!(m.class_of[b'0' as usize], m.class_of[b'a' as usize]);
        assert_ne!(m.class_of[b'a' as usize], m.class_of[b'{' as usize]);
        assert_eq!(m.class_of[0], 0);
        assert_eq!(m.n_classes, 3);
        assert_eq!(m.transitions.len(), m.n_classes * p.n_states());
    }

    #[test]
    fn columns_are_preserved() {
        let mut g = Grammar::new();
        g.literal("kw", "let").pattern("ws", "[ \t]+");
        let p = packed(&g);
        for compress_alphabet in [true, false] {
            let m = compress(&p, compress_alphabet);
            let n = p.n_states();
            for b in 0..=255u8 {
                let c = m.class_of[b as usize] as usize;
                for s in 0..n {
                    assert_eq!(m.transitions[c * n + s], p.word(s, b).bits());
                }
            }
        }
    }
}
