// src/lexer/tables/build.rs
use rayon::prelude::*;
use std::time::Instant;

use super::{
    StartCondition, Tables,
    classes::compress,
    dfa::determinize,
    minimize::minimize,
    nfa::Nfa,
    pack::pack,
    resolve::{Automaton, Diagnostic, resolve_condition},
    tokens::ConditionId,
};
use crate::{
    error::SpecError,
    grammar::{Grammar, ParsedGrammar, Rule},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub nfa_nodes: usize,
    /// Sum over conditions, before minimization.
    pub dfa_states: usize,
    pub states: usize,
    pub classes: usize,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub tables: Tables,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: BuildStats,
}

/// One DFA per condition (in parallel), resolved and merged into one index
/// space. Not minimized, not packed.
pub fn build_automaton(parsed: &ParsedGrammar) -> (Automaton, Vec<Diagnostic>) {
    let (automaton, diags, _) = build_conditions(parsed);
    (automaton, diags)
}

fn build_conditions(parsed: &ParsedGrammar) -> (Automaton, Vec<Diagnostic>, usize) {
    let per_condition: Vec<_> = parsed
        .conditions
        .par_iter()
        .enumerate()
        .map(|(i, name)| {
            let cond = ConditionId(i as u16);
            let rules: Vec<&Rule> = parsed.rules_in(cond).collect();
            let nfa = Nfa::for_condition(rules.iter().map(|r| &r.pattern));
            let dfa = determinize(&nfa);
            log::debug!(
                "[tables] condition '{name}': {} rules, {} NFA nodes, {} DFA states",
                rules.len(),
                nfa.len(),
                dfa.states.len()
            );
            let (states, diags) = resolve_condition(&dfa, cond, name, &rules);
            (states, diags, nfa.len())
        })
        .collect();

    let mut parts = Vec::with_capacity(per_condition.len());
    let mut diagnostics = Vec::new();
    let mut nfa_nodes = 0;
    for (states, diags, nodes) in per_condition {
        parts.push(states);
        diagnostics.extend(diags);
        nfa_nodes += nodes;
    }
    (Automaton::merge(parts), diagnostics, nfa_nodes)
}

pub fn build_tables(parsed: &ParsedGrammar) -> Result<BuildReport, SpecError> {
    let t0 = Instant::now();
    let (merged, diagnostics, nfa_nodes) = build_conditions(parsed);
    let dfa_states = merged.states.len();
    log::info!(
        "[tables] {} conditions -> {} DFA states ({} NFA nodes) in {} ms",
        parsed.conditions.len(),
        dfa_states,
        nfa_nodes,
        t0.elapsed().as_millis()
    );
    for d in &diagnostics {
        log::warn!("[tables] {d}");
    }

    let automaton = if parsed.options.minimize {
        let t1 = Instant::now();
        let m = minimize(&merged);
        log::info!(
            "[tables] minimized {} -> {} states in {} ms",
            dfa_states,
            m.states.len(),
            t1.elapsed().as_millis()
        );
        m
    } else {
        merged
    };

    let packed = pack(&automaton, parsed.token_names.len())?;

    let t2 = Instant::now();
    let classes = compress(&packed, parsed.options.compress_alphabet);
    log::info!(
        "[tables] {} byte classes, {} transition words in {} ms",
        classes.n_classes,
        classes.transitions.len(),
        t2.elapsed().as_millis()
    );

    let n_states = packed.n_states();
    let mut class_offset = [0u32; 256];
    for (b, off) in class_offset.iter_mut().enumerate() {
        *off = classes.class_of[b] * n_states as u32;
    }

    let tables = Tables {
        class_offset,
        transitions: classes.transitions,
        eof: packed.eof.iter().map(|w| w.bits()).collect(),
        token_names: parsed.token_names.clone(),
        conditions: parsed
            .conditions
            .iter()
            .zip(&packed.starts)
            .map(|(name, &state)| StartCondition {
                name: name.clone(),
                state,
            })
            .collect(),
        n_states: n_states as u32,
        n_classes: classes.n_classes as u32,
    };

    let stats = BuildStats {
        nfa_nodes,
        dfa_states,
        states: n_states,
        classes: classes.n_classes,
    };
    log::info!("[tables] total {} ms", t0.elapsed().as_millis());

    Ok(BuildReport {
        tables,
        diagnostics,
        stats,
    })
}

/// Parse and build in one step.
pub fn build_grammar(grammar: &Grammar) -> Result<BuildReport, SpecError> {
    build_tables(&grammar.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::BuildOptions;

    fn grammar() -> Grammar {
        let mut g = Grammar::new();
        g.pattern("ident", "[A-Za-z_][A-Za-z0-9_]*")
            .pattern("number", "[0-9]+")
            .pattern("ws", "[ \t\n]+")
            .literal("plus", "+");
        g
    }

    #[test]
    fn minimized_tables_validate() {
        let report = build_grammar(&grammar()).unwrap();
        report.tables.validate().unwrap();
        assert!(report.diagnostics.is_empty());
        assert!(report.stats.states <= report.stats.dfa_states);
        assert_eq!(report.tables.initial_state(), 0);
        assert!(report.tables.n_classes < 256);
    }

    #[test]
    fn options_disable_compression_and_minimization() {
        let mut g = grammar();
        g.options(BuildOptions {
            compress_alphabet: false,
            minimize: false,
        });
        let report = build_grammar(&g).unwrap();
        report.tables.validate().unwrap();
        assert_eq!(report.tables.n_classes, 256);
        assert_eq!(report.stats.states, report.stats.dfa_states);
    }
}
