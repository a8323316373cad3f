// src/bin/gen_lex_tables.rs
// Compile a JSON grammar into scanner tables.
//
//   gen_lex_tables <grammar.json> [out]
//
// `out` defaults to tables/lexer_tables.bin; a `.json` extension writes JSON.
// Diagnostics are printed as warnings; LEX_STRICT=1 turns them into a failure.

use std::{fs, path::PathBuf, time::Instant};

use anyhow::{Context, Result, bail};
use bytelex::{
    GrammarFile, build_grammar,
    lexer::tables::{save_tables_bin, save_tables_json},
};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(grammar_path) = args.next().map(PathBuf::from) else {
        bail!("usage: gen_lex_tables <grammar.json> [out.bin|out.json]");
    };
    let out_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tables/lexer_tables.bin"));
    let strict = std::env::var("LEX_STRICT").ok().as_deref() == Some("1");

    let t0 = Instant::now();
    let grammar = GrammarFile::load(&grammar_path)?.into_grammar();
    let report = build_grammar(&grammar)
        .with_context(|| format!("compiling {}", grammar_path.display()))?;

    for d in &report.diagnostics {
        eprintln!("[gen_lex_tables] warning: {d}");
    }
    if strict && !report.diagnostics.is_empty() {
        bail!("{} diagnostics with LEX_STRICT=1", report.diagnostics.len());
    }

    if let Some(dir) = out_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = out_path.extension().is_some_and(|e| e == "json");
    let saved = if json {
        save_tables_json(&out_path, &report.tables)
    } else {
        save_tables_bin(&out_path, &report.tables)
    };
    saved.with_context(|| format!("writing {}", out_path.display()))?;

    let t = &report.tables;
    let bytes = fs::metadata(&out_path).map(|m| m.len()).unwrap_or(0);
    println!(
        "[gen_lex_tables] {} rules, {} conditions, {} token kinds",
        grammar.rules().len(),
        t.conditions.len(),
        t.token_names.len()
    );
    println!(
        "[gen_lex_tables] states {} -> {}  classes {}  words {}",
        report.stats.dfa_states,
        t.n_states,
        t.n_classes,
        t.transitions.len()
    );
    println!(
        "[gen_lex_tables] wrote {} bytes (~{:.1} KiB) -> {} in {} ms",
        bytes,
        bytes as f64 / 1024.0,
        out_path.display(),
        t0.elapsed().as_millis()
    );
    Ok(())
}
