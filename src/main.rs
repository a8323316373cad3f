// src/main.rs
use bytelex::{GrammarFile, build_grammar, lexer::lex};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let grammar = GrammarFile::from_json(include_bytes!("../grammars/demo.json"))?.into_grammar();
    let report = build_grammar(&grammar)?;
    for d in &report.diagnostics {
        eprintln!("warning: {d}");
    }
    let tables = &report.tables;
    println!(
        "tables: {} states, {} classes, {} token kinds",
        tables.n_states,
        tables.n_classes,
        tables.token_names.len()
    );

    // A tiny sample covering keywords, comments, strings and operators.
    let src = br#"
        while (n >= 10) { n = n - 10; } // hello
        /* multi
           line */ if (x == "a\"b") return f(1, 2) -> y;
        @
    "#;

    println!("TOKENS:");
    for t in lex(tables, src) {
        let name = tables.token_name(t.kind).unwrap_or("?");
        if name == "ws" {
            continue;
        }
        println!("{name:<14} {:?}", String::from_utf8_lossy(t.lexeme(src)));
    }
    Ok(())
}
