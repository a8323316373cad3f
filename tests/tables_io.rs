//! Saved tables scan exactly like the tables they were saved from.

use std::path::PathBuf;

use bytelex::{
    GrammarFile, TableError, build_grammar,
    lexer::{
        lex,
        tables::{load_tables_path, save_tables_bin, save_tables_json},
    },
};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("bytelex-tables-io-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

#[test]
fn saved_tables_scan_identically() {
    let g = GrammarFile::from_json(include_bytes!("../grammars/demo.json"))
        .unwrap()
        .into_grammar();
    let t = build_grammar(&g).unwrap().tables;
    let src: &[u8] = b"if (a <= 10) { return \"x\\ty\"; } /* done */ @";
    let want = lex(&t, src);

    let bin = scratch("demo.bin");
    save_tables_bin(&bin, &t).unwrap();
    let from_bin = load_tables_path(&bin).unwrap();
    assert_eq!(from_bin, t);
    assert_eq!(lex(&from_bin, src), want);

    let json = scratch("demo.json");
    save_tables_json(&json, &t).unwrap();
    let from_json = load_tables_path(&json).unwrap();
    assert_eq!(from_json, t);
    assert_eq!(lex(&from_json, src), want);
}

#[test]
fn garbage_is_rejected() {
    let p = scratch("garbage.bin");
    std::fs::write(&p, b"definitely not tables").unwrap();
    assert!(matches!(load_tables_path(&p), Err(TableError::BadMagic)));

    let p = scratch("garbage.json");
    std::fs::write(&p, b"{\"n_states\": 1}").unwrap();
    assert!(matches!(load_tables_path(&p), Err(TableError::Json(_))));

    assert!(matches!(
        load_tables_path(&scratch("missing.bin")),
        Err(TableError::Io(_))
    ));
}
