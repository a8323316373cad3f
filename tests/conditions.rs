//! Exclusive start conditions: rule-directed switches and `set_state`.

use bytelex::{ConditionId, Grammar, GrammarFile, RuleSpec, Scanner, Tables, TokenKind, build_grammar};
use bytelex::lexer::{lex, lex_from};

fn string_grammar() -> Tables {
    let mut g = Grammar::new();
    g.condition("string")
        .pattern("word", "[a-z]+")
        .pattern("ws", " +")
        .rule(RuleSpec::literal("open", "\"").then("string"))
        .rule(RuleSpec::pattern("text", "[^\"]+").within(["string"]))
        .rule(RuleSpec::literal("close", "\"").within(["string"]).then("default"));
    build_grammar(&g).unwrap().tables
}

fn names(t: &Tables, input: &[u8], toks: &[bytelex::Token]) -> Vec<String> {
    toks.iter()
        .map(|k| {
            format!(
                "{}:{}",
                t.token_name(k.kind).unwrap(),
                String::from_utf8_lossy(k.lexeme(input))
            )
        })
        .collect()
}

#[test]
fn rules_switch_conditions() {
    let t = string_grammar();
    let src = b"say \"hi there\" ok";
    let got = names(&t, src, &lex(&t, src));
    assert_eq!(
        got,
        [
            "word:say",
            "ws: ",
            "open:\"",
            "text:hi there",
            "close:\"",
            "ws: ",
            "word:ok"
        ]
    );
}

#[test]
fn lex_from_starts_in_the_given_condition() {
    let t = string_grammar();
    let string = t.condition_id("string").unwrap();
    let src = b"a b\" c";
    let got = names(&t, src, &lex_from(&t, src, string));
    assert_eq!(got, ["text:a b", "close:\"", "ws: ", "word:c"]);
}

#[test]
fn set_state_switches_mid_stream() {
    let t = string_grammar();
    let string = t.condition_id("string").unwrap();
    assert_eq!(t.condition_id("default"), Some(ConditionId::DEFAULT));
    assert_eq!(t.condition_id("nope"), None);

    let mut kinds = vec![TokenKind(0); 16];
    let mut ends = vec![0usize; 16];
    let mut sc = Scanner::new(&t);
    sc.set_buffers(&mut kinds, &mut ends);
    // Caller-driven switch at a token boundary: "ab" then the rest as string text.
    sc.feed(b"ab ", 0);
    sc.run();
    assert_eq!(sc.token_count(), 1);
    sc.set_state(string);
    sc.feed(b"x y", 3);
    sc.run();
    sc.finalize();
    let kinds: Vec<&str> = sc
        .token_kinds()
        .iter()
        .map(|&k| sc.token_name(k).unwrap())
        .collect();
    // The pending " " was abandoned by the switch; "x y" is one string text
    // token that starts at the last committed end.
    assert_eq!(kinds, ["word", "text"]);
    assert_eq!(sc.token_ends(), [2, 6]);
}

#[test]
fn all_condition_rules_apply_everywhere() {
    let json = br#"{
        "conditions": ["a", "b"],
        "rules": [
            { "token": "nl", "literal": "\n", "conditions": ["all"] },
            { "token": "to_a", "literal": "A", "next": "a" },
            { "token": "in_a", "pattern": "[a-z]+", "conditions": ["a"] },
            { "token": "to_b", "literal": "B", "conditions": ["a"], "next": "b" },
            { "token": "in_b", "pattern": "[0-9]+", "conditions": ["b"] }
        ]
    }"#;
    let g = GrammarFile::from_json(json).unwrap().into_grammar();
    let t = build_grammar(&g).unwrap().tables;
    let src = b"\nAxy\nB12\n";
    let got = names(&t, src, &lex(&t, src));
    assert_eq!(
        got,
        [
            "nl:\n", "to_a:A", "in_a:xy", "nl:\n", "to_b:B", "in_b:12", "nl:\n"
        ]
    );
}

#[test]
fn unmatched_bytes_keep_the_current_condition() {
    let t = string_grammar();
    // '\x01' has no rule in default; stays in default afterwards.
    let src = b"\x01ab";
    let got = names(&t, src, &lex(&t, src));
    assert_eq!(got, ["no_match:\u{1}", "word:ab"]);
}
