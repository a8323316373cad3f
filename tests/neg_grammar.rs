//! Grammars that must be rejected, and grammars that build with warnings.

use bytelex::{Diagnostic, Grammar, GrammarFile, RuleSpec, SpecError, build_grammar};

fn err(g: &Grammar) -> SpecError {
    build_grammar(g).expect_err("grammar should be rejected")
}

#[test]
fn empty_grammar() {
    assert_eq!(err(&Grammar::new()), SpecError::EmptyGrammar);
}

#[test]
fn malformed_pattern_names_the_rule() {
    let mut g = Grammar::new();
    g.literal("ok", "x").pattern("broken", "[a-");
    match err(&g) {
        SpecError::Pattern { rule, token, .. } => {
            assert_eq!(rule, 1);
            assert_eq!(token, "broken");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn anchors_are_not_byte_patterns() {
    let mut g = Grammar::new();
    g.pattern("line_start", "^x");
    assert!(matches!(err(&g), SpecError::Pattern { rule: 0, .. }));
}

#[test]
fn undeclared_condition() {
    let mut g = Grammar::new();
    g.rule(RuleSpec::literal("q", "\"").then("string"));
    assert_eq!(
        err(&g),
        SpecError::UnknownCondition {
            rule: 0,
            token: "q".into(),
            condition: "string".into(),
        }
    );
}

#[test]
fn fragments_must_exist_and_not_recurse() {
    let mut g = Grammar::new();
    g.pattern("n", "{digits}+");
    assert!(matches!(err(&g), SpecError::UnknownFragment { .. }));

    let mut g = Grammar::new();
    g.fragment("a", "x{b}").fragment("b", "{a}y").pattern("n", "{a}");
    assert!(matches!(err(&g), SpecError::FragmentCycle(_)));
}

#[test]
fn pattern_that_matches_nothing() {
    let mut g = Grammar::new();
    g.pattern("never", r"[^\x00-\xFF]");
    assert_eq!(
        err(&g),
        SpecError::Unsatisfiable {
            rule: 0,
            token: "never".into(),
        }
    );
}

#[test]
fn too_many_token_kinds() {
    let mut g = Grammar::new();
    for i in 0..4096 {
        g.literal(&format!("t{i}"), &format!("k{i};"));
    }
    assert_eq!(
        err(&g),
        SpecError::TooManyTokenKinds {
            count: 4097,
            max: 4096,
        }
    );
}

#[test]
fn json_rule_without_pattern() {
    let json = br#"{ "rules": [ { "token": "a" } ] }"#;
    let g = GrammarFile::from_json(json).unwrap().into_grammar();
    assert!(matches!(err(&g), SpecError::MissingPattern { rule: 0, .. }));
}

#[test]
fn warnings_do_not_stop_the_build() {
    let mut g = Grammar::new();
    g.pattern("word", "[a-z]+")
        .literal("kw", "if")
        .pattern("num", "[0-9]+")
        .pattern("float", r"[0-9]+\.[0-9]+")
        .pattern("rest", r"#(?s:.)*");
    let report = build_grammar(&g).unwrap();
    let d = &report.diagnostics;
    assert!(d.contains(&Diagnostic::UnreachableRule {
        rule: 1,
        token: "kw".into(),
        condition: "default".into(),
    }));
    assert!(d.contains(&Diagnostic::NoBacktrack {
        rule: 2,
        token: "num".into(),
        condition: "default".into(),
    }));
    assert!(d.contains(&Diagnostic::EofOnlyRule {
        rule: 4,
        token: "rest".into(),
        condition: "default".into(),
    }));
    assert_eq!(d.len(), 3, "{d:?}");
    assert!(d[0].to_string().contains("unused"));
}
