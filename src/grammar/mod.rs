// src/grammar/mod.rs
// Rule set front end: builder API, validation and expansion into per-condition rules.

pub mod file;
pub mod pattern;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::SpecError,
    lexer::tables::tokens::{ConditionId, MAX_TOKEN_KINDS, NO_MATCH, NO_MATCH_NAME, TokenKind},
};
pub use file::GrammarFile;
use pattern::{Fragments, PatternExpr, escape_literal, parse_pattern};

/// Name of the condition every grammar starts in. Always condition 0.
pub const DEFAULT_CONDITION: &str = "default";
/// Pseudo-condition that expands to every declared condition.
pub const ALL_CONDITIONS: &str = "all";

/// Table build switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Merge bytes with identical columns into equivalence classes.
    pub compress_alphabet: bool,
    /// Merge equivalent DFA states.
    pub minimize: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            compress_alphabet: true,
            minimize: true,
        }
    }
}

/// One declared rule, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    /// Token name. Rules may share a name; `no_match` maps onto kind 0.
    pub token: String,
    pub pattern: Option<String>,
    pub literal: Option<String>,
    /// Empty means `default`.
    pub conditions: Vec<String>,
    /// Condition entered after this rule's token commits. `None` stays put.
    pub next: Option<String>,
}

impl RuleSpec {
    pub fn pattern(token: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            pattern: Some(pattern.into()),
            literal: None,
            conditions: Vec::new(),
            next: None,
        }
    }

    pub fn literal(token: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            pattern: None,
            literal: Some(text.into()),
            conditions: Vec::new(),
            next: None,
        }
    }

    pub fn within<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = conditions.into_iter().map(Into::into).collect();
        self
    }

    pub fn then(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }
}

/// Declarative rule set. Declaration order is rule priority.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    conditions: Vec<String>,
    fragments: Vec<(String, String)>,
    rules: Vec<RuleSpec>,
    options: BuildOptions,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an exclusive start condition. `default` is implicit.
    pub fn condition(&mut self, name: impl Into<String>) -> &mut Self {
        self.conditions.push(name.into());
        self
    }

    pub fn fragment(&mut self, name: impl Into<String>, pattern: impl Into<String>) -> &mut Self {
        self.fragments.push((name.into(), pattern.into()));
        self
    }

    pub fn rule(&mut self, rule: RuleSpec) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Shorthand for a pattern rule in `default`.
    pub fn pattern(&mut self, token: &str, pattern: &str) -> &mut Self {
        self.rule(RuleSpec::pattern(token, pattern))
    }

    /// Shorthand for a literal rule in `default`.
    pub fn literal(&mut self, token: &str, text: &str) -> &mut Self {
        self.rule(RuleSpec::literal(token, text))
    }

    pub fn options(&mut self, options: BuildOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn rules(&self) -> &[RuleSpec] {
        &self.rules
    }

    /// Validate, parse every pattern and expand multi-condition rules.
    pub fn parse(&self) -> Result<ParsedGrammar, SpecError> {
        if self.rules.is_empty() {
            return Err(SpecError::EmptyGrammar);
        }

        let conditions = self.condition_names()?;
        let cond_ids: HashMap<&str, ConditionId> = conditions
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), ConditionId(i as u16)))
            .collect();

        let mut fragments = Fragments::new(
            self.fragments
                .iter()
                .map(|(name, body)| (name.as_str(), body.as_str())),
        )?;

        let mut token_names = vec![NO_MATCH_NAME.to_string()];
        let mut kinds: HashMap<&str, TokenKind> = HashMap::new();
        kinds.insert(NO_MATCH_NAME, NO_MATCH);

        let mut rules = Vec::new();
        for (idx, spec) in self.rules.iter().enumerate() {
            let pattern = compile_rule(idx, spec, &mut fragments)?;

            let kind = match kinds.get(spec.token.as_str()) {
                Some(&k) => k,
                None => {
                    let k = TokenKind(token_names.len() as u16);
                    token_names.push(spec.token.clone());
                    if token_names.len() > MAX_TOKEN_KINDS {
                        return Err(SpecError::TooManyTokenKinds {
                            count: token_names.len(),
                            max: MAX_TOKEN_KINDS,
                        });
                    }
                    kinds.insert(spec.token.as_str(), k);
                    k
                }
            };

            let lookup = |name: &str| {
                cond_ids
                    .get(name)
                    .copied()
                    .ok_or_else(|| SpecError::UnknownCondition {
                        rule: idx,
                        token: spec.token.clone(),
                        condition: name.to_string(),
                    })
            };

            let next = spec.next.as_deref().map(lookup).transpose()?;

            let mut owners: Vec<ConditionId> = Vec::new();
            if spec.conditions.is_empty() {
                owners.push(ConditionId::DEFAULT);
            }
            for name in &spec.conditions {
                if name == ALL_CONDITIONS {
                    owners.extend((0..conditions.len()).map(|i| ConditionId(i as u16)));
                } else {
                    owners.push(lookup(name)?);
                }
            }
            let mut seen = Vec::with_capacity(owners.len());
            for owner in owners {
                if seen.contains(&owner) {
                    continue;
                }
                seen.push(owner);
                rules.push(Rule {
                    source: idx,
                    token: spec.token.clone(),
                    kind,
                    condition: owner,
                    next_condition: next.unwrap_or(owner),
                    pattern: pattern.clone(),
                });
            }
        }
        drop(cond_ids);

        Ok(ParsedGrammar {
            conditions,
            rules,
            token_names,
            options: self.options,
        })
    }

    fn condition_names(&self) -> Result<Vec<String>, SpecError> {
        let mut names = vec![DEFAULT_CONDITION.to_string()];
        let mut default_declared = false;
        for name in &self.conditions {
            if name == DEFAULT_CONDITION {
                if default_declared {
                    return Err(SpecError::DuplicateCondition(name.clone()));
                }
                default_declared = true;
                continue;
            }
            if name == ALL_CONDITIONS || names.contains(name) {
                return Err(SpecError::DuplicateCondition(name.clone()));
            }
            names.push(name.clone());
        }
        Ok(names)
    }
}

fn compile_rule(
    idx: usize,
    spec: &RuleSpec,
    fragments: &mut Fragments<'_>,
) -> Result<PatternExpr, SpecError> {
    let text = match (&spec.pattern, &spec.literal) {
        (Some(p), None) => fragments.expand(p, &format!("rule #{idx} ({})", spec.token))?,
        (None, Some(l)) => escape_literal(l),
        _ => {
            return Err(SpecError::MissingPattern {
                rule: idx,
                token: spec.token.clone(),
            });
        }
    };
    let expr = parse_pattern(&text).map_err(|message| SpecError::Pattern {
        rule: idx,
        token: spec.token.clone(),
        message,
    })?;
    if expr.has_inverted_repeat() {
        return Err(SpecError::InvalidRepeat {
            rule: idx,
            token: spec.token.clone(),
        });
    }
    if expr.matches_nothing() {
        return Err(SpecError::Unsatisfiable {
            rule: idx,
            token: spec.token.clone(),
        });
    }
    Ok(expr)
}

/// A rule bound to exactly one start condition.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Index of the declaring [`RuleSpec`]; also its priority (lower wins).
    pub source: usize,
    pub token: String,
    pub kind: TokenKind,
    pub condition: ConditionId,
    pub next_condition: ConditionId,
    pub pattern: PatternExpr,
}

/// Validated rule set, ready for automaton construction.
#[derive(Debug, Clone)]
pub struct ParsedGrammar {
    /// `conditions[0]` is `default`.
    pub conditions: Vec<String>,
    /// In declaration order.
    pub rules: Vec<Rule>,
    /// `token_names[kind]`; `token_names[0]` is `no_match`.
    pub token_names: Vec<String>,
    pub options: BuildOptions,
}

impl ParsedGrammar {
    /// Rules owned by `condition`, highest priority first.
    pub fn rules_in(&self, condition: ConditionId) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter().filter(move |r| r.condition == condition)
    }
}
