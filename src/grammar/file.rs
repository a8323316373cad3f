// src/grammar/file.rs
// JSON grammar files.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use super::{BuildOptions, Grammar, RuleSpec};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarFile {
    /// Extra start conditions; `default` is implicit.
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub fragments: BTreeMap<String, String>,
    pub rules: Vec<RuleDef>,
    #[serde(default)]
    pub options: BuildOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDef {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl GrammarFile {
    pub fn from_json(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let data =
            std::fs::read(path).with_context(|| format!("reading grammar {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("parsing grammar {}", path.display()))
    }

    pub fn into_grammar(self) -> Grammar {
        let mut g = Grammar::new();
        for c in self.conditions {
            g.condition(c);
        }
        for (name, body) in self.fragments {
            g.fragment(name, body);
        }
        for r in self.rules {
            g.rule(RuleSpec {
                token: r.token,
                pattern: r.pattern,
                literal: r.literal,
                conditions: r.conditions,
                next: r.next,
            });
        }
        g.options(self.options);
        g
    }
}

impl From<GrammarFile> for Grammar {
    fn from(file: GrammarFile) -> Self {
        file.into_grammar()
    }
}
