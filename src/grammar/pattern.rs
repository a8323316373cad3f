// src/grammar/pattern.rs
// Rule pattern text -> PatternExpr (byte-level AST the automaton builder consumes).

use hashbrown::HashMap;
use regex_syntax::ParserBuilder;
use regex_syntax::hir::{self, Hir, HirKind};

use crate::error::SpecError;

/// Inclusive byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: u8,
    pub end: u8,
}

impl ByteRange {
    pub const ANY: ByteRange = ByteRange { start: 0x00, end: 0xFF };

    #[inline]
    pub const fn single(b: u8) -> Self {
        Self { start: b, end: b }
    }

    #[inline]
    pub const fn contains(self, b: u8) -> bool {
        self.start <= b && b <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternExpr {
    Empty,
    Literal(Vec<u8>),
    Class(Vec<ByteRange>),
    Sequence(Vec<PatternExpr>),
    Alternate(Vec<PatternExpr>),
    Repeat {
        inner: Box<PatternExpr>,
        min: u32,
        max: Option<u32>,
    },
}

impl PatternExpr {
    /// True when no input at all can match (e.g. an empty class on a required path).
    pub fn matches_nothing(&self) -> bool {
        match self {
            PatternExpr::Empty | PatternExpr::Literal(_) => false,
            PatternExpr::Class(ranges) => ranges.is_empty(),
            PatternExpr::Sequence(parts) => parts.iter().any(PatternExpr::matches_nothing),
            PatternExpr::Alternate(parts) => parts.iter().all(PatternExpr::matches_nothing),
            PatternExpr::Repeat { inner, min, .. } => *min > 0 && inner.matches_nothing(),
        }
    }

    /// True when some repetition has an upper bound below its lower bound.
    pub fn has_inverted_repeat(&self) -> bool {
        match self {
            PatternExpr::Empty | PatternExpr::Literal(_) | PatternExpr::Class(_) => false,
            PatternExpr::Sequence(parts) | PatternExpr::Alternate(parts) => {
                parts.iter().any(PatternExpr::has_inverted_repeat)
            }
            PatternExpr::Repeat { inner, min, max } => {
                max.is_some_and(|max| max < *min) || inner.has_inverted_repeat()
            }
        }
    }
}

/// Parse one pattern in byte mode. Errors are plain messages; the caller
/// attaches the rule that owns the pattern.
pub fn parse_pattern(pattern: &str) -> Result<PatternExpr, String> {
    let hir = ParserBuilder::new()
        .unicode(false)
        .utf8(false)
        .dot_matches_new_line(true)
        .build()
        .parse(pattern)
        .map_err(|err| err.to_string())?;
    convert_hir(&hir)
}

/// Pattern that matches `text` byte for byte.
pub fn escape_literal(text: &str) -> String {
    regex_syntax::escape(text)
}

fn convert_hir(hir: &Hir) -> Result<PatternExpr, String> {
    match hir.kind() {
        HirKind::Empty => Ok(PatternExpr::Empty),
        HirKind::Literal(lit) => Ok(PatternExpr::Literal(lit.0.to_vec())),
        HirKind::Class(class) => convert_class(class),
        HirKind::Look(look) => Err(format!(
            "anchors and word boundaries are not supported ({look:?})"
        )),
        HirKind::Repetition(rep) => {
            if !rep.greedy {
                return Err("lazy repetition is not supported".into());
            }
            Ok(PatternExpr::Repeat {
                inner: Box::new(convert_hir(&rep.sub)?),
                min: rep.min,
                max: rep.max,
            })
        }
        HirKind::Capture(cap) => convert_hir(&cap.sub),
        HirKind::Concat(parts) => Ok(PatternExpr::Sequence(
            parts.iter().map(convert_hir).collect::<Result<_, _>>()?,
        )),
        HirKind::Alternation(parts) => Ok(PatternExpr::Alternate(
            parts.iter().map(convert_hir).collect::<Result<_, _>>()?,
        )),
    }
}

fn convert_class(class: &hir::Class) -> Result<PatternExpr, String> {
    let ranges = match class {
        hir::Class::Bytes(bytes) => bytes
            .iter()
            .map(|r| ByteRange {
                start: r.start(),
                end: r.end(),
            })
            .collect(),
        hir::Class::Unicode(unicode) => {
            let mut out = Vec::new();
            for r in unicode.iter() {
                let (start, end) = (r.start() as u32, r.end() as u32);
                if end > 0xFF {
                    return Err(format!(
                        "class range {:?}..={:?} is outside the byte alphabet",
                        r.start(),
                        r.end()
                    ));
                }
                out.push(ByteRange {
                    start: start as u8,
                    end: end as u8,
                });
            }
            out
        }
    };
    Ok(PatternExpr::Class(ranges))
}

// -------------------- fragments --------------------

/// Named sub-patterns referenced as `{name}` from rule patterns.
pub struct Fragments<'g> {
    defs: HashMap<&'g str, &'g str>,
    expanded: HashMap<&'g str, String>,
}

impl<'g> Fragments<'g> {
    pub fn new(defs: impl IntoIterator<Item = (&'g str, &'g str)>) -> Result<Self, SpecError> {
        let mut map = HashMap::new();
        for (name, body) in defs {
            if map.insert(name, body).is_some() {
                return Err(SpecError::DuplicateFragment(name.to_string()));
            }
        }
        Ok(Self {
            defs: map,
            expanded: HashMap::new(),
        })
    }

    /// Replace every `{name}` in `pattern` with `(?:<fragment>)`, recursively.
    /// `referenced_by` names the rule (or fragment) for error messages.
    pub fn expand(&mut self, pattern: &str, referenced_by: &str) -> Result<String, SpecError> {
        let mut stack = Vec::new();
        self.expand_in(pattern, referenced_by, &mut stack)
    }

    fn expand_in(
        &mut self,
        pattern: &str,
        referenced_by: &str,
        stack: &mut Vec<&'g str>,
    ) -> Result<String, SpecError> {
        let refs = fragment_refs(pattern);
        if refs.is_empty() {
            return Ok(pattern.to_string());
        }
        let mut out = String::with_capacity(pattern.len());
        let mut last = 0;
        for (open, close) in refs {
            let name = &pattern[open + 1..close];
            let body = self.resolve(name, referenced_by, stack)?;
            out.push_str(&pattern[last..open]);
            out.push_str("(?:");
            out.push_str(&body);
            out.push(')');
            last = close + 1;
        }
        out.push_str(&pattern[last..]);
        Ok(out)
    }

    fn resolve(
        &mut self,
        name: &str,
        referenced_by: &str,
        stack: &mut Vec<&'g str>,
    ) -> Result<String, SpecError> {
        let Some((&key, &body)) = self.defs.get_key_value(name) else {
            return Err(SpecError::UnknownFragment {
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            });
        };
        if let Some(done) = self.expanded.get(key) {
            return Ok(done.clone());
        }
        if stack.contains(&key) {
            return Err(SpecError::FragmentCycle(key.to_string()));
        }
        stack.push(key);
        let by = format!("fragment '{key}'");
        let body = self.expand_in(body, &by, stack)?;
        stack.pop();
        self.expanded.insert(key, body.clone());
        Ok(body)
    }
}

/// Byte spans `(open, close)` of `{ident}` references outside classes and escapes.
/// `{` followed by a digit or `,` is a repetition and is left alone.
fn fragment_refs(pattern: &str) -> Vec<(usize, usize)> {
    let bytes = pattern.as_bytes();
    let mut refs = Vec::new();
    let mut class_depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'[' => {
                class_depth += 1;
                // A `]` right after `[` or `[^` is a literal member.
                let mut j = i + 1;
                if bytes.get(j) == Some(&b'^') {
                    j += 1;
                }
                if class_depth == 1 && bytes.get(j) == Some(&b']') {
                    i = j + 1;
                    continue;
                }
            }
            b']' if class_depth > 0 => class_depth -= 1,
            b'{' if class_depth == 0 => {
                let start = i + 1;
                let mut j = start;
                while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                    j += 1;
                }
                let ident = j > start && !bytes[start].is_ascii_digit();
                if ident && bytes.get(j) == Some(&b'}') {
                    refs.push((i, j));
                    i = j + 1;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    refs
}
