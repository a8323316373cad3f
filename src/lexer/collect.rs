// src/lexer/collect.rs
// Convenience drivers: allocate sinks, run a scanner, hand back tokens.

use crate::lexer::{
    scanner::Scanner,
    tables::{
        Tables,
        tokens::{ConditionId, NO_MATCH, TokenKind},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub len: usize,
}

impl Token {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn lexeme<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        &input[self.start..self.end()]
    }

    pub fn is_no_match(&self) -> bool {
        self.kind.is_no_match()
    }
}

/// Turn sink contents into tokens; the first one starts at `first_offset`.
pub fn tokens_from_sinks(kinds: &[TokenKind], ends: &[usize], first_offset: usize) -> Vec<Token> {
    let mut start = first_offset;
    kinds
        .iter()
        .zip(ends)
        .map(|(&kind, &end)| {
            let t = Token {
                kind,
                start,
                len: end - start,
            };
            start = end;
            t
        })
        .collect()
}

/// Scan all of `input` in one segment, starting in the default condition.
pub fn lex(tables: &Tables, input: &[u8]) -> Vec<Token> {
    lex_from(tables, input, ConditionId::DEFAULT)
}

/// Scan all of `input` starting in `condition`.
pub fn lex_from(tables: &Tables, input: &[u8], condition: ConditionId) -> Vec<Token> {
    let (mut kinds, mut ends) = sinks(input.len());
    let count = {
        let mut sc = Scanner::new(tables);
        sc.set_buffers(&mut kinds, &mut ends);
        sc.set_state(condition);
        sc.feed(input, 0);
        sc.run();
        sc.finalize();
        sc.token_count()
    };
    tokens_from_sinks(&kinds[..count], &ends[..count], 0)
}

/// Same tokens as [`lex`], but fed `chunk` bytes at a time.
pub fn lex_chunked(tables: &Tables, input: &[u8], chunk: usize) -> Vec<Token> {
    let chunk = chunk.max(1);
    let (mut kinds, mut ends) = sinks(input.len());
    let count = {
        let mut sc = Scanner::new(tables);
        sc.set_buffers(&mut kinds, &mut ends);
        let mut off = 0;
        for piece in input.chunks(chunk) {
            sc.feed(piece, off);
            sc.run();
            off += piece.len();
        }
        sc.finalize();
        sc.token_count()
    };
    tokens_from_sinks(&kinds[..count], &ends[..count], 0)
}

/// One slot per byte. The start state never accepts, so the token committed
/// at end of input always has a byte of its own.
fn sinks(n: usize) -> (Vec<TokenKind>, Vec<usize>) {
    (vec![NO_MATCH; n], vec![0; n])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::lexer::tables::build_grammar;

    #[test]
    fn chunking_does_not_change_tokens() {
        let mut g = Grammar::new();
        g.pattern("num", "[0-9]+")
            .pattern("id", "[a-z]+")
            .literal("arrow", "->")
            .pattern("ws", "\\s+");
        let t = build_grammar(&g).unwrap().tables;
        let src = b"abc -> 123 x->y ?? 7";
        let whole = lex(&t, src);
        for chunk in 1..=src.len() {
            assert_eq!(lex_chunked(&t, src, chunk), whole, "chunk size {chunk}");
        }
        let total: usize = whole.iter().map(|t| t.len).sum();
        assert_eq!(total, src.len());
        assert_eq!(whole[0].lexeme(src), b"abc");
    }

    #[test]
    fn tokens_from_sinks_chains_starts() {
        let toks = tokens_from_sinks(&[TokenKind(1), TokenKind(2)], &[12, 15], 10);
        assert_eq!(
            toks,
            [
                Token {
                    kind: TokenKind(1),
                    start: 10,
                    len: 2
                },
                Token {
                    kind: TokenKind(2),
                    start: 12,
                    len: 3
                },
            ]
        );
    }
}
