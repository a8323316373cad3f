// src/lexer/tables/word.rs
// Packed transition word shared by the table packer and the scan loop:
//   bit  31      commit: this edge ends the pending token and advances output
//   bits 16..=27 token kind (NO_MATCH = 0)
//   bits 0..=15  next state
// Bits 28..=30 are always zero.

use super::tokens::{MAX_TOKEN_KINDS, TokenKind};

const COMMIT_SHIFT: u32 = 31;
const COMMIT_BIT: u32 = 1 << COMMIT_SHIFT;
const KIND_SHIFT: u32 = 16;
const KIND_MASK: u32 = 0x0FFF;
const STATE_MASK: u32 = 0xFFFF;
const RESERVED_MASK: u32 = 0x7000_0000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TransitionWord(u32);

impl TransitionWord {
    /// Panics if `kind` does not fit the 12-bit field.
    #[inline]
    pub fn new(commit: bool, kind: TokenKind, next_state: u16) -> Self {
        assert!(
            (kind.0 as usize) < MAX_TOKEN_KINDS,
            "token kind {} exceeds the 12-bit kind field",
            kind.0
        );
        let commit = (commit as u32) << COMMIT_SHIFT;
        Self(commit | ((kind.0 as u32) << KIND_SHIFT) | next_state as u32)
    }

    /// Continue inside the current token.
    #[inline]
    pub fn shift(kind: TokenKind, next_state: u16) -> Self {
        Self::new(false, kind, next_state)
    }

    /// Commit the pending token of `kind`, then continue from `next_state`.
    #[inline]
    pub fn commit(kind: TokenKind, next_state: u16) -> Self {
        Self::new(true, kind, next_state)
    }

    /// Reinterpret raw table bits. Use [`TransitionWord::is_well_formed`] to
    /// check words that come from outside the packer.
    #[inline(always)]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn is_commit(self) -> bool {
        self.0 & COMMIT_BIT != 0
    }

    /// Output slots to advance after writing this word: 1 on commit, else 0.
    #[inline(always)]
    pub const fn commit_slots(self) -> usize {
        (self.0 >> COMMIT_SHIFT) as usize
    }

    #[inline(always)]
    pub const fn kind(self) -> TokenKind {
        TokenKind(((self.0 >> KIND_SHIFT) & KIND_MASK) as u16)
    }

    #[inline(always)]
    pub const fn next_state(self) -> u16 {
        (self.0 & STATE_MASK) as u16
    }

    #[inline]
    pub const fn is_well_formed(self) -> bool {
        self.0 & RESERVED_MASK == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tables::tokens::NO_MATCH;

    #[test]
    fn layout_matches_table_format() {
        let w = TransitionWord::commit(TokenKind(0x0ABC), 0x1234);
        assert_eq!(w.bits(), 0x8ABC_1234);
        assert!(w.is_commit());
        assert_eq!(w.commit_slots(), 1);
        assert_eq!(w.kind(), TokenKind(0x0ABC));
        assert_eq!(w.next_state(), 0x1234);

        let s = TransitionWord::shift(NO_MATCH, 7);
        assert_eq!(s.bits(), 7);
        assert!(!s.is_commit());
        assert_eq!(s.commit_slots(), 0);
    }

    #[test]
    fn extremes_fit_their_fields() {
        let w = TransitionWord::commit(TokenKind((MAX_TOKEN_KINDS - 1) as u16), u16::MAX);
        assert_eq!(w.kind().0 as usize, MAX_TOKEN_KINDS - 1);
        assert_eq!(w.next_state(), u16::MAX);
        assert!(w.is_well_formed());
        assert_eq!(TransitionWord::from_bits(w.bits()), w);
    }

    #[test]
    #[should_panic(expected = "12-bit kind field")]
    fn oversized_kind_is_rejected() {
        let _ = TransitionWord::shift(TokenKind(MAX_TOKEN_KINDS as u16), 0);
    }

    #[test]
    fn reserved_bits_are_detected() {
        assert!(!TransitionWord::from_bits(0x1000_0000).is_well_formed());
        assert!(TransitionWord::from_bits(0x8FFF_FFFF).is_well_formed());
    }
}
