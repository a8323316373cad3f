// src/lexer/scanner.rs
// Table-driven scanning loop. No allocation, no per-rule branching: the
// tables already encode longest match, priority and condition switches.

use crate::lexer::tables::{
    Tables,
    tokens::{ConditionId, TokenKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing fed since `new`/`init`.
    Ready,
    /// A segment is registered but not fully scanned.
    Fed,
    /// Every fed byte has been scanned.
    Scanned,
    Finalized,
}

/// One scan over a byte stream.
///
/// Output goes to two caller-owned sinks: `kinds[i]` is the kind of the i-th
/// committed token and `ends[i]` is its exclusive end offset in the stream.
/// Token i starts where token i-1 ended (the first starts at the first fed
/// offset). Every slot needs capacity: each scanned byte writes into the
/// current slot whether or not it commits.
pub struct Scanner<'t, 'i, 'o> {
    tables: &'t Tables,
    state: u16,

    input: &'i [u8],
    /// Stream offset of `input[0]`.
    base: usize,
    /// Next unscanned index into `input`.
    pos: usize,
    /// Stream offset just past the last fed byte.
    end: usize,

    kinds: &'o mut [TokenKind],
    ends: &'o mut [usize],
    count: usize,

    phase: Phase,
}

impl<'t, 'i, 'o> Scanner<'t, 'i, 'o> {
    pub fn new(tables: &'t Tables) -> Self {
        Self {
            tables,
            state: tables.initial_state(),
            input: &[],
            base: 0,
            pos: 0,
            end: 0,
            kinds: Default::default(),
            ends: Default::default(),
            count: 0,
            phase: Phase::Ready,
        }
    }

    /// Back to the state right after `new`: cursor, state and count reset,
    /// sinks released.
    pub fn init(&mut self) {
        self.state = self.tables.initial_state();
        self.input = &[];
        self.base = 0;
        self.pos = 0;
        self.end = 0;
        self.kinds = &mut [];
        self.ends = &mut [];
        self.count = 0;
        self.phase = Phase::Ready;
    }

    /// Install output sinks and clear the token count.
    pub fn set_buffers(&mut self, kinds: &'o mut [TokenKind], ends: &'o mut [usize]) {
        self.kinds = kinds;
        self.ends = ends;
        self.count = 0;
    }

    /// Register the next segment of the stream. Nothing is copied or scanned
    /// until [`Scanner::run`]. The first segment may start at any offset;
    /// later ones must start exactly where the previous one ended. An empty
    /// segment changes nothing.
    pub fn feed(&mut self, bytes: &'i [u8], stream_offset: usize) {
        if bytes.is_empty() {
            self.check_empty_segment(stream_offset);
            return;
        }
        self.check_next_segment(stream_offset);
        self.input = bytes;
        self.base = stream_offset;
        self.pos = 0;
        self.end = stream_offset + bytes.len();
        self.phase = Phase::Fed;
    }

    /// Scan whatever was fed and not yet scanned. A no-op when nothing is pending.
    pub fn run(&mut self) {
        assert!(self.phase != Phase::Finalized, "run after finalize");
        if self.phase != Phase::Fed {
            return;
        }
        let input = self.input;
        let rest = &input[self.pos..];
        self.consume(rest, self.base + self.pos);
        self.pos = input.len();
        self.phase = Phase::Scanned;
    }

    /// `feed` + `run` for a segment that only lives for this call, such as
    /// a reused read buffer.
    pub fn scan(&mut self, bytes: &[u8], stream_offset: usize) {
        if bytes.is_empty() {
            self.check_empty_segment(stream_offset);
            return;
        }
        self.check_next_segment(stream_offset);
        self.input = &[];
        self.pos = 0;
        self.base = stream_offset + bytes.len();
        self.end = self.base;
        self.consume(bytes, stream_offset);
        self.phase = Phase::Scanned;
    }

    /// Switch to `condition`'s initial state. Any partially scanned token is
    /// abandoned; the next token still starts at the last committed end.
    pub fn set_state(&mut self, condition: ConditionId) {
        assert!(self.phase != Phase::Finalized, "set_state after finalize");
        self.state = self.tables.condition_state(condition);
    }

    /// Apply the end-of-input word once, committing the pending token if the
    /// current state accepts.
    pub fn finalize(&mut self) {
        assert!(self.phase != Phase::Finalized, "finalize called twice");
        assert!(
            self.phase != Phase::Fed,
            "finalize with {} unscanned bytes; call run first",
            self.input.len() - self.pos
        );
        let w = self.tables.eof_word(self.state);
        if w.is_commit() {
            assert!(
                self.count < self.kinds.len() && self.count < self.ends.len(),
                "token sinks full: no slot for the final token"
            );
            self.kinds[self.count] = w.kind();
            self.ends[self.count] = self.end;
            self.count += 1;
        }
        self.state = w.next_state();
        self.phase = Phase::Finalized;
    }

    pub fn token_count(&self) -> usize {
        self.count
    }

    pub fn token_kinds(&self) -> &[TokenKind] {
        &self.kinds[..self.count]
    }

    pub fn token_ends(&self) -> &[usize] {
        &self.ends[..self.count]
    }

    pub fn token_name(&self, kind: TokenKind) -> Option<&'t str> {
        self.tables.token_name(kind)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Stream offset just past the last fed byte.
    pub fn stream_end(&self) -> usize {
        self.end
    }

    fn check_next_segment(&self, stream_offset: usize) {
        match self.phase {
            Phase::Finalized => panic!("feed after finalize"),
            Phase::Fed => panic!(
                "feed before the previous segment was scanned ({} bytes pending)",
                self.input.len() - self.pos
            ),
            Phase::Scanned => assert_eq!(
                stream_offset, self.end,
                "segments must be contiguous: expected offset {}, got {}",
                self.end, stream_offset
            ),
            Phase::Ready => {}
        }
    }

    fn check_empty_segment(&self, stream_offset: usize) {
        assert!(self.phase != Phase::Finalized, "feed after finalize");
        if self.phase != Phase::Ready {
            assert_eq!(
                stream_offset, self.end,
                "segments must be contiguous: expected offset {}, got {}",
                self.end, stream_offset
            );
        }
    }

    #[inline]
    fn consume(&mut self, bytes: &[u8], first_offset: usize) {
        if bytes.is_empty() {
            return;
        }
        assert!(
            self.count + bytes.len() <= self.kinds.len()
                && self.count + bytes.len() <= self.ends.len(),
            "token sinks too small: {} slots used, {} more bytes, capacity {}",
            self.count,
            bytes.len(),
            self.kinds.len().min(self.ends.len())
        );

        let t = self.tables;
        let kinds = &mut self.kinds[..];
        let ends = &mut self.ends[..];
        let mut state = self.state;
        let mut idx = self.count;
        let mut off = first_offset;
        for &b in bytes {
            let w = t.word(state, b);
            kinds[idx] = w.kind();
            ends[idx] = off;
            idx += w.commit_slots();
            state = w.next_state();
            off += 1;
        }
        self.state = state;
        self.count = idx;
    }
}
