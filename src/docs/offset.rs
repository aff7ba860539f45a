//! Offsets in the Docs index space.
//!
//! The Docs API counts UTF-16 code units. Two newtypes keep absolute document
//! offsets apart from offsets measured inside a single text run; the only way
//! to combine them is [`DocIndex::at`].

use serde::Serialize;
use std::cmp::Ordering;

/// Absolute offset into a document's flat index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct DocIndex(u32);

impl DocIndex {
    /// Wraps a raw absolute index.
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Absolute position of `offset` inside a run that starts at `run_start`.
    pub fn at(run_start: DocIndex, offset: RunOffset) -> Self {
        Self(run_start.0 + offset.0)
    }

    /// Moves forward by `units` UTF-16 code units.
    pub fn advance(self, units: u32) -> Self {
        Self(self.0 + units)
    }
}

impl std::fmt::Display for DocIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Offset within a single text run, in UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct RunOffset(u32);

impl RunOffset {
    /// Wraps a raw run-relative offset.
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    /// Returns the raw offset.
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Length of `s` in UTF-16 code units.
pub fn utf16_len(s: &str) -> u32 {
    s.encode_utf16().count() as u32
}

/// Converts byte positions inside one string to UTF-16 run offsets.
///
/// Positions must be fed in ascending order; each call only scans the text
/// between the previous position and the new one.
#[derive(Debug)]
pub struct Utf16Cursor<'a> {
    text: &'a str,
    byte_pos: usize,
    units: u32,
}

impl<'a> Utf16Cursor<'a> {
    /// Starts a cursor at the beginning of `text`.
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            byte_pos: 0,
            units: 0,
        }
    }

    /// Returns the run offset of `byte_pos`, which must be a char boundary at
    /// or after the previous position.
    pub fn offset_of(&mut self, byte_pos: usize) -> RunOffset {
        debug_assert!(byte_pos >= self.byte_pos, "cursor moved backwards");
        self.units += utf16_len(&self.text[self.byte_pos..byte_pos]);
        self.byte_pos = byte_pos;
        RunOffset(self.units)
    }
}

/// What an occurrence refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OccurrenceKind {
    /// A placeholder text match.
    Placeholder,
    /// An existing inline image.
    InlineImage,
}

/// Half-open interval `[start, end)` of document indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// First index covered.
    pub start: DocIndex,
    /// First index after the occurrence.
    pub end: DocIndex,
    /// What was matched.
    pub kind: OccurrenceKind,
}

impl Occurrence {
    /// Creates an occurrence. `end` must not precede `start`.
    pub fn new(start: DocIndex, end: DocIndex, kind: OccurrenceKind) -> Self {
        debug_assert!(start <= end, "occurrence end before start");
        Self { start, end, kind }
    }

    /// Number of index units covered.
    pub fn len(&self) -> u32 {
        self.end.get() - self.start.get()
    }

    /// True for a zero-width interval.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if the two intervals share at least one index.
    pub fn overlaps(&self, other: &Occurrence) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Comparator placing later occurrences first (by start, then end).
    pub fn descending(a: &Occurrence, b: &Occurrence) -> Ordering {
        b.start.cmp(&a.start).then_with(|| b.end.cmp(&a.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_index_at() {
        let start = DocIndex::new(40);
        assert_eq!(DocIndex::at(start, RunOffset::new(5)), DocIndex::new(45));
        assert_eq!(start.advance(3).get(), 43);
    }

    #[test]
    fn test_utf16_len() {
        assert_eq!(utf16_len("{{images}}"), 10);
        assert_eq!(utf16_len("é"), 1);
        // Non-BMP characters take two code units
        assert_eq!(utf16_len("😀"), 2);
    }

    #[test]
    fn test_cursor_counts_code_units() {
        let text = "a😀b{{x}}";
        let mut cursor = Utf16Cursor::new(text);
        let pos = text.find("{{x}}").unwrap();
        assert_eq!(pos, 6);
        assert_eq!(cursor.offset_of(pos), RunOffset::new(4));
        assert_eq!(cursor.offset_of(text.len()), RunOffset::new(9));
    }

    #[test]
    fn test_descending_comparator() {
        let a = Occurrence::new(DocIndex::new(10), DocIndex::new(18), OccurrenceKind::Placeholder);
        let b = Occurrence::new(DocIndex::new(50), DocIndex::new(58), OccurrenceKind::Placeholder);
        let mut items = vec![a, b];
        items.sort_by(Occurrence::descending);
        assert_eq!(items, vec![b, a]);
    }

    #[test]
    fn test_overlaps() {
        let a = Occurrence::new(DocIndex::new(10), DocIndex::new(18), OccurrenceKind::Placeholder);
        let b = Occurrence::new(DocIndex::new(18), DocIndex::new(20), OccurrenceKind::Placeholder);
        let c = Occurrence::new(DocIndex::new(17), DocIndex::new(19), OccurrenceKind::Placeholder);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert_eq!(a.len(), 8);
        assert!(!a.is_empty());
    }
}
