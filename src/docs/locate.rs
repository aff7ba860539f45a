//! Finds what to replace in a document.
//!
//! Placeholder matches win. Without any, the first inline image is the
//! target. Without either there is nothing to do.

use super::model::{Document, Inline, ParagraphElement, StructuralElement};
use super::offset::{utf16_len, DocIndex, Occurrence, OccurrenceKind, Utf16Cursor};
use crate::error::{ImageSwapError, Result};
use std::ops::ControlFlow;

/// Result of scanning a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// Every placeholder match, in document order.
    Placeholders(Vec<Occurrence>),
    /// No placeholder; the first inline image instead.
    FirstImage(Occurrence),
    /// Neither a placeholder nor an image.
    NoTarget,
}

impl Located {
    /// The occurrences to replace, in document order.
    pub fn occurrences(&self) -> &[Occurrence] {
        match self {
            Self::Placeholders(found) => found,
            Self::FirstImage(image) => std::slice::from_ref(image),
            Self::NoTarget => &[],
        }
    }

    /// True when the image fallback was used.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::FirstImage(_))
    }
}

/// Scans `doc` for `placeholder`, falling back to the first inline image.
pub fn locate(doc: &Document, placeholder: &str) -> Result<Located> {
    if placeholder.is_empty() {
        return Err(ImageSwapError::Validation(
            "placeholder must not be empty".into(),
        ));
    }

    let found = find_placeholders(doc, placeholder);
    if !found.is_empty() {
        return Ok(Located::Placeholders(found));
    }

    Ok(first_inline_image(doc)
        .map(Located::FirstImage)
        .unwrap_or(Located::NoTarget))
}

/// Every non-overlapping match of `placeholder` inside a single text run.
///
/// Matches split across two runs (e.g. half bold) are not found.
pub fn find_placeholders(doc: &Document, placeholder: &str) -> Vec<Occurrence> {
    let mut found = Vec::new();
    if placeholder.is_empty() {
        return found;
    }
    let width = utf16_len(placeholder);

    let _ = walk(&doc.body.content, &mut |element| {
        if let Inline::Text { start, content } = element.inline() {
            let mut cursor = Utf16Cursor::new(content);
            for (byte_pos, _) in content.match_indices(placeholder) {
                let at = DocIndex::at(start, cursor.offset_of(byte_pos));
                found.push(Occurrence::new(
                    at,
                    at.advance(width),
                    OccurrenceKind::Placeholder,
                ));
            }
        }
        ControlFlow::Continue(())
    });

    found
}

/// The first inline object in reading order.
pub fn first_inline_image(doc: &Document) -> Option<Occurrence> {
    let mut first = None;
    let _ = walk(&doc.body.content, &mut |element| match element.inline() {
        Inline::Object { start, end } => {
            first = Some(Occurrence::new(start, end, OccurrenceKind::InlineImage));
            ControlFlow::Break(())
        }
        _ => ControlFlow::Continue(()),
    });
    first
}

/// Visits paragraph elements top to bottom, left to right, descending into
/// tables cell by cell.
///
/// Tables of contents are skipped. Their text mirrors headings and the API
/// refuses edits inside them, which would fail the whole batch.
fn walk<'a, F>(content: &'a [StructuralElement], visit: &mut F) -> ControlFlow<()>
where
    F: FnMut(&'a ParagraphElement) -> ControlFlow<()>,
{
    for block in content {
        if let Some(paragraph) = &block.paragraph {
            for element in &paragraph.elements {
                visit(element)?;
            }
        }
        if let Some(table) = &block.table {
            for row in &table.table_rows {
                for cell in &row.table_cells {
                    walk(&cell.content, visit)?;
                }
            }
        }
    }
    ControlFlow::Continue(())
}
