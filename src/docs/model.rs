//! Google Docs document content tree, as returned by `documents.get`.
//!
//! Only the parts needed to find placeholders and inline images are modelled;
//! everything else in the response is ignored.

use super::offset::DocIndex;
use serde::{Deserialize, Serialize};

/// A fetched document. Valid only for the request that fetched it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Document id.
    #[serde(default)]
    pub document_id: String,
    /// Document title.
    #[serde(default)]
    pub title: String,
    /// Main body.
    #[serde(default)]
    pub body: Body,
}

/// Document body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Body {
    /// Top-level blocks in document order.
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// A block: paragraph, table, or table of contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    /// Absolute start index. The API omits it when it is zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u32>,
    /// Absolute end index (exclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<u32>,
    /// Paragraph content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<Paragraph>,
    /// Table content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
    /// Table of contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_of_contents: Option<TableOfContents>,
}

/// A paragraph: an ordered run of inline elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    /// Inline elements in reading order.
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
}

/// An inline element inside a paragraph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    /// Absolute start index. The API omits it when it is zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u32>,
    /// Absolute end index (exclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<u32>,
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_run: Option<TextRun>,
    /// Reference to an embedded object (image).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_object_element: Option<InlineObjectElement>,
}

/// A run of text sharing one style.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextRun {
    /// The text, including any trailing newline.
    #[serde(default)]
    pub content: String,
}

/// A reference to an inline object such as an image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineObjectElement {
    /// Key into the document's `inlineObjects` map.
    #[serde(default)]
    pub inline_object_id: String,
}

/// A table; cells hold nested structural content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Rows in order.
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

/// A table row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    /// Cells in order.
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

/// A table cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableCell {
    /// Nested blocks.
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// A table of contents; holds nested structural content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableOfContents {
    /// Nested blocks.
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// Classification of a paragraph element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inline<'a> {
    /// A text run starting at `start`.
    Text {
        /// Absolute index of the run's first character.
        start: DocIndex,
        /// Run content.
        content: &'a str,
    },
    /// An embedded object spanning `[start, end)`.
    Object {
        /// Absolute start index.
        start: DocIndex,
        /// Absolute end index (exclusive).
        end: DocIndex,
    },
    /// Anything else (page breaks, footnote refs, ...).
    Other,
}

impl ParagraphElement {
    /// Absolute start, treating an omitted index as zero.
    pub fn start(&self) -> DocIndex {
        DocIndex::new(self.start_index.unwrap_or(0))
    }

    /// Classifies this element.
    pub fn inline(&self) -> Inline<'_> {
        if let Some(run) = &self.text_run {
            return Inline::Text {
                start: self.start(),
                content: &run.content,
            };
        }
        if self.inline_object_element.is_some() {
            let start = self.start();
            // An inline object always occupies one index unit
            let end = self
                .end_index
                .map(DocIndex::new)
                .unwrap_or_else(|| start.advance(1));
            return Inline::Object { start, end };
        }
        Inline::Other
    }
}
