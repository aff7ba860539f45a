//! Turns located occurrences into an ordered `batchUpdate` request list.
//!
//! The Docs API applies the requests of a batch one at a time, and each
//! request's indexes refer to the document as left by the previous ones.
//! Occurrences are therefore processed from the end of the document towards
//! the start: a delete/insert pair at index `n` only shifts content after `n`,
//! and everything still to be processed lies before it. Offsets taken from
//! the unmodified tree stay valid without tracking drift.

use super::offset::{DocIndex, Occurrence};
use serde::{Serialize, Serializer};

/// Default rendered width and height of an inserted image, in points.
pub const DEFAULT_IMAGE_PT: f64 = 200.0;

/// The image to insert and its rendered size.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    /// Publicly fetchable image URL.
    pub uri: String,
    /// Rendered width in points.
    pub width_pt: f64,
    /// Rendered height in points.
    pub height_pt: f64,
}

impl ImagePlacement {
    /// Creates a placement with the default 200×200 pt size.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            width_pt: DEFAULT_IMAGE_PT,
            height_pt: DEFAULT_IMAGE_PT,
        }
    }

    /// Sets the rendered size in points.
    pub fn with_size(mut self, width_pt: f64, height_pt: f64) -> Self {
        self.width_pt = width_pt;
        self.height_pt = height_pt;
        self
    }
}

/// A single document mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOp {
    /// Delete `[start, end)`.
    DeleteRange {
        /// First index removed.
        start: DocIndex,
        /// First index kept after the range.
        end: DocIndex,
    },
    /// Insert an inline image at `at`.
    InsertImage {
        /// Insertion index.
        at: DocIndex,
        /// Image URL.
        uri: String,
        /// Rendered width in points.
        width_pt: f64,
        /// Rendered height in points.
        height_pt: f64,
    },
}

impl MutationOp {
    /// Index the operation starts at.
    pub fn start(&self) -> DocIndex {
        match self {
            Self::DeleteRange { start, .. } => *start,
            Self::InsertImage { at, .. } => *at,
        }
    }
}

/// Builds the delete/insert sequence replacing every occurrence with `image`.
///
/// Pairs are emitted in descending start order; within a pair the delete comes
/// before the insert at the same index. An empty input yields an empty plan.
pub fn plan(occurrences: &[Occurrence], image: &ImagePlacement) -> Vec<MutationOp> {
    let mut ordered = occurrences.to_vec();
    ordered.sort_by(Occurrence::descending);
    debug_assert!(
        ordered.windows(2).all(|w| w[1].end <= w[0].start),
        "occurrences must not overlap"
    );

    let mut ops = Vec::with_capacity(ordered.len() * 2);
    for occurrence in ordered {
        if !occurrence.is_empty() {
            ops.push(MutationOp::DeleteRange {
                start: occurrence.start,
                end: occurrence.end,
            });
        }
        ops.push(MutationOp::InsertImage {
            at: occurrence.start,
            uri: image.uri.clone(),
            width_pt: image.width_pt,
            height_pt: image.height_pt,
        });
    }
    ops
}

// Wire format of a `batchUpdate` request.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum WireRequest<'a> {
    DeleteContentRange { range: WireRange },
    InsertInlineImage(WireInsertImage<'a>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRange {
    start_index: DocIndex,
    end_index: DocIndex,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireInsertImage<'a> {
    location: WireLocation,
    uri: &'a str,
    object_size: WireSize,
}

#[derive(Serialize)]
struct WireLocation {
    index: DocIndex,
}

#[derive(Serialize)]
struct WireSize {
    width: WireDimension,
    height: WireDimension,
}

#[derive(Serialize)]
struct WireDimension {
    magnitude: f64,
    unit: &'static str,
}

impl WireDimension {
    fn points(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: "PT",
        }
    }
}

impl Serialize for MutationOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::DeleteRange { start, end } => WireRequest::DeleteContentRange {
                range: WireRange {
                    start_index: *start,
                    end_index: *end,
                },
            },
            Self::InsertImage {
                at,
                uri,
                width_pt,
                height_pt,
            } => WireRequest::InsertInlineImage(WireInsertImage {
                location: WireLocation { index: *at },
                uri,
                object_size: WireSize {
                    width: WireDimension::points(*width_pt),
                    height: WireDimension::points(*height_pt),
                },
            }),
        };
        wire.serialize(serializer)
    }
}
