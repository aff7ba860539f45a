//! Google Docs: reading the content tree, locating targets, planning and
//! submitting the mutation batch.

mod client;
pub mod locate;
pub mod model;
pub mod offset;
pub mod plan;

pub use client::DocsApi;
pub use locate::{locate, Located};
pub use model::Document;
pub use offset::{DocIndex, Occurrence, OccurrenceKind, RunOffset};
pub use plan::{plan, ImagePlacement, MutationOp, DEFAULT_IMAGE_PT};
