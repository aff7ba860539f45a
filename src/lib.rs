#![warn(missing_docs)]
//! ImageSwap - replace images in web pages and Google Docs/Sheets with
//! AI-generated ones.
//!
//! The crate is the backend for a browser plugin. The plugin asks for an
//! image (`POST /generate`, backed by Adobe Firefly) and, when the page is a
//! Google document, asks the backend to put it in place
//! (`POST /replace-image`).
//!
//! # Quick Start - Generate
//!
//! ```no_run
//! use imageswap::{FireflyProvider, GenerationRequest, ImageProvider};
//!
//! #[tokio::main]
//! async fn main() -> imageswap::Result<()> {
//!     let provider = FireflyProvider::builder().build()?;
//!     let request = GenerationRequest::new("A lighthouse at dusk").with_size(1024, 1024);
//!     let image = provider.generate(&request).await?;
//!     println!("{}", image.image_url);
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Replace
//!
//! ```no_run
//! use imageswap::{replace_image, GoogleWorkspace, ReplaceRequest};
//!
//! #[tokio::main]
//! async fn main() -> imageswap::Result<()> {
//!     let workspace = GoogleWorkspace::from_env()?;
//!     let request = ReplaceRequest::new(
//!         "https://docs.google.com/document/d/DOC_ID/edit",
//!         "https://cdn.example/new.png",
//!     );
//!     let outcome = replace_image(&workspace, &request).await?;
//!     println!("{:?}", outcome.replaced);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `server`: axum HTTP service with CORS
//! - `cli`: `imageswap` binary (`serve`, `generate`, `replace`)

mod error;

pub mod auth;
pub mod docs;
pub mod google;
pub mod image;
pub mod replace;
pub mod sheets;
pub mod target;

#[cfg(feature = "server")]
pub mod server;

// Re-export error types at crate root
pub use error::{ImageSwapError, Result};

pub use google::GoogleWorkspace;
pub use image::providers::{FireflyProvider, FireflyProviderBuilder};
pub use image::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageProvider, ImageProviderKind,
    ImageSize,
};
pub use replace::{
    replace_image, DocKind, ReplaceOutcome, ReplaceRequest, Replaced, Workspace,
    DEFAULT_PLACEHOLDER,
};
pub use target::{detect_target, ClickEvent, ImageTarget};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{ImageSwapError, Result};
    pub use crate::google::GoogleWorkspace;
    pub use crate::image::providers::FireflyProvider;
    pub use crate::image::{GeneratedImage, GenerationRequest, ImageProvider};
    pub use crate::replace::{replace_image, ReplaceOutcome, ReplaceRequest, Workspace};
}
