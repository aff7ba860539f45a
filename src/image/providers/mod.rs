//! Image generation providers.

mod firefly;

pub use firefly::{FireflyProvider, FireflyProviderBuilder};
