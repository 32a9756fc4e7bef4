//! Risum
//!
//! Umbrella crate for the meme-sharing client. The functionality lives in
//! the workspace crates; this crate re-exports them so integration tests and
//! embedders can depend on a single package.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use app_core;
pub use app_state;
pub use app_ui;
pub use backend_client;
pub use storage;
