//! carnet renders a small personal site: a handful of static pages plus a
//! directory of markdown articles under `posts/`.
//!
//! The heart of the crate is the content pipeline: [`content`] discovers and
//! parses articles, [`ContentCache`] memoizes the parsed collection, and
//! [`ContentPipeline`] ties both to one content root. [`build()`] emits the
//! fully static site; the `carnet` CLI wraps the same pipeline in a live
//! preview server for authoring.

pub mod content;
pub mod errors;
pub mod logging;
pub mod templates;

pub use build::metadata::{BuildOutput, PageOutput, StaticAssetOutput};
pub use build::options::BuildOptions;
pub use build::{DEV_STYLESHEET, build};
pub use cache::ContentCache;
pub use pipeline::ContentPipeline;

mod build;
mod cache;
mod pipeline;

/// The version of carnet being used.
///
/// Emitted as a generator tag in the output HTML.
pub const GENERATOR: &str = concat!("carnet v", env!("CARGO_PKG_VERSION"));
