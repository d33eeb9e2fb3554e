use std::path::PathBuf;

/// Options for [`build()`](crate::build).
///
/// ## Examples
/// ```rust,no_run
/// use carnet::{BuildOptions, build};
///
/// fn main() -> Result<(), carnet::errors::CarnetError> {
///     let output = build(&BuildOptions {
///         base_url: Some("https://example.com".to_string()),
///         ..Default::default()
///     })?;
///     println!("{} pages", output.pages.len());
///     Ok(())
/// }
/// ```
pub struct BuildOptions {
    /// Base URL for the site, e.g. `https://example.com`. Used to generate
    /// canonical URLs on post pages; without it no canonical link is emitted.
    pub base_url: Option<String>,

    pub output_dir: PathBuf,
    pub static_dir: PathBuf,

    /// Directory containing the `posts/` content directory.
    pub content_root: PathBuf,

    /// Whether to clean the output directory before building. Skipping the
    /// clean may leave pages for posts that no longer exist.
    pub clean_output_dir: bool,
}

/// Defaults match a site built from the current directory: content from
/// `./posts`, static files from `./static`, output to `./dist`.
impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            output_dir: "dist".into(),
            static_dir: "static".into(),
            content_root: ".".into(),
            clean_output_dir: true,
        }
    }
}
