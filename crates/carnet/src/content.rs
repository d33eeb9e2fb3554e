//! The markdown content pipeline: discovery, front matter, rendering and
//! ordering of articles.
//!
//! Articles live directly inside the `posts/` directory under the content
//! root, one `.md` file per article, each optionally starting with a YAML
//! front matter block:
//!
//! ```md
//! ---
//! title: A post
//! date: 2024-01-01
//! tags: [rust, notes]
//! excerpt: One-line teaser shown on the archive page.
//! ---
//!
//! Body in markdown.
//! ```
//!
//! Every front matter field is optional; see [`Post`] for the fallbacks.
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use glob::glob;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::ContentError;

mod highlight;
pub mod markdown;

/// Name of the directory, under the content root, that holds articles.
pub const CONTENT_SUBDIR: &str = "posts";

/// One parsed article.
#[derive(Debug, Clone)]
pub struct Post {
    /// File stem of the source file. Unique within a content root,
    /// case-sensitive, used in URLs and lookups.
    pub slug: String,
    /// Falls back to the slug when front matter omits it.
    pub title: String,
    /// `None` when front matter omits the date or when the value failed to
    /// parse. Both cases are indistinguishable past the logged warning.
    pub date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub excerpt: String,
    /// Rendered body HTML, including highlighted code blocks.
    pub body_html: String,
    // Epoch seconds of `date`, i64::MIN when undated. Ordering only.
    pub(crate) sort_key: i64,
}

impl Post {
    /// Projects the post down to its serializable summary, dropping the
    /// rendered HTML.
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            slug: self.slug.clone(),
            title: self.title.clone(),
            date: self.date.map(|date| date.to_string()),
            tags: self.tags.clone(),
            excerpt: self.excerpt.clone(),
        }
    }
}

/// A post without its rendered body: what listing consumers (the archive
/// page, the front-end metadata export) receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    /// ISO-8601 date, or `None` for undated posts.
    pub date: Option<String>,
    pub tags: Vec<String>,
    pub excerpt: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrontMatter {
    title: Option<String>,
    date: Option<String>,
    tags: Option<Vec<String>>,
    excerpt: Option<String>,
}

/// Resolves the content directory for a content root.
pub fn content_dir(root: &Path) -> PathBuf {
    root.join(CONTENT_SUBDIR)
}

/// Lists the markdown files directly inside the content directory.
///
/// A missing content directory is an empty site, not an error. Order is
/// whatever the filesystem returns; [`sort_posts`] imposes the real one.
pub fn discover_files(root: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let dir = content_dir(root);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let pattern = dir.join("*.md");
    let pattern = pattern.to_string_lossy();

    let mut files = Vec::new();
    for entry in glob(&pattern).map_err(|source| ContentError::BadPattern {
        pattern: pattern.to_string(),
        source,
    })? {
        let path = entry.map_err(|err| ContentError::ReadFailed {
            path: err.path().to_path_buf(),
            source: err.into_error(),
        })?;
        files.push(path);
    }

    Ok(files)
}

/// Reads and parses every article under `root`, sorted newest first.
///
/// A post whose front matter or body fails to process is logged and skipped;
/// the batch always completes. Only an I/O failure on a file that was
/// successfully listed aborts the load.
pub fn load_posts(root: &Path) -> Result<Vec<Post>, ContentError> {
    let files = discover_files(root)?;

    let mut posts: Vec<Post> = Vec::with_capacity(files.len());
    for path in files {
        let raw = std::fs::read_to_string(&path).map_err(|source| ContentError::ReadFailed {
            path: path.clone(),
            source,
        })?;

        let Some(slug) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!(target: "content", "Skipping {}: file name is not valid UTF-8", path.display());
            continue;
        };

        match parse_post(slug, &raw, &path) {
            Ok(post) => {
                // Last-discovered wins on a slug collision.
                if let Some(existing) = posts.iter_mut().find(|p| p.slug == post.slug) {
                    *existing = post;
                } else {
                    posts.push(post);
                }
            }
            Err(err) => warn!(target: "content", "Skipping {}: {}", path.display(), err),
        }
    }

    sort_posts(&mut posts);
    Ok(posts)
}

/// Deterministic total order: newest first, undated posts last, exact ties
/// broken by ascending slug. Independent of filesystem enumeration order.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.sort_key
            .cmp(&a.sort_key)
            .then_with(|| a.slug.cmp(&b.slug))
    });
}

fn parse_post(slug: &str, raw: &str, path: &Path) -> Result<Post, ContentError> {
    let doc = markdown::render_document(raw).map_err(|source| ContentError::Highlight {
        path: path.to_path_buf(),
        source,
    })?;

    let matter: FrontMatter = if doc.front_matter.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(&doc.front_matter).map_err(|source| ContentError::FrontMatter {
            path: path.to_path_buf(),
            source,
        })?
    };

    let date = matter.date.as_deref().and_then(|value| {
        let parsed = parse_date(value);
        if parsed.is_none() {
            warn!(
                target: "content",
                "{}: unparsable date {:?}, treating the post as undated",
                path.display(),
                value
            );
        }
        parsed
    });

    Ok(Post {
        slug: slug.to_string(),
        title: matter.title.unwrap_or_else(|| slug.to_string()),
        date,
        tags: matter.tags.unwrap_or_default(),
        excerpt: matter.excerpt.unwrap_or_default(),
        body_html: doc.html,
        sort_key: date
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|datetime| datetime.and_utc().timestamp())
            .unwrap_or(i64::MIN),
    })
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }
    if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(datetime.date());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_post(root: &Path, name: &str, contents: &str) {
        let dir = content_dir(root);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn missing_content_directory_is_empty_not_an_error() {
        let root = tempfile::tempdir().unwrap();
        let posts = load_posts(root.path()).unwrap();
        assert!(posts.is_empty());
    }

    #[test]
    fn empty_content_directory_is_empty() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(content_dir(root.path())).unwrap();
        let posts = load_posts(root.path()).unwrap();
        assert!(posts.is_empty());
    }

    #[test]
    fn discovery_is_not_recursive_and_filters_extension() {
        let root = tempfile::tempdir().unwrap();
        write_post(root.path(), "kept.md", "# hi");
        write_post(root.path(), "notes.txt", "not markdown");
        let nested = content_dir(root.path()).join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("deep.md"), "# nope").unwrap();

        let files = discover_files(root.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("kept.md"));
    }

    #[test]
    fn dated_before_undated() {
        let root = tempfile::tempdir().unwrap();
        write_post(
            root.path(),
            "a.md",
            "---\ntitle: Alpha\ndate: 2024-01-01\n---\nbody",
        );
        write_post(root.path(), "b.md", "---\ntitle: Beta\n---\nbody");

        let posts = load_posts(root.path()).unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Alpha", "Beta"]);
    }

    #[test]
    fn equal_dates_tie_break_on_slug_ascending() {
        let root = tempfile::tempdir().unwrap();
        write_post(root.path(), "zeta.md", "---\ndate: 2024-05-01\n---\nz");
        write_post(root.path(), "alpha.md", "---\ndate: 2024-05-01\n---\na");

        let posts = load_posts(root.path()).unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["alpha", "zeta"]);
    }

    #[test]
    fn omitted_and_unparsable_dates_normalize_identically() {
        let omitted = parse_post("no-date", "---\ntitle: A\n---\nbody", Path::new("no-date.md"))
            .unwrap();
        let bad = parse_post(
            "bad-date",
            "---\ntitle: B\ndate: not-a-date\n---\nbody",
            Path::new("bad-date.md"),
        )
        .unwrap();

        assert_eq!(omitted.date, None);
        assert_eq!(bad.date, None);
        assert_eq!(omitted.sort_key, bad.sort_key);

        // Two undated posts tie on the sort key and fall back to slug order.
        let mut posts = vec![omitted, bad];
        sort_posts(&mut posts);
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["bad-date", "no-date"]);
    }

    #[test]
    fn title_falls_back_to_slug() {
        let post = parse_post("my-untitled-post", "Just a body.", Path::new("x.md")).unwrap();
        assert_eq!(post.title, "my-untitled-post");
        assert!(post.tags.is_empty());
        assert_eq!(post.excerpt, "");
    }

    #[test]
    fn datetime_date_values_are_accepted() {
        let post = parse_post(
            "p",
            "---\ndate: 2024-03-05T12:30:00\n---\nbody",
            Path::new("p.md"),
        )
        .unwrap();
        assert_eq!(post.date, NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[test]
    fn broken_front_matter_is_skipped_not_fatal() {
        let root = tempfile::tempdir().unwrap();
        write_post(root.path(), "good.md", "---\ntitle: Good\n---\nbody");
        write_post(root.path(), "broken.md", "---\ntitle: [unclosed\n---\nbody");

        let posts = load_posts(root.path()).unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Good"]);
    }

    #[test]
    fn summary_has_no_rendered_html() {
        let post = parse_post(
            "hello",
            "---\ntitle: Hello\ndate: 2024-01-02\ntags: [a, b]\nexcerpt: hi\n---\n# Heading",
            Path::new("hello.md"),
        )
        .unwrap();

        let summary = post.summary();
        assert_eq!(summary.date.as_deref(), Some("2024-01-02"));
        assert_eq!(summary.tags, ["a", "b"]);

        let value = serde_json::to_value(&summary).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert!(!keys.iter().any(|k| k.contains("body") || k.contains("html")));
        assert!(!keys.iter().any(|k| k.contains("sort")));
    }
}
