//! One site's content pipeline: a content root plus the cache over it.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::ContentCache;
use crate::content::{self, Post, PostSummary};
use crate::errors::ContentError;

pub struct ContentPipeline {
    root: PathBuf,
    cache: ContentCache,
}

impl ContentPipeline {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: ContentCache::new(),
        }
    }

    /// The directory articles are read from.
    pub fn content_dir(&self) -> PathBuf {
        content::content_dir(&self.root)
    }

    /// All posts, newest first. Cached until the content changes.
    pub fn posts(&self) -> Result<Arc<Vec<Post>>, ContentError> {
        self.cache.load(&self.root)
    }

    /// The serialization-safe projection for listing consumers.
    pub fn posts_metadata(&self) -> Result<Vec<PostSummary>, ContentError> {
        Ok(self.posts()?.iter().map(Post::summary).collect())
    }

    /// Looks up a single post by slug.
    pub fn find(&self, slug: &str) -> Result<Option<Post>, ContentError> {
        Ok(self.posts()?.iter().find(|post| post.slug == slug).cloned())
    }

    /// Subscription point for the host's file watcher.
    ///
    /// Returns `true` when the changed path was an article under the content
    /// directory and the cache was dropped, so the caller knows to tell
    /// preview clients to reload. The pipeline itself stays watcher-agnostic.
    pub fn on_content_changed(&self, path: &Path) -> bool {
        let is_article = path.starts_with(self.content_dir())
            && path.extension().is_some_and(|ext| ext == "md");
        if is_article {
            self.cache.invalidate();
        }
        is_article
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("posts");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("hello.md"),
            "---\ntitle: Hello\ndate: 2024-01-01\n---\nbody",
        )
        .unwrap();
        root
    }

    #[test]
    fn find_misses_unknown_slugs() {
        let root = site();
        let pipeline = ContentPipeline::new(root.path());

        assert!(pipeline.find("hello").unwrap().is_some());
        assert!(pipeline.find("no-such-post").unwrap().is_none());
    }

    #[test]
    fn content_change_drops_the_cache() {
        let root = site();
        let pipeline = ContentPipeline::new(root.path());
        pipeline.posts().unwrap();

        let changed = pipeline.content_dir().join("hello.md");
        assert!(pipeline.on_content_changed(&changed));

        pipeline.posts().unwrap();
        assert_eq!(pipeline.cache().scan_count(), 2);
    }

    #[test]
    fn unrelated_changes_are_ignored() {
        let root = site();
        let pipeline = ContentPipeline::new(root.path());
        pipeline.posts().unwrap();

        assert!(!pipeline.on_content_changed(&root.path().join("style.css")));
        assert!(!pipeline.on_content_changed(&pipeline.content_dir().join("notes.txt")));

        pipeline.posts().unwrap();
        assert_eq!(pipeline.cache().scan_count(), 1);
    }

    #[test]
    fn metadata_for_empty_site_is_an_empty_list() {
        let root = tempfile::tempdir().unwrap();
        let pipeline = ContentPipeline::new(root.path());
        assert!(pipeline.posts_metadata().unwrap().is_empty());
    }
}
