//! Single-slot cache over the parsed post collection.
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::content::{self, Post};
use crate::errors::ContentError;

struct CacheSlot {
    root: PathBuf,
    posts: Arc<Vec<Post>>,
}

/// Memoizes the parsed, sorted post collection for one content root.
///
/// Exactly one entry is held at a time, keyed by the root it was computed
/// for: loading a different root is a miss that replaces the slot. The cache
/// is owned by whoever constructs it, never process-global, and is never
/// persisted across runs.
#[derive(Default)]
pub struct ContentCache {
    slot: Mutex<Option<CacheSlot>>,
    scans: AtomicU64,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the posts for `root`, scanning the content directory only on a
    /// cold or invalidated slot.
    ///
    /// The slot lock is held across the scan, so concurrent loads for the
    /// same root share a single scan instead of racing.
    pub fn load(&self, root: &Path) -> Result<Arc<Vec<Post>>, ContentError> {
        let mut slot = self.slot.lock();

        if let Some(entry) = slot.as_ref()
            && entry.root == root
        {
            return Ok(entry.posts.clone());
        }

        self.scans.fetch_add(1, Ordering::Relaxed);
        let posts = Arc::new(content::load_posts(root)?);
        *slot = Some(CacheSlot {
            root: root.to_path_buf(),
            posts: posts.clone(),
        });

        Ok(posts)
    }

    /// Drops the cached collection, whatever changed. Coarse on purpose: a
    /// full rescan is cheap at the content volumes this serves, and a load
    /// that lands between invalidation and repopulation simply triggers a
    /// fresh scan rather than seeing stale data.
    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }

    /// Number of content directory scans performed so far.
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site_with_posts(names: &[&str]) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let dir = content::content_dir(root.path());
        fs::create_dir_all(&dir).unwrap();
        for name in names {
            fs::write(
                dir.join(format!("{name}.md")),
                format!("---\ntitle: {name}\n---\nbody"),
            )
            .unwrap();
        }
        root
    }

    #[test]
    fn second_load_performs_no_additional_scan() {
        let site = site_with_posts(&["one", "two"]);
        let cache = ContentCache::new();

        let first = cache.load(site.path()).unwrap();
        assert_eq!(cache.scan_count(), 1);

        let second = cache.load(site.path()).unwrap();
        assert_eq!(cache.scan_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn invalidate_forces_a_rescan() {
        let site = site_with_posts(&["one"]);
        let cache = ContentCache::new();

        cache.load(site.path()).unwrap();
        cache.invalidate();

        // New content written after invalidation shows up on the next load.
        fs::write(
            content::content_dir(site.path()).join("two.md"),
            "---\ntitle: two\n---\nbody",
        )
        .unwrap();

        let posts = cache.load(site.path()).unwrap();
        assert_eq!(cache.scan_count(), 2);
        assert_eq!(posts.len(), 2);
    }

    #[test]
    fn switching_roots_is_a_miss() {
        let site_a = site_with_posts(&["a"]);
        let site_b = site_with_posts(&["b", "c"]);
        let cache = ContentCache::new();

        assert_eq!(cache.load(site_a.path()).unwrap().len(), 1);
        assert_eq!(cache.load(site_b.path()).unwrap().len(), 2);
        assert_eq!(cache.scan_count(), 2);

        // The single slot now belongs to site_b; going back is another miss.
        assert_eq!(cache.load(site_a.path()).unwrap().len(), 1);
        assert_eq!(cache.scan_count(), 3);
    }

    #[test]
    fn ordering_is_stable_across_cached_loads() {
        let site = site_with_posts(&["zeta", "alpha", "mid"]);
        let cache = ContentCache::new();

        let first: Vec<String> = cache
            .load(site.path())
            .unwrap()
            .iter()
            .map(|p| p.slug.clone())
            .collect();
        let second: Vec<String> = cache
            .load(site.path())
            .unwrap()
            .iter()
            .map(|p| p.slug.clone())
            .collect();

        assert_eq!(first, second);
        assert_eq!(first, ["alpha", "mid", "zeta"]);
    }
}
