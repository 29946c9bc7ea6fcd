//! Image aspect-ratio discovery
//!
//! Ratios are read from image headers (no full decode) on blocking worker
//! threads and memoized per source in an [`AspectCache`] owned by the
//! gallery session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{FolioError, Result};
use crate::layout::mosaic::sanitize_ratio;

/// Ratio used for images that are unknown, unmeasured or failed to load
pub const DEFAULT_ASPECT_RATIO: f64 = 1.0;

/// Cache entries kept beyond the current collection size
const CACHE_SLACK: usize = 64;

/// Image file extensions picked up by directory scans
const IMAGE_EXTENSIONS: [&str; 9] = [
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff", "avif",
];

/// Something that can tell the aspect ratio of an image source.
///
/// Called on a blocking thread; implementations may do file I/O.
pub trait AspectMeasure: Send + Sync {
    fn measure(&self, src: &str) -> Result<f64>;
}

/// Measures images on the local filesystem.
///
/// Relative sources resolve against `root`. Remote URLs cannot be measured
/// here and report the default ratio.
#[derive(Debug, Clone)]
pub struct FileMeasurer {
    root: PathBuf,
}

impl FileMeasurer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Local path for a source, or `None` for remote/inline sources
    pub fn resolve(&self, src: &str) -> Option<PathBuf> {
        if src.is_empty()
            || src.starts_with("http://")
            || src.starts_with("https://")
            || src.starts_with("data:")
        {
            return None;
        }
        let path = Path::new(src.strip_prefix("file://").unwrap_or(src));
        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(self.root.join(path))
        }
    }
}

impl AspectMeasure for FileMeasurer {
    fn measure(&self, src: &str) -> Result<f64> {
        let Some(path) = self.resolve(src) else {
            tracing::debug!(src, "remote source, using default aspect ratio");
            return Ok(DEFAULT_ASPECT_RATIO);
        };

        let (width, height) =
            image::image_dimensions(&path).map_err(|source| FolioError::Image {
                path: path.clone(),
                source,
            })?;

        if width == 0 || height == 0 {
            return Ok(DEFAULT_ASPECT_RATIO);
        }
        Ok(f64::from(width) / f64::from(height))
    }
}

/// Measure many sources concurrently.
///
/// Never fails: a source that can't be measured gets
/// [`DEFAULT_ASPECT_RATIO`] so layout is never blocked on a bad image.
pub async fn measure_all<M>(measurer: std::sync::Arc<M>, sources: Vec<String>) -> Vec<(String, f64)>
where
    M: AspectMeasure + 'static,
{
    // Spawn everything first so the measurements run in parallel
    let handles: Vec<_> = sources
        .into_iter()
        .map(|src| {
            let measurer = measurer.clone();
            let task_src = src.clone();
            let handle = tokio::task::spawn_blocking(move || measurer.measure(&task_src));
            (src, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (src, handle) in handles {
        let ratio = match handle.await.map_err(FolioError::from).and_then(|r| r) {
            Ok(ratio) => sanitize_ratio(ratio),
            Err(e) => {
                tracing::warn!(src = %src, error = %e, "could not measure image, using default ratio");
                DEFAULT_ASPECT_RATIO
            }
        };
        results.push((src, ratio));
    }
    results
}

/// Session-scoped memo of measured aspect ratios, keyed by image source.
///
/// Bounded: entries for sources that leave the collection are evicted with
/// [`retain_sources`](Self::retain_sources), and the cache never grows past
/// the collection size plus a small slack.
#[derive(Debug, Clone)]
pub struct AspectCache {
    ratios: HashMap<String, f64>,
    capacity: usize,
}

impl Default for AspectCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AspectCache {
    pub fn new() -> Self {
        Self {
            ratios: HashMap::new(),
            capacity: CACHE_SLACK,
        }
    }

    pub fn get(&self, src: &str) -> Option<f64> {
        self.ratios.get(src).copied()
    }

    pub fn contains(&self, src: &str) -> bool {
        self.ratios.contains_key(src)
    }

    /// Cached ratio or the default for unmeasured sources
    pub fn ratio_or_default(&self, src: &str) -> f64 {
        self.get(src).unwrap_or(DEFAULT_ASPECT_RATIO)
    }

    pub fn insert(&mut self, src: String, ratio: f64) {
        if self.ratios.len() >= self.capacity && !self.ratios.contains_key(&src) {
            // Over budget: drop an arbitrary entry, it'll be re-measured on demand
            if let Some(victim) = self.ratios.keys().next().cloned() {
                self.ratios.remove(&victim);
            }
        }
        self.ratios.insert(src, sanitize_ratio(ratio));
    }

    /// Keep only the given sources and resize the budget to fit them.
    pub fn retain_sources<'a>(&mut self, sources: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = sources.into_iter().collect();
        self.ratios.retain(|src, _| keep.contains(src.as_str()));
        self.capacity = keep.len() + CACHE_SLACK;
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }
}

/// Find image files under `dir`, sorted by path.
pub fn scan_images(dir: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        })
        .collect();
    images.sort();
    images
}

/// Scan `dir` and measure every image in it.
///
/// Sources are reported relative to `dir` and resolved against it, so a
/// relative `dir` works the same as an absolute one.
pub async fn measure_folder(dir: &Path) -> Vec<(String, f64)> {
    let sources: Vec<String> = scan_images(dir)
        .into_iter()
        .map(|path| {
            path.strip_prefix(dir)
                .map(Path::to_path_buf)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    tracing::debug!(dir = %dir.display(), images = sources.len(), "measuring folder");
    measure_all(std::sync::Arc::new(FileMeasurer::new(dir)), sources).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn test_resolve_sources() {
        let measurer = FileMeasurer::new("/srv/media");
        assert_eq!(measurer.resolve("https://cdn.example.com/a.jpg"), None);
        assert_eq!(measurer.resolve(""), None);
        assert_eq!(
            measurer.resolve("photos/a.jpg"),
            Some(PathBuf::from("/srv/media/photos/a.jpg"))
        );
        assert_eq!(
            measurer.resolve("file:///tmp/b.png"),
            Some(PathBuf::from("/tmp/b.png"))
        );
    }

    #[test]
    fn test_measure_local_png() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("wide.png"), 40, 20);

        let measurer = FileMeasurer::new(dir.path());
        let ratio = measurer.measure("wide.png").unwrap();
        assert!((ratio - 2.0).abs() < 1e-9);
        assert_eq!(measurer.measure("https://x/y.jpg").unwrap(), DEFAULT_ASPECT_RATIO);
        assert!(measurer.measure("missing.png").is_err());
    }

    #[tokio::test]
    async fn test_measure_all_defaults_failures() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("tall.png"), 10, 20);

        let measurer = Arc::new(FileMeasurer::new(dir.path()));
        let results = measure_all(
            measurer,
            vec!["tall.png".to_string(), "broken.png".to_string()],
        )
        .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "tall.png");
        assert!((results[0].1 - 0.5).abs() < 1e-9);
        assert_eq!(results[1], ("broken.png".to_string(), DEFAULT_ASPECT_RATIO));
    }

    #[test]
    fn test_cache_defaults_and_sanitizes() {
        let mut cache = AspectCache::new();
        assert_eq!(cache.ratio_or_default("a"), DEFAULT_ASPECT_RATIO);
        cache.insert("a".into(), 1.5);
        cache.insert("b".into(), f64::NAN);
        assert_eq!(cache.get("a"), Some(1.5));
        assert_eq!(cache.get("b"), Some(1.0));
    }

    #[test]
    fn test_cache_evicts_on_collection_change() {
        let mut cache = AspectCache::new();
        cache.insert("a".into(), 1.2);
        cache.insert("b".into(), 0.8);
        cache.retain_sources(["b", "c"]);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_stays_bounded() {
        let mut cache = AspectCache::new();
        cache.retain_sources(std::iter::empty());
        for i in 0..500 {
            cache.insert(format!("img-{i}"), 1.0);
        }
        assert!(cache.len() <= CACHE_SLACK);
    }

    #[tokio::test]
    async fn test_measure_relative_folder() {
        let dir = tempfile::Builder::new().tempdir_in(".").unwrap();
        // The guard may hold an absolute path; measure through the relative one
        let cwd = std::env::current_dir().unwrap();
        let relative = dir
            .path()
            .strip_prefix(&cwd)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| dir.path().to_path_buf());
        assert!(relative.is_relative());
        std::fs::create_dir(relative.join("sub")).unwrap();
        write_png(&relative.join("wide.png"), 40, 20);
        write_png(&relative.join("sub").join("tall.png"), 10, 40);

        let measured = measure_folder(&relative).await;
        assert_eq!(measured.len(), 2);
        assert_eq!(measured[0].0, Path::new("sub").join("tall.png").to_string_lossy());
        assert!((measured[0].1 - 0.25).abs() < 1e-9);
        assert_eq!(measured[1].0, "wide.png");
        assert!((measured[1].1 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_scan_images_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        write_png(&dir.path().join("b.png"), 2, 2);
        // Only the extension matters, contents are never decoded here
        std::fs::write(dir.path().join("sub").join("a.JPG"), b"jpeg").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();

        let found = scan_images(dir.path());
        assert_eq!(
            found,
            vec![dir.path().join("b.png"), dir.path().join("sub").join("a.JPG")]
        );
    }
}
