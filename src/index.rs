//! The set of images we can browse, and navigation between them.
//!
//! An image is identified by its file name without the `.jpg` extension. The
//! same identifier names its OCR payloads in the data directory.

use std::{
    fs, io,
    sync::{Arc, Mutex, PoisonError},
    time::SystemTime,
};

use schemars::JsonSchema;
use thiserror::Error;

use crate::prelude::*;

/// The only image extension we list.
pub const IMAGE_EXTENSION: &str = "jpg";

/// Returned when an identifier isn't part of the image set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("image not found: {0}")]
pub struct ImageNotFound(pub String);

/// The neighbors of an image in sort order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Adjacency {
    /// The previous image, unless this is the first.
    pub prev: Option<String>,
    /// The next image, unless this is the last.
    pub next: Option<String>,
}

/// List image identifiers in `dir`, sorted ascending.
///
/// Hidden files and non-`.jpg` files are ignored. A missing directory has no
/// images.
#[instrument(level = "debug", skip_all, fields(dir = %dir.display()))]
pub fn list_images(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("Image directory does not exist");
            return Ok(vec![]);
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to read image directory {:?}", dir));
        }
    };

    let mut ids = vec![];
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read image directory {:?}", dir))?;
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != IMAGE_EXTENSION) || !path.is_file()
        {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!(path = %path.display(), "Skipping image with non-UTF-8 name");
            continue;
        };
        if stem.starts_with('.') {
            continue;
        }
        ids.push(stem.to_owned());
    }
    ids.sort();
    debug!(count = ids.len(), "Listed images");
    Ok(ids)
}

/// Find the neighbors of `current` in the sorted identifiers `ids`.
pub fn adjacency(ids: &[String], current: &str) -> Result<Adjacency, ImageNotFound> {
    let idx = ids
        .iter()
        .position(|id| id == current)
        .ok_or_else(|| ImageNotFound(current.to_owned()))?;
    Ok(Adjacency {
        prev: idx.checked_sub(1).map(|prev| ids[prev].clone()),
        next: ids.get(idx + 1).cloned(),
    })
}

/// A cache of [`list_images`] for one directory.
///
/// The listing is reused for as long as the directory's modification time is
/// unchanged. Adding, removing or renaming a file updates that time on the
/// filesystems we care about. Call [`CachedImageIndex::invalidate`] to force a
/// rescan anyway.
#[derive(Debug)]
pub struct CachedImageIndex {
    dir: PathBuf,
    entry: Mutex<Option<CacheEntry>>,
}

#[derive(Debug)]
struct CacheEntry {
    modified: SystemTime,
    ids: Arc<Vec<String>>,
}

impl CachedImageIndex {
    /// Create an empty cache for `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entry: Mutex::new(None),
        }
    }

    /// Get the current image list, rescanning if the directory changed.
    pub fn images(&self) -> Result<Arc<Vec<String>>> {
        let modified = match fs::metadata(&self.dir).and_then(|meta| meta.modified()) {
            Ok(modified) => Some(modified),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to stat image directory {:?}", self.dir)
                });
            }
        };

        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        if let (Some(modified), Some(cached)) = (modified, entry.as_ref()) {
            if cached.modified == modified {
                trace!("Using cached image list");
                return Ok(cached.ids.clone());
            }
        }

        let ids = Arc::new(list_images(&self.dir)?);
        *entry = modified.map(|modified| CacheEntry {
            modified,
            ids: ids.clone(),
        });
        Ok(ids)
    }

    /// Forget the cached listing.
    pub fn invalidate(&self) {
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Where the web viewer gets its image list from.
#[derive(Debug)]
pub enum ImageIndex {
    /// Scan the directory on every request.
    Scan(PathBuf),
    /// Reuse listings while the directory is unchanged.
    Cached(CachedImageIndex),
}

impl ImageIndex {
    /// Create an index for `dir`.
    pub fn new(dir: impl Into<PathBuf>, cached: bool) -> Self {
        if cached {
            ImageIndex::Cached(CachedImageIndex::new(dir))
        } else {
            ImageIndex::Scan(dir.into())
        }
    }

    /// Get the current sorted image list.
    pub fn images(&self) -> Result<Arc<Vec<String>>> {
        match self {
            ImageIndex::Scan(dir) => Ok(Arc::new(list_images(dir)?)),
            ImageIndex::Cached(cache) => cache.images(),
        }
    }

    /// Get the current sorted image list from a blocking thread, for use in
    /// async code.
    pub async fn load(self: Arc<Self>) -> Result<Arc<Vec<String>>> {
        tokio::task::spawn_blocking(move || self.images())
            .await
            .context("image listing task failed")?
    }

    /// Forget any cached listing. Returns `false` if there was no cache, in
    /// which case rescanning would change nothing.
    pub fn invalidate(&self) -> bool {
        match self {
            ImageIndex::Scan(_) => false,
            ImageIndex::Cached(cache) => {
                cache.invalidate();
                true
            }
        }
    }
}
