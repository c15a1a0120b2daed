//! Image feed
//!
//! Watches the image file and publishes a new [`ImageState`] whenever its
//! modification time changes. The server only ever sees whole snapshots:
//! publishing swaps one `Arc` under a short write lock.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use inkcast_core::{ImageSource, ImageState};
use parking_lot::RwLock;

use crate::error::{GatewayError, Result};

/// Current image, shared between the feed and the server
#[derive(Clone)]
pub struct SharedImage {
    current: Arc<RwLock<Arc<ImageState>>>,
}

impl SharedImage {
    /// Start out serving `image`
    pub fn new(image: ImageState) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(image))),
        }
    }

    /// Replace the served image
    pub fn publish(&self, image: ImageState) {
        *self.current.write() = Arc::new(image);
    }
}

impl ImageSource for SharedImage {
    fn snapshot(&self) -> Arc<ImageState> {
        self.current.read().clone()
    }
}

/// Read and validate an image file
pub fn load_image(path: &Path) -> Result<ImageState> {
    let bytes = fs::read(path)?;
    ImageState::new(bytes).map_err(|e| GatewayError::Image {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Polls the image file for changes
pub struct ImageFeed {
    path: PathBuf,
    interval: Duration,
    shared: SharedImage,
    last_modified: Option<SystemTime>,
}

impl ImageFeed {
    /// Create a feed publishing into `shared`
    ///
    /// The file as it is now counts as already published.
    pub fn new(path: PathBuf, interval: Duration, shared: SharedImage) -> Self {
        let last_modified = modified(&path).ok();
        Self {
            path,
            interval,
            shared,
            last_modified,
        }
    }

    /// Check the file once, publishing it if it changed
    ///
    /// Returns true when a new image was published.
    pub fn poll_once(&mut self) -> Result<bool> {
        let stamp = modified(&self.path)?;
        if self.last_modified == Some(stamp) {
            return Ok(false);
        }

        // Remember the stamp even if the content is rejected, so a bad file
        // is reported once rather than on every poll
        self.last_modified = Some(stamp);
        let image = load_image(&self.path)?;
        log::info!(
            "image {} changed, now serving {:08x}",
            self.path.display(),
            image.id()
        );
        self.shared.publish(image);
        Ok(true)
    }

    /// Poll forever on a background thread
    pub fn spawn(mut self) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("image-feed".to_string())
            .spawn(move || loop {
                thread::sleep(self.interval);
                if let Err(e) = self.poll_once() {
                    log::warn!("image feed: {}", e);
                }
            })?;
        Ok(handle)
    }
}

fn modified(path: &Path) -> Result<SystemTime> {
    Ok(fs::metadata(path)?.modified()?)
}
