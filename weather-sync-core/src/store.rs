//! Key-value storage shared between the app process and the widget process.
//!
//! [`KeyValueStore`] is the raw contract. [`SharedStore`] layers the two
//! fixed slots (weather snapshot, background image) on top of it. Writes on
//! the bridge are best effort and reads degrade to `None`; neither path
//! returns an error to the caller.

use std::{fmt::Debug, sync::Arc};

use crate::{background::BackgroundImage, model::WeatherSnapshot};

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key holding the serialized [`WeatherSnapshot`].
pub const WEATHER_DATA_KEY: &str = "weatherData";
/// Key holding the PNG-encoded background image.
pub const BACKGROUND_IMAGE_KEY: &str = "weatherBackgroundImage";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid store key '{0}'")]
    InvalidKey(String),
    #[error("store I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Last-write-wins byte storage. No transactions, no versioning.
pub trait KeyValueStore: Send + Sync + Debug {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// `Ok(None)` when the key has never been written or was removed.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed access to the two shared slots.
#[derive(Debug, Clone)]
pub struct SharedStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SharedStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    pub fn store_weather_snapshot(&self, snapshot: &WeatherSnapshot) {
        let bytes = match serde_json::to_vec(snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize weather snapshot");
                return;
            }
        };

        if let Err(e) = self.backend.put(WEATHER_DATA_KEY, &bytes) {
            tracing::warn!(error = %e, "failed to persist weather snapshot");
        }
    }

    /// Persist `image`, or drop the stored entry when `None`.
    ///
    /// Returns `false` when `image` could not be written. The stored entry is
    /// then removed as well, so readers fall back to no image rather than a
    /// stale one.
    pub fn store_background_image(&self, image: Option<&BackgroundImage>) -> bool {
        let Some(image) = image else {
            if let Err(e) = self.backend.remove(BACKGROUND_IMAGE_KEY) {
                tracing::warn!(error = %e, "failed to remove background image");
            }
            return true;
        };

        let written = match image.to_png_bytes() {
            Ok(bytes) => self
                .backend
                .put(BACKGROUND_IMAGE_KEY, &bytes)
                .inspect_err(|e| tracing::warn!(error = %e, "failed to persist background image"))
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode background image");
                false
            }
        };

        if !written {
            if let Err(e) = self.backend.remove(BACKGROUND_IMAGE_KEY) {
                tracing::warn!(error = %e, "failed to remove stale background image");
            }
        }
        written
    }

    pub fn load_weather_snapshot(&self) -> Option<WeatherSnapshot> {
        let bytes = self.read(WEATHER_DATA_KEY)?;

        serde_json::from_slice(&bytes)
            .inspect_err(|e| tracing::debug!(error = %e, "ignoring malformed weather snapshot"))
            .ok()
    }

    pub fn load_background_image(&self) -> Option<BackgroundImage> {
        let bytes = self.read(BACKGROUND_IMAGE_KEY)?;

        BackgroundImage::from_bytes(&bytes)
            .inspect_err(|e| tracing::debug!(error = %e, "ignoring malformed background image"))
            .ok()
    }

    fn read(&self, key: &str) -> Option<Vec<u8>> {
        match self.backend.get(key) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, key, "shared store read failed");
                None
            }
        }
    }
}
