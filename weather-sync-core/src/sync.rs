//! The view-state controller: coordinate in, rendered state out, with the
//! shared store kept current for the widget.

use serde::{Deserialize, Serialize};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::task::JoinHandle;

use crate::{
    background::BackgroundImage,
    client::{FetchError, WeatherClient},
    model::{Coordinate, ViewState, WeatherSnapshot},
    observable::{Observable, Subscription},
    store::SharedStore,
    widget::TimelineReloader,
};

pub type WeatherState = ViewState<WeatherSnapshot>;

/// What to do with a fetch that completes after a newer one was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Every completion publishes; whichever lands last wins.
    #[default]
    PublishLast,
    /// Only the most recently issued fetch may publish.
    LatestRequest,
}

/// Owns the weather view-state and the background image.
///
/// Cloning yields another handle to the same controller.
#[derive(Debug, Clone)]
pub struct SyncController {
    client: Arc<dyn WeatherClient>,
    store: SharedStore,
    reloader: Option<Arc<dyn TimelineReloader>>,
    stale_policy: StalePolicy,
    state: Observable<WeatherState>,
    background: Observable<Option<BackgroundImage>>,
    latest_token: Arc<AtomicU64>,
}

impl SyncController {
    /// Start in `Loading`, with the background taken from the shared store.
    pub fn new(client: Arc<dyn WeatherClient>, store: SharedStore) -> Self {
        let background = store.load_background_image();
        Self::from_parts(client, store, background)
    }

    /// Start with an injected background instead of reading the store.
    pub fn with_background_image(
        client: Arc<dyn WeatherClient>,
        store: SharedStore,
        image: BackgroundImage,
    ) -> Self {
        Self::from_parts(client, store, Some(image))
    }

    fn from_parts(
        client: Arc<dyn WeatherClient>,
        store: SharedStore,
        background: Option<BackgroundImage>,
    ) -> Self {
        Self {
            client,
            store,
            reloader: None,
            stale_policy: StalePolicy::default(),
            state: Observable::new(ViewState::Loading),
            background: Observable::new(background),
            latest_token: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn reload_timelines_with(mut self, reloader: Arc<dyn TimelineReloader>) -> Self {
        self.reloader = Some(reloader);
        self
    }

    pub fn stale_policy(mut self, policy: StalePolicy) -> Self {
        self.stale_policy = policy;
        self
    }

    pub fn state(&self) -> WeatherState {
        self.state.get()
    }

    pub fn subscribe_state(&self) -> Subscription<WeatherState> {
        self.state.subscribe()
    }

    pub fn background_image(&self) -> Option<BackgroundImage> {
        self.background.get()
    }

    pub fn subscribe_background(&self) -> Subscription<Option<BackgroundImage>> {
        self.background.subscribe()
    }

    /// Reset to `Loading` and fetch in the background.
    ///
    /// Calls are never queued or merged; an earlier in-flight fetch keeps
    /// running. The returned handle resolves once the result is published
    /// (or dropped as stale).
    pub fn get_weather(&self, coordinate: Coordinate) -> JoinHandle<()> {
        let token = self.latest_token.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.set(ViewState::Loading);

        tracing::debug!(
            token,
            lat = coordinate.latitude,
            lon = coordinate.longitude,
            "fetching weather"
        );

        let this = self.clone();
        tokio::spawn(async move {
            let result = this.client.fetch(coordinate).await;
            this.complete(token, result);
        })
    }

    fn complete(&self, token: u64, result: Result<WeatherSnapshot, FetchError>) {
        let next = match &result {
            Ok(snapshot) => ViewState::Success(snapshot.clone()),
            Err(e) => ViewState::Error(e.to_string()),
        };

        // Persisting inside the publish keeps the stored snapshot in the
        // same order as the published states.
        let published = self.state.set_then(
            next,
            || match self.stale_policy {
                StalePolicy::PublishLast => true,
                StalePolicy::LatestRequest => self.latest_token.load(Ordering::SeqCst) == token,
            },
            |state| {
                if let ViewState::Success(snapshot) = state {
                    self.store.store_weather_snapshot(snapshot);
                }
            },
        );

        match result {
            _ if !published => tracing::debug!(token, "dropping stale weather result"),
            Ok(snapshot) => {
                tracing::debug!(token, location = %snapshot.location_name, "weather updated")
            }
            Err(e) => tracing::debug!(token, error = %e, "weather fetch failed"),
        }
    }

    /// Replace the background, keeping memory and the shared store in step.
    ///
    /// A given image is downscaled first. `None` resets to the default and
    /// removes the stored copy.
    pub fn update_background_image(&self, image: Option<BackgroundImage>) {
        let mut resized = image.as_ref().map(BackgroundImage::resized);

        if !self.store.store_background_image(resized.as_ref()) {
            // The store fell back to no image; follow it.
            resized = None;
        }

        tracing::info!(
            size = ?resized.as_ref().map(|i| (i.width(), i.height())),
            "background image updated"
        );
        self.background.set(resized);

        if let Some(reloader) = &self.reloader {
            reloader.reload_all_timelines();
        }
    }
}
