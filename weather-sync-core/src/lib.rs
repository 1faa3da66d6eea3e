//! Core library for the weather app and its home-screen widget.
//!
//! This crate defines:
//! - The weather client and its error taxonomy
//! - The view-state controller that keeps the UI and the shared store in sync
//! - The shared key-value store seen by both the app and the widget
//! - Background image downscaling
//! - The widget timeline source
//!
//! It is used by `weather-sync-cli`, but the controller and store are meant to
//! be embedded by any host that supplies locations and photos.

pub mod background;
pub mod client;
pub mod config;
pub mod model;
pub mod observable;
pub mod store;
pub mod sync;
pub mod widget;

pub use background::BackgroundImage;
pub use client::{FetchError, OpenWeatherClient, WeatherClient};
pub use config::Config;
pub use model::{ConditionKind, Coordinate, ViewState, WeatherCondition, WeatherSnapshot};
pub use observable::{Observable, Subscription};
pub use store::{FileStore, KeyValueStore, MemoryStore, SharedStore, StoreError};
pub use sync::{StalePolicy, SyncController, WeatherState};
pub use widget::{TimelineReloader, TimelineSource, WidgetFamily};
