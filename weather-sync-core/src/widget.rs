//! Home-screen widget side.
//!
//! The widget host runs on its own schedule and never talks to the network.
//! [`TimelineSource`] hands it five hourly entries; each entry reads the shared
//! store only when it is rendered, so all five show the same data until the
//! app writes a fresher snapshot.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::{background::BackgroundImage, store::SharedStore};

/// Number of entries in a generated timeline.
pub const TIMELINE_ENTRY_COUNT: usize = 5;

/// Fire-and-forget request to the widget host to rebuild its timelines.
pub trait TimelineReloader: Send + Sync + Debug {
    fn reload_all_timelines(&self);
}

/// User-editable widget configuration, carried unchanged in every entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfiguration {
    pub favorite_emoji: String,
}

impl Default for WidgetConfiguration {
    fn default() -> Self {
        Self {
            favorite_emoji: "😀".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub date: DateTime<Utc>,
    pub configuration: WidgetConfiguration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadPolicy {
    /// Ask for a new timeline after the last entry's date.
    AtEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    pub policy: ReloadPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetFamily {
    #[default]
    Small,
    Medium,
    Large,
    ExtraLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Leading,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTone {
    /// Over a photo.
    Light,
    Dark,
}

impl WidgetFamily {
    /// Edge length of the square condition icon, in points.
    pub fn icon_size(&self) -> u32 {
        match self {
            WidgetFamily::Small => 67,
            WidgetFamily::Medium => 82,
            WidgetFamily::Large | WidgetFamily::ExtraLarge => 155,
        }
    }

    pub fn font_size(&self) -> u32 {
        match self {
            WidgetFamily::Small => 18,
            WidgetFamily::Medium => 22,
            WidgetFamily::Large | WidgetFamily::ExtraLarge => 32,
        }
    }

    pub fn alignment(&self) -> Alignment {
        match self {
            WidgetFamily::Medium => Alignment::Leading,
            _ => Alignment::Center,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetContent {
    Weather {
        location_name: String,
        icon: Option<&'static str>,
    },
    /// Nothing has been fetched yet.
    OpenAppFirst,
}

/// Everything needed to draw one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetView {
    pub date: DateTime<Utc>,
    pub family: WidgetFamily,
    pub content: WidgetContent,
    pub background: Option<BackgroundImage>,
    pub text_tone: TextTone,
}

#[derive(Debug, Clone)]
pub struct TimelineSource {
    store: SharedStore,
}

impl TimelineSource {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn placeholder(&self, now: DateTime<Utc>) -> TimelineEntry {
        TimelineEntry {
            date: now,
            configuration: WidgetConfiguration::default(),
        }
    }

    pub fn snapshot(&self, configuration: &WidgetConfiguration, now: DateTime<Utc>) -> TimelineEntry {
        TimelineEntry {
            date: now,
            configuration: configuration.clone(),
        }
    }

    /// Five entries an hour apart, starting at `now`.
    pub fn timeline(&self, configuration: &WidgetConfiguration, now: DateTime<Utc>) -> Timeline {
        let entries = (0..TIMELINE_ENTRY_COUNT as i64)
            .map(|hour| TimelineEntry {
                date: now + Duration::hours(hour),
                configuration: configuration.clone(),
            })
            .collect();

        Timeline {
            entries,
            policy: ReloadPolicy::AtEnd,
        }
    }

    /// Build the view for `entry` from whatever the shared store holds now.
    pub fn render(&self, entry: &TimelineEntry, family: WidgetFamily) -> WidgetView {
        let background = self.store.load_background_image();

        let content = match self.store.load_weather_snapshot() {
            Some(snapshot) => WidgetContent::Weather {
                icon: snapshot
                    .primary_condition()
                    .and_then(|c| c.kind().icon_name()),
                location_name: snapshot.location_name,
            },
            None => WidgetContent::OpenAppFirst,
        };

        let text_tone = if background.is_some() {
            TextTone::Light
        } else {
            TextTone::Dark
        };

        WidgetView {
            date: entry.date,
            family,
            content,
            background,
            text_tone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{WeatherCondition, WeatherSnapshot};
    use chrono::TimeZone;
    use image::{Rgba, RgbaImage};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 4, 8, 30, 0).unwrap()
    }

    fn rainy(name: &str) -> WeatherSnapshot {
        WeatherSnapshot::new(
            vec![WeatherCondition {
                id: 501,
                main_category: "Rain".into(),
                description: "moderate rain".into(),
            }],
            name,
        )
    }

    #[test]
    fn timeline_has_five_hourly_entries() {
        let source = TimelineSource::new(SharedStore::in_memory());
        let config = WidgetConfiguration::default();

        let timeline = source.timeline(&config, now());

        assert_eq!(timeline.policy, ReloadPolicy::AtEnd);
        assert_eq!(timeline.entries.len(), TIMELINE_ENTRY_COUNT);
        for (hour, entry) in timeline.entries.iter().enumerate() {
            assert_eq!(entry.date, now() + Duration::hours(hour as i64));
            assert_eq!(entry.configuration, config);
        }
    }

    #[test]
    fn empty_store_renders_open_app_first() {
        let source = TimelineSource::new(SharedStore::in_memory());

        let view = source.render(&source.placeholder(now()), WidgetFamily::Small);

        assert_eq!(view.content, WidgetContent::OpenAppFirst);
        assert_eq!(view.text_tone, TextTone::Dark);
        assert!(view.background.is_none());
    }

    #[test]
    fn entries_read_store_at_render_time() {
        let store = SharedStore::in_memory();
        let source = TimelineSource::new(store.clone());
        let timeline = source.timeline(&WidgetConfiguration::default(), now());

        store.store_weather_snapshot(&rainy("Bandung"));
        let first = source.render(&timeline.entries[0], WidgetFamily::Medium);
        let last = source.render(&timeline.entries[4], WidgetFamily::Medium);

        assert_eq!(first.content, last.content);
        assert_eq!(
            first.content,
            WidgetContent::Weather {
                location_name: "Bandung".into(),
                icon: Some("rain"),
            }
        );

        store.store_weather_snapshot(&rainy("Bogor"));
        let refreshed = source.render(&timeline.entries[0], WidgetFamily::Medium);
        assert!(matches!(
            refreshed.content,
            WidgetContent::Weather { ref location_name, .. } if location_name == "Bogor"
        ));
    }

    #[test]
    fn no_conditions_renders_without_icon() {
        let store = SharedStore::in_memory();
        store.store_weather_snapshot(&WeatherSnapshot::new(vec![], "Nowhere"));
        let source = TimelineSource::new(store);

        let view = source.render(&source.placeholder(now()), WidgetFamily::Large);

        assert_eq!(
            view.content,
            WidgetContent::Weather {
                location_name: "Nowhere".into(),
                icon: None,
            }
        );
    }

    #[test]
    fn background_switches_text_tone() {
        let store = SharedStore::in_memory();
        let image = BackgroundImage::new(RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 255])));
        store.store_background_image(Some(&image));
        let source = TimelineSource::new(store);

        let view = source.render(&source.placeholder(now()), WidgetFamily::Small);

        assert_eq!(view.background, Some(image));
        assert_eq!(view.text_tone, TextTone::Light);
        assert_eq!(view.content, WidgetContent::OpenAppFirst);
    }

    #[test]
    fn family_layout_metrics() {
        assert_eq!(WidgetFamily::Small.icon_size(), 67);
        assert_eq!(WidgetFamily::Medium.icon_size(), 82);
        assert_eq!(WidgetFamily::ExtraLarge.icon_size(), 155);
        assert_eq!(WidgetFamily::Large.font_size(), 32);
        assert_eq!(WidgetFamily::Medium.alignment(), Alignment::Leading);
        assert_eq!(WidgetFamily::Small.alignment(), Alignment::Center);
    }
}
