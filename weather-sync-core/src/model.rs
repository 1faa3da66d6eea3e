use serde::{Deserialize, Serialize};

/// A point on the globe, supplied per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Coarse condition category derived from the provider's `main` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    Clear,
    Clouds,
    Drizzle,
    Rain,
    Thunderstorm,
    Snow,
    Unknown,
}

impl ConditionKind {
    /// Total mapping: anything not in the table is `Unknown`.
    pub fn from_category(category: &str) -> Self {
        match category.to_lowercase().as_str() {
            "clear" => ConditionKind::Clear,
            "clouds" => ConditionKind::Clouds,
            "drizzle" => ConditionKind::Drizzle,
            "rain" => ConditionKind::Rain,
            "thunderstorm" => ConditionKind::Thunderstorm,
            "snow" => ConditionKind::Snow,
            _ => ConditionKind::Unknown,
        }
    }

    /// Asset name used by cards and the widget. `None` means no icon.
    pub fn icon_name(&self) -> Option<&'static str> {
        match self {
            ConditionKind::Clear => Some("sunny"),
            ConditionKind::Clouds | ConditionKind::Drizzle => Some("cloud"),
            ConditionKind::Rain | ConditionKind::Thunderstorm => Some("rain"),
            ConditionKind::Snow => Some("snow"),
            ConditionKind::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: i64,
    #[serde(rename = "main")]
    pub main_category: String,
    pub description: String,
}

impl WeatherCondition {
    pub fn kind(&self) -> ConditionKind {
        ConditionKind::from_category(&self.main_category)
    }
}

/// Decoded weather for one location at one point in time.
///
/// Field names on the wire follow the provider payload (`weather`, `name`),
/// both for the HTTP response and for the copy kept in the shared store.
/// Unknown fields in either source are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(rename = "weather", default)]
    pub conditions: Vec<WeatherCondition>,
    #[serde(rename = "name")]
    pub location_name: String,
}

impl WeatherSnapshot {
    pub fn new(conditions: Vec<WeatherCondition>, location_name: impl Into<String>) -> Self {
        Self {
            conditions,
            location_name: location_name.into(),
        }
    }

    /// The condition the UI leads with.
    pub fn primary_condition(&self) -> Option<&WeatherCondition> {
        self.conditions.first()
    }
}

/// What the view layer should show right now.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Success(T),
    Error(String),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Loading
    }
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }
}
