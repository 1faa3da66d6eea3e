use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Password, Text};
use std::{path::PathBuf, sync::Arc};

use weather_sync_core::{
    BackgroundImage, Config, Coordinate, FileStore, OpenWeatherClient, SharedStore,
    SyncController, TimelineReloader, TimelineSource, ViewState, WidgetFamily,
    WeatherState,
    widget::{Alignment, TextTone, WidgetConfiguration, WidgetContent},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-sync", version, about = "Weather fetch and widget sync")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key and endpoint.
    Configure,

    /// Fetch weather for a coordinate and update the shared snapshot.
    Fetch {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Set or clear the background photo used by the widget.
    Background {
        /// Image file (PNG or JPEG).
        #[arg(required_unless_present = "clear", conflicts_with = "clear")]
        path: Option<PathBuf>,

        /// Reset to the default background.
        #[arg(long)]
        clear: bool,
    },

    /// Render the widget timeline from the shared store.
    Widget {
        #[arg(long, value_enum, default_value_t = Family::Small)]
        family: Family,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Family {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

impl From<Family> for WidgetFamily {
    fn from(value: Family) -> Self {
        match value {
            Family::Small => WidgetFamily::Small,
            Family::Medium => WidgetFamily::Medium,
            Family::Large => WidgetFamily::Large,
            Family::ExtraLarge => WidgetFamily::ExtraLarge,
        }
    }
}

/// The widget re-reads the store on every render, so a reload is just a note.
#[derive(Debug)]
struct LogReloader;

impl TimelineReloader for LogReloader {
    fn reload_all_timelines(&self) {
        tracing::info!("widget timelines reload requested");
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),
            Command::Fetch { lat, lon } => fetch(&config, Coordinate::new(lat, lon)).await,
            Command::Background { path, clear } => background(&config, path, clear),
            Command::Widget { family } => widget(&config, family.into()),
        }
    }
}

fn shared_store(config: &Config) -> Result<SharedStore> {
    let dir = config.shared_store_dir()?;
    let store = FileStore::open(&dir)
        .with_context(|| format!("Failed to open shared store at {}", dir.display()))?;
    Ok(SharedStore::new(Arc::new(store)))
}

fn controller(config: &Config, api_key: &str) -> Result<SyncController> {
    let client = OpenWeatherClient::new(config.api_url.clone(), api_key);

    Ok(SyncController::new(Arc::new(client), shared_store(config)?)
        .stale_policy(config.stale_policy)
        .reload_timelines_with(Arc::new(LogReloader)))
}

fn configure(mut config: Config) -> Result<()> {
    let api_key = Password::new("API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_url = Text::new("Endpoint:")
        .with_default(&config.api_url)
        .prompt()
        .context("Failed to read endpoint")?;

    config.set_api_key(api_key.trim().to_string());
    config.api_url = api_url.trim().to_string();
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn fetch(config: &Config, coordinate: Coordinate) -> Result<()> {
    let controller = controller(config, config.require_api_key()?)?;
    let mut states = controller.subscribe_state();

    let handle = controller.get_weather(coordinate);
    print_state(&controller.state());

    let settled = states
        .wait_for(|state| !state.is_loading())
        .await
        .context("Weather state stream closed")?;
    handle.await.context("Weather fetch task failed")?;

    print_state(&settled);
    if let Some(message) = settled.error_message() {
        bail!("Weather fetch failed: {message}");
    }
    Ok(())
}

fn print_state(state: &WeatherState) {
    match state {
        ViewState::Loading => println!("loading..."),
        ViewState::Success(snapshot) => {
            println!("{}", snapshot.location_name);
            for condition in &snapshot.conditions {
                println!("  {} ({})", condition.main_category, condition.description);
            }
        }
        ViewState::Error(message) => println!("error: {message}"),
    }
}

fn background(config: &Config, path: Option<PathBuf>, clear: bool) -> Result<()> {
    // No fetch happens here, so a missing key is fine.
    let controller = controller(config, config.api_key.as_deref().unwrap_or_default())?;

    let image = match (path, clear) {
        (_, true) | (None, _) => None,
        (Some(path), false) => Some(
            BackgroundImage::open(&path)
                .with_context(|| format!("Failed to load image: {}", path.display()))?,
        ),
    };

    controller.update_background_image(image);

    match controller.background_image() {
        Some(image) => println!("Background set ({}x{})", image.width(), image.height()),
        None => println!("Background cleared"),
    }
    Ok(())
}

fn widget(config: &Config, family: WidgetFamily) -> Result<()> {
    let source = TimelineSource::new(shared_store(config)?);
    let timeline = source.timeline(&WidgetConfiguration::default(), chrono::Utc::now());

    for entry in &timeline.entries {
        let view = source.render(entry, family);
        let tone = match view.text_tone {
            TextTone::Light => "light",
            TextTone::Dark => "dark",
        };
        let body = match &view.content {
            WidgetContent::Weather { location_name, icon } => {
                format!("{location_name} [{}]", icon.unwrap_or("-"))
            }
            WidgetContent::OpenAppFirst => "Please Open The App First".to_string(),
        };

        println!(
            "{}  {body}  (icon {}pt, font {}pt, {} aligned, {tone} text{})",
            entry.date.format("%Y-%m-%d %H:%M"),
            family.icon_size(),
            family.font_size(),
            alignment_label(family.alignment()),
            if view.background.is_some() { ", photo" } else { "" },
        );
    }
    Ok(())
}

fn alignment_label(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Leading => "leading",
        Alignment::Center => "center",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["weather-sync", "fetch", "--lat", "37.7749", "--lon", "-122.4194"])
            .unwrap();

        match cli.command {
            Command::Fetch { lat, lon } => {
                assert_eq!(lat, 37.7749);
                assert_eq!(lon, -122.4194);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn background_needs_path_or_clear() {
        assert!(Cli::try_parse_from(["weather-sync", "background"]).is_err());
        assert!(Cli::try_parse_from(["weather-sync", "background", "a.png", "--clear"]).is_err());
        assert!(Cli::try_parse_from(["weather-sync", "background", "--clear"]).is_ok());
    }

    #[test]
    fn widget_family_defaults_to_small() {
        let cli = Cli::try_parse_from(["weather-sync", "widget"]).unwrap();

        assert!(matches!(cli.command, Command::Widget { family: Family::Small }));
        assert_eq!(WidgetFamily::from(Family::ExtraLarge), WidgetFamily::ExtraLarge);
    }

    #[test]
    fn medium_widget_is_leading_aligned() {
        assert_eq!(alignment_label(WidgetFamily::from(Family::Medium).alignment()), "leading");
        assert_eq!(alignment_label(WidgetFamily::from(Family::Large).alignment()), "center");
    }
}
