use anyhow::{Context, Result};
use chrono::Weekday;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::availability::{validate_slot_minutes, ScheduleSettings, DEFAULT_SLOT_MINUTES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClockFormat {
    #[default]
    Hour24,      // "14:30"
    Hour12,      // "2:30pm"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Sunday => Weekday::Sun,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub partner_id: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
    #[serde(default)]
    pub clock_format: ClockFormat,
    #[serde(default)]
    pub week_start: WeekStart,
    #[serde(default = "default_slot_duration")]
    pub slot_duration_minutes: u16,
    #[serde(default)]
    pub buffer_time_minutes: u16,
    #[serde(default = "default_max_advance_booking_days")]
    pub max_advance_booking_days: u16,
    #[serde(default = "default_schedule_start_hour")]
    pub schedule_start_hour: u8,
    #[serde(default = "default_schedule_end_hour")]
    pub schedule_end_hour: u8,
}

fn default_font_scale() -> f32 {
    1.0
}

fn default_slot_duration() -> u16 {
    DEFAULT_SLOT_MINUTES
}

fn default_max_advance_booking_days() -> u16 {
    30
}

fn default_schedule_start_hour() -> u8 {
    6  // 6am
}

fn default_schedule_end_hour() -> u8 {
    22  // 10pm
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            partner_id: String::new(),
            api_token: None,
            font_scale: 1.0,
            clock_format: ClockFormat::Hour24,
            week_start: WeekStart::Monday,
            slot_duration_minutes: DEFAULT_SLOT_MINUTES,
            buffer_time_minutes: 0,
            max_advance_booking_days: 30,
            schedule_start_hour: 6,
            schedule_end_hour: 22,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .context("Failed to read config file")?;
        let config: Config = serde_json::from_str(&contents)
            .context("Failed to parse config file")?;
        Ok(config.normalized())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Replace values the editor cannot work with by their defaults.
    pub fn normalized(mut self) -> Self {
        if let Err(e) = validate_slot_minutes(self.slot_duration_minutes) {
            tracing::warn!(error = %e, "invalid slot duration in config, using default");
            self.slot_duration_minutes = DEFAULT_SLOT_MINUTES;
        }
        self.schedule_end_hour = self.schedule_end_hour.min(24);
        if self.schedule_start_hour >= self.schedule_end_hour {
            self.schedule_start_hour = default_schedule_start_hour();
            self.schedule_end_hour = default_schedule_end_hour();
        }
        if !(0.5..=3.0).contains(&self.font_scale) {
            self.font_scale = default_font_scale();
        }
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.trim().is_empty()
            && !self.partner_id.trim().is_empty()
            && self.api_token.is_some()
    }

    fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "slotboard", "slotboard")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    pub fn base_url(&self) -> String {
        // Default to https, drop trailing slashes
        let url = self.api_base_url.trim().trim_end_matches('/');
        if url.starts_with("https://") || url.starts_with("http://") {
            url.to_string()
        } else {
            format!("https://{}", url)
        }
    }

    /// Booking metadata used when the partner has no stored schedule yet.
    pub fn schedule_settings(&self) -> ScheduleSettings {
        ScheduleSettings {
            slot_duration_minutes: self.slot_duration_minutes,
            buffer_time_minutes: self.buffer_time_minutes,
            max_advance_booking_days: self.max_advance_booking_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.slot_duration_minutes, 30);
        assert_eq!(config.week_start, WeekStart::Monday);
        assert!(!config.is_configured());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_base_url: "api.example.com/v1/".to_string(),
            partner_id: "p-42".to_string(),
            api_token: Some("secret".to_string()),
            week_start: WeekStart::Sunday,
            slot_duration_minutes: 15,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.is_configured());
        assert_eq!(loaded.partner_id, "p-42");
        assert_eq!(loaded.week_start.weekday(), Weekday::Sun);
        assert_eq!(loaded.schedule_settings().slot_duration_minutes, 15);
        assert_eq!(loaded.base_url(), "https://api.example.com/v1");
    }

    #[test]
    fn partial_file_fills_defaults_and_fixes_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "api_base_url": "http://localhost:8080", "partner_id": "p-1",
                 "slot_duration_minutes": 7, "schedule_start_hour": 20, "schedule_end_hour": 8 }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.slot_duration_minutes, 30);
        assert_eq!((config.schedule_start_hour, config.schedule_end_hour), (6, 22));
        assert_eq!(config.max_advance_booking_days, 30);
        assert_eq!(config.base_url(), "http://localhost:8080");
        assert!(!config.is_configured());
    }

    #[test]
    fn unreadable_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
