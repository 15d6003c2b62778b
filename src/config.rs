//! Application configuration.
//!
//! Configuration is stored in TOML format at `~/.config/champion/config.toml`
//! (or XDG equivalent). A missing file yields the defaults below.
//!
//! # Example Configuration
//!
//! ```toml
//! db_path = "/var/lib/champion/champion.db"
//! faq_path = "/etc/champion/faq.toml"
//!
//! [business]
//! name = "Champion Cleaners"
//! phone = "+971 4 285 8581"
//! services = ["Wash & Fold Service", "Bag & Shoe Spa"]
//!
//! [matcher]
//! mode = "confidence"
//! confidence_floor = 0.15
//!
//! [matcher.weights]
//! question_token = 100.0
//!
//! [pickup]
//! min_lead_days = 1
//! max_days_ahead = 30
//! opening_time = "08:00"
//! closing_time = "20:00"
//! slot_minutes = 30
//! ```

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::search::MatcherSettings;

const APP_DIR: &str = "champion";
const CONFIG_FILE: &str = "config.toml";

/// Errors that can occur when loading or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database path. Defaults to the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,

    /// FAQ catalog file (TOML or JSON). Defaults to the embedded catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faq_path: Option<PathBuf>,

    pub business: BusinessInfo,
    pub matcher: MatcherSettings,
    pub pickup: PickupSettings,
}

/// Company details shown to customers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BusinessInfo {
    pub name: String,
    pub tagline: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    /// Services a pickup can be booked for, in display order.
    pub services: Vec<String>,
    pub coverage_areas: Vec<String>,
    /// Shown when a question goes unanswered.
    pub popular_questions: Vec<String>,
}

impl Default for BusinessInfo {
    fn default() -> Self {
        Self {
            name: "Champion Cleaners".into(),
            tagline: "Your trusted laundry & dry cleaning service in the UAE".into(),
            phone: "+971 4 285 8581".into(),
            email: "info@champion-cleaners.com".into(),
            website: "https://www.champion-cleaners.com".into(),
            services: [
                "Free Pick-up & Delivery",
                "Carpet & Upholstery Cleaning",
                "Bag & Shoe Spa",
                "Permanent Creasing",
                "Wedding Gown Restoration",
                "Soft Toy Cleaning",
                "Alteration Clinique",
                "Hanger Amnesty",
                "Hygienizing & Sanitizing Service",
                "Wash & Fold Service",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            coverage_areas: ["Dubai", "Abu Dhabi", "Sharjah", "Ajman", "Ras Al Khaimah"]
                .into_iter()
                .map(String::from)
                .collect(),
            popular_questions: [
                "Do you provide free pickup and delivery?",
                "What areas do you cover?",
                "How do I schedule a pickup?",
                "What is the Bag & Shoe Spa service?",
                "Do you offer carpet and upholstery cleaning?",
                "How do you clean delicate fabrics and wedding gowns?",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl BusinessInfo {
    /// Canonical service name for `input`, ignoring case and surrounding whitespace.
    pub fn find_service(&self, input: &str) -> Option<&str> {
        let wanted = input.trim();
        self.services
            .iter()
            .find(|s| s.eq_ignore_ascii_case(wanted))
            .map(String::as_str)
    }
}

/// Pickup booking window and business hours.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PickupSettings {
    /// Earliest pickup, in days after today.
    pub min_lead_days: i64,
    /// Latest pickup, in days after today.
    pub max_days_ahead: i64,
    /// `HH:MM`, first bookable slot.
    pub opening_time: String,
    /// `HH:MM`, exclusive.
    pub closing_time: String,
    pub slot_minutes: u32,
}

impl Default for PickupSettings {
    fn default() -> Self {
        Self {
            min_lead_days: 1,
            max_days_ahead: 30,
            opening_time: "08:00".into(),
            closing_time: "20:00".into(),
            slot_minutes: 30,
        }
    }
}

impl PickupSettings {
    pub fn opening(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(self.opening_time.trim(), "%H:%M").ok()
    }

    pub fn closing(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(self.closing_time.trim(), "%H:%M").ok()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_lead_days < 0 || self.max_days_ahead < self.min_lead_days {
            return Err(ConfigError::Validation(
                "pickup window must satisfy 0 <= min_lead_days <= max_days_ahead".into(),
            ));
        }
        let (Some(open), Some(close)) = (self.opening(), self.closing()) else {
            return Err(ConfigError::Validation(
                "pickup opening_time and closing_time must be HH:MM".into(),
            ));
        };
        if open >= close {
            return Err(ConfigError::Validation(
                "pickup opening_time must be before closing_time".into(),
            ));
        }
        if self.slot_minutes == 0 {
            return Err(ConfigError::Validation(
                "pickup slot_minutes must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from the default location.
    ///
    /// Returns the defaults if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the default configuration file path.
    ///
    /// Uses XDG conventions:
    /// - Primary: `$XDG_CONFIG_HOME/champion/config.toml`
    /// - Fallback: platform-specific config dir (e.g., `~/.config/champion/config.toml` on Linux)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config).join(APP_DIR).join(CONFIG_FILE));
        }

        dirs::config_dir()
            .map(|p| p.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.business.services.is_empty() {
            return Err(ConfigError::Validation(
                "business.services cannot be empty".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for service in &self.business.services {
            if !seen.insert(service.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate service: {service}"
                )));
            }
        }

        self.matcher.validate().map_err(ConfigError::Validation)?;
        self.pickup.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ScoringMode;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.business.services.len(), 10);
        assert_eq!(config.matcher.mode, ScoringMode::Weighted);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [matcher]
            mode = "confidence"

            [pickup]
            max_days_ahead = 14
            "#,
        )
        .unwrap();
        assert_eq!(config.matcher.mode, ScoringMode::Confidence);
        assert_eq!(config.matcher.confidence_floor, 0.15);
        assert_eq!(config.pickup.max_days_ahead, 14);
        assert_eq!(config.pickup.min_lead_days, 1);
        assert_eq!(config.business.name, "Champion Cleaners");
    }

    #[test]
    fn test_duplicate_services_rejected() {
        let mut config = AppConfig::default();
        config.business.services.push("wash & fold service".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_bad_pickup_hours_rejected() {
        let mut config = AppConfig::default();
        config.pickup.opening_time = "21:00".into();
        assert!(config.validate().is_err());
        config.pickup.opening_time = "eight".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_matcher_floor_rejected() {
        let mut config = AppConfig::default();
        config.matcher.confidence_floor = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_find_service_case_insensitive() {
        let info = BusinessInfo::default();
        assert_eq!(info.find_service(" bag & shoe spa "), Some("Bag & Shoe Spa"));
        assert_eq!(info.find_service("car wash"), None);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.db_path = Some(PathBuf::from("/tmp/champion.db"));
        config.matcher.mode = ScoringMode::Confidence;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let loaded = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, AppConfig::default());
    }
}
