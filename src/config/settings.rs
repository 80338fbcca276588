use anyhow::{Context, Result};
use chrono::Weekday;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::{ExclusionPolicy, PrayerType};

fn default_jomaa_weekday() -> String {
    "friday".to_string()
}
fn default_jomaa_prayer() -> String {
    "dhuhr".to_string()
}
fn default_cycle_length_days() -> u32 {
    30
}
fn default_period_days() -> u32 {
    7
}

/// Which prayers the exclusions apply to. Domain policy, so it lives in
/// config rather than code; the defaults mirror the common rulings the
/// original app assumed (Friday reduces Dhuhr only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_jomaa_weekday")]
    pub jomaa_weekday: String,
    #[serde(default = "default_jomaa_prayer")]
    pub jomaa_prayer: String,
    #[serde(default = "default_cycle_length_days")]
    pub cycle_length_days: u32,
    /// Pre-filled period length for setup prompts (1-15).
    #[serde(default = "default_period_days")]
    pub default_period_days: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            jomaa_weekday: default_jomaa_weekday(),
            jomaa_prayer: default_jomaa_prayer(),
            cycle_length_days: default_cycle_length_days(),
            default_period_days: default_period_days(),
        }
    }
}

impl PolicyConfig {
    pub fn exclusion_policy(&self) -> Result<ExclusionPolicy> {
        let jomaa_weekday = Weekday::from_str(&self.jomaa_weekday)
            .map_err(|_| anyhow::anyhow!("Unknown weekday: {}", self.jomaa_weekday))?;
        let jomaa_prayer = PrayerType::from_str(&self.jomaa_prayer)
            .with_context(|| format!("Bad jomaa_prayer '{}'", self.jomaa_prayer))?;
        Ok(ExclusionPolicy {
            jomaa_weekday,
            jomaa_prayer,
            cycle_length_days: self.cycle_length_days,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "qada").context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("qada.db"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(&path).with_context(|| format!("Reading {:?}", path))?;
        let config: AppConfig = toml::from_str(&content).context("Parsing config.toml")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(&path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
