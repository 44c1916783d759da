use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Language {
    English,
    French,
    Spanish,
    Hindi,
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl std::str::FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "french" | "fr" => Ok(Language::French),
            "spanish" | "es" => Ok(Language::Spanish),
            "hindi" | "hi" => Ok(Language::Hindi),
            other => bail!("unsupported language '{other}'"),
        }
    }
}

/// Alert thresholds, each a percentage in `1..=100`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thresholds {
    pub pest: u8,
    pub moisture: u8,
    pub nitrogen: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pest: 70,
            moisture: 30,
            nitrogen: 50,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("pest", self.pest),
            ("moisture", self.moisture),
            ("nitrogen", self.nitrogen),
        ] {
            if !(1..=100).contains(&value) {
                bail!("{name} threshold must be within 1..=100, got {value}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationToggles {
    pub pest: bool,
    pub nutrient: bool,
    #[serde(rename = "yield")]
    pub yield_updates: bool,
}

impl Default for NotificationToggles {
    fn default() -> Self {
        Self {
            pest: true,
            nutrient: true,
            yield_updates: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThresholdSettings {
    pub thresholds: Thresholds,
    #[serde(rename = "notifications")]
    pub notifications_enabled: NotificationToggles,
    pub language: Language,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AreaUnit {
    Acres,
    Hectares,
}

const ACRES_PER_HECTARE: f64 = 2.471;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FarmProfile {
    pub farm_name: String,
    pub farm_area_value: f64,
    pub farm_unit: AreaUnit,
}

impl Default for FarmProfile {
    fn default() -> Self {
        Self {
            farm_name: "Green Valley Estates".into(),
            farm_area_value: 1240.0,
            farm_unit: AreaUnit::Acres,
        }
    }
}

impl FarmProfile {
    pub fn area_hectares(&self) -> f64 {
        match self.farm_unit {
            AreaUnit::Acres => self.farm_area_value / ACRES_PER_HECTARE,
            AreaUnit::Hectares => self.farm_area_value,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    #[serde(default)]
    preferences: ThresholdSettings,
    #[serde(default)]
    farm: FarmProfile,
}

/// JSON-backed user preferences, read by the notification trigger and the
/// ambient alert stream.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<UserSettings>(&contents) {
                Ok(mut data) => {
                    if let Err(err) = data.preferences.thresholds.validate() {
                        log::warn!(
                            "Resetting invalid thresholds in {}: {err}",
                            path.display()
                        );
                        data.preferences.thresholds = Thresholds::default();
                    }
                    data
                }
                Err(err) => {
                    log::warn!(
                        "Ignoring unreadable settings at {}: {err}",
                        path.display()
                    );
                    UserSettings::default()
                }
            }
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn preferences(&self) -> ThresholdSettings {
        self.read().preferences
    }

    pub fn farm_profile(&self) -> FarmProfile {
        self.read().farm.clone()
    }

    pub fn update_preferences(&self, preferences: ThresholdSettings) -> Result<()> {
        preferences.thresholds.validate()?;
        let mut guard = self.write();
        guard.preferences = preferences;
        self.persist(&guard)
    }

    pub fn update_thresholds(&self, thresholds: Thresholds) -> Result<()> {
        thresholds.validate()?;
        let mut guard = self.write();
        guard.preferences.thresholds = thresholds;
        self.persist(&guard)
    }

    pub fn set_language(&self, language: Language) -> Result<()> {
        let mut guard = self.write();
        guard.preferences.language = language;
        self.persist(&guard)
    }

    pub fn update_farm_profile(&self, farm: FarmProfile) -> Result<()> {
        if !farm.farm_area_value.is_finite() || farm.farm_area_value <= 0.0 {
            bail!("farm area must be a positive number");
        }
        let mut guard = self.write();
        guard.farm = farm;
        self.persist(&guard)
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
