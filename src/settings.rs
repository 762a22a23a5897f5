use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::error::AlignError;

/// Nanosecond precision; anything finer is lost in the result durations.
pub const MAX_OFFSET_DECIMALS: u32 = 9;

/// Step sizes for the operator commands. These are session configuration, not
/// per-command arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlignerSettings {
    /// zoom-in keeps `1 - 1/zoom_factor` of the width; zoom-out undoes it.
    pub zoom_factor: f64,
    /// look-left/right pan by `width / look_factor`.
    pub look_factor: f64,
    /// Coarse shifts move the offset by `width / shift_factor`.
    pub shift_factor: f64,
    /// scale-up/down multiply/divide by this.
    pub scale_factor: f64,
    /// Samples considered when measuring the fine-shift step.
    pub fine_shift_samples: usize,
    /// Committed offsets are rounded to this many decimals.
    pub offset_decimals: u32,
}

impl Default for AlignerSettings {
    fn default() -> Self {
        Self {
            zoom_factor: 2.0,
            look_factor: 4.0,
            shift_factor: 30.0,
            scale_factor: 1.1,
            fine_shift_samples: 100,
            offset_decimals: 4,
        }
    }
}

impl AlignerSettings {
    pub fn validate(&self) -> std::result::Result<(), AlignError> {
        if !(self.zoom_factor.is_finite() && self.zoom_factor > 1.0) {
            return Err(AlignError::InvalidSettings(format!(
                "zoom_factor must be greater than 1, got {}",
                self.zoom_factor
            )));
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 1.0) {
            return Err(AlignError::InvalidSettings(format!(
                "scale_factor must be greater than 1, got {}",
                self.scale_factor
            )));
        }
        if !(self.look_factor.is_finite() && self.look_factor > 0.0) {
            return Err(AlignError::InvalidSettings(format!(
                "look_factor must be positive, got {}",
                self.look_factor
            )));
        }
        if !(self.shift_factor.is_finite() && self.shift_factor > 0.0) {
            return Err(AlignError::InvalidSettings(format!(
                "shift_factor must be positive, got {}",
                self.shift_factor
            )));
        }
        if self.fine_shift_samples < 2 {
            return Err(AlignError::InvalidSettings(format!(
                "fine_shift_samples must be at least 2, got {}",
                self.fine_shift_samples
            )));
        }
        if self.offset_decimals > MAX_OFFSET_DECIMALS {
            return Err(AlignError::InvalidSettings(format!(
                "offset_decimals must be at most {}, got {}",
                MAX_OFFSET_DECIMALS, self.offset_decimals
            )));
        }
        Ok(())
    }
}

/// JSON-backed settings file. Missing or unreadable content falls back to the
/// defaults so a broken file never blocks an alignment run.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AlignerSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<AlignerSettings>(&contents) {
                Ok(parsed) if parsed.validate().is_ok() => parsed,
                Ok(_) | Err(_) => {
                    log::warn!(
                        "Ignoring invalid settings in {}; using defaults",
                        path.display()
                    );
                    AlignerSettings::default()
                }
            }
        } else {
            AlignerSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> AlignerSettings {
        self.data
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn update(&self, settings: AlignerSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        *guard = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: AlignerSettings = serde_json::from_str(&contents)?;
        data.validate()?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &AlignerSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
