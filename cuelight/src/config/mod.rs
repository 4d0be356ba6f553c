/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Settings loading and persistence.
//!
//! The settings record is owned by the caller and handed to the codec and the
//! scheduler **by value or reference per call**; nothing in the core keeps a
//! pointer to it.
//!
//! The expected YAML structure is:
//! ```yaml
//! device:
//!   on_ms: 350
//!   gap_ms: 0
//!   led_count: 5
//!   brightness: 100
//!   buzzer_freq_hz: 1500
//!   buzzer_dur_ms: 500
//! voice1: { announcer: 0, style: 1, speed: 5, pitch: 5, volume: 5 }
//! voice2: { announcer: 3, style: 2, speed: 5, pitch: 5, volume: 5 }
//! colors:
//!   - { index: 1, rgb: "FF0000" }
//!   - { index: 2, rgb: "00FF00" }
//! conflicts:
//!   - { c1: 1, c2: 2, c3: 0 }
//! ```

pub mod palette;

pub use palette::{ColorItem, ColorTable, ConflictTriple, PaletteError, Rgb};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ── Device / voice records ────────────────────────────────────────────────────

/// Device-wide LED and buzzer parameters.  Times are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProps {
    /// How long each LED stays lit (all modes).
    pub on_ms: u32,
    /// Gap between LEDs in SEQ / RAND modes.
    pub gap_ms: u32,
    /// Number of LEDs the device drives.  Every LED action is aligned to it.
    pub led_count: u32,
    /// 0–255.
    pub brightness: u32,
    pub buzzer_freq_hz: u32,
    pub buzzer_dur_ms: u32,
}

impl Default for DeviceProps {
    fn default() -> Self {
        Self {
            on_ms: 350,
            gap_ms: 0,
            led_count: 5,
            brightness: 100,
            buzzer_freq_hz: 1500,
            buzzer_dur_ms: 500,
        }
    }
}

/// One speech-synthesis parameter set (`VOICESET1` / `VOICESET2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceProps {
    /// 0–10.
    pub announcer: u32,
    /// 0–2.
    pub style: u32,
    /// 0–10.
    pub speed: u32,
    /// 0–10.
    pub pitch: u32,
    /// 0–10.
    pub volume: u32,
}

impl Default for VoiceProps {
    fn default() -> Self {
        Self {
            announcer: 0,
            style: 1,
            speed: 5,
            pitch: 5,
            volume: 5,
        }
    }
}

// ── Private YAML (de)serialization type ───────────────────────────────────────

/// Maps directly onto the YAML file layout.  Callers work with [`Settings`].
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SettingsFile {
    device: DeviceProps,
    voice1: VoiceProps,
    voice2: VoiceProps,
    colors: Vec<ColorItem>,
    conflicts: Vec<ConflictTriple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_plan_path: Option<PathBuf>,
}

// ── Settings ──────────────────────────────────────────────────────────────────

/// Everything the core needs from the settings collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub device: DeviceProps,
    pub voice1: VoiceProps,
    pub voice2: VoiceProps,
    /// Palette and conflict table (always normalised).
    pub palette: ColorTable,
    /// Most recently imported plan file, if any.
    pub last_plan_path: Option<PathBuf>,
}

impl Settings {
    fn from_file(file: SettingsFile) -> Self {
        Self {
            device: file.device,
            voice1: file.voice1,
            voice2: file.voice2,
            palette: ColorTable::new(file.colors, file.conflicts),
            last_plan_path: file.last_plan_path,
        }
    }

    fn to_file(&self) -> SettingsFile {
        SettingsFile {
            device: self.device,
            voice1: self.voice1,
            voice2: self.voice2,
            colors: self.palette.colors().to_vec(),
            conflicts: self.palette.conflicts().to_vec(),
            last_plan_path: self.last_plan_path.clone(),
        }
    }

    /// Parse settings from a YAML string, normalising the palette.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: SettingsFile =
            serde_yaml::from_str(content).context("Failed to parse settings YAML")?;
        Ok(Self::from_file(file))
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.to_file()).context("Failed to serialise settings")
    }
}

// ── SettingsStore ─────────────────────────────────────────────────────────────

/// Persistence collaborator for [`Settings`].
pub trait SettingsStore {
    fn load(&self) -> Result<Settings>;
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// [`SettingsStore`] backed by a single YAML file.
#[derive(Debug, Clone)]
pub struct YamlSettingsStore {
    path: PathBuf,
}

impl YamlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for YamlSettingsStore {
    /// Reads the settings file.
    ///
    /// * A missing file yields defaults (empty palette, default device props).
    /// * Malformed YAML is an error.
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            warn!(
                "Settings file {} not found, using default settings",
                self.path.display()
            );
            return Ok(Settings::default());
        }

        info!("Loading settings from: {}", self.path.display());
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot open settings file: {}", self.path.display()))?;
        let settings = Settings::from_yaml_str(&content)
            .with_context(|| format!("Failed to load settings file: {}", self.path.display()))?;

        debug!(
            colors = settings.palette.colors().len(),
            conflicts = settings.palette.conflicts().len(),
            led_count = settings.device.led_count,
            "settings loaded"
        );
        Ok(settings)
    }

    /// Overwrites the settings file with `settings`.
    fn save(&self, settings: &Settings) -> Result<()> {
        let yaml = settings.to_yaml_string()?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create settings directory: {}", dir.display()))?;
        }
        std::fs::write(&self.path, yaml)
            .with_context(|| format!("Cannot write settings file: {}", self.path.display()))?;
        info!("Settings saved to: {}", self.path.display());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
