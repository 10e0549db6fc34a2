use crate::engine::FieldSettings;
use crate::starfield::clamp_speed_factor;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Animation and particle settings
    pub background: BackgroundConfig,

    /// Keybindings configuration
    pub keys: KeyConfig,

    /// Status bar colors
    pub colors: ColorConfig,

    /// Help text at the bottom
    pub help_text: HelpConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Frames per second the host scheduler fires at
    pub fps: u32,
    /// Starfield population before the dark/light factor
    pub star_count: usize,
    /// Starfield depth units per millisecond
    pub speed_factor: f32,
    /// Nebula dust multiplier
    pub density: f32,
    /// Fixed random seed, for reproducible fields
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub toggle_style: Vec<String>,
    pub toggle_mode: Vec<String>,
    pub next_scheme: Vec<String>,
    pub pause: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Status bar foreground; "theme" follows the active theme's text color
    pub help_fg: String,
    /// Key labels; "theme" follows the primary accent
    pub help_key_fg: String,
    pub help_key_modifier: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpConfig {
    pub enabled: bool,
    pub separator: String,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        let field = FieldSettings::default();
        Self {
            fps: 30,
            star_count: field.star_count,
            speed_factor: field.speed_factor,
            density: field.density,
            seed: None,
        }
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            toggle_style: vec!["s".to_string(), "Tab".to_string()],
            toggle_mode: vec!["m".to_string()],
            next_scheme: vec!["c".to_string()],
            pause: vec!["p".to_string(), " ".to_string()],
            quit: vec!["Esc".to_string(), "q".to_string(), "Ctrl-c".to_string()],
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            help_fg: "theme".to_string(),
            help_key_fg: "theme".to_string(),
            help_key_modifier: vec!["bold".to_string()],
        }
    }
}

impl Default for HelpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            separator: " | ".to_string(),
        }
    }
}

impl BackgroundConfig {
    /// Frame interval in milliseconds; a zero fps is treated as one.
    pub fn frame_interval_ms(&self) -> u64 {
        1000 / u64::from(self.fps.max(1))
    }

    /// Field construction settings. The theme is filled in at mount time.
    pub fn field_settings(&self) -> FieldSettings {
        FieldSettings {
            star_count: self.star_count,
            speed_factor: clamp_speed_factor(self.speed_factor),
            density: self.density.max(0.0),
            seed: self.seed,
            ..FieldSettings::default()
        }
    }
}

// ============================================================================
// CONFIG LOADING
// ============================================================================

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "starscape")
}

pub fn get_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Loads the default config file, falling back to defaults on any problem.
pub fn load_config() -> Config {
    if let Some(config_path) = get_config_path() {
        if config_path.exists() {
            match load_config_from_path(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    warn!("{:#}", e);
                    warn!("using default configuration");
                }
            }
        }
    }
    Config::default()
}

pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Writes the commented default config to `path`, creating parent dirs.
pub fn generate_config_file(path: &Path) -> Result<()> {
    let config_dir = path.parent().context("Invalid config path")?;

    fs::create_dir_all(config_dir).with_context(|| {
        format!(
            "Failed to create config directory: {}",
            config_dir.display()
        )
    })?;

    fs::write(path, generate_default_config())
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(())
}

pub fn generate_default_config() -> String {
    String::from(
        r##"## starscape configuration file
## Place this file at ~/.config/starscape/config.toml
## All fields are optional - defaults will be used for missing values

[background]
fps = 30
## Starfield population; 50% of it is shown in dark mode, 40% in light mode
star_count = 600
## Starfield depth units travelled per millisecond
speed_factor = 0.02
## Nebula dust multiplier (1.0 = 700 dust stars)
density = 0.4
## Uncomment for the same field on every start
# seed = 42

[keys]
## Key names: Use crossterm KeyCode names
## Examples: "q", "Esc", "Enter", "Up", "Down", "Left", "Right", "Tab", "Backspace"
## Modifiers can be added with format: "Ctrl-q", "Alt-q", "Shift-Up"
toggle_style = ["s", "Tab"]
toggle_mode = ["m"]
next_scheme = ["c"]
pause = ["p", " "]
quit = ["Esc", "q", "Ctrl-c"]

[colors]
## Available colors:
## "theme" follows the active theme
## Standard: black, red, green, yellow, blue, magenta, cyan, gray, white
## Light variants: lightred, lightgreen, lightyellow, lightblue, lightmagenta, lightcyan
## Dark variants: darkgray
## Hex: "#RRGGBB" (e.g., "#ff0000" for red)
## HSL: "hsl(221 83% 53%)" or "hsl(221, 83%, 53%)"
help_fg = "theme"
help_key_fg = "theme"
help_key_modifier = ["bold"]  ## Options: bold, italic, underlined, slowblink, rapidblink, reversed, hidden, crossedout

[help_text]
enabled = true
separator = " | "
"##,
    )
}
