use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::map::{TILE_HEIGHT, TILE_WIDTH};
use crate::surface::Color;

/// Everything that changes how a level is composed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub tile_width: u32,
    pub tile_height: u32,

    /// Alpha multiplier applied to mask fragments.
    pub mask_opacity: f32,

    pub clear_color: Color,
    pub open_tile_color: Color,
    pub blocked_tile_color: Color,
    pub entrance_point_color: Color,
    pub cell_group_color: Color,
    pub person_color: Color,
    pub label_color: Color,

    pub show_animations: bool,
    pub show_tile_states: bool,
    pub show_masks: bool,
    pub show_doors: bool,
    pub show_entrance_points: bool,
    pub show_cell_groups: bool,
    pub show_persons: bool,

    pub entrance_point_radius: u32,
    pub cell_group_anchor_radius: u32,
    pub cell_group_line_width: u32,
    pub person_radius: u32,
    /// Distance from a marker down to its label baseline.
    pub label_offset: i32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            tile_width: TILE_WIDTH,
            tile_height: TILE_HEIGHT,

            mask_opacity: 0.5,

            clear_color: [0, 0, 0, 255],
            open_tile_color: [0, 255, 0, 64],
            blocked_tile_color: [255, 0, 0, 64],
            entrance_point_color: [0, 0, 255, 255],
            cell_group_color: [0, 128, 0, 255],
            person_color: [255, 0, 0, 255],
            label_color: [255, 255, 255, 255],

            show_animations: true,
            show_tile_states: true,
            show_masks: true,
            show_doors: true,
            show_entrance_points: true,
            show_cell_groups: true,
            show_persons: true,

            entrance_point_radius: 4,
            cell_group_anchor_radius: 3,
            cell_group_line_width: 2,
            person_radius: 5,
            label_offset: 15,
        }
    }
}

impl RenderSettings {
    /// Clamps values that would make the renderer misbehave.
    pub fn sanitized(mut self) -> Self {
        self.tile_width = self.tile_width.max(1);
        self.tile_height = self.tile_height.max(1);
        self.mask_opacity = if self.mask_opacity.is_finite() {
            self.mask_opacity.clamp(0.0, 1.0)
        } else {
            RenderSettings::default().mask_opacity
        };
        self
    }
}

pub fn default_settings_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".sefview").join("settings.json");
    } else if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata).join(".sefview").join("settings.json");
    }

    log::info!("Using fallback settings path: ./settings.json");
    PathBuf::from("settings.json")
}

/// Loads settings from `path`. A missing file gives the defaults; an unreadable
/// or malformed one is logged and also gives the defaults.
pub fn load_settings_at(path: &Path) -> RenderSettings {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No settings file at {:?}, using defaults", path);
            return RenderSettings::default();
        }
        Err(e) => {
            log::warn!("Failed to read settings file {:?}: {e}", path);
            return RenderSettings::default();
        }
    };

    match serde_json::from_slice::<RenderSettings>(&bytes) {
        Ok(s) => {
            log::info!("Loaded render settings from {:?}", path);
            s.sanitized()
        }
        Err(e) => {
            log::warn!("Failed to parse settings file {:?}: {e}", path);
            RenderSettings::default()
        }
    }
}

pub fn save_settings_at(path: &Path, settings: &RenderSettings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating settings dir {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(settings).context("serializing settings")?;
    fs::write(path, format!("{json}\n"))
        .with_context(|| format!("writing settings file {:?}", path))?;
    Ok(())
}
