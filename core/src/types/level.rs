//! Records decoded from the level container blocks.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

use super::tile::TileGrid;
use crate::constants::UNKNOWN_VERSION;
use crate::decoded::DecodeStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapSize {
    pub width: u32,
    pub height: u32,
}

impl Default for MapSize {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Weather {
    pub kind: u16,
    pub intensity: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PixelPosition {
    pub x: u32,
    pub y: u32,
}

/// Static, animation and trigger placements share this record layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Description {
    pub name: String,
    pub param1: u16,
    pub param2: u16,
    /// Index of the bitmap / animation in the level pack.
    pub number: u32,
    pub position: PixelPosition,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaskDescription {
    pub number: u32,
    pub x: u32,
    pub y: u32,
}

/// Cell coordinates in tile units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CellPosition {
    pub x: u16,
    pub y: u16,
}

/// Named groups of cells, kept in file order.
pub type CellGroups = IndexMap<String, Vec<CellPosition>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Door {
    /// Key of the matching door in the scene descriptor.
    pub sef_name: String,
    pub open_action: String,
    pub close_action: String,
    pub cell_group: String,
    pub param1: String,
    /// Name of the static sprite drawn while the door is closed.
    pub static_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnvironmentSoundHeader {
    pub param1: i32,
    pub param2: f32,
    pub param3: f32,
    pub param4: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtraSound {
    pub path: String,
    pub volumes: [f32; 8],
    pub flags: [u32; 4],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnvironmentSounds {
    pub header: EnvironmentSoundHeader,
    pub level_theme: String,
    pub day_ambience: String,
    pub night_ambience: String,
    pub other_sounds: Vec<ExtraSound>,
}

/// Everything decoded from one level container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelDescriptor {
    pub version: String,
    pub map_size: MapSize,
    pub weather: Weather,
    pub level_floors: u32,
    pub static_descriptions: Vec<Description>,
    pub animation_descriptions: Vec<Description>,
    pub trigger_descriptions: Vec<Description>,
    pub mask_descriptions: Vec<MaskDescription>,
    pub cell_groups: CellGroups,
    pub doors: Vec<Door>,
    pub environment_sounds: EnvironmentSounds,
    pub tile_grid: TileGrid,
    /// Blocks with an unrecognised id, decoded as text under their raw id.
    pub extra_blocks: BTreeMap<String, String>,
    /// Per-block decode status, keyed by block id.
    pub block_status: BTreeMap<String, DecodeStatus>,
}

impl Default for LevelDescriptor {
    fn default() -> Self {
        Self {
            version: UNKNOWN_VERSION.to_string(),
            map_size: MapSize::default(),
            weather: Weather::default(),
            level_floors: 0,
            static_descriptions: Vec::new(),
            animation_descriptions: Vec::new(),
            trigger_descriptions: Vec::new(),
            mask_descriptions: Vec::new(),
            cell_groups: CellGroups::new(),
            doors: Vec::new(),
            environment_sounds: EnvironmentSounds::default(),
            tile_grid: TileGrid::default(),
            extra_blocks: BTreeMap::new(),
            block_status: BTreeMap::new(),
        }
    }
}

impl LevelDescriptor {
    /// True if any block had to fall back to defaults or a partial record set.
    pub fn is_degraded(&self) -> bool {
        self.block_status
            .values()
            .any(|s| *s == DecodeStatus::Degraded)
    }

    pub fn static_by_name(&self, name: &str) -> Option<&Description> {
        self.static_descriptions.iter().find(|s| s.name == name)
    }
}
