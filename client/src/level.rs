//! Level assembly: fetches and decodes everything one level needs, in a fixed
//! order, and joins the cross-references between the files.

use std::collections::HashMap;

use anyhow::{bail, Context};
use image::RgbaImage;
use sef_core::ani::{decode_animated_cursor, AnimatedCursor};
use sef_core::csx::decode_indexed_image;
use sef_core::lao::{decode_animation_table, AnimationInfo};
use sef_core::lvl::decode_level;
use sef_core::sdb::StringTable;
use sef_core::sef::parse_scene;
use sef_core::types::{
    CellPosition, Description, Door, LevelDescriptor, MaskDescription, SceneDescriptor, SceneDoor,
};
use sef_core::{DecodeStatus, Decoded};

use crate::animation::Animation;
use crate::assets::{AssetRef, AssetSource};

#[derive(Debug, Clone)]
pub struct LevelStatic {
    pub description: Description,
    pub image: Option<RgbaImage>,
}

#[derive(Debug, Clone)]
pub struct LevelMask {
    pub description: MaskDescription,
    pub image: Option<RgbaImage>,
}

/// A door present in both the level container and the scene.
#[derive(Debug, Clone)]
pub struct LevelDoor {
    pub door: Door,
    pub scene: SceneDoor,
    /// Index into [`Level::statics`] of the sprite drawn while closed.
    pub static_index: usize,
    pub name_closed: Option<String>,
    pub name_opened: Option<String>,
    pub opened: bool,
}

#[derive(Debug, Clone)]
pub struct Level {
    pub mode: String,
    pub name: String,
    pub strings: StringTable,
    pub scene: SceneDescriptor,
    pub descriptor: LevelDescriptor,
    pub animation_table: Vec<AnimationInfo>,
    pub statics: Vec<LevelStatic>,
    static_index: HashMap<String, usize>,
    pub masks: Vec<LevelMask>,
    pub doors: Vec<LevelDoor>,
    pub animations: Vec<Animation>,
    pub background: Option<RgbaImage>,
    /// Degraded when a required file decoded only partially.
    pub status: DecodeStatus,
}

impl Level {
    /// A level with its descriptors but no images, doors or animations yet.
    pub fn from_descriptors(
        mode: &str,
        name: &str,
        strings: StringTable,
        scene: SceneDescriptor,
        descriptor: LevelDescriptor,
    ) -> Self {
        Self {
            mode: mode.to_string(),
            name: name.to_string(),
            strings,
            scene,
            descriptor,
            animation_table: Vec::new(),
            statics: Vec::new(),
            static_index: HashMap::new(),
            masks: Vec::new(),
            doors: Vec::new(),
            animations: Vec::new(),
            background: None,
            status: DecodeStatus::Complete,
        }
    }

    /// Adds a static and indexes it by name. The first static with a given
    /// name wins lookups.
    pub fn push_static(&mut self, item: LevelStatic) -> usize {
        let index = self.statics.len();
        self.static_index
            .entry(item.description.name.clone())
            .or_insert(index);
        self.statics.push(item);
        index
    }

    pub fn pack(&self) -> &str {
        &self.scene.pack
    }

    pub fn static_by_name(&self, name: &str) -> Option<&LevelStatic> {
        self.static_index.get(name).and_then(|&i| self.statics.get(i))
    }

    pub fn door_static(&self, door: &LevelDoor) -> Option<&LevelStatic> {
        self.statics.get(door.static_index)
    }

    pub fn door(&self, sef_name: &str) -> Option<&LevelDoor> {
        self.doors.iter().find(|d| d.door.sef_name == sef_name)
    }

    /// Opens or closes a door. Returns `false` if no such door was loaded.
    /// Cached tile rasters must be invalidated by the caller afterwards.
    pub fn set_door_opened(&mut self, sef_name: &str, opened: bool) -> bool {
        match self.doors.iter_mut().find(|d| d.door.sef_name == sef_name) {
            Some(door) => {
                if door.opened != opened {
                    log::info!(
                        "door '{sef_name}' {}",
                        if opened { "opened" } else { "closed" }
                    );
                }
                door.opened = opened;
                true
            }
            None => false,
        }
    }

    /// Cells covered by doors that are currently closed.
    ///
    /// Uses the door's container cell group, falling back to the scene group
    /// named by the scene door.
    pub fn closed_door_cells(&self) -> Vec<CellPosition> {
        let mut cells = Vec::new();
        for door in self.doors.iter().filter(|d| !d.opened) {
            if let Some(group) = self.descriptor.cell_groups.get(&door.door.cell_group) {
                cells.extend_from_slice(group);
            } else if let Some(group) = self.scene.cell_groups.get(&door.scene.cells_name) {
                cells.extend(group.iter().filter_map(|p| {
                    Some(CellPosition {
                        x: u16::try_from(p.x).ok()?,
                        y: u16::try_from(p.y).ok()?,
                    })
                }));
            }
        }
        cells
    }

    /// Display name of a person: the string table entry for its literary name,
    /// or the scene key.
    pub fn person_label<'a>(&'a self, key: &'a str) -> &'a str {
        self.scene
            .persons
            .get(key)
            .and_then(|p| p.literary_name)
            .and_then(|id| self.strings.get(id))
            .filter(|name| !name.is_empty())
            .unwrap_or(key)
    }
}

/// Loads `level` of game mode `mode`.
///
/// The string table, the scene and the level container are required; images
/// and the animation table are optional and simply absent when they fail.
pub fn load_level<S>(source: &S, mode: &str, level: &str) -> anyhow::Result<Level>
where
    S: AssetSource + ?Sized,
{
    log::info!("Loading level {level} ({mode})");
    let mode_s = mode.to_string();
    let level_s = level.to_string();

    let sdb_ref = AssetRef::StringTable {
        mode: mode_s.clone(),
        level: level_s.clone(),
    };
    let sdb_bytes = source
        .fetch(&sdb_ref)
        .with_context(|| format!("fetching {sdb_ref}"))?;
    let strings = StringTable::decode(&sdb_bytes);
    warn_if_degraded(&sdb_ref, &strings);

    let sef_ref = AssetRef::Scene {
        mode: mode_s.clone(),
        level: level_s.clone(),
    };
    let sef_text = source
        .fetch_text(&sef_ref)
        .with_context(|| format!("fetching {sef_ref}"))?;
    let scene = parse_scene(&sef_text);
    if scene.pack.is_empty() {
        bail!("{sef_ref} does not name a level pack");
    }
    let pack = scene.pack.clone();

    let lvl_ref = AssetRef::LevelContainer { pack: pack.clone() };
    let lvl_bytes = source
        .fetch(&lvl_ref)
        .with_context(|| format!("fetching {lvl_ref}"))?;
    let descriptor = decode_level(&lvl_bytes);
    warn_if_degraded(&lvl_ref, &descriptor);

    let status = strings.status.and(descriptor.status);
    let mut level = Level::from_descriptors(
        mode,
        level,
        strings.into_inner(),
        scene,
        descriptor.into_inner(),
    );
    level.status = status;

    for description in level.descriptor.static_descriptions.clone() {
        let image = load_sprite(
            source,
            &AssetRef::Static {
                pack: pack.clone(),
                number: description.number,
            },
        );
        level.push_static(LevelStatic { description, image });
    }

    level.masks = level
        .descriptor
        .mask_descriptions
        .iter()
        .map(|description| LevelMask {
            description: *description,
            image: load_sprite(
                source,
                &AssetRef::Mask {
                    pack: pack.clone(),
                    number: description.number,
                },
            ),
        })
        .collect();

    let mut doors = Vec::new();
    for door in &level.descriptor.doors {
        let Some(scene_door) = level.scene.doors.get(&door.sef_name) else {
            log::debug!("door '{}' has no scene entry, skipped", door.sef_name);
            continue;
        };
        let Some(&index) = level.static_index.get(&door.static_name) else {
            log::debug!(
                "door '{}' refers to unknown static '{}', skipped",
                door.sef_name,
                door.static_name
            );
            continue;
        };
        doors.push(LevelDoor {
            door: door.clone(),
            scene: scene_door.clone(),
            static_index: index,
            name_closed: literary_name(&level.strings, scene_door.literary_name_closed),
            name_opened: literary_name(&level.strings, scene_door.literary_name_opened),
            opened: scene_door.is_opened.unwrap_or(false),
        });
    }
    level.doors = doors;

    let lao_ref = AssetRef::AnimationTable { pack: pack.clone() };
    level.animation_table = match source.fetch(&lao_ref) {
        Ok(bytes) => {
            let table = decode_animation_table(&bytes);
            warn_if_degraded(&lao_ref, &table);
            table.into_inner()
        }
        Err(e) => {
            log::warn!("{lao_ref} unavailable: {e}");
            Vec::new()
        }
    };

    let mut animations = Vec::new();
    for description in &level.descriptor.animation_descriptions {
        let Some(info) = level.animation_table.get(description.number as usize) else {
            log::debug!(
                "animation '{}' #{} has no table entry, skipped",
                description.name,
                description.number
            );
            continue;
        };
        let strip_ref = AssetRef::Animation {
            pack: pack.clone(),
            number: description.number,
        };
        let Some(strip) = load_sprite(source, &strip_ref) else {
            continue;
        };
        animations.push(Animation::new(
            strip,
            *info,
            description.position.x as i32,
            description.position.y as i32,
        ));
    }

    level.animations = animations;

    let background_ref = AssetRef::Background { pack: pack.clone() };
    level.background = match source.fetch(&background_ref) {
        Ok(bytes) => match image::load_from_memory(&bytes) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                log::warn!("{background_ref} could not be decoded: {e}");
                None
            }
        },
        Err(e) => {
            log::warn!("{background_ref} unavailable: {e}");
            None
        }
    };

    log::info!(
        "Level {} loaded: pack {pack}, {} statics, {} masks, {} doors, {} animations",
        level.name,
        level.statics.len(),
        level.masks.len(),
        level.doors.len(),
        level.animations.len()
    );

    Ok(level)
}

/// Loads an animated cursor by file name.
pub fn load_cursor<S>(source: &S, name: &str) -> anyhow::Result<Decoded<AnimatedCursor>>
where
    S: AssetSource + ?Sized,
{
    let cursor_ref = AssetRef::Cursor {
        name: name.to_string(),
    };
    let bytes = source
        .fetch(&cursor_ref)
        .with_context(|| format!("fetching {cursor_ref}"))?;
    let cursor =
        decode_animated_cursor(&bytes).with_context(|| format!("decoding {cursor_ref}"))?;
    warn_if_degraded(&cursor_ref, &cursor);
    Ok(cursor)
}

fn literary_name(strings: &StringTable, id: i32) -> Option<String> {
    if id < 0 {
        return None;
    }
    strings.get(id).map(str::to_string)
}

fn warn_if_degraded<T>(asset: &AssetRef, decoded: &Decoded<T>) {
    if !decoded.is_complete() {
        log::warn!("{asset} is truncated or malformed, using what could be decoded");
    }
}

/// Fetches and decodes an indexed sprite with a transparent fill.
fn load_sprite<S>(source: &S, asset: &AssetRef) -> Option<RgbaImage>
where
    S: AssetSource + ?Sized,
{
    let bytes = match source.fetch(asset) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("{asset} unavailable: {e}");
            return None;
        }
    };

    let decoded = decode_indexed_image(&bytes, true);
    warn_if_degraded(asset, &decoded);
    let image = decoded.into_inner();
    if image.is_empty() {
        log::warn!("{asset} decoded to an empty image");
        return None;
    }
    RgbaImage::from_raw(image.width, image.height, image.pixels)
}
