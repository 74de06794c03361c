//! Load, build and draw a small level held in memory.

use std::io::Cursor;
use std::time::Duration;

use image::{ImageFormat, Rgba, RgbaImage};
use sefview::assets::{AssetRef, MemorySource};
use sefview::level::{load_level, Level};
use sefview::map::TileState;
use sefview::render_cache::{LayerState, RenderingCache};
use sefview::settings::RenderSettings;
use sefview::surface::{Color, RasterSurface, Rect, Surface};

const MODE: &str = "single";
const LEVEL: &str = "l07";
const PACK: &str = "harbor";

#[derive(Debug, Clone, PartialEq)]
struct BlitCall {
    src_size: (u32, u32),
    src_rect: Rect,
    dst: (i32, i32),
}

/// Records every call instead of drawing.
struct CountingSurface {
    size: (u32, u32),
    clears: usize,
    blits: Vec<BlitCall>,
    circles: Vec<(i32, i32, u32)>,
    polylines: Vec<(usize, bool)>,
    labels: Vec<(String, i32, i32)>,
}

impl CountingSurface {
    fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            clears: 0,
            blits: Vec::new(),
            circles: Vec::new(),
            polylines: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn blitted_at(&self, dst: (i32, i32), src_size: (u32, u32)) -> bool {
        self.blits
            .iter()
            .any(|b| b.dst == dst && b.src_size == src_size)
    }
}

impl Surface for CountingSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn clear(&mut self, _color: Color) {
        self.clears += 1;
        self.blits.clear();
        self.circles.clear();
        self.polylines.clear();
        self.labels.clear();
    }

    fn blit(&mut self, src: &RgbaImage, src_rect: Rect, dst_x: i32, dst_y: i32) {
        self.blits.push(BlitCall {
            src_size: src.dimensions(),
            src_rect,
            dst: (dst_x, dst_y),
        });
    }

    fn fill_circle(&mut self, cx: i32, cy: i32, radius: u32, _color: Color) {
        self.circles.push((cx, cy, radius));
    }

    fn stroke_polyline(&mut self, points: &[(i32, i32)], closed: bool, _width: u32, _color: Color) {
        self.polylines.push((points.len(), closed));
    }

    fn draw_label(&mut self, text: &str, x: i32, y: i32, _color: Color) {
        self.labels.push((text.to_string(), x, y));
    }
}

fn prefixed(s: &str) -> Vec<u8> {
    let mut out = (s.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(s.as_bytes());
    out
}

fn block(id: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = id.as_bytes().to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn u32s(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// A `width`x`height` indexed image filled with one opaque colour.
fn solid_csx(width: i32, height: i32) -> Vec<u8> {
    let mut data = 1i32.to_le_bytes().to_vec();
    data.extend_from_slice(&[0, 0, 0, 255]);
    data.extend_from_slice(&[40, 80, 120, 0]);
    data.extend_from_slice(&width.to_le_bytes());
    data.extend_from_slice(&height.to_le_bytes());
    for row in 0..=height {
        data.extend_from_slice(&(row * width).to_le_bytes());
    }
    data.extend(std::iter::repeat(0u8).take((width * height) as usize));
    data
}

fn level_container() -> Vec<u8> {
    // one static used by the door
    let mut statics = u32s(&[1]);
    statics.extend_from_slice(&[0, 0, 0, 0]);
    statics.extend(u32s(&[4, 24, 9]));
    statics.extend(prefixed("gate_sprite"));

    // one on-screen and one far away mask
    let mut masks = u32s(&[2]);
    masks.extend(u32s(&[0, 1, 2, 3]));
    masks.extend(u32s(&[0, 2, 5000, 5000]));

    let mut groups = u32s(&[1]);
    groups.extend(prefixed("gate_cells"));
    groups.extend(u32s(&[1]));
    groups.extend_from_slice(&[1, 0, 1, 0]);

    let mut doors = u32s(&[1]);
    for s in ["gate", "open_gate", "close_gate", "gate_cells", "", "gate_sprite"] {
        doors.extend(prefixed(s));
    }

    // 1x1 chunks, all four tiles open
    let mut grid = u32s(&[1, 1]);
    grid.extend(std::iter::repeat(0u8).take(24));

    let mut lvl = block("BLK_LVER", &[2, 0, 1, 0]);
    lvl.extend(block("BLK_SDSC", &statics));
    lvl.extend(block("BLK_MDSC", &masks));
    lvl.extend(block("BLK_CGRP", &groups));
    lvl.extend(block("BLK_DOOR", &doors));
    lvl.extend(block("BLK_MHDR", &grid));
    lvl
}

fn string_table() -> Vec<u8> {
    let mut sdb = b"SDB ".to_vec();
    for (id, text) in [(100, "Harbor gate"), (200, "Old sailor")] {
        sdb.extend_from_slice(&(id as i32).to_le_bytes());
        sdb.extend_from_slice(&(text.len() as i32).to_le_bytes());
        sdb.extend_from_slice(text.as_bytes());
    }
    sdb
}

const SCENE: &str = r#"
pack: "Harbor"
persons
{
    name "sailor"
    {
        position: 3 4
        literary_name: 200
    }
}
points_entrance
{
    name "pier"
    {
        position: 1 1
        direction: UP
    }
}
cell_groups
{
    name "dock"
    {
        cell_00: 0 0
        cell_01: 2 0
        cell_02: 2 2
    }
}
doors
{
    name "gate"
    {
        cells_name: "gate_cells"
        literary_name_close: 100
        is_opened: 0
    }
}
"#;

fn background_png() -> Vec<u8> {
    let image = RgbaImage::from_pixel(64, 48, Rgba([10, 10, 10, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn source() -> MemorySource {
    source_with_scene(SCENE)
}

fn source_with_scene(scene: &str) -> MemorySource {
    let pack = PACK.to_string();
    let mut source = MemorySource::new();
    source
        .insert(
            AssetRef::StringTable {
                mode: MODE.into(),
                level: LEVEL.into(),
            },
            string_table(),
        )
        .insert(
            AssetRef::Scene {
                mode: MODE.into(),
                level: LEVEL.into(),
            },
            scene.as_bytes(),
        )
        .insert(AssetRef::LevelContainer { pack: pack.clone() }, level_container())
        .insert(
            AssetRef::Static {
                pack: pack.clone(),
                number: 4,
            },
            solid_csx(3, 2),
        )
        .insert(
            AssetRef::Mask {
                pack: pack.clone(),
                number: 1,
            },
            solid_csx(1, 1),
        )
        .insert(
            AssetRef::Mask {
                pack: pack.clone(),
                number: 2,
            },
            solid_csx(1, 1),
        )
        .insert(AssetRef::Background { pack }, background_png());
    source
}

fn load() -> Level {
    load_level(&source(), MODE, LEVEL).unwrap()
}

#[test]
fn level_loads_every_layer() {
    let level = load();
    assert_eq!(level.pack(), PACK);
    assert_eq!(level.descriptor.version, "1.2");
    assert_eq!(level.statics.len(), 1);
    assert_eq!(level.masks.len(), 2);
    assert!(level.masks.iter().all(|m| m.image.is_some()));
    assert_eq!(level.doors.len(), 1);
    assert_eq!(level.doors[0].name_closed.as_deref(), Some("Harbor gate"));
    assert_eq!(level.background.as_ref().map(|b| b.dimensions()), Some((64, 48)));
}

#[test]
fn tile_raster_rebuilds_once_per_invalidate() {
    let level = load();
    let mut cache = RenderingCache::new(RenderSettings::default());
    let mut surface = CountingSurface::new(64, 48);

    cache.build(&level);
    assert_eq!(cache.stats().tile_builds, 1);

    cache.invalidate();
    assert_eq!(cache.tile_layer_state(), LayerState::Dirty);
    for frame in 0..4 {
        cache.draw(&level, &mut surface, (0, 0), Duration::from_millis(frame * 16));
    }

    assert_eq!(cache.tile_layer_state(), LayerState::Built);
    assert_eq!(cache.stats().tile_builds, 2);
    assert_eq!(cache.stats().mask_builds, 1);
    assert_eq!(surface.clears, 4);
}

#[test]
fn off_screen_mask_fragments_are_never_blitted() {
    let level = load();
    let mut cache = RenderingCache::new(RenderSettings::default());
    let mut surface = CountingSurface::new(64, 48);

    cache.draw(&level, &mut surface, (0, 0), Duration::ZERO);
    assert!(surface.blitted_at((2, 3), (1, 1)));
    assert!(!surface.blits.iter().any(|b| b.src_size == (1, 1) && b.dst == (5000, 5000)));
    let fragment_blits = surface.blits.iter().filter(|b| b.src_size == (1, 1)).count();
    assert_eq!(fragment_blits, 1);

    // scrolled so only the far mask is in view
    cache.draw(&level, &mut surface, (4990, 4990), Duration::ZERO);
    assert!(surface.blitted_at((10, 10), (1, 1)));
    assert!(!surface.blitted_at((2 - 4990, 3 - 4990), (1, 1)));
}

#[test]
fn draw_order_and_overlays() {
    let level = load();
    let mut cache = RenderingCache::new(RenderSettings::default());
    let mut surface = CountingSurface::new(64, 48);
    cache.draw(&level, &mut surface, (0, 0), Duration::ZERO);

    // background, tile raster, on-screen mask, door sprite
    let sizes: Vec<(u32, u32)> = surface.blits.iter().map(|b| b.src_size).collect();
    assert_eq!(sizes, vec![(64, 48), (24, 18), (1, 1), (3, 2)]);
    assert_eq!(surface.blits[0].src_rect, Rect::new(0, 0, 64, 48));
    assert_eq!(surface.blits[3].dst, (24, 9));

    assert!(surface.circles.contains(&(12, 9, 4)));
    assert!(surface.circles.contains(&(0, 0, 3)));
    assert!(surface.circles.contains(&(36, 36, 5)));
    assert_eq!(surface.polylines, vec![(3, true)]);

    let labels: Vec<&str> = surface.labels.iter().map(|(t, _, _)| t.as_str()).collect();
    assert_eq!(labels, vec!["pier", "dock", "Old sailor"]);
    assert_eq!(surface.labels[2].2, 36 + 15);
}

#[test]
fn opening_a_door_frees_its_cells() {
    let mut level = load();
    let mut cache = RenderingCache::new(RenderSettings::default());
    let mut surface = CountingSurface::new(64, 48);

    cache.draw(&level, &mut surface, (0, 0), Duration::ZERO);
    let states = cache.tile_states().unwrap();
    assert_eq!(states.state_at_xy(1, 1), Some(TileState::Blocked));
    assert!(surface.blitted_at((24, 9), (3, 2)));

    assert!(level.set_door_opened("gate", true));
    cache.invalidate();
    cache.draw(&level, &mut surface, (0, 0), Duration::ZERO);

    let states = cache.tile_states().unwrap();
    assert_eq!(states.state_at_xy(1, 1), Some(TileState::Open));
    assert!(!surface.blitted_at((24, 9), (3, 2)));
    assert_eq!(cache.stats().tile_builds, 2);
}

#[test]
fn far_away_scene_positions_draw_without_overflow() {
    let scene = "pack: \"Harbor\"\npersons\n{\nname \"far\"\n{\nposition: 300000000 0\n}\n}\n";
    let level = load_level(&source_with_scene(scene), MODE, LEVEL).unwrap();
    assert_eq!(level.scene.persons["far"].position.x, 300_000_000);

    let mut cache = RenderingCache::new(RenderSettings::default());
    let mut surface = CountingSurface::new(64, 48);
    cache.draw(&level, &mut surface, (0, 0), Duration::ZERO);
    cache.draw(&level, &mut surface, (i32::MIN, i32::MAX), Duration::ZERO);
    assert_eq!(surface.clears, 2);

    let mut raster = RasterSurface::new(64, 48);
    cache.draw(&level, &mut raster, (0, 0), Duration::ZERO);
    let far = raster.labels().iter().find(|l| l.text == "far").unwrap();
    assert_eq!((far.x, far.y), (i32::MAX, 15));
}
