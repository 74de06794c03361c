//! Cached rasters for a loaded level and the per-frame composition.
//!
//! The tile-state overlay and the mask fragments are expensive to compute and
//! change only when the level state changes, so each is kept as a layer with
//! its own [`LayerState`]. Callers that change door state call
//! [`RenderingCache::invalidate`]; the next [`RenderingCache::draw`] rebuilds
//! what is dirty and nothing else.

use std::time::Duration;

use image::RgbaImage;

use crate::level::Level;
use crate::map::{tile_rect, tile_to_pixel, TileState, TileStateMap};
use crate::settings::RenderSettings;
use crate::surface::{fill_rect, Rect, Surface};

/// Largest tile-state raster, in pixels, the cache will allocate.
pub const MAX_RASTER_PIXELS: u64 = 8192 * 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerState {
    #[default]
    Uninitialized,
    Dirty,
    Built,
}

/// How many times each layer has been built since the cache was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub tile_builds: u32,
    pub mask_builds: u32,
}

/// Background pixels around a mask, with the mask's opaque area cut out.
#[derive(Debug, Clone)]
pub struct MaskFragment {
    pub x: i32,
    pub y: i32,
    pub image: RgbaImage,
}

impl MaskFragment {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.image.width(), self.image.height())
    }
}

#[derive(Debug, Clone)]
pub struct RenderingCache {
    settings: RenderSettings,
    tile_state: LayerState,
    mask_state: LayerState,
    tile_states: Option<TileStateMap>,
    tile_raster: Option<RgbaImage>,
    fragments: Vec<MaskFragment>,
    stats: CacheStats,
}

impl RenderingCache {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings: settings.sanitized(),
            tile_state: LayerState::Uninitialized,
            mask_state: LayerState::Uninitialized,
            tile_states: None,
            tile_raster: None,
            fragments: Vec::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn tile_layer_state(&self) -> LayerState {
        self.tile_state
    }

    pub fn mask_layer_state(&self) -> LayerState {
        self.mask_state
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn tile_states(&self) -> Option<&TileStateMap> {
        self.tile_states.as_ref()
    }

    pub fn tile_raster(&self) -> Option<&RgbaImage> {
        self.tile_raster.as_ref()
    }

    pub fn fragments(&self) -> &[MaskFragment] {
        &self.fragments
    }

    /// Builds every layer for a freshly loaded level.
    pub fn build(&mut self, level: &Level) {
        self.build_tiles(level);
        self.build_masks(level);
    }

    /// Marks the tile-state overlay stale. Has no effect before the first build.
    pub fn invalidate(&mut self) {
        if self.tile_state == LayerState::Built {
            self.tile_state = LayerState::Dirty;
        }
    }

    /// Marks the mask fragments stale, e.g. after the background changed.
    pub fn invalidate_masks(&mut self) {
        if self.mask_state == LayerState::Built {
            self.mask_state = LayerState::Dirty;
        }
    }

    /// Rebuilds the layers that are not built. Built layers are left alone.
    pub fn rebuild(&mut self, level: &Level) {
        if self.tile_state != LayerState::Built {
            self.build_tiles(level);
        }
        if self.mask_state != LayerState::Built {
            self.build_masks(level);
        }
    }

    fn build_tiles(&mut self, level: &Level) {
        let (tw, th) = (self.settings.tile_width, self.settings.tile_height);
        let blocked = level.closed_door_cells();
        let states = TileStateMap::build(&level.descriptor.tile_grid, &blocked);

        let size = states
            .width()
            .checked_mul(tw)
            .zip(states.height().checked_mul(th))
            .filter(|(w, h)| *w as u64 * *h as u64 <= MAX_RASTER_PIXELS);
        let raster = match size {
            Some((width, height)) => {
                let mut raster = RgbaImage::new(width, height);
                for (coord, state) in states.iter() {
                    let color = match state {
                        TileState::Open => self.settings.open_tile_color,
                        TileState::Blocked => self.settings.blocked_tile_color,
                    };
                    fill_rect(&mut raster, tile_rect(coord, tw, th), color);
                }
                Some(raster)
            }
            None => {
                log::warn!(
                    "tile raster for {}x{} tiles of {tw}x{th} px is too large, overlay skipped",
                    states.width(),
                    states.height()
                );
                None
            }
        };

        log::debug!(
            "tile raster built: {}x{} tiles ({} decoded), {} blocked",
            states.width(),
            states.height(),
            level.descriptor.tile_grid.tile_count(),
            states.count(TileState::Blocked)
        );
        self.tile_states = Some(states);
        self.tile_raster = raster;
        self.tile_state = LayerState::Built;
        self.stats.tile_builds += 1;
    }

    fn build_masks(&mut self, level: &Level) {
        let opacity = self.settings.mask_opacity;
        self.fragments = level
            .masks
            .iter()
            .filter_map(|mask| {
                let image = mask.image.as_ref()?;
                let x = mask.description.x as i32;
                let y = mask.description.y as i32;
                Some(MaskFragment {
                    x,
                    y,
                    image: cut_fragment(level.background.as_ref(), image, x, y, opacity),
                })
            })
            .collect();

        log::debug!("{} mask fragments built", self.fragments.len());
        self.mask_state = LayerState::Built;
        self.stats.mask_builds += 1;
    }

    /// Composes one frame for the view whose top-left corner is `scroll` in
    /// map pixels. Stale layers are rebuilt first; otherwise only `surface`
    /// is touched.
    pub fn draw(
        &mut self,
        level: &Level,
        surface: &mut dyn Surface,
        scroll: (i32, i32),
        elapsed: Duration,
    ) {
        self.rebuild(level);

        let (sx, sy) = scroll;
        let (vw, vh) = surface.size();
        let viewport = Rect::new(sx, sy, vw, vh);
        let settings = &self.settings;

        surface.clear(settings.clear_color);

        if let Some(background) = &level.background {
            surface.blit(background, viewport, 0, 0);
        }

        if settings.show_animations {
            for animation in &level.animations {
                if !animation.bounds().intersects(&viewport) {
                    continue;
                }
                let frame = animation.frame_at(elapsed);
                surface.blit(
                    animation.strip(),
                    animation.frame_rect(frame),
                    animation.x.saturating_sub(sx),
                    animation.y.saturating_sub(sy),
                );
            }
        }

        if settings.show_tile_states {
            if let Some(raster) = &self.tile_raster {
                surface.blit(raster, viewport, 0, 0);
            }
        }

        if settings.show_masks {
            for fragment in &self.fragments {
                if fragment.bounds().intersects(&viewport) {
                    surface.blit(
                        &fragment.image,
                        Rect::of_image(&fragment.image),
                        fragment.x.saturating_sub(sx),
                        fragment.y.saturating_sub(sy),
                    );
                }
            }
        }

        if settings.show_doors {
            for door in level.doors.iter().filter(|d| !d.opened) {
                let Some(sprite) = level.door_static(door) else {
                    continue;
                };
                let Some(image) = &sprite.image else {
                    continue;
                };
                let x = sprite.description.position.x as i32;
                let y = sprite.description.position.y as i32;
                let bounds = Rect::new(x, y, image.width(), image.height());
                if bounds.intersects(&viewport) {
                    surface.blit(
                        image,
                        Rect::of_image(image),
                        x.saturating_sub(sx),
                        y.saturating_sub(sy),
                    );
                }
            }
        }

        let (tw, th) = (settings.tile_width, settings.tile_height);
        let to_screen = |x: i32, y: i32| {
            let (px, py) = tile_to_pixel(x, y, tw, th);
            (px.saturating_sub(sx), py.saturating_sub(sy))
        };
        let label_y = |y: i32| y.saturating_add(settings.label_offset);

        if settings.show_entrance_points {
            for (name, point) in &level.scene.entrance_points {
                let (x, y) = to_screen(point.position.x, point.position.y);
                surface.fill_circle(x, y, settings.entrance_point_radius, settings.entrance_point_color);
                surface.draw_label(name, x, label_y(y), settings.label_color);
            }
        }

        if settings.show_cell_groups {
            for (name, cells) in &level.scene.cell_groups {
                let points: Vec<(i32, i32)> =
                    cells.iter().map(|cell| to_screen(cell.x, cell.y)).collect();
                let Some(&(x, y)) = points.first() else {
                    continue;
                };
                surface.stroke_polyline(
                    &points,
                    points.len() >= 3,
                    settings.cell_group_line_width,
                    settings.cell_group_color,
                );
                surface.fill_circle(x, y, settings.cell_group_anchor_radius, settings.cell_group_color);
                surface.draw_label(name, x, label_y(y), settings.label_color);
            }
        }

        if settings.show_persons {
            for (key, person) in &level.scene.persons {
                let (x, y) = to_screen(person.position.x, person.position.y);
                surface.fill_circle(x, y, settings.person_radius, settings.person_color);
                surface.draw_label(
                    level.person_label(key),
                    x,
                    label_y(y),
                    settings.label_color,
                );
            }
        }
    }
}

/// Copies the background under a mask, removes it where the mask is opaque
/// and scales what is left by `opacity`.
fn cut_fragment(
    background: Option<&RgbaImage>,
    mask: &RgbaImage,
    x: i32,
    y: i32,
    opacity: f32,
) -> RgbaImage {
    let mut fragment = RgbaImage::new(mask.width(), mask.height());
    let Some(background) = background else {
        return fragment;
    };

    for (mx, my, out) in fragment.enumerate_pixels_mut() {
        let bx = x as i64 + mx as i64;
        let by = y as i64 + my as i64;
        if bx < 0 || by < 0 || bx >= background.width() as i64 || by >= background.height() as i64 {
            continue;
        }
        let [r, g, b, a] = background.get_pixel(bx as u32, by as u32).0;
        let cover = mask.get_pixel(mx, my).0[3] as f32 / 255.0;
        let alpha = a as f32 * (1.0 - cover) * opacity;
        out.0 = [r, g, b, alpha.round().clamp(0.0, 255.0) as u8];
    }
    fragment
}
