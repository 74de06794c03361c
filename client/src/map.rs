//! Tile geometry and the per-tile state overlay.

use sef_core::types::{CellPosition, TileCoord, TileGrid};

use crate::surface::Rect;

/// On-screen tile size in pixels.
pub const TILE_WIDTH: u32 = 12;
pub const TILE_HEIGHT: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileState {
    #[default]
    Open,
    Blocked,
}

/// Pixel rectangle covered by a tile.
#[inline]
pub fn tile_rect(coord: TileCoord, tile_width: u32, tile_height: u32) -> Rect {
    Rect::new(
        (coord.x * tile_width) as i32,
        (coord.y * tile_height) as i32,
        tile_width,
        tile_height,
    )
}

/// Pixel position of a tile's top-left corner for scene coordinates,
/// saturated to the `i32` range.
#[inline]
pub fn tile_to_pixel(x: i32, y: i32, tile_width: u32, tile_height: u32) -> (i32, i32) {
    let scale = |v: i32, side: u32| (v as i64 * side as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    (scale(x, tile_width), scale(y, tile_height))
}

/// Open/blocked state for every tile of the grid, indexed row-major.
#[derive(Debug, Clone)]
pub struct TileStateMap {
    width: u32,
    height: u32,
    states: Vec<TileState>,
}

impl TileStateMap {
    /// Classifies every decoded tile, then forces the given cells to blocked.
    ///
    /// The map covers the decoded chunks only; a header promising more chunks
    /// than the block holds does not grow it.
    pub fn build<'a>(grid: &TileGrid, blocked_cells: impl IntoIterator<Item = &'a CellPosition>) -> Self {
        let (width, height) = grid.decoded_size_in_tiles();
        let mut map = Self {
            width,
            height,
            states: vec![TileState::Open; width as usize * height as usize],
        };

        for (coord, tile) in grid.tiles() {
            let state = if tile.looks_open() {
                TileState::Open
            } else {
                TileState::Blocked
            };
            if let Some(slot) = map.state_at_xy_mut(coord.x, coord.y) {
                *slot = state;
            }
        }

        for cell in blocked_cells {
            if let Some(slot) = map.state_at_xy_mut(cell.x as u32, cell.y as u32) {
                *slot = TileState::Blocked;
            }
        }
        map
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline]
    pub fn tile_index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(x as usize + y as usize * self.width as usize)
        } else {
            None
        }
    }

    pub fn state_at_xy(&self, x: u32, y: u32) -> Option<TileState> {
        self.tile_index(x, y).and_then(|idx| self.states.get(idx).copied())
    }

    fn state_at_xy_mut(&mut self, x: u32, y: u32) -> Option<&mut TileState> {
        self.tile_index(x, y).and_then(|idx| self.states.get_mut(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, TileState)> + '_ {
        let width = self.width.max(1) as usize;
        self.states.iter().enumerate().map(move |(idx, state)| {
            (
                TileCoord {
                    x: (idx % width) as u32,
                    y: (idx / width) as u32,
                },
                *state,
            )
        })
    }

    pub fn count(&self, state: TileState) -> usize {
        self.states.iter().filter(|s| **s == state).count()
    }
}
