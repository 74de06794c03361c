//! Tile grid decoded from the `BLK_MHDR` block.
//!
//! Only the surface type and the primary mask index have a confirmed meaning.
//! The other bytes are exposed as raw bit-fields; observed patterns suggest
//! they carry mask correlation, passability and path priority, but nothing
//! here relies on that.

use serde::Serialize;

use crate::constants::{CHUNK_SIDE, TILES_PER_CHUNK, TILE_OPEN_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SurfaceType {
    Ground,
    Grass,
    Sand,
    Wood,
    Stone,
    Water,
    Snow,
    Unknown(u16),
}

impl SurfaceType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => SurfaceType::Ground,
            1 => SurfaceType::Grass,
            2 => SurfaceType::Sand,
            3 => SurfaceType::Wood,
            4 => SurfaceType::Stone,
            5 => SurfaceType::Water,
            6 => SurfaceType::Snow,
            other => SurfaceType::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            SurfaceType::Ground => 0,
            SurfaceType::Grass => 1,
            SurfaceType::Sand => 2,
            SurfaceType::Wood => 3,
            SurfaceType::Stone => 4,
            SurfaceType::Water => 5,
            SurfaceType::Snow => 6,
            SurfaceType::Unknown(other) => other,
        }
    }
}

impl Default for SurfaceType {
    fn default() -> Self {
        SurfaceType::Ground
    }
}

/// One 6-byte tile record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tile {
    /// Primary mask index.
    pub mask: u8,
    /// Second mask index byte; meaning unconfirmed.
    pub mask_aux: u8,
    /// Packed 2+2+4 bit byte.
    pub packed_a: u8,
    /// Packed nibble pair.
    pub packed_b: u8,
    pub surface: SurfaceType,
}

impl Tile {
    pub fn from_bytes(bytes: &[u8; 6]) -> Self {
        Self {
            mask: bytes[0],
            mask_aux: bytes[1],
            packed_a: bytes[2],
            packed_b: bytes[3],
            surface: SurfaceType::from_u16(u16::from_le_bytes([bytes[4], bytes[5]])),
        }
    }

    /// Bits 0-1 of `packed_a`.
    #[inline]
    pub fn packed_a_low(&self) -> u8 {
        self.packed_a & 0b11
    }

    /// Bits 2-3 of `packed_a`.
    #[inline]
    pub fn packed_a_mid(&self) -> u8 {
        (self.packed_a >> 2) & 0b11
    }

    /// Bits 4-7 of `packed_a`.
    #[inline]
    pub fn packed_a_high(&self) -> u8 {
        self.packed_a >> 4
    }

    #[inline]
    pub fn packed_b_low(&self) -> u8 {
        self.packed_b & 0x0F
    }

    #[inline]
    pub fn packed_b_high(&self) -> u8 {
        self.packed_b >> 4
    }

    /// Both packed bytes read as one little-endian word.
    #[inline]
    pub fn raw_flags(&self) -> u16 {
        u16::from_le_bytes([self.packed_a, self.packed_b])
    }

    /// Observed split used by the tile-state overlay. Not gameplay-authoritative.
    #[inline]
    pub fn looks_open(&self) -> bool {
        self.raw_flags() < TILE_OPEN_THRESHOLD
    }
}

pub type TileChunk = [Tile; TILES_PER_CHUNK];

/// Tile coordinates (in tiles, not pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileGrid {
    /// Width in chunks.
    pub width: u32,
    /// Height in chunks.
    pub height: u32,
    /// Chunks stored column by column.
    pub chunks: Vec<TileChunk>,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            chunks: Vec::new(),
        }
    }
}

impl TileGrid {
    /// Position of a tile given its chunk index and its index inside the chunk.
    ///
    /// Chunks run down each column first; the four tiles of a chunk are laid
    /// out row by row.
    pub fn tile_coord(&self, chunk_index: usize, tile_index: usize) -> TileCoord {
        let height = self.height.max(1) as usize;
        let chunk_col = chunk_index / height;
        let chunk_row = chunk_index % height;
        let x = chunk_col * CHUNK_SIDE + tile_index % CHUNK_SIDE;
        let y = chunk_row * CHUNK_SIDE + tile_index / CHUNK_SIDE;
        TileCoord {
            x: x as u32,
            y: y as u32,
        }
    }

    pub fn tiles(&self) -> impl Iterator<Item = (TileCoord, &Tile)> + '_ {
        self.chunks.iter().enumerate().flat_map(move |(ci, chunk)| {
            chunk
                .iter()
                .enumerate()
                .map(move |(ti, tile)| (self.tile_coord(ci, ti), tile))
        })
    }

    /// Grid extent in tiles.
    pub fn size_in_tiles(&self) -> (u32, u32) {
        let side = CHUNK_SIDE as u32;
        (
            self.width.saturating_mul(side),
            self.height.saturating_mul(side),
        )
    }

    /// Extent in tiles of the chunks actually present.
    ///
    /// Never larger than [`size_in_tiles`](Self::size_in_tiles), and bounded
    /// by the chunk count, so a corrupt header cannot inflate it.
    pub fn decoded_size_in_tiles(&self) -> (u32, u32) {
        let count = self.chunks.len() as u64;
        if count == 0 {
            return (0, 0);
        }
        let column = self.height.max(1) as u64;
        let rows = column.min(count);
        let columns = (self.width as u64).min(count.div_ceil(column));
        let side = CHUNK_SIDE as u64;
        (
            (columns * side).min(u32::MAX as u64) as u32,
            (rows * side).min(u32::MAX as u64) as u32,
        )
    }

    pub fn tile_count(&self) -> usize {
        self.chunks.len() * TILES_PER_CHUNK
    }
}
