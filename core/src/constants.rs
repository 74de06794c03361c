//! Constants module - magic numbers of the engine's asset formats

use bitflags::bitflags;
use serde::Serialize;

// =============================================================================
// Level container (.lvl)
// =============================================================================

/// Block header: 8-byte ASCII id followed by a `u32` payload length.
pub const BLOCK_ID_LEN: usize = 8;
pub const BLOCK_HEADER_LEN: usize = BLOCK_ID_LEN + 4;

pub const BLK_LVER: &str = "BLK_LVER";
pub const BLK_MPSZ: &str = "BLK_MPSZ";
pub const BLK_WTHR: &str = "BLK_WTHR";
pub const BLK_LFLS: &str = "BLK_LFLS";
pub const BLK_CGRP: &str = "BLK_CGRP";
pub const BLK_DOOR: &str = "BLK_DOOR";
pub const BLK_SENV: &str = "BLK_SENV";
pub const BLK_SDSC: &str = "BLK_SDSC";
pub const BLK_ADSC: &str = "BLK_ADSC";
pub const BLK_TDSC: &str = "BLK_TDSC";
pub const BLK_MDSC: &str = "BLK_MDSC";
pub const BLK_MHDR: &str = "BLK_MHDR";

/// Version string reported when the version block is missing or short.
pub const UNKNOWN_VERSION: &str = "-1";

/// Fixed part of a static/animation/trigger description record.
pub const DESCRIPTION_FIXED_LEN: usize = 16;
/// Mask description records are fixed-size.
pub const MASK_DESCRIPTION_LEN: usize = 16;
/// Environment sound header (one i32, three f32).
pub const SOUND_HEADER_LEN: usize = 16;
/// Numeric tail of an extra sound entry (8 f32 + 4 u32).
pub const EXTRA_SOUND_PARAMS_LEN: usize = 48;

/// Tile grid: four tiles per chunk, six bytes per tile.
pub const TILES_PER_CHUNK: usize = 4;
pub const TILE_RECORD_LEN: usize = 6;
pub const CHUNK_RECORD_LEN: usize = TILES_PER_CHUNK * TILE_RECORD_LEN;
/// A chunk is a 2x2 block of tiles.
pub const CHUNK_SIDE: usize = 2;

/// Observed threshold on the packed tile flags: values below it render as open.
pub const TILE_OPEN_THRESHOLD: u16 = 2000;

// =============================================================================
// String table (.sdb)
// =============================================================================

pub const SDB_SIGNATURE: [u8; 4] = *b"SDB ";
pub const UNKNOWN_NAME: &str = "Unknown";

// =============================================================================
// Indexed image (.csx)
// =============================================================================

pub const CSX_TRANSPARENT_PIXEL: u8 = 105;
pub const CSX_COLOR_RUN: u8 = 106;
pub const CSX_EDGE_DUPLICATE: u8 = 107;
pub const CSX_TRANSPARENT_RUN: u8 = 108;

/// Refuse to allocate index buffers larger than this many pixels.
pub const CSX_MAX_PIXELS: usize = 8192 * 8192;

// =============================================================================
// Animated cursor (.ani)
// =============================================================================

pub const RIFF_SIGNATURE: [u8; 4] = *b"RIFF";
pub const ACON_FORM: [u8; 4] = *b"ACON";
pub const ANI_HEADER_CHUNK: [u8; 4] = *b"anih";
pub const ANI_RATE_CHUNK: [u8; 4] = *b"rate";
pub const ANI_SEQUENCE_CHUNK: [u8; 4] = *b"seq ";
pub const ANI_LIST_CHUNK: [u8; 4] = *b"LIST";
pub const ANI_FRAME_LIST: [u8; 4] = *b"fram";
pub const ANI_ICON_CHUNK: [u8; 4] = *b"icon";

/// Cursor display rates are counted in 1/60 s.
pub const JIFFIES_PER_SECOND: u32 = 60;

bitflags! {
    /// `bfAttributes` of the cursor header.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
    pub struct AniAttributes: u32 {
        /// Frames are icon/cursor resources rather than raw bitmaps.
        const ICON = 0x0000_0001;
        /// The container carries an explicit `seq ` chunk.
        const SEQUENCE = 0x0000_0002;
    }
}

// =============================================================================
// Level animation table (.lao)
// =============================================================================

pub const LAO_RECORD_LEN: usize = 8;
pub const LAO_MAX_LEN: usize = 500;
