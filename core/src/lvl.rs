//! Level container (.lvl) decoding.
//!
//! A level file is a flat run of `(8-byte id, u32 length, payload)` blocks.
//! Each known block id has a typed sub-decoder. None of them fail: a payload
//! that is too short yields the documented default, and record arrays stop at
//! the first record that does not fit, keeping everything decoded so far.

use crate::byte_operations::ByteReader;
use crate::constants::*;
use crate::decoded::{DecodeStatus, Decoded};
use crate::string_operations::{decode_ascii_tag, decode_legacy, read_prefixed_string};
use crate::types::{
    CellGroups, CellPosition, Description, Door, EnvironmentSoundHeader, EnvironmentSounds,
    ExtraSound, LevelDescriptor, MapSize, MaskDescription, PixelPosition, Tile, TileChunk,
    TileGrid, Weather,
};

/// One named block of the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    pub id: [u8; BLOCK_ID_LEN],
    pub payload: &'a [u8],
}

impl Block<'_> {
    pub fn id_str(&self) -> String {
        decode_ascii_tag(&self.id)
    }
}

/// Splits a container into blocks.
///
/// Scanning stops silently at an incomplete header or at a payload that runs
/// past the end of the buffer; the status is degraded when bytes were left over.
pub fn scan_blocks(data: &[u8]) -> Decoded<Vec<Block<'_>>> {
    let mut reader = ByteReader::new(data);
    let mut blocks = Vec::new();

    while !reader.is_empty() {
        let start = reader.position();
        if !reader.has(BLOCK_HEADER_LEN) {
            log::debug!("incomplete block header at offset {start}");
            break;
        }
        // The header was bounds-checked above.
        let id = reader.read_tag::<BLOCK_ID_LEN>().unwrap_or_default();
        let length = reader.read_u32().unwrap_or_default() as usize;
        let Some(payload) = reader.read_bytes(length) else {
            log::debug!(
                "block {} at offset {start} declares {length} bytes, only {} left",
                decode_ascii_tag(&id),
                reader.remaining()
            );
            reader.seek(start);
            break;
        };
        blocks.push(Block { id, payload });
    }

    if reader.is_empty() {
        Decoded::complete(blocks)
    } else {
        Decoded::degraded(blocks)
    }
}

/// Decodes a whole level container.
pub fn decode_level(data: &[u8]) -> Decoded<LevelDescriptor> {
    let scanned = scan_blocks(data);
    let mut level = LevelDescriptor::default();

    for block in &scanned.value {
        let id = block.id_str();
        let payload = block.payload;

        let status = match id.as_str() {
            BLK_LVER => assign(&mut level.version, decode_version(payload)),
            BLK_MPSZ => assign(&mut level.map_size, decode_map_size(payload)),
            BLK_WTHR => assign(&mut level.weather, decode_weather(payload)),
            BLK_LFLS => assign(&mut level.level_floors, decode_level_floors(payload)),
            BLK_CGRP => assign(&mut level.cell_groups, decode_cell_groups(payload)),
            BLK_DOOR => assign(&mut level.doors, decode_doors(payload)),
            BLK_SENV => assign(
                &mut level.environment_sounds,
                decode_environment_sounds(payload),
            ),
            BLK_SDSC => assign(&mut level.static_descriptions, decode_descriptions(payload)),
            BLK_ADSC => assign(
                &mut level.animation_descriptions,
                decode_descriptions(payload),
            ),
            BLK_TDSC => assign(
                &mut level.trigger_descriptions,
                decode_descriptions(payload),
            ),
            BLK_MDSC => assign(
                &mut level.mask_descriptions,
                decode_mask_descriptions(payload),
            ),
            BLK_MHDR => assign(&mut level.tile_grid, decode_tile_grid(payload)),
            _ => {
                level.extra_blocks.insert(id.clone(), decode_legacy(payload));
                DecodeStatus::Complete
            }
        };

        if status == DecodeStatus::Degraded {
            log::debug!("block {id} decoded with defaults or partial records");
        }
        level.block_status.insert(id, status);
    }

    log::debug!(
        "level container: {} blocks, version {}, {} tile chunks",
        scanned.value.len(),
        level.version,
        level.tile_grid.chunks.len()
    );

    let status = if level.is_degraded() {
        scanned.status.and(DecodeStatus::Degraded)
    } else {
        scanned.status
    };
    Decoded::with_status(level, status)
}

fn assign<T>(slot: &mut T, decoded: Decoded<T>) -> DecodeStatus {
    *slot = decoded.value;
    decoded.status
}

/// Reads a prefixed string, flagging the record set as degraded when the
/// declared length does not fit.
fn read_name(reader: &mut ByteReader<'_>, status: &mut DecodeStatus) -> Option<String> {
    let length = reader.peek_u32()? as usize;
    if reader.remaining() < length.saturating_add(4) {
        *status = DecodeStatus::Degraded;
    }
    read_prefixed_string(reader)
}

/// `BLK_LVER`: minor then major as `u16`, rendered `"major.minor"`.
pub fn decode_version(payload: &[u8]) -> Decoded<String> {
    let mut reader = ByteReader::new(payload);
    match (reader.read_u16(), reader.read_u16()) {
        (Some(minor), Some(major)) => Decoded::complete(format!("{major}.{minor}")),
        _ => Decoded::degraded(UNKNOWN_VERSION.to_string()),
    }
}

/// `BLK_MPSZ`: map size in pixels, `{1,1}` when short.
pub fn decode_map_size(payload: &[u8]) -> Decoded<MapSize> {
    let mut reader = ByteReader::new(payload);
    match (reader.read_u32(), reader.read_u32()) {
        (Some(width), Some(height)) => Decoded::complete(MapSize { width, height }),
        _ => Decoded::fallback(),
    }
}

/// `BLK_WTHR`: weather type and intensity.
pub fn decode_weather(payload: &[u8]) -> Decoded<Weather> {
    let mut reader = ByteReader::new(payload);
    match (reader.read_u16(), reader.read_u16()) {
        (Some(kind), Some(intensity)) => Decoded::complete(Weather { kind, intensity }),
        _ => Decoded::fallback(),
    }
}

/// `BLK_LFLS`: number of floors.
pub fn decode_level_floors(payload: &[u8]) -> Decoded<u32> {
    match ByteReader::new(payload).read_u32() {
        Some(floors) => Decoded::complete(floors),
        None => Decoded::fallback(),
    }
}

/// `BLK_SDSC` / `BLK_ADSC` / `BLK_TDSC`: counted description records.
pub fn decode_descriptions(payload: &[u8]) -> Decoded<Vec<Description>> {
    let mut reader = ByteReader::new(payload);
    let Some(count) = reader.read_u32() else {
        return Decoded::fallback();
    };

    let mut status = DecodeStatus::Complete;
    let mut descriptions = Vec::new();
    for _ in 0..count {
        if !reader.has(DESCRIPTION_FIXED_LEN) {
            status = DecodeStatus::Degraded;
            break;
        }
        // The fixed part was bounds-checked above.
        let param1 = reader.read_u16().unwrap_or_default();
        let param2 = reader.read_u16().unwrap_or_default();
        let number = reader.read_u32().unwrap_or_default();
        let x = reader.read_u32().unwrap_or_default();
        let y = reader.read_u32().unwrap_or_default();

        let name = read_name(&mut reader, &mut status).unwrap_or_else(|| {
            status = DecodeStatus::Degraded;
            String::new()
        });

        descriptions.push(Description {
            name,
            param1,
            param2,
            number,
            position: PixelPosition { x, y },
        });
    }

    Decoded::with_status(descriptions, status)
}

/// `BLK_MDSC`: counted 16-byte mask records (4 reserved bytes, number, x, y).
pub fn decode_mask_descriptions(payload: &[u8]) -> Decoded<Vec<MaskDescription>> {
    let mut reader = ByteReader::new(payload);
    let Some(count) = reader.read_u32() else {
        return Decoded::fallback();
    };

    let mut status = DecodeStatus::Complete;
    let mut masks = Vec::new();
    for _ in 0..count {
        let Some(record) = reader.read_bytes(MASK_DESCRIPTION_LEN) else {
            status = DecodeStatus::Degraded;
            break;
        };
        let mut record = ByteReader::new(record);
        record.skip(4);
        masks.push(MaskDescription {
            number: record.read_u32().unwrap_or_default(),
            x: record.read_u32().unwrap_or_default(),
            y: record.read_u32().unwrap_or_default(),
        });
    }

    Decoded::with_status(masks, status)
}

/// `BLK_CGRP`: counted named groups of `(u16 x, u16 y)` cells.
pub fn decode_cell_groups(payload: &[u8]) -> Decoded<CellGroups> {
    let mut reader = ByteReader::new(payload);
    let Some(count) = reader.read_u32() else {
        return Decoded::fallback();
    };

    let mut status = DecodeStatus::Complete;
    let mut groups = CellGroups::new();
    'groups: for _ in 0..count {
        let Some(name) = read_name(&mut reader, &mut status) else {
            status = DecodeStatus::Degraded;
            break;
        };
        let Some(size) = reader.read_u32() else {
            status = DecodeStatus::Degraded;
            break;
        };

        let mut cells = Vec::new();
        for _ in 0..size {
            match (reader.read_u16(), reader.read_u16()) {
                (Some(x), Some(y)) => cells.push(CellPosition { x, y }),
                _ => {
                    status = DecodeStatus::Degraded;
                    groups.insert(name, cells);
                    break 'groups;
                }
            }
        }
        groups.insert(name, cells);
    }

    Decoded::with_status(groups, status)
}

/// `BLK_DOOR`: counted records of six prefixed strings.
pub fn decode_doors(payload: &[u8]) -> Decoded<Vec<Door>> {
    let mut reader = ByteReader::new(payload);
    let Some(count) = reader.read_u32() else {
        return Decoded::fallback();
    };

    let mut status = DecodeStatus::Complete;
    let mut doors = Vec::new();
    for _ in 0..count {
        let mut fields: [String; 6] = Default::default();
        for field in fields.iter_mut() {
            match read_name(&mut reader, &mut status) {
                Some(value) => *field = value,
                None => {
                    status = DecodeStatus::Degraded;
                    return Decoded::with_status(doors, status);
                }
            }
        }
        let [sef_name, open_action, close_action, cell_group, param1, static_name] = fields;
        doors.push(Door {
            sef_name,
            open_action,
            close_action,
            cell_group,
            param1,
            static_name,
        });
    }

    Decoded::with_status(doors, status)
}

/// `BLK_SENV`: sound header, three named tracks and extra sound entries.
pub fn decode_environment_sounds(payload: &[u8]) -> Decoded<EnvironmentSounds> {
    let mut reader = ByteReader::new(payload);
    if !reader.has(SOUND_HEADER_LEN) {
        return Decoded::fallback();
    }

    let mut sounds = EnvironmentSounds {
        header: EnvironmentSoundHeader {
            param1: reader.read_i32().unwrap_or_default(),
            param2: reader.read_f32().unwrap_or_default(),
            param3: reader.read_f32().unwrap_or_default(),
            param4: reader.read_f32().unwrap_or_default(),
        },
        ..Default::default()
    };

    let Some(extra_count) = reader.read_u32() else {
        return Decoded::degraded(sounds);
    };

    let mut status = DecodeStatus::Complete;
    for track in 0..3 {
        let Some(name) = read_name(&mut reader, &mut status) else {
            return Decoded::degraded(sounds);
        };
        match track {
            0 => sounds.level_theme = name,
            1 => sounds.day_ambience = name,
            _ => sounds.night_ambience = name,
        }
    }

    for _ in 0..extra_count {
        let Some(path) = read_name(&mut reader, &mut status) else {
            status = DecodeStatus::Degraded;
            break;
        };
        let Some(params) = reader.read_bytes(EXTRA_SOUND_PARAMS_LEN) else {
            status = DecodeStatus::Degraded;
            break;
        };

        let mut params = ByteReader::new(params);
        let mut extra = ExtraSound {
            path,
            ..Default::default()
        };
        for volume in extra.volumes.iter_mut() {
            *volume = params.read_f32().unwrap_or_default();
        }
        for flag in extra.flags.iter_mut() {
            *flag = params.read_u32().unwrap_or_default();
        }
        sounds.other_sounds.push(extra);
    }

    Decoded::with_status(sounds, status)
}

/// `BLK_MHDR`: grid size in chunks followed by 24-byte chunks.
pub fn decode_tile_grid(payload: &[u8]) -> Decoded<TileGrid> {
    let mut reader = ByteReader::new(payload);
    let (Some(width), Some(height)) = (reader.read_u32(), reader.read_u32()) else {
        return Decoded::fallback();
    };

    let mut chunks = Vec::with_capacity(reader.remaining() / CHUNK_RECORD_LEN);
    while let Some(record) = reader.read_bytes(CHUNK_RECORD_LEN) {
        let mut chunk: TileChunk = Default::default();
        for (tile, bytes) in chunk.iter_mut().zip(record.chunks_exact(TILE_RECORD_LEN)) {
            let mut raw = [0u8; TILE_RECORD_LEN];
            raw.copy_from_slice(bytes);
            *tile = Tile::from_bytes(&raw);
        }
        chunks.push(chunk);
    }

    let expected = (width as usize).saturating_mul(height as usize);
    let status = if reader.is_empty() && chunks.len() >= expected {
        DecodeStatus::Complete
    } else {
        DecodeStatus::Degraded
    };

    Decoded::with_status(
        TileGrid {
            width,
            height,
            chunks,
        },
        status,
    )
}
