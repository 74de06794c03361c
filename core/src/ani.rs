//! Animated cursor container (RIFF / ACON).
//!
//! Only the outer signature is strict. Chunks are walked by id and length;
//! anything unreadable after the signature is dropped and reported through
//! [`DecodeStatus::Degraded`].

use std::time::Duration;

use serde::Serialize;

use crate::byte_operations::ByteReader;
use crate::constants::*;
use crate::decoded::{DecodeStatus, Decoded};
use crate::error::{DecodeError, Result};
use crate::string_operations::decode_ascii_tag;

/// Fixed `anih` metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AniHeader {
    pub header_size: u32,
    pub frame_count: u32,
    pub step_count: u32,
    pub width: u32,
    pub height: u32,
    pub bit_count: u32,
    pub planes: u32,
    /// Default display rate in jiffies (1/60 s).
    pub display_rate: u32,
    pub attributes: AniAttributes,
}

/// Raw icon image of one frame. Decoding it is left to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconResource {
    pub bytes: Vec<u8>,
}

impl IconResource {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimatedCursor {
    pub header: AniHeader,
    /// Per-frame display durations in jiffies.
    pub rates: Vec<u32>,
    /// Explicit frame order; empty when the container has none.
    pub sequence: Vec<u32>,
    pub frames: Vec<IconResource>,
    /// Sum of `rates`.
    pub rate_sum: u64,
}

impl AnimatedCursor {
    /// Display time of frame `index`, falling back to the header rate.
    pub fn frame_jiffies(&self, index: usize) -> u32 {
        self.rates
            .get(index)
            .copied()
            .unwrap_or(self.header.display_rate)
    }

    /// Length of one loop. Uses the rate chunk when present, otherwise the
    /// default display rate for every frame.
    pub fn total_duration(&self) -> Duration {
        let jiffies = if self.rate_sum > 0 {
            self.rate_sum
        } else {
            u64::from(self.header.display_rate) * self.frames.len() as u64
        };
        jiffies_to_duration(jiffies)
    }

    /// Start offset of each frame inside one loop.
    pub fn frame_offsets(&self) -> Vec<Duration> {
        let mut elapsed = 0u64;
        (0..self.frames.len())
            .map(|index| {
                let start = elapsed;
                elapsed += u64::from(self.frame_jiffies(index));
                jiffies_to_duration(start)
            })
            .collect()
    }
}

fn jiffies_to_duration(jiffies: u64) -> Duration {
    Duration::from_millis(jiffies.saturating_mul(1000) / u64::from(JIFFIES_PER_SECOND))
}

/// Decodes an animated cursor.
///
/// Fails only when the `RIFF` signature or the `ACON` form type is missing.
pub fn decode_animated_cursor(data: &[u8]) -> Result<Decoded<AnimatedCursor>> {
    let mut reader = ByteReader::new(data);
    let truncated = || DecodeError::Truncated {
        context: "cursor container header",
        need: 12,
        have: data.len(),
    };

    let signature = reader.read_tag::<4>().ok_or_else(truncated)?;
    if signature != RIFF_SIGNATURE {
        return Err(DecodeError::MissingRiff { found: signature });
    }
    let _riff_size = reader.read_u32().ok_or_else(truncated)?;
    let form = reader.read_tag::<4>().ok_or_else(truncated)?;
    if form != ACON_FORM {
        return Err(DecodeError::NotAcon { found: form });
    }

    let mut cursor = AnimatedCursor::default();
    let mut status = DecodeStatus::Complete;

    while !reader.is_empty() {
        let (Some(id), Some(size)) = (reader.read_tag::<4>(), reader.read_u32()) else {
            status = DecodeStatus::Degraded;
            break;
        };
        let size = size as usize;
        let body = match reader.read_bytes(size) {
            Some(body) => body,
            None => {
                log::debug!(
                    "cursor chunk {} declares {size} bytes, only {} left",
                    decode_ascii_tag(&id),
                    reader.remaining()
                );
                status = DecodeStatus::Degraded;
                reader.read_bytes(reader.remaining()).unwrap_or_default()
            }
        };
        if size % 2 == 1 {
            reader.skip(1);
        }

        let chunk_status = match id {
            ANI_HEADER_CHUNK => read_header(body, &mut cursor.header),
            ANI_RATE_CHUNK => {
                let rates = read_u32_list(body);
                cursor.rate_sum += rates.iter().map(|&r| u64::from(r)).sum::<u64>();
                cursor.rates.extend(rates);
                DecodeStatus::Complete
            }
            ANI_SEQUENCE_CHUNK => {
                cursor.sequence.extend(read_u32_list(body));
                DecodeStatus::Complete
            }
            ANI_LIST_CHUNK => read_frame_list(body, &mut cursor.frames),
            _ => {
                log::debug!("skipping cursor chunk {}", decode_ascii_tag(&id));
                DecodeStatus::Complete
            }
        };
        status = status.and(chunk_status);
    }

    log::debug!(
        "animated cursor: {} frames, {} rates, {} jiffies",
        cursor.frames.len(),
        cursor.rates.len(),
        cursor.rate_sum
    );
    Ok(Decoded::with_status(cursor, status))
}

fn read_header(body: &[u8], header: &mut AniHeader) -> DecodeStatus {
    let mut reader = ByteReader::new(body);
    let mut fields = [0u32; 9];
    for field in fields.iter_mut() {
        match reader.read_u32() {
            Some(value) => *field = value,
            None => return DecodeStatus::Degraded,
        }
    }

    let [header_size, frame_count, step_count, width, height, bit_count, planes, display_rate, attributes] =
        fields;
    *header = AniHeader {
        header_size,
        frame_count,
        step_count,
        width,
        height,
        bit_count,
        planes,
        display_rate,
        attributes: AniAttributes::from_bits_retain(attributes),
    };
    DecodeStatus::Complete
}

fn read_u32_list(body: &[u8]) -> Vec<u32> {
    let mut reader = ByteReader::new(body);
    std::iter::from_fn(|| reader.read_u32()).collect()
}

fn read_frame_list(body: &[u8], frames: &mut Vec<IconResource>) -> DecodeStatus {
    let mut reader = ByteReader::new(body);
    match reader.read_tag::<4>() {
        Some(ANI_FRAME_LIST) => {}
        Some(other) => {
            log::debug!("skipping LIST of type {}", decode_ascii_tag(&other));
            return DecodeStatus::Complete;
        }
        None => return DecodeStatus::Degraded,
    }

    while !reader.is_empty() {
        let (Some(id), Some(size)) = (reader.read_tag::<4>(), reader.read_u32()) else {
            return DecodeStatus::Degraded;
        };
        let Some(bytes) = reader.read_bytes(size as usize) else {
            return DecodeStatus::Degraded;
        };
        if size % 2 == 1 {
            reader.skip(1);
        }
        if id == ANI_ICON_CHUNK {
            frames.push(IconResource {
                bytes: bytes.to_vec(),
            });
        }
    }
    DecodeStatus::Complete
}
