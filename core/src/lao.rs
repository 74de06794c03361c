//! Per-level animation table (.lao): frame height and frame duration for
//! every animation strip of a level pack, in strip order.

use serde::Serialize;

use crate::byte_operations::ByteReader;
use crate::constants::{LAO_MAX_LEN, LAO_RECORD_LEN};
use crate::decoded::Decoded;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnimationInfo {
    /// Height of one frame in the vertical strip, in pixels.
    pub height: u16,
    /// Time each frame stays on screen, in milliseconds.
    pub duration: u16,
}

/// Decodes the table. A buffer that is not a whole number of records, or is
/// larger than any table the engine writes, gives an empty degraded table.
pub fn decode_animation_table(data: &[u8]) -> Decoded<Vec<AnimationInfo>> {
    if data.len() % LAO_RECORD_LEN != 0 || data.len() > LAO_MAX_LEN {
        log::debug!("rejecting animation table of {} bytes", data.len());
        return Decoded::fallback();
    }

    let table = data
        .chunks_exact(LAO_RECORD_LEN)
        .map(|record| {
            let mut reader = ByteReader::new(record);
            let height = reader.read_u16().unwrap_or_default();
            reader.skip(2);
            let duration = reader.read_u16().unwrap_or_default();
            AnimationInfo { height, duration }
        })
        .collect();
    Decoded::complete(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_height_and_duration() {
        let data = [
            64, 0, 0xFF, 0xFF, 100, 0, 0xEE, 0xEE, //
            32, 1, 0, 0, 0x2C, 0x01, 0, 0,
        ];
        let decoded = decode_animation_table(&data);
        assert!(decoded.is_complete());
        assert_eq!(
            decoded.value,
            vec![
                AnimationInfo { height: 64, duration: 100 },
                AnimationInfo { height: 288, duration: 300 },
            ]
        );
    }

    #[test]
    fn rejects_partial_and_oversized_tables() {
        let partial = decode_animation_table(&[0; 12]);
        assert!(partial.value.is_empty());
        assert!(!partial.is_complete());

        let oversized = decode_animation_table(&[0; 504]);
        assert!(oversized.value.is_empty());
        assert!(!oversized.is_complete());

        assert!(decode_animation_table(&[]).is_complete());
    }
}
