//! Palette-indexed, run-length compressed images (.csx).
//!
//! Layout: `i32` palette size, BGRA fill colour, palette of BGRA entries,
//! `i32` width and height, `height + 1` row offsets into the pixel stream, then
//! the stream itself. Alpha is stored inverted.
//!
//! Row opcodes 105..=108 share the value space with palette indices, so a
//! palette with more than 105 colours cannot address its upper entries
//! directly. Files in the wild are decoded the same way regardless.

use serde::Serialize;

use crate::byte_operations::ByteReader;
use crate::constants::*;
use crate::decoded::{DecodeStatus, Decoded};

pub type Rgba = [u8; 4];

/// A decoded image with straight (non-premultiplied) RGBA pixels, row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexedImage {
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub pixels: Vec<u8>,
}

impl IndexedImage {
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.pixels.get(at..at + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

fn read_bgra(reader: &mut ByteReader<'_>) -> Option<Rgba> {
    let [b, g, r, a] = reader.read_tag::<4>()?;
    Some([r, g, b, 255 - a])
}

/// Decodes an indexed image.
///
/// With `transparent_fill` the fill colour's alpha is forced to zero, which
/// is how sprites and masks are drawn. A header too short to give the image
/// size yields an empty degraded image; a short pixel stream leaves the
/// missing pixels at the fill colour.
pub fn decode_indexed_image(data: &[u8], transparent_fill: bool) -> Decoded<IndexedImage> {
    let mut reader = ByteReader::new(data);
    let mut status = DecodeStatus::Complete;

    let Some(color_count) = reader.read_i32() else {
        return Decoded::fallback();
    };
    let Some(mut fill) = read_bgra(&mut reader) else {
        return Decoded::fallback();
    };
    if transparent_fill {
        fill[3] = 0;
    }

    let color_count = color_count.max(0) as usize;
    let mut palette = Vec::with_capacity(color_count.min(reader.remaining() / 4));
    for _ in 0..color_count {
        match read_bgra(&mut reader) {
            Some(color) => palette.push(color),
            None => return Decoded::fallback(),
        }
    }

    let (Some(width), Some(height)) = (reader.read_i32(), reader.read_i32()) else {
        return Decoded::fallback();
    };
    let width = width.max(0) as usize;
    let height = height.max(0) as usize;
    let pixel_count = width.saturating_mul(height);
    if pixel_count > CSX_MAX_PIXELS || (width == 0) != (height == 0) {
        log::debug!("indexed image {width}x{height} has an unusable size");
        return Decoded::fallback();
    }

    // sized from the buffer, not the header
    let mut row_offsets = Vec::with_capacity((height + 1).min(reader.remaining() / 4));
    for _ in 0..=height {
        match reader.read_i32() {
            Some(offset) => row_offsets.push(offset.max(0) as usize),
            None => return Decoded::fallback(),
        }
    }

    let declared = row_offsets.last().copied().unwrap_or_default();
    let stream = match reader.read_bytes(declared) {
        Some(stream) => stream,
        None => {
            log::debug!(
                "indexed image stream declares {declared} bytes, {} present",
                reader.remaining()
            );
            status = DecodeStatus::Degraded;
            reader.read_bytes(reader.remaining()).unwrap_or_default()
        }
    };

    let mut indices = vec![None; pixel_count];
    for y in 0..height {
        let start = row_offsets[y];
        let end = row_offsets[y + 1].max(start);
        let row = &mut indices[y * width..(y + 1) * width];
        let bytes = stream.get(start..end.min(stream.len())).unwrap_or_default();
        decode_line(bytes, row);
    }

    let mut pixels = Vec::with_capacity(pixel_count * 4);
    for index in &indices {
        let color = index
            .and_then(|i| palette.get(i as usize))
            .copied()
            .unwrap_or(fill);
        pixels.extend_from_slice(&color);
    }

    Decoded::with_status(
        IndexedImage {
            width: width as u32,
            height: height as u32,
            pixels,
        },
        status,
    )
}

/// Decodes one compressed row into palette indices; `None` is unindexed.
///
/// Decoding stops when the row is full or the bytes run out. Opcode operands
/// missing at the end of the row are treated as absent.
pub fn decode_line(bytes: &[u8], row: &mut [Option<u8>]) {
    let mut input = bytes.iter().copied();
    let mut x = 0usize;

    while x < row.len() {
        let Some(op) = input.next() else { break };
        match op {
            CSX_EDGE_DUPLICATE => {
                let Some(index) = input.next() else { break };
                row[x] = Some(index);
                if x > 0 {
                    row[x - 1] = Some(index);
                }
                x += 1;
            }
            CSX_TRANSPARENT_PIXEL => x += 1,
            CSX_COLOR_RUN => {
                let (Some(index), Some(count)) = (input.next(), input.next()) else {
                    break;
                };
                let count = (count as usize).min(row.len() - x);
                row[x..x + count].fill(Some(index));
                if x > 0 {
                    row[x - 1] = Some(index);
                }
                x += count;
            }
            CSX_TRANSPARENT_RUN => {
                let Some(count) = input.next() else { break };
                x += (count as usize).min(row.len() - x);
            }
            literal => {
                row[x] = Some(literal);
                x += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(palette: &[[u8; 4]], fill: [u8; 4], width: i32, height: i32) -> Vec<u8> {
        let mut out = (palette.len() as i32).to_le_bytes().to_vec();
        out.extend_from_slice(&fill);
        for color in palette {
            out.extend_from_slice(color);
        }
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out
    }

    fn image(palette: &[[u8; 4]], fill: [u8; 4], width: i32, rows: &[&[u8]]) -> Vec<u8> {
        let mut out = header(palette, fill, width, rows.len() as i32);
        let mut offset = 0i32;
        out.extend_from_slice(&offset.to_le_bytes());
        for row in rows {
            offset += row.len() as i32;
            out.extend_from_slice(&offset.to_le_bytes());
        }
        for row in rows {
            out.extend_from_slice(row);
        }
        out
    }

    fn run(bytes: &[u8], width: usize) -> Vec<Option<u8>> {
        let mut row = vec![None; width];
        decode_line(bytes, &mut row);
        row
    }

    #[test]
    fn empty_palette_falls_back_to_fill() {
        // BGRA stored, alpha inverted: stored 0x00 -> opaque.
        let fill = [30, 20, 10, 0];
        let mut data = header(&[], fill, 2, 2);
        for offset in [0i32, 0, 2, 4] {
            data.extend_from_slice(&offset.to_le_bytes());
        }
        data.extend_from_slice(&[10, 11, 20, 21]);

        let decoded = decode_indexed_image(&data, false);
        assert!(decoded.is_complete());
        let img = decoded.value;
        assert_eq!((img.width, img.height), (2, 2));
        assert_eq!(img.pixels.len(), 16);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(img.pixel(x, y), Some([10, 20, 30, 255]));
            }
        }
    }

    #[test]
    fn palette_is_bgra_with_inverted_alpha() {
        let palette = [[0, 0, 255, 0], [255, 0, 0, 200]];
        let data = image(&palette, [0, 0, 0, 0], 3, &[&[0, 1, 105]]);

        let img = decode_indexed_image(&data, true).value;
        assert_eq!(img.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(img.pixel(1, 0), Some([0, 0, 255, 55]));
        assert_eq!(img.pixel(2, 0), Some([0, 0, 0, 0]));
        assert_eq!(img.pixel(3, 0), None);
    }

    #[test]
    fn transparent_fill_only_changes_alpha() {
        let data = image(&[], [1, 2, 3, 0], 1, &[&[105]]);
        assert_eq!(decode_indexed_image(&data, false).value.pixel(0, 0), Some([3, 2, 1, 255]));
        assert_eq!(decode_indexed_image(&data, true).value.pixel(0, 0), Some([3, 2, 1, 0]));
    }

    #[test]
    fn literal_and_transparent_opcodes() {
        assert_eq!(run(&[3, 105, 4], 3), vec![Some(3), None, Some(4)]);
        assert_eq!(run(&[108, 2, 9], 4), vec![None, None, Some(9), None]);
    }

    #[test]
    fn color_run_backfills_previous_pixel() {
        assert_eq!(
            run(&[105, 106, 7, 2], 4),
            vec![Some(7), Some(7), Some(7), None]
        );
        // first in row: nothing to backfill
        assert_eq!(run(&[106, 5, 2, 1], 3), vec![Some(5), Some(5), Some(1)]);
    }

    #[test]
    fn runs_are_clamped_to_row_width() {
        assert_eq!(run(&[106, 2, 200], 3), vec![Some(2); 3]);
        assert_eq!(run(&[1, 108, 250, 3], 3), vec![Some(1), None, None]);
    }

    #[test]
    fn edge_duplicate_writes_operand_twice() {
        assert_eq!(run(&[1, 107, 9, 2], 3), vec![Some(9), Some(9), Some(2)]);
        assert_eq!(run(&[107, 4], 2), vec![Some(4), None]);
    }

    #[test]
    fn missing_operands_stop_the_row() {
        assert_eq!(run(&[1, 106, 3], 4), vec![Some(1), None, None, None]);
        assert_eq!(run(&[107], 2), vec![None, None]);
    }

    #[test]
    fn short_stream_degrades_to_fill() {
        let mut data = image(&[[0, 255, 0, 0]], [0, 0, 0, 255], 2, &[&[0, 0], &[0, 0]]);
        data.truncate(data.len() - 2);

        let decoded = decode_indexed_image(&data, false);
        assert_eq!(decoded.status, DecodeStatus::Degraded);
        assert_eq!(decoded.value.pixel(1, 0), Some([0, 255, 0, 255]));
        assert_eq!(decoded.value.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn zero_width_with_huge_height_is_rejected() {
        let data = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0x7F];
        let decoded = decode_indexed_image(&data, true);
        assert!(!decoded.is_complete());
        assert!(decoded.value.is_empty());
    }

    #[test]
    fn huge_height_without_offsets_is_empty() {
        let decoded = decode_indexed_image(&header(&[], [0; 4], 1, 1 << 20), false);
        assert!(!decoded.is_complete());
        assert!(decoded.value.is_empty());

        let decoded = decode_indexed_image(&header(&[], [0; 4], i32::MAX, i32::MAX), false);
        assert!(decoded.value.is_empty());
    }

    #[test]
    fn huge_palette_count_stops_at_end_of_buffer() {
        let mut data = i32::MAX.to_le_bytes().to_vec();
        data.extend_from_slice(&[0, 0, 0, 0, 1, 2, 3, 4]);
        let decoded = decode_indexed_image(&data, false);
        assert!(!decoded.is_complete());
        assert!(decoded.value.is_empty());
    }

    #[test]
    fn truncated_header_is_empty() {
        let decoded = decode_indexed_image(&[1, 0, 0], false);
        assert!(!decoded.is_complete());
        assert!(decoded.value.is_empty());
    }
}
