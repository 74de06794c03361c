use encoding_rs::WINDOWS_1251;

use crate::byte_operations::ByteReader;

/// Decodes bytes stored in the engine's single-byte legacy codepage (cp1251).
pub fn decode_legacy(bytes: &[u8]) -> String {
    let (text, _had_errors) = WINDOWS_1251.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Decodes a fixed-width ASCII identifier, keeping non-ASCII bytes visible as
/// replacement characters.
pub fn decode_ascii_tag(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
        .collect()
}

/// Reads a `u32` length followed by that many cp1251 bytes.
///
/// Returns `None` when the length itself cannot be read. A length running past
/// the end of the buffer yields `Some("")`; only the four length bytes are
/// consumed in that case.
pub fn read_prefixed_string(reader: &mut ByteReader<'_>) -> Option<String> {
    let length = reader.read_u32()? as usize;
    match reader.read_bytes(length) {
        Some(bytes) => Some(decode_legacy(bytes)),
        None => {
            log::debug!(
                "string length {length} overruns buffer at offset {}",
                reader.position()
            );
            Some(String::new())
        }
    }
}
