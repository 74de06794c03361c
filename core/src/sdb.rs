//! Localised string table (.sdb).
//!
//! `(i32 id, i32 length, bytes)` triples, optionally preceded by the `"SDB "`
//! signature. Tables without the signature are obfuscated: every text byte is
//! XOR-ed with [`XOR_KEY`], and the first four bytes are already the first id.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::byte_operations::ByteReader;
use crate::constants::{SDB_SIGNATURE, UNKNOWN_NAME};
use crate::decoded::Decoded;
use crate::encrypt::{xor_decode, XOR_KEY};
use crate::string_operations::decode_legacy;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StringTable {
    entries: BTreeMap<i32, String>,
}

impl StringTable {
    pub fn decode(data: &[u8]) -> Decoded<StringTable> {
        let mut reader = ByteReader::new(data);
        let obfuscated = data.get(..SDB_SIGNATURE.len()) != Some(&SDB_SIGNATURE[..]);
        if !obfuscated {
            reader.skip(SDB_SIGNATURE.len());
        }

        let mut entries = BTreeMap::new();
        while !reader.is_empty() {
            let start = reader.position();
            let Some(entry) = read_entry(&mut reader, obfuscated) else {
                reader.seek(start);
                break;
            };
            entries.insert(entry.0, entry.1);
        }

        log::debug!(
            "string table: {} entries, obfuscated: {obfuscated}",
            entries.len()
        );

        let table = StringTable { entries };
        if reader.is_empty() {
            Decoded::complete(table)
        } else {
            log::debug!(
                "string table truncated at offset {}, {} bytes ignored",
                reader.position(),
                reader.remaining()
            );
            Decoded::degraded(table)
        }
    }

    /// Text for `id`, or `"Unknown"` when the table has no (or an empty) entry.
    pub fn name(&self, id: i32) -> &str {
        match self.entries.get(&id) {
            Some(text) if !text.is_empty() => text,
            _ => UNKNOWN_NAME,
        }
    }

    pub fn get(&self, id: i32) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_entry(reader: &mut ByteReader<'_>, obfuscated: bool) -> Option<(i32, String)> {
    let id = reader.read_i32()?;
    let length = usize::try_from(reader.read_i32()?).ok()?;
    let bytes = reader.read_bytes(length)?;

    let text = if obfuscated {
        decode_legacy(&xor_decode(bytes, XOR_KEY))
    } else {
        decode_legacy(bytes)
    };
    Some((id, text.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoded::DecodeStatus;

    fn entry(id: i32, text: &[u8], key: Option<u8>) -> Vec<u8> {
        let mut out = id.to_le_bytes().to_vec();
        out.extend_from_slice(&(text.len() as i32).to_le_bytes());
        match key {
            Some(key) => out.extend(xor_decode(text, key)),
            None => out.extend_from_slice(text),
        }
        out
    }

    #[test]
    fn signed_table_is_read_verbatim() {
        let mut data = b"SDB ".to_vec();
        data.extend(entry(10, b" Guard ", None));
        data.extend(entry(11, &[0xC4, 0xE2, 0xE5, 0xF0, 0xFC], None));

        let decoded = StringTable::decode(&data);
        assert!(decoded.is_complete());
        let table = decoded.value;
        assert_eq!(table.len(), 2);
        assert_eq!(table.name(10), "Guard");
        assert_eq!(table.name(11), "Дверь");
    }

    #[test]
    fn unsigned_table_is_xor_decoded() {
        let mut data = entry(1, b"Merchant", Some(0xAA));
        data.extend(entry(2, b"Old well", Some(0xAA)));

        let table = StringTable::decode(&data).value;
        assert_eq!(table.get(1), Some("Merchant"));
        assert_eq!(table.get(2), Some("Old well"));
    }

    #[test]
    fn signed_table_payload_is_not_xored() {
        // The same obfuscated bytes behind a signature stay obfuscated.
        let mut data = b"SDB ".to_vec();
        let hidden = xor_decode(b"abc", 0xAA);
        data.extend(entry(5, &hidden, None));

        let table = StringTable::decode(&data).value;
        let raw = table.get(5).map(|s| s.to_string()).unwrap_or_default();
        assert_ne!(raw, "abc");
        assert_eq!(decode_legacy(&xor_decode(&hidden, 0xAA)), "abc");
    }

    #[test]
    fn unknown_ids_use_sentinel() {
        let table = StringTable::decode(b"SDB ").value;
        assert!(table.is_empty());
        assert_eq!(table.name(99), "Unknown");
        assert_eq!(table.get(99), None);
    }

    #[test]
    fn truncated_entry_is_ignored() {
        let mut data = b"SDB ".to_vec();
        data.extend(entry(1, b"kept", None));
        let mut cut = entry(2, b"lost text", None);
        cut.truncate(cut.len() - 3);
        data.extend(cut);

        let decoded = StringTable::decode(&data);
        assert_eq!(decoded.status, DecodeStatus::Degraded);
        assert_eq!(decoded.value.len(), 1);
        assert_eq!(decoded.value.name(1), "kept");
        assert_eq!(decoded.value.get(2), None);
    }

    #[test]
    fn oversized_length_is_ignored() {
        let mut data = b"SDB ".to_vec();
        data.extend(entry(1, b"kept", None));
        data.extend_from_slice(&2i32.to_le_bytes());
        data.extend_from_slice(&i32::MAX.to_le_bytes());
        data.extend_from_slice(b"short");

        let decoded = StringTable::decode(&data);
        assert_eq!(decoded.status, DecodeStatus::Degraded);
        assert_eq!(decoded.value.len(), 1);
        assert_eq!(decoded.value.get(2), None);
    }
}
