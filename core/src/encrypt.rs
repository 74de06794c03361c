/// Single-byte key the string tables are obfuscated with.
pub const XOR_KEY: u8 = 0xAA;

/// XORs every byte with `key`. The operation is its own inverse.
pub fn xor_decode(bytes: &[u8], key: u8) -> Vec<u8> {
    bytes.iter().map(|&b| b ^ key).collect()
}
