//! Offset parsing and formatting utilities.

use anyhow::{Result, anyhow};

/// Parse a file offset given in decimal or as hex with a 0x prefix.
///
/// Sector bounds are usually quoted in decimal, while hex editors show hex.
pub fn parse_offset(s: &str) -> Result<usize> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).map_err(|e| anyhow!("Invalid hex offset: {}", e)),
        None => s.parse().map_err(|e| anyhow!("Invalid offset: {}", e)),
    }
}

/// Parse a single byte value (decimal or 0x hex).
pub fn parse_byte(s: &str) -> Result<u8> {
    let value = parse_offset(s)?;
    u8::try_from(value).map_err(|_| anyhow!("Byte value {} out of range", value))
}

/// Format bytes as space-separated hex pairs.
pub fn format_hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
