//! ID generation, hex-narrowing, and timestamp helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Generates a fresh 128-bit ID formatted as a standard dashed UUID string.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Derives a 64-bit hex span id from a trace/span id by scanning its
/// characters, multiplying an accumulator by 16 and adding the nibble value
/// for each hex digit, then formatting the low 64 bits as a zero-padded
/// 16-character hex string. Non-hex characters (e.g. the dashes in a UUID)
/// are skipped. This is an intentional lossy narrowing to fit Jaeger's
/// 64-bit span id slot.
pub fn narrow_to_64bit_hex(id: &str) -> String {
    let mut acc: u64 = 0;
    for c in id.chars() {
        if let Some(nibble) = c.to_digit(16) {
            acc = acc.wrapping_mul(16).wrapping_add(nibble as u64);
        }
    }
    format!("{:016x}", acc)
}

/// Current time as milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Current time as microseconds since the Unix epoch.
pub fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}
