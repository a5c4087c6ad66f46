//! # Converters
//!
//! Conversions between resource field types and what the mailcow API expects.

/// Bytes in a MiB; mailcow takes quotas in MiB and reports them in bytes
pub const BYTES_PER_MIB: i64 = 1_048_576;

/// Quotas and counts are sent as JSON floats
#[allow(
    clippy::cast_precision_loss,
    reason = "Quotas in MiB stay far below f32 precision limits"
)]
pub fn int64_to_float32(value: i64) -> f32 {
    value as f32
}

/// `add/domain-admin` takes `active` as 0/1
pub fn bool_to_int(value: bool) -> i32 {
    i32::from(value)
}

/// Quotas are reported back in bytes
pub fn mib_to_bytes(mib: i64) -> i64 {
    mib.saturating_mul(BYTES_PER_MIB)
}
