//! Identifier generation

use rand::Rng;

/// Id epoch: 2024-01-01 00:00:00 UTC
pub const ID_EPOCH_MS: i64 = 1_704_067_200_000;

const TIMESTAMP_MASK: i64 = 0x1FF_FFFF_FFFF;
const RANDOM_BITS: u32 = 12;

/// Snowflake-style id for a row created at `now_ms`.
///
/// 41 bits of milliseconds since [`ID_EPOCH_MS`] and 12 random bits, so ids
/// stay below 2^53 and survive a round trip through JavaScript numbers.
/// Two ids from the same millisecond can collide; stores retry or rely on
/// the primary key.
pub fn snowflake_id(now_ms: i64) -> i64 {
    let ts = (now_ms - ID_EPOCH_MS).max(0) & TIMESTAMP_MASK;
    let random: i64 = rand::thread_rng().gen_range(0..1 << RANDOM_BITS);
    (ts << RANDOM_BITS) | random
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEC_2025: i64 = 1_764_590_400_000;

    #[test]
    fn fits_js_safe_integer() {
        let id = snowflake_id(DEC_2025);
        assert!(id > 0);
        assert!(id < (1i64 << 53));
    }

    #[test]
    fn later_rows_get_larger_ids() {
        let earlier = snowflake_id(DEC_2025);
        let later = snowflake_id(DEC_2025 + 1);
        assert!(later > earlier);
    }

    #[test]
    fn clock_before_epoch_does_not_go_negative() {
        assert!(snowflake_id(0) >= 0);
    }
}
