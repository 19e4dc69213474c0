//! Persisted identifier generation.
//!
//! Layout: 13 base58 characters (Bitcoin alphabet) holding the UTC
//! nanosecond timestamp, left-padded with the zero digit `1`, followed by
//! 4 random decimal digits.
//!
//! # Invariants
//! - Every generated id is exactly `ID_LENGTH` ASCII characters.
//! - Fixed-width padding keeps lexicographic order equal to timestamp order.
//! - Uniqueness is probabilistic: ids only collide when two calls share a
//!   nanosecond and draw the same 4-digit suffix. Not suitable as a secret.

use chrono::Utc;
use rand::Rng;

/// Total id length.
pub const ID_LENGTH: usize = TIMESTAMP_WIDTH + SUFFIX_DIGITS;

const TIMESTAMP_WIDTH: usize = 13;
const SUFFIX_DIGITS: usize = 4;
const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Generates an id for the current instant.
pub fn generate_id() -> String {
    generate_id_at(now_nanos())
}

/// Generates an id for an explicit nanosecond timestamp.
pub fn generate_id_at(timestamp_ns: u64) -> String {
    let mut id = encode_base58_fixed(timestamp_ns);
    let mut rng = rand::thread_rng();
    for _ in 0..SUFFIX_DIGITS {
        let digit: u8 = rng.gen_range(0..10);
        id.push(char::from(b'0' + digit));
    }
    id
}

/// Recovers the nanosecond timestamp from a generated id.
///
/// Returns `None` when `id` does not have the generated shape.
pub fn decode_id_timestamp(id: &str) -> Option<u64> {
    if !is_generated_id(id) {
        return None;
    }

    id[..TIMESTAMP_WIDTH].bytes().try_fold(0u64, |acc, byte| {
        let digit = BASE58_ALPHABET.iter().position(|c| *c == byte)? as u64;
        acc.checked_mul(58)?.checked_add(digit)
    })
}

/// Checks length, timestamp alphabet and decimal suffix.
pub fn is_generated_id(id: &str) -> bool {
    id.len() == ID_LENGTH
        && id.is_ascii()
        && id[..TIMESTAMP_WIDTH]
            .bytes()
            .all(|byte| BASE58_ALPHABET.contains(&byte))
        && id[TIMESTAMP_WIDTH..].bytes().all(|byte| byte.is_ascii_digit())
}

fn encode_base58_fixed(mut value: u64) -> String {
    let mut digits = [BASE58_ALPHABET[0]; TIMESTAMP_WIDTH];
    for slot in digits.iter_mut().rev() {
        if value == 0 {
            break;
        }
        *slot = BASE58_ALPHABET[(value % 58) as usize];
        value /= 58;
    }
    digits.iter().map(|byte| char::from(*byte)).collect()
}

fn now_nanos() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .and_then(|nanos| u64::try_from(nanos).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{
        decode_id_timestamp, encode_base58_fixed, generate_id, generate_id_at, is_generated_id,
        ID_LENGTH,
    };
    use std::collections::HashSet;
    use std::time::Duration;

    #[test]
    fn ids_have_fixed_shape() {
        let id = generate_id();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(is_generated_id(&id), "unexpected id shape: {id}");
    }

    #[test]
    fn encoding_matches_known_base58_values() {
        assert_eq!(encode_base58_fixed(0), "1111111111111");
        assert_eq!(encode_base58_fixed(57), "111111111111z");
        assert_eq!(encode_base58_fixed(58), "1111111111121");
        assert_eq!(encode_base58_fixed(u64::MAX), "11jpXCZedGfVQ");
    }

    #[test]
    fn timestamp_round_trips_through_id() {
        let timestamp = 1_760_000_000_123_456_789;
        let id = generate_id_at(timestamp);
        assert_eq!(decode_id_timestamp(&id), Some(timestamp));
    }

    #[test]
    fn rapid_generation_yields_distinct_ids() {
        let ids: HashSet<String> = (0..1_000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn timestamps_do_not_decrease_across_milliseconds() {
        let first = generate_id();
        std::thread::sleep(Duration::from_millis(1));
        let second = generate_id();

        let first_ts = decode_id_timestamp(&first).unwrap();
        let second_ts = decode_id_timestamp(&second).unwrap();
        assert!(second_ts >= first_ts);
        assert!(second[..13] >= first[..13]);
    }

    #[test]
    fn rejects_foreign_shapes() {
        assert!(!is_generated_id("11111111-2222-4333-8444-555555555555"));
        assert!(!is_generated_id("0000000000000abcd"));
        assert_eq!(decode_id_timestamp("short"), None);
    }
}
