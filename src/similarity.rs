//! Fingerprint comparison.
//!
//! Distances are percentages of differing character positions. Two
//! fingerprints of different length cannot be compared and yield
//! [`INCOMPARABLE`] instead of an error; callers must check for a negative
//! value before reading the result as a percentage.

/// Sentinel returned by [`hamming_distance`] for fingerprints of unequal length.
pub const INCOMPARABLE: f64 = -1.0;

/// Distances strictly below this percentage count as "perceptually similar".
pub const SIMILARITY_THRESHOLD_PERCENT: f64 = 9.0;

/// Percentage (0..=100) of positions at which `fp1` and `fp2` differ.
///
/// Returns [`INCOMPARABLE`] when the character counts differ and `0.0` for two
/// empty fingerprints.
pub fn hamming_distance(fp1: &str, fp2: &str) -> f64 {
    let mut length = 0_usize;
    let mut differing = 0_usize;
    let mut left = fp1.chars();
    let mut right = fp2.chars();

    loop {
        match (left.next(), right.next()) {
            (Some(a), Some(b)) => {
                length += 1;
                if a != b {
                    differing += 1;
                }
            }
            (None, None) => break,
            _ => return INCOMPARABLE,
        }
    }

    if length == 0 {
        return 0.0;
    }
    differing as f64 * 100.0 / length as f64
}

/// Caller-side policy on top of [`hamming_distance`].
pub fn is_similar(distance: f64) -> bool {
    distance >= 0.0 && distance < SIMILARITY_THRESHOLD_PERCENT
}

#[cfg(test)]
mod tests {
    use super::{hamming_distance, is_similar, INCOMPARABLE};

    #[test]
    fn identical_fingerprints_have_zero_distance() {
        assert_eq!(hamming_distance("abcd", "abcd"), 0.0);
    }

    #[test]
    fn swapped_tail_differs_in_half_the_positions() {
        assert_eq!(hamming_distance("abcd", "abdc"), 50.0);
    }

    #[test]
    fn unequal_lengths_are_incomparable() {
        assert_eq!(hamming_distance("abc", "abcd"), INCOMPARABLE);
        assert_eq!(hamming_distance("abcd", ""), INCOMPARABLE);
    }

    #[test]
    fn empty_fingerprints_compare_as_equal() {
        assert_eq!(hamming_distance("", ""), 0.0);
    }

    #[test]
    fn positions_are_compared_as_characters() {
        assert_eq!(hamming_distance("ab↑", "ab↓"), 100.0 / 3.0);
        assert_eq!(hamming_distance("↑", "ab"), INCOMPARABLE);
    }

    #[test]
    fn similarity_policy_rejects_sentinel_and_threshold() {
        assert!(is_similar(0.0));
        assert!(is_similar(8.9));
        assert!(!is_similar(9.0));
        assert!(!is_similar(INCOMPARABLE));
    }

    #[test]
    fn distance_is_symmetric_and_counts_every_flipped_position() {
        const HEX: &[u8] = b"0123456789abcdef";
        let n = 210;
        let base = (0..n)
            .map(|i| HEX[(i * 7 + 3) % 16] as char)
            .collect::<String>();

        for k in 0..=n {
            // 37 is coprime with 210, so this picks exactly k positions.
            let flipped = base
                .chars()
                .enumerate()
                .map(|(i, ch)| {
                    if (i * 37) % n < k {
                        let digit = ch.to_digit(16).unwrap() as usize;
                        HEX[(digit + 1) % 16] as char
                    } else {
                        ch
                    }
                })
                .collect::<String>();

            let forward = hamming_distance(&base, &flipped);
            assert_eq!(forward, hamming_distance(&flipped, &base), "k = {k}");
            assert_eq!(forward, 100.0 * k as f64 / n as f64, "k = {k}");
        }
    }
}
