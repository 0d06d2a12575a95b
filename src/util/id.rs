//! Record ID generation.
//!
//! IDs have the form `<prefix>-<hash>` where hash is base36 lowercase
//! (0-9, a-z) with adaptive length based on how many records exist.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// ID generation configuration.
#[derive(Debug, Clone)]
pub struct IdConfig {
    /// Minimum hash length.
    pub min_hash_length: usize,
    /// Maximum hash length.
    pub max_hash_length: usize,
    /// Maximum collision probability before increasing length.
    pub max_collision_prob: f64,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            min_hash_length: 4,
            max_hash_length: 10,
            max_collision_prob: 0.25,
        }
    }
}

/// ID generator that produces unique record IDs.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    config: IdConfig,
}

impl IdGenerator {
    /// Create a new ID generator with the given config.
    #[must_use]
    pub const fn new(config: IdConfig) -> Self {
        Self { config }
    }

    /// Compute the optimal hash length for a given record count.
    ///
    /// Uses birthday problem approximation to estimate collision probability.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap
    )]
    pub fn optimal_length(&self, record_count: usize) -> usize {
        let n = record_count as f64;
        let max_prob = self.config.max_collision_prob;

        for len in self.config.min_hash_length..=self.config.max_hash_length {
            // Base36 has 36^len possible values
            let space = 36_f64.powi(len as i32);
            // Birthday problem: P(collision) ≈ 1 - e^(-n²/2d)
            let prob = 1.0 - (-n * n / (2.0 * space)).exp();
            if prob < max_prob {
                return len;
            }
        }
        self.config.max_hash_length
    }

    /// Generate an ID, checking for collisions with the provided checker.
    ///
    /// The checker returns `true` if the ID is already taken. Nonces are
    /// tried at each length before the hash is lengthened.
    pub fn generate<F>(
        &self,
        prefix: &str,
        natural_key: &str,
        actor: &str,
        created_at: DateTime<Utc>,
        record_count: usize,
        exists: F,
    ) -> String
    where
        F: Fn(&str) -> bool,
    {
        let mut length = self.optimal_length(record_count);
        let mut nonce = 0u32;

        loop {
            for _ in 0..10 {
                let seed = generate_id_seed(natural_key, actor, created_at, nonce);
                let id = format!("{prefix}-{}", compute_id_hash(&seed, length));
                if !exists(&id) {
                    return id;
                }
                nonce += 1;
            }

            if length < self.config.max_hash_length {
                length += 1;
            } else {
                // The hash space is saturated at max length; append the nonce.
                let seed = generate_id_seed(natural_key, actor, created_at, nonce);
                let hash_str = compute_id_hash(&seed, length);
                loop {
                    let id = format!("{prefix}-{hash_str}{nonce}");
                    if !exists(&id) {
                        return id;
                    }
                    nonce += 1;
                }
            }
        }
    }
}

/// Generate the seed string for ID generation.
///
/// Inputs: `natural_key | actor | created_at (ns) | nonce`
#[must_use]
pub fn generate_id_seed(
    natural_key: &str,
    actor: &str,
    created_at: DateTime<Utc>,
    nonce: u32,
) -> String {
    format!(
        "{}|{}|{}|{}",
        natural_key,
        actor,
        created_at.timestamp_nanos_opt().unwrap_or(0),
        nonce
    )
}

/// Compute a base36 hash of the input string with a specific length.
///
/// Uses SHA256 to hash the input, then converts the first 8 bytes to a u64,
/// encodes as base36, and truncates to the requested length.
#[must_use]
pub fn compute_id_hash(input: &str, length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();

    let mut num = 0u64;
    for &byte in result.iter().take(8) {
        num = (num << 8) | u64::from(byte);
    }

    let encoded = base36_encode(num);
    let padded = if encoded.len() < length {
        format!("{encoded:0>length$}")
    } else {
        encoded
    };

    padded.chars().take(length).collect()
}

fn base36_encode(mut num: u64) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if num == 0 {
        return "0".to_string();
    }
    let mut chars = Vec::new();
    while num > 0 {
        chars.push(ALPHABET[(num % 36) as usize] as char);
        num /= 36;
    }
    chars.into_iter().rev().collect()
}
