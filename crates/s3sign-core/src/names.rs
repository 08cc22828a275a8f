//! Unique name generation for buckets, objects, and temporary paths.
//!
//! [`NameGenerator`] is an explicitly owned linear-congruential generator.
//! It makes no claim to statistical quality; it only needs to produce names
//! that do not collide in practice during a single test run. Seeding it with
//! a fixed value makes the produced names reproducible.

use tracing::trace;

/// Multiplier from Numerical Recipes.
const LCG_MULTIPLIER: u32 = 1_664_525;
/// Increment from Numerical Recipes.
const LCG_INCREMENT: u32 = 1_013_904_223;
/// Suffixes are the state reduced modulo this value, printed with 9 digits.
const SUFFIX_MODULUS: u32 = 1_000_000_000;

/// Characters allowed in generated names. Every one is valid in an S3 bucket name.
const NAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
/// Length of the names produced by [`NameGenerator::bucket_name`].
const BUCKET_NAME_LEN: usize = 60;

/// Owned pseudo-random generator for unique names.
///
/// Callers that share one across threads wrap it in a lock themselves.
///
/// # Examples
///
/// ```
/// use s3sign_core::NameGenerator;
///
/// let mut a = NameGenerator::new(42);
/// let mut b = NameGenerator::new(42);
/// assert_eq!(a.next_suffix(), b.next_suffix());
/// assert_eq!(a.next_suffix().len(), 9);
/// ```
#[derive(Debug, Clone)]
pub struct NameGenerator {
    state: u32,
}

impl NameGenerator {
    /// Create a generator with a fixed seed.
    ///
    /// A seed of `0` means "unseeded": the first draw reseeds from the clock
    /// and process id.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Create a generator seeded from the current time and process id.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            state: entropy_seed(),
        }
    }

    /// Return a new 9-digit, zero-padded numeric suffix.
    pub fn next_suffix(&mut self) -> String {
        let r = self.step();
        format!("{:09}", r % SUFFIX_MODULUS)
    }

    /// Return a random lowercase alphanumeric string of length `len`.
    pub fn random_string(&mut self, len: usize) -> String {
        let mut out = String::with_capacity(len);
        while out.len() < len {
            // The high bits of an LCG are the least predictable ones.
            let idx = (self.step() >> 26) as usize;
            if let Some(&c) = NAME_ALPHABET.get(idx) {
                out.push(char::from(c));
            }
        }
        out
    }

    /// Return a random name usable as an S3 bucket name.
    pub fn bucket_name(&mut self) -> String {
        self.random_string(BUCKET_NAME_LEN)
    }

    /// Return `prefix` followed by a fresh suffix, e.g. for object keys.
    pub fn unique_name(&mut self, prefix: &str) -> String {
        format!("{prefix}{}", self.next_suffix())
    }

    fn step(&mut self) -> u32 {
        if self.state == 0 {
            self.state = entropy_seed();
            trace!("reseeded name generator");
        }
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

fn entropy_seed() -> u32 {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    // Truncation is fine: only the low bits vary between calls.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let seed = (nanos as u64).wrapping_add(u64::from(std::process::id())) as u32;
    seed.max(1)
}
