//! String seeds and the deterministic streams derived from them.
//!
//! A [`Seed`] wraps the caller's seed string (a token id, a content hash).
//! Every random stream used during generation is derived from it by SHA-256,
//! so the same string yields the same sprite on every machine. Nothing here
//! reads the clock or any platform entropy.

use crate::prng::Xorshift64;
use crate::spec::SpriteSpec;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Separates hashed fields so that `("ab", "c")` and `("a", "bc")` differ.
const FIELD_SEPARATOR: u8 = 0x1f;

/// The caller's seed string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(String);

impl Seed {
    pub fn new(seed: impl Into<String>) -> Self {
        Self(seed.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The main generation stream: the first eight bytes of SHA-256(seed),
    /// big-endian, seed an [`Xorshift64`].
    pub fn rng(&self) -> Xorshift64 {
        Xorshift64::new(digest_prefix(&Sha256::digest(self.0.as_bytes())))
    }

    /// An independent stream for one labelled consumer, e.g. a single part
    /// in a single frame. Streams with different labels are uncorrelated and
    /// do not depend on how much of the main stream has been consumed.
    pub fn stream(&self, label: &str) -> Xorshift64 {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
        hasher.update(label.as_bytes());
        Xorshift64::new(digest_prefix(&hasher.finalize()))
    }

    /// Seed for coherent-noise generators.
    pub fn noise_seed(&self) -> u32 {
        self.stream("noise").next_u32()
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Seed {
    fn from(s: &str) -> Self {
        Seed::new(s)
    }
}

/// Audit fingerprint over the seed and the identity-defining spec fields
/// (archetype, genre, role, rarity). Always 64 lowercase hex characters.
pub fn provenance_hash(seed: &Seed, spec: &SpriteSpec) -> String {
    let role = spec.role.map(|r| r.name()).unwrap_or("none");
    let fields = [
        seed.as_str(),
        spec.archetype.name(),
        spec.genre.name(),
        role,
        spec.rarity.name(),
    ];
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
    }
    to_hex(&hasher.finalize())
}

fn digest_prefix(digest: &[u8]) -> u64 {
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
