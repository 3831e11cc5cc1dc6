//! Hash derivation: reducing token streams to stable digests.

use sha2::{Digest, Sha256};

/// Hashes an ordered token stream. Tokens are fed through a NUL separator
/// so `["ab", "c"]` and `["a", "bc"]` cannot collide; emission order is the
/// order components were added, never sorted.
pub fn hash_from_values<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for value in values {
        hasher.update(value.as_ref().as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Appends `hash` to `out` unless it is already present, preserving
/// first-seen order across variants.
pub(crate) fn push_deduped(out: &mut Vec<String>, hash: String) {
    if !out.contains(&hash) {
        out.push(hash);
    }
}
