//! Random identifiers for naming throwaway resources.

use rand::Rng;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Length of identifiers returned by [`generate_id`].
pub const ID_LENGTH: usize = 8;

/// Generate an 8-character identifier from the URL-safe base64 alphabet.
///
/// Uses the thread-local CSPRNG, giving 48 bits of entropy per identifier.
#[must_use]
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}
