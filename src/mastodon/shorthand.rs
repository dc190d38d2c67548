//! Toot shorthands.
//!
//! Status ids are long numeric strings, unpleasant to type in IRC. Each toot
//! gets a six character shorthand instead: the FNV-1 32-bit hash of its id,
//! base64 encoded with an alphabet that leaves out look-alike characters
//! (`I`/`l`, `O`/`0`).

use base64::Engine;
use base64::alphabet::Alphabet;
use base64::engine::{GeneralPurpose, general_purpose};

const ALPHABET: Alphabet =
    match Alphabet::new("ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz123456789.,;#!?") {
        Ok(alphabet) => alphabet,
        Err(_) => panic!("shorthand alphabet must be 64 unique printable characters"),
    };

const ENGINE: GeneralPurpose = GeneralPurpose::new(&ALPHABET, general_purpose::NO_PAD);

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1 (multiply, then xor) over `data`.
fn fnv1_32(data: &[u8]) -> u32 {
    data.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        hash.wrapping_mul(FNV_PRIME) ^ u32::from(byte)
    })
}

/// Shorthand for `toot_id`.
///
/// `attempt` 0 is the plain hash. Higher attempts salt the input as
/// `<id>#<attempt>`, used when the plain shorthand already belongs to a
/// different toot.
pub fn encode(toot_id: &str, attempt: u32) -> String {
    let hash = if attempt == 0 {
        fnv1_32(toot_id.as_bytes())
    } else {
        fnv1_32(format!("{toot_id}#{attempt}").as_bytes())
    };
    ENGINE.encode(hash.to_be_bytes())
}
