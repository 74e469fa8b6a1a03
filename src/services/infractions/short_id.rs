//! Public short IDs for infraction records.
//!
//! The alphabet leaves out `j`, `l` and `o`. Changing it or the minimum length
//! invalidates every ID already handed out.

use once_cell::sync::OnceCell;
use sqids::Sqids;

use crate::bot::error::Error;
use crate::constants::defaults::{SHORT_ID_ALPHABET, SHORT_ID_MIN_LENGTH};

static CODEC: OnceCell<Sqids> = OnceCell::new();

fn codec() -> Result<&'static Sqids, sqids::Error> {
    CODEC.get_or_try_init(|| {
        Sqids::builder()
            .alphabet(SHORT_ID_ALPHABET.chars().collect())
            .min_length(SHORT_ID_MIN_LENGTH)
            .build()
    })
}

pub fn encode(id: u64) -> Result<String, Error> {
    Ok(codec()?.encode(&[id])?)
}

/// Decode a short ID; anything that is not the canonical encoding of some
/// sequence yields an empty vector
pub fn decode(short_id: &str) -> Vec<u64> {
    let Ok(codec) = codec() else {
        return Vec::new();
    };

    let ids = codec.decode(short_id);
    if ids.is_empty() {
        return ids;
    }

    match codec.encode(&ids) {
        Ok(canonical) if canonical == short_id => ids,
        _ => Vec::new(),
    }
}

/// The single record id a short ID refers to
pub fn decode_record_id(short_id: &str) -> Option<i64> {
    match decode(short_id.trim()).as_slice() {
        [id] => i64::try_from(*id).ok(),
        _ => None,
    }
}
