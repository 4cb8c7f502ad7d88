//! Canonical encoding of a `(period, hotel, room)` tuple into the rate key
//! `K` used to address both the cache entry and the cross-replica registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tuple::{Hotel, Period, RateRequest, Room};

/// A stable, byte-identical-across-replicas encoding of a `RateRequest`.
///
/// Built by serializing a field-ordered struct to compact JSON. `serde_json`
/// preserves struct field declaration order and never inserts whitespace in
/// its compact writer, so two replicas given the same tuple always produce
/// the same bytes — the property §3 requires of K.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateKey(String);

#[derive(Serialize, Deserialize)]
struct KeyTuple {
    period: Period,
    hotel: Hotel,
    room: Room,
}

/// Failure decoding a previously-encoded key back into its tuple.
///
/// Only reachable for keys that did not originate from [`RateKey::new`] —
/// e.g. a registry entry corrupted out of band. The revalidator treats this
/// as a malformed entry: skip it and count it as an error (§4.5.2 step 2).
#[derive(Debug, Clone, thiserror::Error)]
#[error("malformed rate key: {0}")]
pub struct KeyDecodeError(String);

impl RateKey {
    /// Encode a request's tuple into its canonical key.
    pub fn new(request: RateRequest) -> Self {
        let tuple = KeyTuple {
            period: request.period,
            hotel: request.hotel,
            room: request.room,
        };
        // Field order is fixed by the struct definition above and
        // `serde_json`'s compact writer emits no extraneous whitespace.
        let encoded = serde_json::to_string(&tuple).expect("KeyTuple is always serializable");
        Self(encoded)
    }

    /// Decode a key back into its tuple, for defensive iteration over the
    /// registry during a batch revalidation pass.
    pub fn decode(&self) -> Result<RateRequest, KeyDecodeError> {
        let tuple: KeyTuple =
            serde_json::from_str(&self.0).map_err(|e| KeyDecodeError(e.to_string()))?;
        Ok(RateRequest::new(tuple.period, tuple.hotel, tuple.room))
    }

    /// Borrow the raw encoded string, as stored in the KV store and registry.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RateKey {
    type Err = KeyDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = Self(s.to_string());
        key.decode()?;
        Ok(key)
    }
}

impl AsRef<str> for RateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
