//! Codec trait and implementations for serializing notifications.
//!
//! The orchestrator emits [`LifecycleEvent`](crate::LifecycleEvent) values;
//! delivering them (a message bus, a plugin event system, a log file) is
//! someone else's job. Whoever does it needs bytes, and a [`Codec`] is the
//! strategy that produces them.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so a single codec can be shared by every
/// thread that forwards notifications.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use arenaforge_protocol::{ArenaId, Codec, JsonCodec, LifecycleEvent, WorldId};
///
/// let codec = JsonCodec;
/// let event = LifecycleEvent::ArenaCreated {
///     arena_id: ArenaId(7),
///     world_id: WorldId(1),
/// };
///
/// let bytes = codec.encode(&event).unwrap();
/// let decoded: LifecycleEvent = codec.decode(&bytes).unwrap();
/// assert_eq!(event, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
