//! Error types for the protocol layer.
//!
//! Each crate in Arenaforge defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in encoding or decoding a
//! notification, not in placement or arena state.

/// Errors that can occur while encoding or decoding notifications.
///
/// `#[derive(thiserror::Error)]` generates the `std::error::Error`
/// implementation; each `#[error("...")]` is the human-readable message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: malformed JSON, an unknown `type` tag, or missing
    /// fields.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
