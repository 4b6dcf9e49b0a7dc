//! Error types for the protocol layer.

/// Errors that can occur turning events into frames or frames into
/// actions.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing an outbound event failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame could not be parsed. Malformed JSON, an unknown
    /// action, or a stroke that isn't valid base64 all land here.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but makes no sense.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
