//! Unified error type for Scrawl.

use scrawl_protocol::ProtocolError;
use scrawl_room::RoomError;
use scrawl_session::SessionError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `scrawl` facade you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum ScrawlError {
    /// Encoding or decoding a frame failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Login bookkeeping failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room refused or couldn't take a command.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Configuration or word lists couldn't be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
