//! # Scrawl
//!
//! Session engine for a multiplayer drawing-and-guessing game.
//!
//! Players join a named room; each round one or more artists draw a
//! secret phrase while everyone else guesses it in chat. Scores add up
//! over a fixed number of rounds, then a scoreboard intermission starts
//! the next game.
//!
//! This crate is the host-facing facade over the layers:
//!
//! - [`scrawl_protocol`]: actions, events and the wire codec
//! - [`scrawl_session`]: logins and the connection table
//! - [`scrawl_room`]: the room state machine and its actors
//! - [`scrawl_tick`]: the fixed-rate room ticker
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scrawl::{GameServer, ServerConfig};
//!
//! # async fn run() -> Result<(), scrawl::ScrawlError> {
//! scrawl::init_tracing();
//! let config = ServerConfig::load()?;
//! let server = GameServer::from_config(&config).await?;
//! server.spawn_ticker(config.tick_config());
//!
//! // For each connection accepted by your transport:
//! let (id, mut events) = server.connect().await;
//! server.handle_frame(id, br#"{"action":"login","data":{"username":"ann"}}"#).await?;
//! while let Some(event) = events.recv().await {
//!     let frame = server.encode(&event)?;
//!     // ...write `frame` to the socket
//! #   let _ = frame;
//! }
//! server.disconnect(id).await;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod server;
mod words;

pub use config::{CONFIG_PATH_ENV, ConfigError, DEFAULT_CONFIG_PATH, RoomDefinition, ServerConfig};
pub use error::ScrawlError;
pub use server::{EventReceiver, GameServer, JoinResult, LoginResult};
pub use words::{WordListDirectory, is_valid_list_name};

pub use scrawl_protocol as protocol;
pub use scrawl_room as room;
pub use scrawl_session as session;
pub use scrawl_tick as tick;

/// Log filter used when `RUST_LOG` isn't set.
pub const DEFAULT_LOG_FILTER: &str = "scrawl=debug";

/// Installs a `tracing` subscriber that logs to stderr, filtered by
/// `RUST_LOG` (falling back to [`DEFAULT_LOG_FILTER`]).
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
