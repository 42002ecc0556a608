//! # RCON Transport
//!
//! The collectors never talk to the network directly. They go through the
//! [`Transport`] trait, which sends one administrative command and returns the
//! raw text reply. [`RconClient`] implements it on top of the Source RCON
//! framing that Minecraft servers speak.

mod client;
#[cfg(test)]
pub(crate) mod mock;
mod packet;

pub use client::RconClient;
use futures::future::BoxFuture;

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("RCON I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("RCON request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("RCON authentication was rejected by the server")]
    Authentication,
    #[error("RCON protocol violation: {0}")]
    Protocol(String),
    #[error("RCON command is {len} bytes, the server accepts at most {max}")]
    CommandTooLong { len: usize, max: usize },
}

/// Sends a single administrative command and returns the server's text reply.
///
/// Implementations are responsible for serializing concurrent callers and for
/// bounding every round-trip with a timeout.
pub trait Transport: Send + Sync {
    fn execute<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<String, TransportError>>;
}
