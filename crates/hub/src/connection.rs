//! Transport-agnostic view of a client connection.
//!
//! A connection is split into a stream of inbound text frames and a sink of
//! outbound text frames. Adapters for concrete transports live with the
//! transport (the gateway wraps axum's WebSocket).

use futures_util::{Sink, Stream};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The peer closed the connection normally.
    #[error("connection closed")]
    Closed,

    #[error("connection closed unexpectedly: {0}")]
    Abnormal(String),
}

impl ConnectionError {
    pub fn abnormal(reason: impl ToString) -> Self {
        Self::Abnormal(reason.to_string())
    }

    pub fn is_abnormal(&self) -> bool {
        matches!(self, Self::Abnormal(_))
    }
}

/// Inbound half: each item is one text frame or the error that ended the connection.
pub trait FrameStream: Stream<Item = Result<String, ConnectionError>> + Unpin + Send + 'static {}

impl<T> FrameStream for T where
    T: Stream<Item = Result<String, ConnectionError>> + Unpin + Send + 'static
{
}

/// Outbound half: accepts serialized messages as text frames.
pub trait FrameSink: Sink<String, Error = ConnectionError> + Unpin + Send + 'static {}

impl<T> FrameSink for T where T: Sink<String, Error = ConnectionError> + Unpin + Send + 'static {}
