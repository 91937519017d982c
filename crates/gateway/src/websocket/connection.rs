//! Adapts axum's WebSocket to the hub's frame stream and sink.

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use depot_hub::{ConnectionError, FrameSink, FrameStream};
use futures_util::{future, SinkExt, StreamExt};
use tracing::debug;

/// Split an upgraded socket into the halves a [`depot_hub::Client`] serves.
pub fn split(socket: WebSocket) -> (impl FrameStream, impl FrameSink) {
    let (sink, stream) = socket.split();

    let reader = stream.filter_map(|frame| future::ready(inbound(frame)));
    let writer = sink
        .sink_map_err(|error| ConnectionError::abnormal(error))
        .with(|text: String| future::ready(Ok::<_, ConnectionError>(Message::Text(text))));

    (reader, writer)
}

/// Map one received frame. `None` means the frame carries nothing for the chat.
fn inbound(frame: Result<Message, axum::Error>) -> Option<Result<String, ConnectionError>> {
    match frame {
        Ok(Message::Text(text)) => Some(Ok(text)),
        Ok(Message::Binary(bytes)) => {
            debug!(len = bytes.len(), "ignoring binary frame");
            None
        }
        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
        Ok(Message::Close(frame)) => Some(Err(close_reason(frame))),
        Err(error) => Some(Err(ConnectionError::abnormal(error))),
    }
}

fn close_reason(frame: Option<CloseFrame<'static>>) -> ConnectionError {
    match frame {
        None => ConnectionError::Closed,
        Some(CloseFrame { code, .. }) if code == close_code::NORMAL || code == close_code::AWAY => {
            ConnectionError::Closed
        }
        Some(CloseFrame { code, reason }) => {
            ConnectionError::abnormal(format!("close code {code}: {reason}"))
        }
    }
}
