//! # Depot Hub Crate
//!
//! In-process chat broker. A single control loop owns every room and its
//! members; connected clients talk to it through a [`HubHandle`].
//!
//! ## Architecture
//!
//! - **Hub**: control loop consuming the register, unregister, broadcast and
//!   query channels one event at a time
//! - **Room**: named set of members keyed by client id
//! - **Client**: read actor and write actor around one connection and its
//!   bounded outbound queue
//! - **Connection**: transport-agnostic frame stream/sink pair
//!
//! ## Usage
//!
//! ```rust,no_run
//! use depot_config::HubConfig;
//! use depot_hub::{Hub, Message};
//!
//! # async fn demo() -> depot_hub::HubResult<()> {
//! let (hub, _task) = Hub::spawn(&HubConfig::default());
//! hub.create_room(1, "lobby").await?;
//! hub.broadcast(Message::new("hello", 1, "system")).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod connection;
pub mod error;
pub mod hub;
pub mod message;
pub mod room;

pub use client::{Client, ClientHandle, ClientKey, ConnectionId, Registration};
pub use connection::{ConnectionError, FrameSink, FrameStream};
pub use error::{HubError, HubResult};
pub use hub::{Hub, HubHandle};
pub use message::{ClientId, Message, RoomId, JOIN_NOTICE, LEAVE_NOTICE};
pub use room::{ClientSummary, RoomSummary};
