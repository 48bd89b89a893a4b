//! OneBot v11 host for the setu plugin.
//!
//! Connects to an implementation over a forward WebSocket, turns message
//! events into [`OneBotMessageEvent`]s and renders replies as CQ-coded text.

pub mod client;
pub mod event;
pub mod message;

pub use client::OneBotClient;
pub use message::{IncomingMessage, OneBotMessageEvent, Target};
