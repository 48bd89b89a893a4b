//! Bridging OneBot messages to the plugin's `MessageEvent`.

use crate::client::OneBotClient;
use async_trait::async_trait;
use setu_core::{MessageEvent, Reply, SetuError};
use std::path::Path;

/// Where a reply should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Private(i64),
    Group(i64),
}

/// Inbound chat message, stripped down to what the plugin needs.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub message_id: i32,
    pub user_id: i64,
    pub target: Target,
    pub raw_message: String,
}

impl From<crate::event::MessageEvent> for IncomingMessage {
    fn from(ev: crate::event::MessageEvent) -> Self {
        let target = match (ev.message_type.as_str(), ev.group_id) {
            ("group", Some(group_id)) => Target::Group(group_id),
            _ => Target::Private(ev.user_id),
        };
        Self {
            message_id: ev.message_id,
            user_id: ev.user_id,
            target,
            raw_message: ev.raw_message,
        }
    }
}

/// Escape text so the implementation does not read it as CQ codes.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('[', "&#91;")
        .replace(']', "&#93;")
}

/// Escape a CQ code parameter value.
fn escape_param(value: &str) -> String {
    escape_text(value).replace(',', "&#44;")
}

/// Image segment pointing at a local file. The path is made absolute since
/// the implementation may run with a different working directory.
pub fn image_code(path: &Path) -> String {
    let abs = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("[CQ:image,file=file://{}]", escape_param(&abs.to_string_lossy()))
}

/// Render a reply as a OneBot message string. `None` for empty replies.
pub fn render_reply(reply: &Reply) -> Option<String> {
    match reply {
        Reply::Empty => None,
        Reply::Plain(text) => Some(escape_text(text)),
        Reply::Image(path) => Some(image_code(path)),
    }
}

/// A message as the plugin sees it, with a handle to answer through.
pub struct OneBotMessageEvent {
    client: OneBotClient,
    message: IncomingMessage,
}

impl OneBotMessageEvent {
    pub fn new(client: OneBotClient, message: IncomingMessage) -> Self {
        Self { client, message }
    }

    pub fn message(&self) -> &IncomingMessage {
        &self.message
    }
}

#[async_trait]
impl MessageEvent for OneBotMessageEvent {
    fn message_str(&self) -> &str {
        &self.message.raw_message
    }

    async fn send(&self, reply: Reply) -> Result<(), SetuError> {
        let Some(text) = render_reply(&reply) else {
            return Ok(());
        };
        self.client.send_to(self.message.target, &text).await
    }
}
