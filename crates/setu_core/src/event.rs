//! Host-facing message abstractions.
//!
//! A host (OneBot, a test harness, ...) hands the plugin something that
//! implements [`MessageEvent`]; the plugin answers with a [`Reply`].

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// What the plugin wants the host to put into the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing to say; the host should stay silent.
    Empty,
    Plain(String),
    /// An image backed by a local file.
    Image(PathBuf),
}

impl Reply {
    pub fn empty() -> Self {
        Self::Empty
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain(text.into())
    }

    pub fn image(path: impl AsRef<Path>) -> Self {
        Self::Image(path.as_ref().to_path_buf())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Text content, if this is a plain reply.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Plain(text) => Some(text),
            _ => None,
        }
    }
}

/// One inbound chat message as seen by the plugin.
#[async_trait]
pub trait MessageEvent: Send + Sync {
    /// Raw message text as delivered by the host.
    fn message_str(&self) -> &str;

    /// Message text folded to lower case, used for keyword matching.
    fn lowered(&self) -> String {
        self.message_str().to_lowercase()
    }

    /// Deliver a reply to the chat this message came from.
    async fn send(&self, reply: Reply) -> Result<()>;
}
