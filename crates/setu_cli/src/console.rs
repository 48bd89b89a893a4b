use async_trait::async_trait;
use setu_core::{MessageEvent, Reply, SetuError};

/// Stand-in host that prints replies to stdout, for `--once`.
pub struct ConsoleEvent {
    text: String,
}

impl ConsoleEvent {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[async_trait]
impl MessageEvent for ConsoleEvent {
    fn message_str(&self) -> &str {
        &self.text
    }

    async fn send(&self, reply: Reply) -> Result<(), SetuError> {
        match reply {
            Reply::Empty => {}
            Reply::Plain(text) => println!("{}", text),
            Reply::Image(path) => println!("[image] {}", path.display()),
        }
        Ok(())
    }
}
