pub mod config;
pub mod error;
pub mod event;

pub use config::{LockScope, SetuConfig, TriggerProfile};
pub use error::SetuError;
pub use event::{MessageEvent, Reply};

use serde::{Deserialize, Serialize};

/// Content rating requested from the illustration API for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestMode {
    /// Mature-rated content (`r18 = 1`).
    Adult,
    /// Non-mature content (`r18 = 0`).
    Filtered,
}

impl RequestMode {
    /// Value of the API's `r18` parameter.
    pub fn r18(self) -> u8 {
        match self {
            Self::Adult => 1,
            Self::Filtered => 0,
        }
    }

    pub fn is_adult(self) -> bool {
        self == Self::Adult
    }
}
