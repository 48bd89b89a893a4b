//! Client for the Lolicon illustration API.
//!
//! One POST per request, JSON in and out. See <https://api.lolicon.app>.

mod client;
mod types;

pub use client::SetuClient;
pub use types::{SetuItem, SetuQuery, MAX_NUM, MAX_UIDS};
