//! Keyword-triggered illustration plugin.
//!
//! A matching message gets an acknowledgement, then one image fetched from
//! the API, downloaded into the store, sent, and deleted again.

mod pipeline;
pub mod replies;
pub mod trigger;

pub use pipeline::SetuPlugin;
pub use replies::ReplyTable;
