//! Transient image storage.
//!
//! The directory is shared by every in-flight request. Access goes through
//! [`LockScope`](setu_core::LockScope): either one lock for everything, or
//! one lock per file name with directory scans still exclusive. A request
//! that needs a file to outlive a single operation takes a [`Lease`] on its name.

mod lock;
mod store;

pub use lock::Lease;
pub use store::ImageStore;
