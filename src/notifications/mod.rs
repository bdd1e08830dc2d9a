//! Notification center, local read state and background refresh.

mod center;
mod local_store;
mod poller;
mod reconcile;

pub use center::*;
pub use local_store::*;
pub use poller::*;
pub use reconcile::*;
