//! Data models for the campus directory backend.
//!
//! Field names serialize in camelCase to match the web client.

mod activity;
mod directory;
mod location;
mod medicine;
mod notification;
mod pharmacy;
mod user;

pub use activity::*;
pub use directory::*;
pub use location::*;
pub use medicine::*;
pub use notification::*;
pub use pharmacy::*;
pub use user::*;
