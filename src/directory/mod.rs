//! Campus directory: the in-memory location buckets and the searches run
//! over them.

mod filter;
mod search;
mod store;

pub use filter::*;
pub use search::*;
pub use store::*;
