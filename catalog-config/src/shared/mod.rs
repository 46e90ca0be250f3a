mod base;
mod catalog;
mod connection;
mod merge;
mod store;

pub use base::*;
pub use catalog::*;
pub use connection::*;
pub use merge::*;
pub use store::*;
