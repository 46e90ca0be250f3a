//! Consumers of the catalog event queue.

pub mod pool;
