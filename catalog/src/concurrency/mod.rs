//! Coordination primitives shared by the merge workers.

pub mod shutdown;
