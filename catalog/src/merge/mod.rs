//! Merging of descriptors into the catalog.
//!
//! Layered leaf first: [`resolver`] looks entities up by natural key, [`upsert`] adds the
//! create-if-absent policy, [`association`] builds the join rows and [`orchestrator`]
//! sequences all of them inside one unit of work per descriptor, re-running the whole merge
//! through [`retry`] when it loses a race on a natural key.

pub mod association;
pub mod orchestrator;
pub mod resolver;
pub mod retry;
pub mod upsert;
