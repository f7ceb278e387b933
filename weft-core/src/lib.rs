//! Weft Core - Domain Types
//!
//! Value records for the workflow orchestration domain plus the pure
//! transformations the client applies to them (event-tree construction,
//! time formatting). No I/O lives here.

mod event;
mod timefmt;
mod tree;
mod types;

pub use event::*;
pub use timefmt::*;
pub use tree::*;
pub use types::*;
