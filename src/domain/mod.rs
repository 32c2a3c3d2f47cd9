//! Domain types the fixtures produce
//!
//! Events and stacks are plain data here; their deeper semantics belong to
//! the processing pipeline that consumes them.

pub mod clock;
pub mod event;
pub mod identifiers;
pub mod sample;
pub mod stack;

pub use event::*;
pub use identifiers::*;
pub use stack::*;
