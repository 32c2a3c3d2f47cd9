//! Event Fixtures - declarative construction of events and stacks for tests
//!
//! Tests declare events and stacks through a [`FixtureSet`], in any order,
//! and build them in one asynchronous step that replays every declared
//! mutation and runs the events through the processing pipeline.

pub mod config;
pub mod domain;
pub mod error;
pub mod fixtures;
pub mod pipeline;
pub mod telemetry;
pub mod testing;

pub use error::{Error, Result};
pub use fixtures::{BuiltFixtures, EventBuilder, FixtureSet, StackBuilder};
