//! Declarative fixture construction
//!
//! A [`FixtureSet`] hands out event and stack builders, each recording an
//! ordered list of mutations. Nothing is built until [`FixtureSet::build`]
//! replays those mutations and hands the events to the pipeline.

pub mod event_builder;
pub mod fixture_set;
pub mod mutation;
pub mod stack_builder;

pub use event_builder::EventBuilder;
pub use fixture_set::{BuiltFixtures, FixtureSet, Materialized};
pub use mutation::{EventMutation, Moment, Mutation, Mutations, StackMutation};
pub use stack_builder::{StackBuilder, StackOrigin};
