use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::fixture_set::Registry;
use super::mutation::{EventMutation, Moment, Mutations};
use super::stack_builder::{StackBuilder, StackBuilderState, StackOrigin};
use crate::domain::{Event, EventType, ProjectId, StackStatus, TenantId};

pub(crate) struct EventBuilderState {
    mutations: Mutex<Vec<EventMutation>>,
    stack: OnceLock<Arc<StackBuilderState>>,
}

impl EventBuilderState {
    pub(crate) fn new(event_type: EventType) -> Self {
        Self {
            mutations: Mutex::new(vec![EventMutation::Seed {
                tenant: TenantId::sample(),
                project: ProjectId::sample(),
                event_type,
            }]),
            stack: OnceLock::new(),
        }
    }

    pub(crate) fn associated_stack(&self) -> Option<&Arc<StackBuilderState>> {
        self.stack.get()
    }
}

/// Accumulates mutations for one event
///
/// Stack-affecting calls (`set_status`, `mark_fixed`, `mark_snoozed`) are
/// routed to a stack builder that is created and registered in the owning
/// fixture set the first time one of them is made. Later calls reuse it.
#[derive(Clone)]
pub struct EventBuilder {
    state: Arc<EventBuilderState>,
    registry: Arc<Registry>,
}

impl EventBuilder {
    pub(crate) fn from_state(state: Arc<EventBuilderState>, registry: Arc<Registry>) -> Self {
        Self { state, registry }
    }

    pub(crate) fn owns_stack(&self, stack: &StackBuilder) -> bool {
        self.state
            .associated_stack()
            .is_some_and(|state| Arc::ptr_eq(state, stack.state()))
    }

    fn push(self, mutation: EventMutation) -> Self {
        self.state.mutations.lock().push(mutation);
        self
    }

    pub fn set_tenant(self, tenant: TenantId) -> Self {
        self.push(EventMutation::Tenant(tenant))
    }

    pub fn set_project(self, project: ProjectId) -> Self {
        self.push(EventMutation::Project(project))
    }

    pub fn set_message(self, message: impl Into<String>) -> Self {
        self.push(EventMutation::Message(message.into()))
    }

    pub fn set_source(self, source: impl Into<String>) -> Self {
        self.push(EventMutation::Source(source.into()))
    }

    /// Override the capture time stamped at replay
    pub fn set_date(self, date: DateTime<Utc>) -> Self {
        self.push(EventMutation::Date(Moment::At(date)))
    }

    /// Append tags; earlier tags are kept
    pub fn add_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags = tags.into_iter().map(Into::into).collect();
        self.push(EventMutation::AddTags(tags))
    }

    /// Declare the status of this event's stack
    ///
    /// `Open` is every stack's default, so it does not create a stack.
    pub fn set_status(self, status: StackStatus) -> Self {
        if status == StackStatus::Open {
            return self;
        }

        self.stack().set_status(status);
        self
    }

    pub fn mark_fixed(self, date_fixed: Option<DateTime<Utc>>) -> Self {
        self.stack().mark_fixed(date_fixed);
        self
    }

    pub fn mark_fixed_in_version(self, version: impl Into<String>) -> Self {
        self.stack().mark_fixed_in_version(version, None);
        self
    }

    pub fn mark_snoozed(self, snooze_until: Option<DateTime<Utc>>) -> Self {
        self.stack().mark_snoozed(snooze_until);
        self
    }

    /// The stack builder associated with this event, created and registered
    /// on first use
    pub fn stack(&self) -> StackBuilder {
        let state = self
            .state
            .stack
            .get_or_init(|| self.registry.register_stack(StackOrigin::Associated));
        StackBuilder::from_state(Arc::clone(state), Arc::clone(&self.registry))
    }

    /// The associated stack builder, if a stack-affecting call created one
    pub fn associated_stack(&self) -> Option<StackBuilder> {
        self.state
            .associated_stack()
            .map(|state| StackBuilder::from_state(Arc::clone(state), Arc::clone(&self.registry)))
    }
}

impl Mutations for EventBuilder {
    type Entity = Event;
    type Mutation = EventMutation;

    fn mutations(&self) -> Vec<EventMutation> {
        self.state.mutations.lock().clone()
    }
}

impl fmt::Debug for EventBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBuilder")
            .field("mutations", &*self.state.mutations.lock())
            .field("has_stack", &self.state.stack.get().is_some())
            .finish()
    }
}
