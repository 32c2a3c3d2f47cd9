use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::fixture_set::Registry;
use super::mutation::{Moment, Mutations, StackMutation};
use crate::domain::{ProjectId, Stack, StackStatus, TenantId};

/// Where a stack builder came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOrigin {
    /// Declared directly through [`FixtureSet::add_stack`](super::FixtureSet::add_stack)
    Standalone,
    /// Created on demand by an event builder's stack-affecting call
    Associated,
}

pub(crate) struct StackBuilderState {
    origin: StackOrigin,
    mutations: Mutex<Vec<StackMutation>>,
}

impl StackBuilderState {
    pub(crate) fn new(origin: StackOrigin) -> Self {
        Self {
            origin,
            mutations: Mutex::new(vec![StackMutation::Seed {
                tenant: TenantId::sample(),
                project: ProjectId::sample(),
            }]),
        }
    }
}

/// Accumulates mutations for one stack
///
/// A cheap handle: clones refer to the same builder, which stays registered
/// in the fixture set that created it.
#[derive(Clone)]
pub struct StackBuilder {
    state: Arc<StackBuilderState>,
    registry: Arc<Registry>,
}

impl StackBuilder {
    pub(crate) fn from_state(state: Arc<StackBuilderState>, registry: Arc<Registry>) -> Self {
        Self { state, registry }
    }

    pub(crate) fn state(&self) -> &Arc<StackBuilderState> {
        &self.state
    }

    fn push(self, mutation: StackMutation) -> Self {
        self.state.mutations.lock().push(mutation);
        self
    }

    pub fn origin(&self) -> StackOrigin {
        self.state.origin
    }

    pub fn is_associated(&self) -> bool {
        self.state.origin == StackOrigin::Associated
    }

    pub fn set_tenant(self, tenant: TenantId) -> Self {
        self.push(StackMutation::Tenant(tenant))
    }

    pub fn set_project(self, project: ProjectId) -> Self {
        self.push(StackMutation::Project(project))
    }

    pub fn set_title(self, title: impl Into<String>) -> Self {
        self.push(StackMutation::Title(title.into()))
    }

    pub fn set_status(self, status: StackStatus) -> Self {
        self.push(StackMutation::Status(status))
    }

    /// Set the date fixed, defaulting to the time of replay
    pub fn mark_fixed(self, date_fixed: Option<DateTime<Utc>>) -> Self {
        self.push(StackMutation::DateFixed(Moment::at_or_now(date_fixed)))
    }

    /// Set the fixed-in version and date fixed
    ///
    /// Status is left as it is; only the version label and date change.
    pub fn mark_fixed_in_version(
        self,
        version: impl Into<String>,
        date_fixed: Option<DateTime<Utc>>,
    ) -> Self {
        self.push(StackMutation::FixedInVersion(version.into()))
            .push(StackMutation::DateFixed(Moment::at_or_now(date_fixed)))
    }

    /// Snooze the stack until `snooze_until`, or for the configured default
    /// period (24 hours) from the time of replay
    pub fn mark_snoozed(self, snooze_until: Option<DateTime<Utc>>) -> Self {
        let until = match snooze_until {
            Some(date) => Moment::At(date),
            None => Moment::FromNow(self.registry.settings().default_snooze()),
        };
        self.push(StackMutation::Status(StackStatus::Snoozed))
            .push(StackMutation::SnoozeUntil(until))
    }
}

impl Mutations for StackBuilder {
    type Entity = Stack;
    type Mutation = StackMutation;

    fn mutations(&self) -> Vec<StackMutation> {
        self.state.mutations.lock().clone()
    }
}

impl fmt::Debug for StackBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackBuilder")
            .field("origin", &self.state.origin)
            .field("mutations", &*self.state.mutations.lock())
            .finish()
    }
}
