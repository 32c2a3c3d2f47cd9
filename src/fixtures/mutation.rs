//! Deferred mutations and their replay
//!
//! Builders never touch an entity directly. Each fluent call appends one
//! tagged mutation; replay starts from the entity's empty instance and
//! applies the sequence in insertion order, so the last write to a field wins.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{
    clock::Clock, Event, EventType, ProjectId, Stack, StackStatus, TenantId,
};

/// A timestamp resolved against the clock when a mutation is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    Now,
    At(DateTime<Utc>),
    FromNow(Duration),
}

impl Moment {
    /// Offsets that leave the representable calendar saturate at its ends
    pub fn resolve(&self, clock: &dyn Clock) -> DateTime<Utc> {
        match self {
            Self::Now => clock.now(),
            Self::At(at) => *at,
            Self::FromNow(offset) => clock
                .now()
                .checked_add_signed(*offset)
                .unwrap_or(if *offset < Duration::zero() {
                    DateTime::<Utc>::MIN_UTC
                } else {
                    DateTime::<Utc>::MAX_UTC
                }),
        }
    }

    /// `At(date)` when a date is given, `Now` otherwise
    pub fn at_or_now(date: Option<DateTime<Utc>>) -> Self {
        date.map_or(Self::Now, Self::At)
    }
}

/// One deferred change to an entity of type `T`
pub trait Mutation<T> {
    fn apply(&self, entity: &mut T, clock: &dyn Clock);
}

/// Capability shared by every entity builder: a read-only, ordered view of
/// the mutations accumulated so far
pub trait Mutations {
    type Entity: Default;
    type Mutation: Mutation<Self::Entity>;

    fn mutations(&self) -> Vec<Self::Mutation>;
}

/// Replay `mutations` in order onto `entity`
pub fn apply_all<T, M>(entity: &mut T, mutations: &[M], clock: &dyn Clock)
where
    M: Mutation<T>,
{
    for mutation in mutations {
        mutation.apply(entity, clock);
    }
}

/// Build a fresh entity from the builder's accumulated mutations
pub fn replay<B>(builder: &B, clock: &dyn Clock) -> B::Entity
where
    B: Mutations,
{
    let mut entity = B::Entity::default();
    apply_all(&mut entity, &builder.mutations(), clock);
    entity
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventMutation {
    /// Default identity, type and capture time
    Seed {
        tenant: TenantId,
        project: ProjectId,
        event_type: EventType,
    },
    Tenant(TenantId),
    Project(ProjectId),
    Message(String),
    Source(String),
    AddTags(Vec<String>),
    Date(Moment),
}

impl Mutation<Event> for EventMutation {
    fn apply(&self, event: &mut Event, clock: &dyn Clock) {
        match self {
            Self::Seed {
                tenant,
                project,
                event_type,
            } => {
                event.tenant_id = Some(tenant.clone());
                event.project_id = Some(project.clone());
                event.event_type = Some(event_type.clone());
                event.date = Some(clock.now());
            }
            Self::Tenant(tenant) => event.tenant_id = Some(tenant.clone()),
            Self::Project(project) => event.project_id = Some(project.clone()),
            Self::Message(message) => event.message = Some(message.clone()),
            Self::Source(source) => event.source = Some(source.clone()),
            Self::AddTags(tags) => event.tags.extend(tags.iter().cloned()),
            Self::Date(moment) => event.date = Some(moment.resolve(clock)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackMutation {
    /// Default identity
    Seed {
        tenant: TenantId,
        project: ProjectId,
    },
    Tenant(TenantId),
    Project(ProjectId),
    Title(String),
    Status(StackStatus),
    DateFixed(Moment),
    FixedInVersion(String),
    SnoozeUntil(Moment),
}

impl Mutation<Stack> for StackMutation {
    fn apply(&self, stack: &mut Stack, clock: &dyn Clock) {
        match self {
            Self::Seed { tenant, project } => {
                stack.tenant_id = Some(tenant.clone());
                stack.project_id = Some(project.clone());
            }
            Self::Tenant(tenant) => stack.tenant_id = Some(tenant.clone()),
            Self::Project(project) => stack.project_id = Some(project.clone()),
            Self::Title(title) => stack.title = Some(title.clone()),
            Self::Status(status) => stack.status = *status,
            Self::DateFixed(moment) => stack.date_fixed = Some(moment.resolve(clock)),
            Self::FixedInVersion(version) => stack.fixed_in_version = Some(version.clone()),
            Self::SnoozeUntil(moment) => stack.snooze_until = Some(moment.resolve(clock)),
        }
    }
}
