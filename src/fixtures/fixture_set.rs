use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use super::event_builder::{EventBuilder, EventBuilderState};
use super::mutation::{apply_all, replay, Mutations, StackMutation};
use super::stack_builder::{StackBuilder, StackBuilderState, StackOrigin};
use crate::{
    config::FixtureSettings,
    domain::{
        clock::{self, Clock},
        Event, EventType, Stack,
    },
    error::{Error, Result},
    pipeline::{EventPipeline, PipelineContext, StackRepository},
    testing::{InMemoryStackRepository, StackingPipeline},
};

/// Owner of every builder state created through a fixture set
///
/// Builder handles keep a reference to it so lazily created stack builders
/// can register themselves.
pub(crate) struct Registry {
    settings: RwLock<FixtureSettings>,
    events: RwLock<Vec<Arc<EventBuilderState>>>,
    stacks: RwLock<Vec<Arc<StackBuilderState>>>,
}

impl Registry {
    fn new(settings: FixtureSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
            events: RwLock::new(Vec::new()),
            stacks: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn settings(&self) -> FixtureSettings {
        self.settings.read().clone()
    }

    fn register_event(&self, event_type: EventType) -> Arc<EventBuilderState> {
        let state = Arc::new(EventBuilderState::new(event_type));
        self.events.write().push(Arc::clone(&state));
        state
    }

    pub(crate) fn register_stack(&self, origin: StackOrigin) -> Arc<StackBuilderState> {
        let state = Arc::new(StackBuilderState::new(origin));
        self.stacks.write().push(Arc::clone(&state));
        state
    }
}

/// Entities produced by replaying every builder, before any collaborator
/// has seen them
#[derive(Debug, Clone, Default)]
pub struct Materialized {
    pub events: Vec<Event>,
    pub stacks: Vec<Stack>,
}

/// Result of a successful build
///
/// `events` are the pipeline-processed events in declaration order;
/// `stacks` holds every stack the build wrote, in stack-builder order.
#[derive(Debug, Clone, Default)]
pub struct BuiltFixtures {
    pub events: Vec<Event>,
    pub stacks: Vec<Stack>,
}

impl BuiltFixtures {
    /// The written stack `event` was grouped into, if the build touched it
    pub fn stack_for(&self, event: &Event) -> Option<&Stack> {
        let stack_id = event.stack_id.as_ref()?;
        self.stacks.iter().find(|stack| &stack.id == stack_id)
    }
}

/// Declares events and stacks, then builds them through the pipeline
///
/// Every builder is created through one of the `add_*` factories, so the set
/// always knows about all of them, including stack builders created lazily
/// by event builders.
pub struct FixtureSet {
    registry: Arc<Registry>,
    pipeline: Arc<dyn EventPipeline>,
    stacks: Arc<dyn StackRepository>,
    clock: Arc<dyn Clock>,
}

impl FixtureSet {
    pub fn new(pipeline: Arc<dyn EventPipeline>, stacks: Arc<dyn StackRepository>) -> Self {
        Self {
            registry: Arc::new(Registry::new(FixtureSettings::default())),
            pipeline,
            stacks,
            clock: clock::global(),
        }
    }

    /// A set wired to [`StackingPipeline`] over an [`InMemoryStackRepository`]
    pub fn in_memory() -> Self {
        let stacks = Arc::new(InMemoryStackRepository::new());
        let pipeline = Arc::new(StackingPipeline::new(stacks.clone()));
        Self::new(pipeline, stacks)
    }

    /// Use `clock` instead of the process-wide clock when replaying
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_settings(self, settings: FixtureSettings) -> Self {
        *self.registry.settings.write() = settings;
        self
    }

    pub fn settings(&self) -> FixtureSettings {
        self.registry.settings()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn stack_repository(&self) -> Arc<dyn StackRepository> {
        Arc::clone(&self.stacks)
    }

    pub fn add_event(&self, event_type: impl Into<EventType>) -> EventBuilder {
        let state = self.registry.register_event(event_type.into());
        EventBuilder::from_state(state, Arc::clone(&self.registry))
    }

    pub fn add_error_event(&self) -> EventBuilder {
        self.add_event(EventType::error())
    }

    pub fn add_log_event(&self) -> EventBuilder {
        self.add_event(EventType::log())
    }

    pub fn add_not_found_event(&self) -> EventBuilder {
        self.add_event(EventType::not_found())
    }

    pub fn add_feature_usage_event(&self) -> EventBuilder {
        self.add_event(EventType::feature_usage())
    }

    pub fn add_session_event(&self) -> EventBuilder {
        self.add_event(EventType::session())
    }

    pub fn add_session_end_event(&self) -> EventBuilder {
        self.add_event(EventType::session_end())
    }

    pub fn add_heartbeat_event(&self) -> EventBuilder {
        self.add_event(EventType::session_heartbeat())
    }

    pub fn add_stack(&self) -> StackBuilder {
        let state = self.registry.register_stack(StackOrigin::Standalone);
        StackBuilder::from_state(state, Arc::clone(&self.registry))
    }

    pub fn event_builders(&self) -> Vec<EventBuilder> {
        self.registry
            .events
            .read()
            .iter()
            .map(|state| EventBuilder::from_state(Arc::clone(state), Arc::clone(&self.registry)))
            .collect()
    }

    pub fn stack_builders(&self) -> Vec<StackBuilder> {
        self.registry
            .stacks
            .read()
            .iter()
            .map(|state| StackBuilder::from_state(Arc::clone(state), Arc::clone(&self.registry)))
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.registry.events.read().len()
    }

    pub fn stack_count(&self) -> usize {
        self.registry.stacks.read().len()
    }

    /// Replay every builder onto fresh entities without touching the
    /// pipeline or the repository
    pub fn materialize(&self) -> Materialized {
        let clock = self.clock.as_ref();
        let materialized = Materialized {
            events: self
                .event_builders()
                .iter()
                .map(|builder| replay(builder, clock))
                .collect(),
            stacks: self
                .stack_builders()
                .iter()
                .map(|builder| replay(builder, clock))
                .collect(),
        };
        debug!(
            events = materialized.events.len(),
            stacks = materialized.stacks.len(),
            "Materialized fixtures"
        );
        materialized
    }

    /// Build every declared fixture
    ///
    /// Events are replayed, grouped by tenant/project and submitted to the
    /// pipeline one partition at a time. Stack builders created by event
    /// builders are then replayed onto the stack the pipeline assigned to
    /// their event; standalone stack builders become new stacks. Any
    /// collaborator error is returned as is and nothing is returned on
    /// failure.
    #[instrument(skip(self), fields(events = self.event_count(), stacks = self.stack_count()))]
    pub async fn build(self) -> Result<BuiltFixtures> {
        let event_builders = self.event_builders();
        let stack_builders = self.stack_builders();

        let replayed: Vec<Event> = event_builders
            .iter()
            .map(|builder| replay(builder, self.clock.as_ref()))
            .collect();
        let events = self.submit(replayed).await?;

        let mut stacks: Vec<Stack> = Vec::with_capacity(stack_builders.len());
        for builder in &stack_builders {
            let stack = match builder.origin() {
                StackOrigin::Standalone => {
                    let stack = replay(builder, self.clock.as_ref());
                    self.stacks.add(stack).await?
                }
                StackOrigin::Associated => {
                    self.reconcile(builder, &event_builders, &events).await?
                }
            };

            match stacks.iter_mut().find(|existing| existing.id == stack.id) {
                Some(existing) => *existing = stack,
                None => stacks.push(stack),
            }
        }

        info!(
            events = events.len(),
            stacks = stacks.len(),
            "Fixtures built"
        );
        Ok(BuiltFixtures { events, stacks })
    }

    /// Submit events partitioned by scope, returning the processed events
    /// in their original order
    async fn submit(&self, events: Vec<Event>) -> Result<Vec<Event>> {
        let total = events.len();
        let mut processed: Vec<Option<Event>> = vec![None; total];

        for (context, batch) in partition(events)? {
            debug!(
                tenant = %context.tenant_id,
                project = %context.project_id,
                events = batch.len(),
                "Submitting partition to pipeline"
            );

            let (indices, batch): (Vec<usize>, Vec<Event>) = batch.into_iter().unzip();
            let results = self.pipeline.run(batch, Some(context)).await?;
            if results.len() != indices.len() {
                return Err(Error::reconciliation(format!(
                    "pipeline returned {} events for a partition of {}",
                    results.len(),
                    indices.len()
                )));
            }

            for (index, event) in indices.into_iter().zip(results) {
                processed[index] = Some(event);
            }
        }

        Ok(processed.into_iter().flatten().collect())
    }

    /// Replay an associated stack builder onto the stack the pipeline
    /// produced for its event
    ///
    /// The pipeline owns the stack's identity: the seeded sample scope is
    /// skipped and id, tenant and project are kept from the stored stack.
    async fn reconcile(
        &self,
        builder: &StackBuilder,
        event_builders: &[EventBuilder],
        events: &[Event],
    ) -> Result<Stack> {
        let event = event_builders
            .iter()
            .position(|event_builder| event_builder.owns_stack(builder))
            .and_then(|index| events.get(index))
            .ok_or_else(|| Error::reconciliation("associated stack builder has no built event"))?;

        let stack_id = event
            .stack_id
            .clone()
            .ok_or_else(|| Error::reconciliation("pipeline assigned no stack to the event"))?;

        let mut stack = self
            .stacks
            .get_by_id(&stack_id)
            .await?
            .ok_or_else(|| Error::reconciliation(format!("stack {stack_id} not found")))?;

        let id = stack.id.clone();
        let tenant_id = stack.tenant_id.clone();
        let project_id = stack.project_id.clone();

        let mutations: Vec<StackMutation> = builder
            .mutations()
            .into_iter()
            .filter(|mutation| !matches!(mutation, StackMutation::Seed { .. }))
            .collect();
        apply_all(&mut stack, &mutations, self.clock.as_ref());

        if stack.tenant_id != tenant_id || stack.project_id != project_id {
            warn!(
                stack = %id,
                "Stack builder scope differs from the pipeline stack; keeping the pipeline scope"
            );
        }
        stack.id = id;
        stack.tenant_id = tenant_id;
        stack.project_id = project_id;

        debug!(stack = %stack.id, mutations = mutations.len(), "Reconciled stack");
        self.stacks.save(stack).await
    }
}

type Partition = (PipelineContext, Vec<(usize, Event)>);

/// Group events by `(tenant, project)` in first-appearance order, keeping
/// each event's declaration index
fn partition(events: Vec<Event>) -> Result<Vec<Partition>> {
    let mut partitions: Vec<Partition> = Vec::new();

    for (index, event) in events.into_iter().enumerate() {
        let (tenant_id, project_id) = event.scope().ok_or(Error::MissingScope)?;
        let context = PipelineContext::new(tenant_id, project_id);

        match partitions
            .iter_mut()
            .find(|(existing, _)| *existing == context)
        {
            Some((_, batch)) => batch.push((index, event)),
            None => partitions.push((context, vec![(index, event)])),
        }
    }

    Ok(partitions)
}

impl fmt::Debug for FixtureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureSet")
            .field("events", &self.event_count())
            .field("stacks", &self.stack_count())
            .field("settings", &self.settings())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SnoozeHours, MAX_SNOOZE_HOURS};
    use crate::domain::{clock::FixedClock, ProjectId, StackStatus, TenantId};
    use chrono::{DateTime, Duration, Utc};

    fn clock() -> FixedClock {
        FixedClock::at(DateTime::from_timestamp(1_700_000_000, 0).unwrap())
    }

    fn tenant(id: &str) -> TenantId {
        TenantId::try_new(id.to_string()).unwrap()
    }

    fn project(id: &str) -> ProjectId {
        ProjectId::try_new(id.to_string()).unwrap()
    }

    #[test]
    fn factories_register_builders() {
        let set = FixtureSet::in_memory();
        set.add_error_event();
        set.add_log_event();
        set.add_event("usage");
        set.add_stack();

        assert_eq!(set.event_count(), 3);
        assert_eq!(set.stack_count(), 1);
    }

    #[test]
    fn lazily_created_stacks_are_tracked() {
        let set = FixtureSet::in_memory();
        set.add_stack();
        set.add_error_event().mark_fixed(None);

        let builders = set.stack_builders();
        assert_eq!(builders.len(), 2);
        assert!(!builders[0].is_associated());
        assert!(builders[1].is_associated());
    }

    #[test]
    fn materialize_replays_in_declaration_order() {
        let clock = clock();
        let set = FixtureSet::in_memory().with_clock(Arc::new(clock.clone()));
        set.add_error_event().set_message("first");
        set.add_log_event().set_message("second");
        set.add_stack().set_title("standalone");

        let materialized = set.materialize();

        assert_eq!(materialized.events.len(), 2);
        assert_eq!(materialized.events[0].message.as_deref(), Some("first"));
        assert_eq!(materialized.events[1].message.as_deref(), Some("second"));
        assert_eq!(materialized.events[0].date, Some(clock.now()));
        assert_eq!(materialized.stacks[0].title.as_deref(), Some("standalone"));
    }

    #[test]
    fn custom_snooze_period_is_used() {
        let clock = clock();
        let set = FixtureSet::in_memory()
            .with_clock(Arc::new(clock.clone()))
            .with_settings(FixtureSettings {
                default_snooze_hours: SnoozeHours::try_new(2).unwrap(),
            });
        set.add_stack().mark_snoozed(None);

        let stack = &set.materialize().stacks[0];

        assert_eq!(stack.snooze_until, Some(clock.now() + Duration::hours(2)));
    }

    #[test]
    fn longest_configured_snooze_saturates_at_replay() {
        let clock = FixedClock::at(DateTime::<Utc>::MAX_UTC - Duration::days(1));
        let set = FixtureSet::in_memory()
            .with_clock(Arc::new(clock))
            .with_settings(FixtureSettings {
                default_snooze_hours: SnoozeHours::try_new(MAX_SNOOZE_HOURS).unwrap(),
            });
        set.add_stack().mark_snoozed(None);
        set.add_error_event().mark_snoozed(None);

        let materialized = set.materialize();

        for stack in &materialized.stacks {
            assert_eq!(stack.snooze_until, Some(DateTime::<Utc>::MAX_UTC));
        }
        assert_eq!(materialized.stacks.len(), 2);
    }

    #[test]
    fn session_factories_tag_their_types() {
        let set = FixtureSet::in_memory();
        set.add_session_event();
        set.add_session_end_event();
        set.add_heartbeat_event();

        let types: Vec<_> = set
            .materialize()
            .events
            .into_iter()
            .filter_map(|event| event.event_type)
            .collect();

        assert_eq!(
            types,
            vec![
                EventType::session(),
                EventType::session_end(),
                EventType::session_heartbeat(),
            ]
        );
        assert_eq!(types[1].as_str(), "sessionend");
        assert_eq!(types[2].as_str(), "heartbeat");
    }

    #[test]
    fn partitions_group_by_scope_in_first_seen_order() {
        let scoped = |t: &str, p: &str| Event {
            tenant_id: Some(tenant(t)),
            project_id: Some(project(p)),
            ..Event::default()
        };
        let events = vec![
            scoped("t1", "p1"),
            scoped("t2", "p1"),
            scoped("t1", "p1"),
            scoped("t1", "p2"),
        ];

        let partitions = partition(events).unwrap();

        assert_eq!(partitions.len(), 3);
        assert_eq!(partitions[0].0, PipelineContext::new(tenant("t1"), project("p1")));
        let indices: Vec<usize> = partitions[0].1.iter().map(|(index, _)| *index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(partitions[1].0.tenant_id, tenant("t2"));
        assert_eq!(partitions[2].0.project_id, project("p2"));
    }

    #[test]
    fn partition_rejects_unscoped_events() {
        let result = partition(vec![Event::default()]);
        assert!(matches!(result, Err(Error::MissingScope)));
    }

    #[tokio::test]
    async fn build_reconciles_associated_stack() {
        let clock = clock();
        let set = FixtureSet::in_memory().with_clock(Arc::new(clock.clone()));
        let repository = set.stack_repository();
        set.add_error_event()
            .set_message("boom")
            .set_status(StackStatus::Ignored)
            .set_tenant(tenant("acme"));

        let built = set.build().await.unwrap();

        let event = &built.events[0];
        let stack = built.stack_for(event).unwrap();
        assert_eq!(stack.status, StackStatus::Ignored);
        assert_eq!(stack.tenant_id, Some(tenant("acme")));
        assert_eq!(stack.total_occurrences, 1);

        let stored = repository
            .get_by_id(&stack.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&stored, stack);
    }

    #[tokio::test]
    async fn build_with_no_fixtures_is_empty() {
        let built = FixtureSet::in_memory().build().await.unwrap();

        assert!(built.events.is_empty());
        assert!(built.stacks.is_empty());
    }
}
