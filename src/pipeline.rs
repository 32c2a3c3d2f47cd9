//! Collaborators the build phase hands finished fixtures to
//!
//! The processing pipeline turns events into persisted stacks; the stack
//! repository is where those stacks live. Both are owned by the host test
//! suite; [`crate::testing`] provides in-memory versions.

use async_trait::async_trait;

use crate::{
    domain::{Event, ProjectId, Stack, StackId, TenantId},
    error::Result,
};

/// Tenant/project scope a batch of events is submitted under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineContext {
    pub tenant_id: TenantId,
    pub project_id: ProjectId,
}

impl PipelineContext {
    pub fn new(tenant_id: TenantId, project_id: ProjectId) -> Self {
        Self {
            tenant_id,
            project_id,
        }
    }
}

/// Event processing pipeline
#[async_trait]
pub trait EventPipeline: Send + Sync {
    /// Ingest a batch of events
    ///
    /// Returns the processed events in submission order, each carrying the
    /// `stack_id` of the stack it was grouped into.
    async fn run(&self, events: Vec<Event>, context: Option<PipelineContext>) -> Result<Vec<Event>>;
}

/// Stack persistence
#[async_trait]
pub trait StackRepository: Send + Sync {
    async fn get_by_id(&self, id: &StackId) -> Result<Option<Stack>>;

    /// Persist a new stack
    async fn add(&self, stack: Stack) -> Result<Stack>;

    /// Overwrite an existing stack
    async fn save(&self, stack: Stack) -> Result<Stack>;
}
