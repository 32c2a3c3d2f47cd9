//! In-memory collaborators for building fixtures without a real backend
//!
//! [`StackingPipeline`] stands in for the event processing pipeline: it groups
//! events by signature into stacks stored in any [`StackRepository`].
//! [`InMemoryStackRepository`] keeps those stacks in a map.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::{
    domain::{Event, Stack, StackId},
    error::{Error, Result},
    pipeline::{EventPipeline, PipelineContext, StackRepository},
};

/// Stack repository backed by a map
#[derive(Debug, Default)]
pub struct InMemoryStackRepository {
    stacks: RwLock<HashMap<StackId, Stack>>,
}

impl InMemoryStackRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.stacks.read().await.len()
    }

    pub async fn all(&self) -> Vec<Stack> {
        self.stacks.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl StackRepository for InMemoryStackRepository {
    async fn get_by_id(&self, id: &StackId) -> Result<Option<Stack>> {
        Ok(self.stacks.read().await.get(id).cloned())
    }

    async fn add(&self, stack: Stack) -> Result<Stack> {
        let mut stacks = self.stacks.write().await;
        if stacks.contains_key(&stack.id) {
            return Err(Error::repository(format!("stack {} already exists", stack.id)));
        }
        stacks.insert(stack.id.clone(), stack.clone());
        Ok(stack)
    }

    async fn save(&self, stack: Stack) -> Result<Stack> {
        let mut stacks = self.stacks.write().await;
        match stacks.get_mut(&stack.id) {
            Some(existing) => {
                *existing = stack.clone();
                Ok(stack)
            }
            None => Err(Error::repository(format!("stack {} does not exist", stack.id))),
        }
    }
}

/// Signature identifying the stack an event belongs to
///
/// Hex SHA-256 over tenant, project, type and message.
pub fn event_signature(event: &Event) -> String {
    let mut hasher = Sha256::new();
    for part in [
        event.tenant_id.as_ref().map(|id| id.as_ref()),
        event.project_id.as_ref().map(|id| id.as_ref()),
        event.event_type.as_ref().map(|t| t.as_str()),
        event.message.as_deref(),
    ] {
        hasher.update(part.unwrap_or_default().as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Pipeline that stacks events by signature
///
/// The first event with a new signature creates a stack titled after its
/// message (or its type); later events with that signature are added to it.
/// Every submitted context is recorded.
pub struct StackingPipeline {
    stacks: Arc<dyn StackRepository>,
    signatures: Mutex<HashMap<String, StackId>>,
    contexts: Mutex<Vec<Option<PipelineContext>>>,
}

impl StackingPipeline {
    pub fn new(stacks: Arc<dyn StackRepository>) -> Self {
        Self {
            stacks,
            signatures: Mutex::new(HashMap::new()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    /// Contexts passed to [`EventPipeline::run`], in call order
    pub async fn contexts(&self) -> Vec<Option<PipelineContext>> {
        self.contexts.lock().await.clone()
    }

    async fn stack_event(&self, mut event: Event) -> Result<Event> {
        let signature = event_signature(&event);
        let occurred_at = event.date.unwrap_or_default();
        let mut signatures = self.signatures.lock().await;

        let existing = match signatures.get(&signature) {
            Some(id) => self.stacks.get_by_id(id).await?,
            None => None,
        };

        let stack = match existing {
            Some(mut stack) => {
                stack.record_occurrence(occurred_at);
                self.stacks.save(stack).await?
            }
            None => {
                let mut stack = Stack {
                    tenant_id: event.tenant_id.clone(),
                    project_id: event.project_id.clone(),
                    title: event
                        .message
                        .clone()
                        .or_else(|| event.event_type.as_ref().map(ToString::to_string)),
                    signature_hash: Some(signature.clone()),
                    ..Stack::default()
                };
                stack.record_occurrence(occurred_at);
                let stack = self.stacks.add(stack).await?;
                debug!(stack = %stack.id, "Created stack for new signature");
                signatures.insert(signature, stack.id.clone());
                stack
            }
        };

        event.stack_id = Some(stack.id);
        Ok(event)
    }
}

#[async_trait]
impl EventPipeline for StackingPipeline {
    async fn run(&self, events: Vec<Event>, context: Option<PipelineContext>) -> Result<Vec<Event>> {
        self.contexts.lock().await.push(context);

        let mut processed = Vec::with_capacity(events.len());
        for event in events {
            processed.push(self.stack_event(event).await?);
        }
        Ok(processed)
    }
}
