use chrono::{DateTime, Utc};
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use super::identifiers::{ProjectId, StackId, TenantId};

/// Event type tag, e.g. `error` or `log`
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    pub const ERROR: &'static str = "error";
    pub const LOG: &'static str = "log";
    pub const NOT_FOUND: &'static str = "404";
    pub const FEATURE_USAGE: &'static str = "usage";
    pub const SESSION: &'static str = "session";
    pub const SESSION_END: &'static str = "sessionend";
    pub const SESSION_HEARTBEAT: &'static str = "heartbeat";

    pub fn error() -> Self {
        Self::from(Self::ERROR)
    }

    pub fn log() -> Self {
        Self::from(Self::LOG)
    }

    pub fn not_found() -> Self {
        Self::from(Self::NOT_FOUND)
    }

    pub fn feature_usage() -> Self {
        Self::from(Self::FEATURE_USAGE)
    }

    pub fn session() -> Self {
        Self::from(Self::SESSION)
    }

    pub fn session_end() -> Self {
        Self::from(Self::SESSION_END)
    }

    pub fn session_heartbeat() -> Self {
        Self::from(Self::SESSION_HEARTBEAT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_error(&self) -> bool {
        self.0 == Self::ERROR
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single recorded occurrence belonging to a tenant/project
///
/// `Event::default()` is the empty instance fixture replay starts from.
/// `stack_id` is only ever assigned by the processing pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub tenant_id: Option<TenantId>,
    pub project_id: Option<ProjectId>,
    pub event_type: Option<EventType>,
    pub date: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub stack_id: Option<StackId>,
}

impl Event {
    /// The `(tenant, project)` pair owning this event, when both are set
    pub fn scope(&self) -> Option<(TenantId, ProjectId)> {
        match (&self.tenant_id, &self.project_id) {
            (Some(tenant), Some(project)) => Some((tenant.clone(), project.clone())),
            _ => None,
        }
    }
}
