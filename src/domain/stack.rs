use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::{ProjectId, StackId, TenantId};

/// Lifecycle status of a stack
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackStatus {
    #[default]
    Open,
    Fixed,
    Regressed,
    Snoozed,
    Ignored,
}

/// A deduplicated group of occurrences of the same underlying issue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    pub id: StackId,
    pub tenant_id: Option<TenantId>,
    pub project_id: Option<ProjectId>,
    pub title: Option<String>,
    pub signature_hash: Option<String>,
    pub status: StackStatus,
    pub date_fixed: Option<DateTime<Utc>>,
    pub fixed_in_version: Option<String>,
    pub snooze_until: Option<DateTime<Utc>>,
    pub total_occurrences: u64,
    pub first_occurrence: Option<DateTime<Utc>>,
    pub last_occurrence: Option<DateTime<Utc>>,
}

impl Stack {
    /// Record one more occurrence at `at`
    pub fn record_occurrence(&mut self, at: DateTime<Utc>) {
        self.total_occurrences += 1;
        self.first_occurrence = Some(self.first_occurrence.map_or(at, |first| first.min(at)));
        self.last_occurrence = Some(self.last_occurrence.map_or(at, |last| last.max(at)));
    }

    pub fn is_fixed(&self) -> bool {
        self.date_fixed.is_some()
    }
}
