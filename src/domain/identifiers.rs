//! Identifiers for the tenant/project scope and for stacks
//!
//! Tenant and project ids are opaque strings assigned by the host system;
//! stack ids are UUID v7 newtypes, time-ordered like the rest of our entity ids.

use nutype::nutype;
use uuid::Uuid;

use super::sample::{TEST_PROJECT_ID, TEST_TENANT_ID};

/// Identifier of the tenant (organization) owning events and stacks
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        Display,
        AsRef
    )
)]
pub struct TenantId(String);

impl TenantId {
    /// The designated sample tenant
    pub fn sample() -> Self {
        Self::try_new(TEST_TENANT_ID.to_string()).expect("Sample tenant id is always valid")
    }

    pub fn is_sample(&self) -> bool {
        self.as_ref() == TEST_TENANT_ID
    }
}

/// Identifier of the project owning events and stacks
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        Display,
        AsRef
    )
)]
pub struct ProjectId(String);

impl ProjectId {
    /// The designated sample project
    pub fn sample() -> Self {
        Self::try_new(TEST_PROJECT_ID.to_string()).expect("Sample project id is always valid")
    }

    pub fn is_sample(&self) -> bool {
        self.as_ref() == TEST_PROJECT_ID
    }
}

/// Unique identifier for a stack
#[nutype(derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRef
))]
pub struct StackId(Uuid);

impl StackId {
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

impl Default for StackId {
    fn default() -> Self {
        Self::generate()
    }
}
