//! Sample identity used as the default scope for every fixture
//!
//! Builders seed these before any caller mutation, so tests that do not care
//! about ownership never have to assign a tenant or project.

pub const TEST_TENANT_ID: &str = "537650f3b77efe23a47914f3";
pub const TEST_PROJECT_ID: &str = "537650f3b77efe23a47914f4";
