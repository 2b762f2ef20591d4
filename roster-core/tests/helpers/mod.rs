//! Shared fixtures for the integration tests.
//!
//! Every test gets its own in-memory [`LocalBackend`] and credential store,
//! so nothing leaks between tests.

#![allow(dead_code)]

use std::sync::Arc;

use roster_core::backend::LocalBackend;
use roster_core::member::MemberDraft;
use roster_core::session::{MemoryCredentialStore, Role, SessionManager};
use roster_core::RosterCore;

pub const NATIONAL_EMAIL: &str = "national@example.com";
pub const REGIONAL_EMAIL: &str = "regional@example.com";
pub const PASSWORD: &str = "correct horse battery";

/// Creates a backend with one national and one regional account.
pub fn seeded_backend() -> Arc<LocalBackend> {
    let backend = Arc::new(LocalBackend::in_memory().unwrap());
    backend
        .add_account(NATIONAL_EMAIL, PASSWORD, Role::National, None)
        .unwrap();
    backend
        .add_account(REGIONAL_EMAIL, PASSWORD, Role::Regional, Some("3"))
        .unwrap();
    backend
}

/// Creates a session manager over `backend` and `store`.
pub fn manager(
    backend: &Arc<LocalBackend>,
    store: &Arc<MemoryCredentialStore>,
) -> SessionManager {
    SessionManager::new(backend.clone(), store.clone())
}

/// Creates a core signed in as the regional representative.
pub async fn signed_in_core() -> RosterCore {
    let core = RosterCore::with_backend(seeded_backend(), Arc::new(MemoryCredentialStore::new()));
    core.session().login(REGIONAL_EMAIL, PASSWORD).await.unwrap();
    core
}

/// A draft that passes every rule.
pub fn complete_draft() -> MemberDraft {
    MemberDraft {
        first_name: Some("Youssef".to_string()),
        last_name: Some("Alaoui".to_string()),
        date_of_birth: Some("1985-09-30".to_string()),
        gender: Some("Male".to_string()),
        national_number: Some("MOR0042".to_string()),
        jamaat: Some("Tanger".to_string()),
        family_situation: Some("Single".to_string()),
        children_count: Some(0.into()),
        children_over_15_count: Some(0.into()),
        spouse_is_ahmadi: Some(false.into()),
        salary_mad: Some(4200.5.into()),
        salary_type: Some("Variable".to_string()),
        monthly_tchanda: Some(250.0.into()),
        is_mousi: Some(true.into()),
        is_active: Some(true.into()),
        jamaat_role: Some("Secretary".to_string()),
    }
}
