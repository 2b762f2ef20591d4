//! Member management through [`RosterCore`] against the local backend.

mod helpers;

use std::sync::Arc;

use helpers::{complete_draft, seeded_backend, signed_in_core, PASSWORD, NATIONAL_EMAIL};
use roster_core::backend::LocalBackend;
use roster_core::member::{Gender, MemberDraft, MemberId, SalaryType};
use roster_core::session::MemoryCredentialStore;
use roster_core::{ErrorKind, MemberError, RosterCore};

#[tokio::test]
async fn created_members_are_listed_by_name() {
    let core = signed_in_core().await;

    let mut zahra = complete_draft();
    zahra.first_name = Some("Zahra".to_string());
    zahra.last_name = Some("Berrada".to_string());
    zahra.gender = Some("Female".to_string());
    zahra.national_number = Some("MOR0007".to_string());

    core.create_member(&complete_draft()).await.unwrap();
    core.create_member(&zahra).await.unwrap();

    let names: Vec<String> = core
        .list_members()
        .await
        .unwrap()
        .iter()
        .map(|m| m.full_name())
        .collect();
    assert_eq!(names, vec!["Youssef Alaoui", "Zahra Berrada"]);
}

#[tokio::test]
async fn created_member_keeps_typed_fields() {
    let core = signed_in_core().await;

    let record = core.create_member(&complete_draft()).await.unwrap();

    assert_eq!(record.fields.gender, Gender::Male);
    assert_eq!(record.fields.salary_type, SalaryType::Variable);
    assert_eq!(record.fields.national_number, "MOR0042");
    assert!(record.fields.is_mousi);
}

#[tokio::test]
async fn edit_form_round_trip() {
    let core = signed_in_core().await;
    let record = core.create_member(&complete_draft()).await.unwrap();

    // The edit form starts from the stored record.
    let mut form = MemberDraft::from(&record);
    form.family_situation = Some("Married".to_string());
    form.children_count = Some(1.into());

    let updated = core.update_member(&record.id, &form).await.unwrap();
    let fetched = core.get_member(&record.id).await.unwrap().unwrap();

    assert_eq!(updated, fetched);
    assert_eq!(fetched.fields.children_count, 1);
    assert_eq!(fetched.id, record.id);
}

#[tokio::test]
async fn invalid_edit_leaves_record_untouched() {
    let core = signed_in_core().await;
    let record = core.create_member(&complete_draft()).await.unwrap();

    let edit = MemberDraft {
        gender: Some("male".to_string()),
        salary_mad: Some((-10.0).into()),
        ..MemberDraft::default()
    };
    let err = core.update_member(&record.id, &edit).await.unwrap_err();

    let MemberError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert_eq!(errors.fields(), vec!["gender", "salary_mad"]);
    assert_eq!(
        core.get_member(&record.id).await.unwrap().unwrap(),
        record
    );
}

#[tokio::test]
async fn empty_draft_lists_every_field() {
    let core = signed_in_core().await;

    let err = core
        .create_member(&MemberDraft::default())
        .await
        .unwrap_err();

    let MemberError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert_eq!(errors.len(), 16);
    assert_eq!(errors.fields()[0], "first_name");
    assert_eq!(errors.fields()[15], "jamaat_role");
}

#[tokio::test]
async fn members_persist_in_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("members.db");

    let id = {
        let backend = Arc::new(LocalBackend::open(&path).unwrap());
        backend
            .add_account(NATIONAL_EMAIL, PASSWORD, roster_core::session::Role::National, None)
            .unwrap();
        let core = RosterCore::with_backend(backend, Arc::new(MemoryCredentialStore::new()));
        core.session().login(NATIONAL_EMAIL, PASSWORD).await.unwrap();
        core.create_member(&complete_draft()).await.unwrap().id
    };

    let backend = Arc::new(LocalBackend::open(&path).unwrap());
    backend
        .add_account(NATIONAL_EMAIL, PASSWORD, roster_core::session::Role::National, None)
        .unwrap();
    let core = RosterCore::with_backend(backend, Arc::new(MemoryCredentialStore::new()));
    core.session().login(NATIONAL_EMAIL, PASSWORD).await.unwrap();

    let record = core.get_member(&id).await.unwrap().unwrap();
    assert_eq!(record.full_name(), "Youssef Alaoui");
}

#[tokio::test]
async fn signed_out_core_refuses_member_calls() {
    let core = RosterCore::with_backend(seeded_backend(), Arc::new(MemoryCredentialStore::new()));

    let err = core.get_member(&MemberId::new("1")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
}
