//! Repository tests against a migrated `PostgreSQL` database.
//!
//! These tests require `FB_TEST_DATABASE_URL` pointing at a scratch
//! database. Every test uses unique names, so they can share one database
//! and run in parallel.

#![allow(clippy::indexing_slicing)]

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use finboard_core::{Email, EntryType, Month, Role, RoleSet, UnitId, UserId};
use finboard_dashboard::db::{
    MasterCodeRepository, PasswordResetRepository, RepositoryError, UNKNOWN_UNIT,
    UnitDataRepository, UnitRepository, UserRepository,
};
use finboard_dashboard::models::{MasterCodeInput, NewUnitDataItem, UnitDataFilter, UserProfile};
use finboard_dashboard::services::AuthError;
use finboard_dashboard::services::auth::{AuthService, hash_token};
use finboard_integration_tests::{test_pool, unique};
use sqlx::PgPool;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap_or_else(|e| panic!("bad decimal {s}: {e}"))
}

fn profile(name: &str) -> UserProfile {
    UserProfile {
        name: name.to_owned(),
        email: Email::parse(&format!("{}@finboard.test", unique("user")))
            .unwrap_or_else(|e| panic!("bad email: {e}")),
        roles: RoleSet::single(Role::Manager),
    }
}

async fn create_unit(pool: &PgPool, prefix: &str) -> UnitId {
    UnitRepository::new(pool)
        .create(&unique(prefix))
        .await
        .unwrap_or_else(|e| panic!("create unit failed: {e}"))
        .id
}

async fn create_user(pool: &PgPool, units: &[UnitId]) -> (UserId, UserProfile) {
    let profile = profile("Rina");
    let id = UserRepository::new(pool)
        .create(&profile, None, units)
        .await
        .unwrap_or_else(|e| panic!("create user failed: {e}"));
    (id, profile)
}

fn master_code(code: &str, category: &str) -> MasterCodeInput {
    MasterCodeInput {
        account_code: code.to_owned(),
        category: category.to_owned(),
        account_name: format!("Account {code}"),
        description: None,
    }
}

fn item(code: &str, month: u8, value: &str, entry_type: EntryType) -> NewUnitDataItem {
    NewUnitDataItem {
        account_code: code.to_owned(),
        month: Month::new(month).unwrap_or_else(|e| panic!("bad month: {e}")),
        category: "Salaries".to_owned(),
        area: Some("Jakarta".to_owned()),
        business_line: None,
        value: dec(value),
        entry_type,
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_unit_names_are_unique_ignoring_case() {
    let pool = test_pool().await;
    let repo = UnitRepository::new(&pool);
    let name = unique("North");

    let unit = repo.create(&name).await.unwrap_or_else(|e| panic!("{e}"));
    assert!(matches!(
        repo.create(&name.to_lowercase()).await,
        Err(RepositoryError::Conflict(_))
    ));

    let other = repo
        .create(&unique("South"))
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert!(matches!(
        repo.rename(other.id, &name.to_uppercase()).await,
        Err(RepositoryError::Conflict(_))
    ));

    let renamed = repo
        .rename(unit.id, &name.to_uppercase())
        .await
        .unwrap_or_else(|e| panic!("renaming to own name in other case failed: {e}"));
    assert_eq!(renamed.name, name.to_uppercase());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_unit_with_assigned_users_cannot_be_deleted() {
    let pool = test_pool().await;
    let unit_id = create_unit(&pool, "Assigned").await;
    let (user_id, profile) = create_user(&pool, &[unit_id]).await;

    let units = UnitRepository::new(&pool);
    assert!(matches!(
        units.delete(unit_id).await,
        Err(RepositoryError::Conflict(_))
    ));
    assert!(units.get_by_id(unit_id).await.unwrap_or_else(|e| panic!("{e}")).is_some());

    UserRepository::new(&pool)
        .update(user_id, &profile, &[], None)
        .await
        .unwrap_or_else(|e| panic!("unassign failed: {e}"));
    units
        .delete(unit_id)
        .await
        .unwrap_or_else(|e| panic!("delete after unassign failed: {e}"));
    assert!(units.get_by_id(unit_id).await.unwrap_or_else(|e| panic!("{e}")).is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_user_update_is_all_or_nothing() {
    let pool = test_pool().await;
    let kept = create_unit(&pool, "Kept").await;
    let (user_id, original) = create_user(&pool, &[kept]).await;

    let gone = create_unit(&pool, "Gone").await;
    UnitRepository::new(&pool)
        .delete(gone)
        .await
        .unwrap_or_else(|e| panic!("{e}"));

    let mut changed = profile("Renamed");
    changed.roles = RoleSet::single(Role::Supervisor);
    let users = UserRepository::new(&pool);
    match users.update(user_id, &changed, &[kept, gone], Some("new-hash")).await {
        Err(RepositoryError::Conflict(reason)) => assert_eq!(reason, UNKNOWN_UNIT),
        other => panic!("expected unknown unit conflict, got {other:?}"),
    }

    let stored = users
        .get_by_id(user_id)
        .await
        .unwrap_or_else(|e| panic!("{e}"))
        .unwrap_or_else(|| panic!("user disappeared"));
    assert_eq!(stored.name, original.name);
    assert_eq!(stored.email, original.email);
    assert_eq!(stored.unit_ids, vec![kept]);
    let with_password = users
        .get_by_email(&original.email)
        .await
        .unwrap_or_else(|e| panic!("{e}"))
        .unwrap_or_else(|| panic!("user disappeared"));
    assert_eq!(with_password.password_hash, None);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_master_code_create_update_and_upsert() {
    let pool = test_pool().await;
    let repo = MasterCodeRepository::new(&pool);
    let code = unique("51");

    let created = repo
        .create(&master_code(&code, "Salaries"))
        .await
        .unwrap_or_else(|e| panic!("create failed: {e}"));
    assert!(matches!(
        repo.create(&master_code(&code, "Other")).await,
        Err(RepositoryError::Conflict(_))
    ));

    let mut edited = master_code(&code, "Payroll");
    edited.description = Some("Monthly payroll".to_owned());
    let updated = repo
        .update(created.id, &edited)
        .await
        .unwrap_or_else(|e| panic!("update failed: {e}"));
    assert_eq!(updated.category, "Payroll");
    assert_eq!(updated.description.as_deref(), Some("Monthly payroll"));

    let second = unique("52");
    let affected = repo
        .upsert_many(&[
            master_code(&code, "Wages"),
            master_code(&second, "Utilities"),
            master_code(&second, "Electricity"),
        ])
        .await
        .unwrap_or_else(|e| panic!("upsert failed: {e}"));
    assert_eq!(affected, 2);

    let lookup = repo.category_lookup().await.unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(lookup.get(&code).map(String::as_str), Some("Wages"));
    assert_eq!(lookup.get(&second).map(String::as_str), Some("Electricity"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_unit_data_insert_then_list() {
    let pool = test_pool().await;
    let unit_id = create_unit(&pool, "Data").await;
    let repo = UnitDataRepository::new(&pool);

    let (batch, inserted) = repo
        .insert_many(
            unit_id,
            2024,
            &[
                item("51001", 1, "1250.50", EntryType::Debit),
                item("41001", 1, "2000", EntryType::Credit),
                item("51001", 2, "0.05", EntryType::Debit),
            ],
        )
        .await
        .unwrap_or_else(|e| panic!("insert failed: {e}"));
    assert_eq!(inserted, 3);

    let all = repo
        .list(&UnitDataFilter {
            unit_ids: vec![unit_id],
            year: 2024,
            ..UnitDataFilter::default()
        })
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|i| i.import_batch == Some(batch)));
    let total: Decimal = all.iter().map(|i| i.value).sum();
    assert_eq!(total, dec("3250.55"));

    let february = repo
        .list(&UnitDataFilter {
            unit_ids: vec![unit_id],
            year: 2024,
            month: Some(Month::new(2).unwrap_or_else(|e| panic!("{e}"))),
            ..UnitDataFilter::default()
        })
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(february.len(), 1);
    assert_eq!(february[0].value, dec("0.05"));
    assert_eq!(february[0].area.as_deref(), Some("Jakarta"));

    let other_year = repo
        .list_for_units(&[unit_id], 2023)
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert!(other_year.is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_reset_token_can_be_spent_once() {
    let pool = test_pool().await;
    let (user_id, _) = create_user(&pool, &[]).await;
    let token = unique("token");
    PasswordResetRepository::new(&pool)
        .create(user_id, &hash_token(&token), Utc::now() + Duration::hours(1))
        .await
        .unwrap_or_else(|e| panic!("{e}"));

    let first_auth = AuthService::new(&pool, None, "http://localhost:3002");
    let second_auth = AuthService::new(&pool, None, "http://localhost:3002");
    let (first, second) = tokio::join!(
        first_auth.reset_password(&token, "first-password", "first-password"),
        second_auth.reset_password(&token, "second-password", "second-password"),
    );

    let succeeded = [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(succeeded, 1, "first: {first:?}, second: {second:?}");
    assert!(
        matches!(first, Err(AuthError::InvalidResetToken))
            || matches!(second, Err(AuthError::InvalidResetToken))
    );
}
