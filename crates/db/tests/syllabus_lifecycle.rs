//! Integration tests for the syllabus upload lifecycle.
//!
//! Exercises the repository layer against a real database:
//! - Create / sync / verify state transitions
//! - Visibility of unconfirmed rows
//! - Owner-gated update and delete
//! - Listing filters and pagination
//! - Constraint violations surfacing as `Malformed`

mod common;

use assert_matches::assert_matches;
use sqlx::PgPool;
use syllabi_core::pagination::Pagination;
use syllabi_core::types::DbId;
use syllabi_db::error::StoreError;
use syllabi_db::models::syllabus::{SyllabusFilters, UpdateSyllabus};
use syllabi_db::repositories::{SyllabusRepo, SyllabusViewRepo};

use common::{new_syllabus, seed_course, seed_syllabus, seed_user, syllabus_exists};

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_starts_unconfirmed(pool: PgPool) {
    let (owner, course, id) = seed_syllabus(&pool).await;

    let syllabus = SyllabusRepo::get_visible(&pool, owner, id).await.unwrap();
    assert_eq!(syllabus.user_id, owner);
    assert_eq!(syllabus.course_id, course);
    assert_eq!(syllabus.semester, "Fall");
    assert!(syllabus.date_synced.is_none());
    assert!(!syllabus.is_confirmed());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_unknown_course_is_malformed(pool: PgPool) {
    let owner = seed_user(&pool, "Ada Owner").await;

    let result = SyllabusRepo::create(&pool, &new_syllabus(owner, DbId::new_v4())).await;
    assert_matches!(result, Err(StoreError::Malformed(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_rejects_out_of_domain_values(pool: PgPool) {
    let owner = seed_user(&pool, "Ada Owner").await;
    let course = seed_course(&pool, "CPS 109", "Computer Science I").await;

    let mut input = new_syllabus(owner, course);
    input.semester = "Autumn".into();
    assert_matches!(
        SyllabusRepo::create(&pool, &input).await,
        Err(StoreError::Malformed(c)) if c == "ck_syllabi_semester"
    );

    let mut input = new_syllabus(owner, course);
    input.file_size = 0;
    assert_matches!(
        SyllabusRepo::create(&pool, &input).await,
        Err(StoreError::Malformed(_))
    );
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sync_is_idempotent(pool: PgPool) {
    let (owner, _, id) = seed_syllabus(&pool).await;

    let first = SyllabusRepo::sync(&pool, id).await.unwrap();
    let second = SyllabusRepo::sync(&pool, id).await.unwrap();
    assert_eq!(first, second, "re-sync must keep the first confirmation time");

    let syllabus = SyllabusRepo::get_visible(&pool, owner, id).await.unwrap();
    assert_eq!(syllabus.date_synced, Some(first));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sync_unknown_id_is_not_found(pool: PgPool) {
    let result = SyllabusRepo::sync(&pool, DbId::new_v4()).await;
    assert_matches!(result, Err(StoreError::NotFound { entity: "syllabus", .. }));
}

// ---------------------------------------------------------------------------
// Verify
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_verify_deletes_unconfirmed_upload(pool: PgPool) {
    let (_, _, id) = seed_syllabus(&pool).await;

    let outcome = SyllabusRepo::verify(&pool, id).await.unwrap();
    assert!(!outcome.was_confirmed);
    assert!(!outcome.newly_verified);
    assert_eq!(outcome.owner_email, "ada.owner@example.com");
    assert_eq!(outcome.course_label(), "CPS 109 - Computer Science I");
    assert!(!syllabus_exists(&pool, id).await);

    // A second verification finds nothing left to decide.
    assert_matches!(
        SyllabusRepo::verify(&pool, id).await,
        Err(StoreError::NotFound { .. })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_verify_keeps_confirmed_upload(pool: PgPool) {
    let (owner, _, id) = seed_syllabus(&pool).await;
    SyllabusRepo::sync(&pool, id).await.unwrap();

    let outcome = SyllabusRepo::verify(&pool, id).await.unwrap();
    assert!(outcome.was_confirmed);
    assert!(outcome.newly_verified);
    assert_eq!(outcome.owner_name, "Ada Owner");

    // A redelivered job keeps the row but is not a new verification.
    let again = SyllabusRepo::verify(&pool, id).await.unwrap();
    assert!(again.was_confirmed);
    assert!(!again.newly_verified);

    let syllabus = SyllabusRepo::get_visible(&pool, owner, id).await.unwrap();
    assert!(syllabus.is_confirmed());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sync_after_expiry_is_not_found(pool: PgPool) {
    let (_, _, id) = seed_syllabus(&pool).await;
    SyllabusRepo::verify(&pool, id).await.unwrap();

    assert_matches!(
        SyllabusRepo::sync(&pool, id).await,
        Err(StoreError::NotFound { .. })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_verify_cascades_views_and_reactions(pool: PgPool) {
    let (owner, _, id) = seed_syllabus(&pool).await;
    SyllabusRepo::get_visible(&pool, owner, id).await.unwrap();
    syllabi_db::repositories::ReactionRepo::set(&pool, owner, id, false)
        .await
        .unwrap();

    SyllabusRepo::verify(&pool, id).await.unwrap();

    assert_eq!(SyllabusViewRepo::count_for_syllabus(&pool, id).await.unwrap(), 0);
    let reactions: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM syllabus_reactions WHERE syllabus_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(reactions.0, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sync_racing_verify_never_splits(pool: PgPool) {
    let owner = seed_user(&pool, "Ada Owner").await;
    let course = seed_course(&pool, "CPS 109", "Computer Science I").await;

    let mut ids = Vec::new();
    for _ in 0..20 {
        ids.push(SyllabusRepo::create(&pool, &new_syllabus(owner, course)).await.unwrap());
    }

    let mut handles = Vec::new();
    for &id in &ids {
        let sync_pool = pool.clone();
        let verify_pool = pool.clone();
        let sync = tokio::spawn(async move { SyllabusRepo::sync(&sync_pool, id).await });
        let verify = tokio::spawn(async move { SyllabusRepo::verify(&verify_pool, id).await });
        handles.push((id, sync, verify));
    }

    for (id, sync, verify) in handles {
        let synced = sync.await.unwrap();
        let outcome = verify.await.unwrap().unwrap();
        let exists = syllabus_exists(&pool, id).await;

        match (synced, outcome.was_confirmed) {
            // Sync landed first: the row is kept.
            (Ok(_), true) => assert!(exists, "confirmed syllabus {id} was deleted"),
            // Verify deleted first: the late sync finds nothing.
            (Err(StoreError::NotFound { .. }), false) => {
                assert!(!exists, "abandoned syllabus {id} was kept")
            }
            (synced, was_confirmed) => {
                panic!("syllabus {id}: sync {synced:?} with was_confirmed={was_confirmed}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Expiry sweep
// ---------------------------------------------------------------------------

async fn backdate(pool: &PgPool, id: DbId, hours: i32) {
    sqlx::query("UPDATE syllabi SET date_added = NOW() - make_interval(hours => $2) WHERE id = $1")
        .bind(id)
        .bind(hours)
        .execute(pool)
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expire_unconfirmed_removes_only_stale_uploads(pool: PgPool) {
    let (owner, course, stale) = seed_syllabus(&pool).await;
    let fresh = SyllabusRepo::create(&pool, &new_syllabus(owner, course)).await.unwrap();
    let confirmed = SyllabusRepo::create(&pool, &new_syllabus(owner, course)).await.unwrap();
    SyllabusRepo::sync(&pool, confirmed).await.unwrap();
    backdate(&pool, stale, 2).await;
    backdate(&pool, confirmed, 2).await;

    let cutoff = chrono::Utc::now() - chrono::Duration::hours(1);
    let expired = SyllabusRepo::expire_unconfirmed(&pool, cutoff).await.unwrap();

    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].syllabus_id, stale);
    assert!(!expired[0].was_confirmed);
    assert_eq!(expired[0].owner_email, "ada.owner@example.com");
    assert_eq!(expired[0].course_label(), "CPS 109 - Computer Science I");

    assert!(!syllabus_exists(&pool, stale).await);
    assert!(syllabus_exists(&pool, fresh).await);
    assert!(syllabus_exists(&pool, confirmed).await);

    // Nothing left to expire.
    let again = SyllabusRepo::expire_unconfirmed(&pool, cutoff).await.unwrap();
    assert!(again.is_empty());
}

// ---------------------------------------------------------------------------
// Visibility and views
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unconfirmed_is_private_to_owner(pool: PgPool) {
    let (_, _, id) = seed_syllabus(&pool).await;
    let stranger = seed_user(&pool, "Bob Stranger").await;

    assert_matches!(
        SyllabusRepo::get_visible(&pool, stranger, id).await,
        Err(StoreError::NotFound { .. })
    );
    let listed = SyllabusRepo::list(&pool, stranger, &SyllabusFilters::default(), Pagination::default())
        .await
        .unwrap();
    assert!(listed.is_empty());

    SyllabusRepo::sync(&pool, id).await.unwrap();

    let syllabus = SyllabusRepo::get_visible(&pool, stranger, id).await.unwrap();
    assert_eq!(syllabus.id, id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_hidden_read_records_no_view(pool: PgPool) {
    let (_, _, id) = seed_syllabus(&pool).await;
    let stranger = seed_user(&pool, "Bob Stranger").await;

    let _ = SyllabusRepo::get_visible(&pool, stranger, id).await;
    assert_eq!(SyllabusViewRepo::count_for_syllabus(&pool, id).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_views_are_deduplicated_per_user(pool: PgPool) {
    let (owner, _, id) = seed_syllabus(&pool).await;
    SyllabusRepo::sync(&pool, id).await.unwrap();
    let reader = seed_user(&pool, "Cam Reader").await;

    for _ in 0..3 {
        SyllabusRepo::get_visible(&pool, reader, id).await.unwrap();
    }
    assert_eq!(SyllabusViewRepo::count_for_syllabus(&pool, id).await.unwrap(), 1);

    SyllabusRepo::get_visible(&pool, owner, id).await.unwrap();
    assert_eq!(SyllabusViewRepo::count_for_syllabus(&pool, id).await.unwrap(), 2);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_and_paginates(pool: PgPool) {
    let owner = seed_user(&pool, "Ada Owner").await;
    let cps = seed_course(&pool, "CPS 109", "Computer Science I").await;
    let mth = seed_course(&pool, "MTH 110", "Discrete Mathematics").await;

    for course in [cps, cps, cps, mth] {
        let id = SyllabusRepo::create(&pool, &new_syllabus(owner, course))
            .await
            .unwrap();
        SyllabusRepo::sync(&pool, id).await.unwrap();
    }
    let reader = seed_user(&pool, "Cam Reader").await;

    let by_course = SyllabusFilters {
        course_id: Some(cps),
        ..Default::default()
    };
    let all = SyllabusRepo::list(&pool, reader, &by_course, Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|s| s.course_id == cps));

    let first_page = SyllabusRepo::list(&pool, reader, &by_course, Pagination { page: 1, size: 2 })
        .await
        .unwrap();
    let second_page =
        SyllabusRepo::list(&pool, reader, &by_course, Pagination { page: 2, size: 2 })
            .await
            .unwrap();
    assert_eq!(first_page.len(), 2);
    assert_eq!(second_page.len(), 1);
    assert!(!first_page.iter().any(|s| s.id == second_page[0].id));

    let winter = SyllabusFilters {
        semester: Some("Winter".into()),
        ..Default::default()
    };
    let none = SyllabusRepo::list(&pool, reader, &winter, Pagination::default())
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_includes_own_unconfirmed(pool: PgPool) {
    let (owner, _, id) = seed_syllabus(&pool).await;

    let listed = SyllabusRepo::list(&pool, owner, &SyllabusFilters::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}

// ---------------------------------------------------------------------------
// Owner-gated mutations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_by_owner_changes_fields(pool: PgPool) {
    let (owner, _, id) = seed_syllabus(&pool).await;

    let input = UpdateSyllabus {
        year: Some(2025),
        semester: None,
    };
    SyllabusRepo::update(&pool, owner, id, &input).await.unwrap();

    let syllabus = SyllabusRepo::get_visible(&pool, owner, id).await.unwrap();
    assert_eq!(syllabus.year, 2025);
    assert_eq!(syllabus.semester, "Fall", "absent field must be left unchanged");
    assert!(syllabus.date_modified >= syllabus.date_added);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_by_non_owner_is_forbidden_and_rolled_back(pool: PgPool) {
    let (owner, _, id) = seed_syllabus(&pool).await;
    let stranger = seed_user(&pool, "Bob Stranger").await;

    let input = UpdateSyllabus {
        year: Some(2030),
        semester: Some("Winter".into()),
    };
    assert_matches!(
        SyllabusRepo::update(&pool, stranger, id, &input).await,
        Err(StoreError::Forbidden(_))
    );

    let syllabus = SyllabusRepo::get_visible(&pool, owner, id).await.unwrap();
    assert_eq!(syllabus.year, 2024);
    assert_eq!(syllabus.semester, "Fall");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_invalid_semester_is_malformed(pool: PgPool) {
    let (owner, _, id) = seed_syllabus(&pool).await;

    let input = UpdateSyllabus {
        year: None,
        semester: Some("Autumn".into()),
    };
    assert_matches!(
        SyllabusRepo::update(&pool, owner, id, &input).await,
        Err(StoreError::Malformed(_))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_unknown_id_is_not_found(pool: PgPool) {
    let owner = seed_user(&pool, "Ada Owner").await;

    let result = SyllabusRepo::update(&pool, owner, DbId::new_v4(), &UpdateSyllabus::default()).await;
    assert_matches!(result, Err(StoreError::NotFound { .. }));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_by_non_owner_keeps_row(pool: PgPool) {
    let (_, _, id) = seed_syllabus(&pool).await;
    let stranger = seed_user(&pool, "Bob Stranger").await;

    assert_matches!(
        SyllabusRepo::delete(&pool, stranger, id).await,
        Err(StoreError::Forbidden(_))
    );
    assert!(syllabus_exists(&pool, id).await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_by_owner_removes_row(pool: PgPool) {
    let (owner, _, id) = seed_syllabus(&pool).await;

    SyllabusRepo::delete(&pool, owner, id).await.unwrap();
    assert!(!syllabus_exists(&pool, id).await);

    assert_matches!(
        SyllabusRepo::delete(&pool, owner, id).await,
        Err(StoreError::NotFound { .. })
    );
}
