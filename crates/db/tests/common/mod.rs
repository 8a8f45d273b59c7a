//! Fixtures shared by the repository integration tests.
//!
//! Users and courses belong to other parts of the platform, so they are
//! seeded with plain SQL rather than through a repository.

#![allow(dead_code)]

use sqlx::PgPool;
use syllabi_core::types::DbId;
use syllabi_db::models::syllabus::CreateSyllabus;
use syllabi_db::repositories::SyllabusRepo;

pub async fn seed_user(pool: &PgPool, name: &str) -> DbId {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    sqlx::query_scalar("INSERT INTO users (full_name, email) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn seed_course(pool: &PgPool, code: &str, title: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO courses (course, title) VALUES ($1, $2) RETURNING id")
        .bind(code)
        .bind(title)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub fn new_syllabus(user_id: DbId, course_id: DbId) -> CreateSyllabus {
    CreateSyllabus {
        user_id,
        course_id,
        file: "outline.pdf".to_string(),
        file_size: 4096,
        content_type: "application/pdf".to_string(),
        year: 2024,
        semester: "Fall".to_string(),
    }
}

/// Seed an owner and a course, then create one unconfirmed syllabus.
pub async fn seed_syllabus(pool: &PgPool) -> (DbId, DbId, DbId) {
    let owner = seed_user(pool, "Ada Owner").await;
    let course = seed_course(pool, "CPS 109", "Computer Science I").await;
    let id = SyllabusRepo::create(pool, &new_syllabus(owner, course))
        .await
        .unwrap();
    (owner, course, id)
}

pub async fn syllabus_exists(pool: &PgPool, id: DbId) -> bool {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM syllabi WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap();
    count.0 == 1
}
