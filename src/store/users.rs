use sqlx::{PgConnection, PgExecutor};

use crate::auth::UserRole;
use crate::models::{CreateUser, Discipline, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, age, age_bracket, gender, \
                            skill_level, created_at, updated_at";

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_email<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn email_exists<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(executor)
            .await?;

    Ok(exists)
}

pub async fn role_of<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<Option<UserRole>, sqlx::Error> {
    sqlx::query_scalar::<_, UserRole>("SELECT role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

pub async fn insert(conn: &mut PgConnection, user: &CreateUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, password_hash, role, age, age_bracket, gender, skill_level)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(user.age)
    .bind(user.age_bracket)
    .bind(user.gender)
    .bind(user.skill_level)
    .fetch_one(&mut *conn)
    .await
}

pub async fn insert_interests(
    conn: &mut PgConnection,
    user_id: i64,
    disciplines: &[Discipline],
) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;
    for discipline in disciplines {
        inserted += sqlx::query(
            "INSERT INTO interests (user_id, discipline) VALUES ($1, $2)
             ON CONFLICT (user_id, discipline) DO NOTHING",
        )
        .bind(user_id)
        .bind(*discipline)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    }

    Ok(inserted)
}

pub async fn interests_of<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<Vec<Discipline>, sqlx::Error> {
    sqlx::query_scalar::<_, Discipline>(
        "SELECT discipline FROM interests WHERE user_id = $1 ORDER BY discipline",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Users holding a subscription to the training.
pub async fn subscribed_to<'e, E: PgExecutor<'e>>(
    executor: E,
    training_id: i64,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT u.id, u.name, u.email, u.password_hash, u.role, u.age, u.age_bracket, u.gender,
                u.skill_level, u.created_at, u.updated_at
         FROM users u
         JOIN subscriptions s ON s.student_id = u.id
         WHERE s.training_id = $1
         ORDER BY u.name, u.id",
    )
    .bind(training_id)
    .fetch_all(executor)
    .await
}
