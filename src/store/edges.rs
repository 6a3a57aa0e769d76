use sqlx::{PgConnection, PgExecutor};

use crate::models::{AvailableTraining, Subscription};

/// Inserts one availability edge per user; pairs already present are skipped.
pub async fn insert_available(
    conn: &mut PgConnection,
    training_id: i64,
    user_ids: &[i64],
) -> Result<u64, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(0);
    }

    Ok(sqlx::query(
        "INSERT INTO available_trainings (user_id, training_id)
         SELECT user_id, $2 FROM UNNEST($1::bigint[]) AS targets(user_id)
         ON CONFLICT (user_id, training_id) DO NOTHING",
    )
    .bind(user_ids)
    .bind(training_id)
    .execute(&mut *conn)
    .await?
    .rows_affected())
}

/// Removes the training's availability edges for users outside `keep`.
pub async fn remove_available_except(
    conn: &mut PgConnection,
    training_id: i64,
    keep: &[i64],
) -> Result<u64, sqlx::Error> {
    Ok(sqlx::query(
        "DELETE FROM available_trainings
         WHERE training_id = $1 AND NOT (user_id = ANY($2::bigint[]))",
    )
    .bind(training_id)
    .bind(keep)
    .execute(&mut *conn)
    .await?
    .rows_affected())
}

/// Deletes the edge and reports whether it was there.
pub async fn take_available(
    conn: &mut PgConnection,
    user_id: i64,
    training_id: i64,
) -> Result<bool, sqlx::Error> {
    let removed = sqlx::query(
        "DELETE FROM available_trainings WHERE user_id = $1 AND training_id = $2",
    )
    .bind(user_id)
    .bind(training_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(removed > 0)
}

/// Idempotent: an existing subscription is returned unchanged.
pub async fn insert_subscription(
    conn: &mut PgConnection,
    student_id: i64,
    training_id: i64,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query(
        "INSERT INTO subscriptions (student_id, training_id) VALUES ($1, $2)
         ON CONFLICT (student_id, training_id) DO NOTHING",
    )
    .bind(student_id)
    .bind(training_id)
    .execute(&mut *conn)
    .await?;

    sqlx::query_as::<_, Subscription>(
        "SELECT student_id, training_id, created_at FROM subscriptions
         WHERE student_id = $1 AND training_id = $2",
    )
    .bind(student_id)
    .bind(training_id)
    .fetch_one(&mut *conn)
    .await
}

pub async fn remove_subscription(
    conn: &mut PgConnection,
    student_id: i64,
    training_id: i64,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        "DELETE FROM subscriptions WHERE student_id = $1 AND training_id = $2
         RETURNING student_id, training_id, created_at",
    )
    .bind(student_id)
    .bind(training_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn subscriber_ids<'e, E: PgExecutor<'e>>(
    executor: E,
    training_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT student_id FROM subscriptions WHERE training_id = $1 ORDER BY student_id",
    )
    .bind(training_id)
    .fetch_all(executor)
    .await
}

/// Returns (subscriptions removed, availability edges removed).
pub async fn delete_edges_for_training(
    conn: &mut PgConnection,
    training_id: i64,
) -> Result<(u64, u64), sqlx::Error> {
    let subscriptions = sqlx::query("DELETE FROM subscriptions WHERE training_id = $1")
        .bind(training_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let available = sqlx::query("DELETE FROM available_trainings WHERE training_id = $1")
        .bind(training_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok((subscriptions, available))
}

pub async fn available_for_training<'e, E: PgExecutor<'e>>(
    executor: E,
    training_id: i64,
) -> Result<Vec<AvailableTraining>, sqlx::Error> {
    sqlx::query_as::<_, AvailableTraining>(
        "SELECT user_id, training_id FROM available_trainings
         WHERE training_id = $1 ORDER BY user_id",
    )
    .bind(training_id)
    .fetch_all(executor)
    .await
}
