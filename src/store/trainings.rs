use sqlx::{PgConnection, PgExecutor, Postgres, QueryBuilder};

use crate::models::{NewTraining, TimeWindow, Training, TrainingFilter};

const TRAINING_COLUMNS: &str = "t.id, t.title, t.description, t.time_start, t.time_end, \
                                t.training_type, t.discipline, t.coach_id, t.individual_for_id, \
                                t.target_auditory, t.target_gender, t.created_at, t.updated_at";

/// Which trainings a search starts from before filters apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    All,
    AvailableTo(i64),
    SubscribedBy(i64),
}

pub async fn insert(conn: &mut PgConnection, training: &NewTraining) -> Result<Training, sqlx::Error> {
    sqlx::query_as::<_, Training>(&format!(
        "INSERT INTO trainings AS t (title, description, time_start, time_end, training_type,
                                     discipline, coach_id, individual_for_id, target_auditory,
                                     target_gender)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING {TRAINING_COLUMNS}"
    ))
    .bind(&training.title)
    .bind(&training.description)
    .bind(training.time_start)
    .bind(training.time_end)
    .bind(training.training_type)
    .bind(training.discipline)
    .bind(training.coach_id)
    .bind(training.individual_for_id)
    .bind(training.target_auditory)
    .bind(training.target_gender)
    .fetch_one(&mut *conn)
    .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    training_id: i64,
) -> Result<Option<Training>, sqlx::Error> {
    sqlx::query_as::<_, Training>(&format!(
        "SELECT {TRAINING_COLUMNS} FROM trainings t WHERE t.id = $1"
    ))
    .bind(training_id)
    .fetch_optional(executor)
    .await
}

/// Row lock held until the transaction ends; blocks concurrent retargeting and subscribes.
pub async fn lock_for_update(
    conn: &mut PgConnection,
    training_id: i64,
) -> Result<Option<Training>, sqlx::Error> {
    sqlx::query_as::<_, Training>(&format!(
        "SELECT {TRAINING_COLUMNS} FROM trainings t WHERE t.id = $1 FOR UPDATE"
    ))
    .bind(training_id)
    .fetch_optional(&mut *conn)
    .await
}

/// Shared lock: many subscribes may proceed together, an update waits for them.
pub async fn lock_shared(
    conn: &mut PgConnection,
    training_id: i64,
) -> Result<Option<Training>, sqlx::Error> {
    sqlx::query_as::<_, Training>(&format!(
        "SELECT {TRAINING_COLUMNS} FROM trainings t WHERE t.id = $1 FOR SHARE"
    ))
    .bind(training_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn exists<'e, E: PgExecutor<'e>>(executor: E, training_id: i64) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM trainings WHERE id = $1)")
        .bind(training_id)
        .fetch_one(executor)
        .await?;

    Ok(exists)
}

/// Writes every mutable column of `training` back to its row.
pub async fn update(conn: &mut PgConnection, training: &Training) -> Result<Training, sqlx::Error> {
    sqlx::query_as::<_, Training>(&format!(
        "UPDATE trainings AS t
         SET title = $2, description = $3, time_start = $4, time_end = $5, training_type = $6,
             discipline = $7, individual_for_id = $8, target_auditory = $9, target_gender = $10,
             updated_at = NOW()
         WHERE t.id = $1
         RETURNING {TRAINING_COLUMNS}"
    ))
    .bind(training.id)
    .bind(&training.title)
    .bind(&training.description)
    .bind(training.time_start)
    .bind(training.time_end)
    .bind(training.training_type)
    .bind(training.discipline)
    .bind(training.individual_for_id)
    .bind(training.target_auditory)
    .bind(training.target_gender)
    .fetch_one(&mut *conn)
    .await
}

pub async fn delete(conn: &mut PgConnection, training_id: i64) -> Result<u64, sqlx::Error> {
    Ok(sqlx::query("DELETE FROM trainings WHERE id = $1")
        .bind(training_id)
        .execute(&mut *conn)
        .await?
        .rows_affected())
}

fn push_search<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    scope: SearchScope,
    filter: &'a TrainingFilter,
    window: Option<TimeWindow>,
) {
    builder.push(format!("SELECT {TRAINING_COLUMNS} FROM trainings t"));

    match scope {
        SearchScope::All => {
            builder.push(" WHERE TRUE");
        }
        SearchScope::AvailableTo(user_id) => {
            builder
                .push(" JOIN available_trainings a ON a.training_id = t.id WHERE a.user_id = ")
                .push_bind(user_id);
        }
        SearchScope::SubscribedBy(student_id) => {
            builder
                .push(" JOIN subscriptions s ON s.training_id = t.id WHERE s.student_id = ")
                .push_bind(student_id);
        }
    }

    if let Some(title) = &filter.title {
        builder.push(" AND t.title = ").push_bind(title);
    }
    if let Some(description) = &filter.description {
        builder.push(" AND t.description = ").push_bind(description);
    }
    if let Some(training_type) = filter.training_type {
        builder.push(" AND t.training_type = ").push_bind(training_type);
    }
    if let Some(discipline) = filter.discipline {
        builder.push(" AND t.discipline = ").push_bind(discipline);
    }
    if let Some(individual_for_id) = filter.individual_for_id {
        builder.push(" AND t.individual_for_id = ").push_bind(individual_for_id);
    }
    if let Some(target_auditory) = filter.target_auditory {
        builder.push(" AND t.target_auditory = ").push_bind(target_auditory);
    }
    if let Some(target_gender) = filter.target_gender {
        builder.push(" AND t.target_gender = ").push_bind(target_gender);
    }
    if let Some(coach_id) = filter.coach_id {
        builder.push(" AND t.coach_id = ").push_bind(coach_id);
    }

    // Time-of-day and date ranges are independent of each other.
    if let Some(window) = window {
        builder
            .push(" AND t.time_start::time >= ")
            .push_bind(window.time_start)
            .push(" AND t.time_end::time <= ")
            .push_bind(window.time_end)
            .push(" AND t.time_start::date BETWEEN ")
            .push_bind(window.date_start)
            .push(" AND ")
            .push_bind(window.date_end);
    }

    builder.push(" ORDER BY t.time_start, t.id");
}

pub async fn search<'e, E: PgExecutor<'e>>(
    executor: E,
    scope: SearchScope,
    filter: &TrainingFilter,
    window: Option<TimeWindow>,
) -> Result<Vec<Training>, sqlx::Error> {
    let mut builder = QueryBuilder::new("");
    push_search(&mut builder, scope, filter, window);

    builder.build_query_as::<Training>().fetch_all(executor).await
}
