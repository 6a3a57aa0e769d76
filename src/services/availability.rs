//! Availability edges derived from a training's targeting rule.
//!
//! `compute_targets` is the read side; `sync_availability` rewrites the
//! `available_trainings` rows of one training so that every target who is not
//! already subscribed holds exactly one edge and nobody else holds any.

use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::{FromRow, PgConnection};

use crate::auth::UserRole;
use crate::models::{AgeBracket, Gender, TargetingRule};
use crate::services::{ServiceError, ServiceResult};
use crate::store::{edges, users};

/// The user attributes a targeting rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct Candidate {
    pub id: i64,
    pub age_bracket: AgeBracket,
    pub gender: Gender,
}

impl TargetingRule {
    /// Unset group targets act as wildcards.
    pub fn admits(&self, candidate: &Candidate) -> bool {
        match *self {
            TargetingRule::Individual { student_id } => candidate.id == student_id,
            TargetingRule::Group { auditory, gender } => {
                auditory.map_or(true, |bracket| bracket == candidate.age_bracket)
                    && gender.map_or(true, |gender| gender == candidate.gender)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub added: u64,
    pub removed: u64,
}

/// Ids of every user the rule admits, ascending.
pub async fn compute_targets(
    conn: &mut PgConnection,
    rule: &TargetingRule,
) -> Result<Vec<i64>, sqlx::Error> {
    match *rule {
        TargetingRule::Individual { student_id } => Ok(vec![student_id]),
        TargetingRule::Group { auditory, gender } => {
            sqlx::query_scalar::<_, i64>(
                "SELECT id FROM users
                 WHERE ($1::age_bracket IS NULL OR age_bracket = $1)
                   AND ($2::gender IS NULL OR gender = $2)
                 ORDER BY id",
            )
            .bind(auditory)
            .bind(gender)
            .fetch_all(&mut *conn)
            .await
        }
    }
}

/// Whether one user currently falls under the rule.
pub async fn is_eligible(
    conn: &mut PgConnection,
    rule: &TargetingRule,
    user_id: i64,
) -> Result<bool, sqlx::Error> {
    let candidate = sqlx::query_as::<_, Candidate>(
        "SELECT id, age_bracket, gender FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(candidate.is_some_and(|candidate| rule.admits(&candidate)))
}

/// Targets that should hold an availability edge: everyone not yet subscribed.
pub fn pending_targets(targets: &[i64], subscribed: &[i64]) -> Vec<i64> {
    let subscribed: BTreeSet<i64> = subscribed.iter().copied().collect();
    targets
        .iter()
        .copied()
        .filter(|id| !subscribed.contains(id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Recomputes the training's availability edges inside the caller's transaction.
///
/// Edges of users who keep their eligibility are left in place; subscriptions
/// are never touched.
pub async fn sync_availability(
    conn: &mut PgConnection,
    training_id: i64,
    rule: &TargetingRule,
) -> Result<SyncOutcome, sqlx::Error> {
    let targets = compute_targets(conn, rule).await?;
    let subscribed = edges::subscriber_ids(&mut *conn, training_id).await?;
    let keep = pending_targets(&targets, &subscribed);

    let removed = edges::remove_available_except(conn, training_id, &keep).await?;
    let added = edges::insert_available(conn, training_id, &keep).await?;

    Ok(SyncOutcome { added, removed })
}

/// Individual trainings may only be aimed at an existing student.
pub async fn check_individual_target(
    conn: &mut PgConnection,
    rule: &TargetingRule,
) -> ServiceResult<()> {
    let TargetingRule::Individual { student_id } = *rule else {
        return Ok(());
    };

    match users::role_of(&mut *conn, student_id).await? {
        Some(UserRole::Student) => Ok(()),
        Some(_) => Err(ServiceError::Validation(format!(
            "User with id={student_id} is not a student"
        ))),
        None => Err(ServiceError::Validation(format!(
            "Student with id={student_id} does not exist"
        ))),
    }
}
