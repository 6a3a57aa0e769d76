// Persistence for users, trainings and the booking edge tables.
//
// Functions that take `&mut PgConnection` are meant to run inside a caller's
// transaction; the ones generic over `PgExecutor` work on the pool as well.

pub mod edges;
pub mod trainings;
pub mod users;

pub use trainings::SearchScope;

/// SQLSTATE 23505 on the given constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation() && db_err.constraint() == Some(constraint))
        .unwrap_or(false)
}

/// SQLSTATE 23503, any foreign key.
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_foreign_key_violation())
        .unwrap_or(false)
}
