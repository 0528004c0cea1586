//! Error taxonomy for the query layer.
//!
//! Every query function returns exactly one of three outcome classes:
//! [`DbError::NotFound`], one of the per-entity duplicate-key sentinels, or a
//! wrapped [`QueryFailure`] carrying the operation and its inputs.

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for `query_canceled` (raised by `statement_timeout`).
const QUERY_CANCELED: &str = "57014";

/// Low-level cause of a failed round-trip to the store.
#[derive(Debug, thiserror::Error)]
pub enum QueryFailure {
    /// The transaction deadline passed before the statement finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The query context was cancelled (explicitly or via its parent).
    #[error("canceled")]
    Canceled,

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl QueryFailure {
    /// Deadline or cancellation, as opposed to a failure reported by the driver.
    pub fn is_interruption(&self) -> bool {
        matches!(self, QueryFailure::DeadlineExceeded | QueryFailure::Canceled)
    }
}

/// Every `query_canceled` is reported as [`QueryFailure::DeadlineExceeded`].
/// The transaction-local `statement_timeout` is by far its most common
/// source, but an operator's `pg_cancel_backend` lands here as well; the
/// SQLSTATE does not tell the two apart.
impl From<sqlx::Error> for QueryFailure {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(QUERY_CANCELED) {
                return QueryFailure::DeadlineExceeded;
            }
        }
        QueryFailure::Sqlx(err)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// No active row matched. Covers both "never existed" and "soft-deleted".
    #[error("no rows in result set")]
    NotFound,

    #[error("duplicate key value violates unique constraint \"tasks_name_state_unique\"")]
    TaskDuplicateKey,

    #[error("duplicate key value violates unique constraint \"tags_name_state_unique\"")]
    TagDuplicateKey,

    #[error("duplicate key value violates unique constraint \"users_email_state_unique\"")]
    UserDuplicateKey,

    /// Any other failure, annotated with the operation and key inputs.
    #[error("error at {op}: {source}")]
    Query {
        op: String,
        #[source]
        source: QueryFailure,
    },

    #[error("failed to begin transaction: {0}")]
    Begin(#[source] QueryFailure),

    /// The unit of work succeeded but its changes were not committed.
    #[error("failed to commit transaction: {0}")]
    Commit(#[source] QueryFailure),
}

impl DbError {
    pub fn query(op: impl Into<String>, source: QueryFailure) -> Self {
        DbError::Query {
            op: op.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound)
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(
            self,
            DbError::TaskDuplicateKey | DbError::TagDuplicateKey | DbError::UserDuplicateKey
        )
    }

    /// The underlying round-trip failure, if this error wraps one.
    pub fn failure(&self) -> Option<&QueryFailure> {
        match self {
            DbError::Query { source, .. } => Some(source),
            DbError::Begin(source) | DbError::Commit(source) => Some(source),
            _ => None,
        }
    }
}

/// Declared `(field, state)` uniqueness constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    TaskName,
    TagName,
    UserEmail,
}

impl UniqueKey {
    /// Name of the unique constraint in the schema.
    pub fn constraint(&self) -> &'static str {
        match self {
            UniqueKey::TaskName => "tasks_name_state_unique",
            UniqueKey::TagName => "tags_name_state_unique",
            UniqueKey::UserEmail => "users_email_state_unique",
        }
    }

    /// The sentinel returned when a write would violate this key.
    pub fn duplicate_error(&self) -> DbError {
        match self {
            UniqueKey::TaskName => DbError::TaskDuplicateKey,
            UniqueKey::TagName => DbError::TagDuplicateKey,
            UniqueKey::UserEmail => DbError::UserDuplicateKey,
        }
    }

    /// Whether `err` is a violation of this constraint.
    ///
    /// Matches on SQLSTATE and the reported constraint name. When the driver
    /// does not report a constraint name, falls back to the message text.
    pub fn is_violated_by(&self, err: &sqlx::Error) -> bool {
        let sqlx::Error::Database(db_err) = err else {
            return false;
        };
        if db_err.code().as_deref() != Some(UNIQUE_VIOLATION) {
            return false;
        }
        match db_err.constraint() {
            Some(name) => name == self.constraint(),
            None => db_err.message().contains(self.constraint()),
        }
    }
}

/// Translate a failed write into the duplicate-key sentinel for `key`, or a
/// wrapped [`DbError::Query`] built from `op`.
pub(crate) fn translate_write(
    failure: QueryFailure,
    key: UniqueKey,
    op: impl FnOnce() -> String,
) -> DbError {
    match failure {
        QueryFailure::Sqlx(ref err) if key.is_violated_by(err) => key.duplicate_error(),
        other => DbError::query(op(), other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_carries_operation_and_cause() {
        let err = DbError::query("loading tag by id '1'", QueryFailure::DeadlineExceeded);
        assert_eq!(
            err.to_string(),
            "error at loading tag by id '1': deadline exceeded"
        );
        assert!(matches!(err.failure(), Some(QueryFailure::DeadlineExceeded)));
    }

    #[test]
    fn duplicate_sentinels_are_distinct_from_generic_failures() {
        assert!(DbError::TagDuplicateKey.is_duplicate_key());
        assert!(DbError::UserDuplicateKey.is_duplicate_key());
        assert!(!DbError::NotFound.is_duplicate_key());
        assert!(!DbError::query("x", QueryFailure::Canceled).is_duplicate_key());
    }

    #[test]
    fn non_database_errors_never_match_a_constraint() {
        let err = sqlx::Error::RowNotFound;
        assert!(!UniqueKey::TaskName.is_violated_by(&err));
        let translated = translate_write(QueryFailure::Sqlx(err), UniqueKey::TaskName, || {
            "inserting task".to_string()
        });
        assert!(matches!(translated, DbError::Query { .. }));
    }

    #[test]
    fn cancellation_is_not_translated_to_duplicate() {
        let translated =
            translate_write(QueryFailure::Canceled, UniqueKey::UserEmail, || "op".into());
        assert!(matches!(
            translated,
            DbError::Query {
                source: QueryFailure::Canceled,
                ..
            }
        ));
    }

    #[test]
    fn constraint_names_match_schema() {
        assert_eq!(UniqueKey::TaskName.constraint(), "tasks_name_state_unique");
        assert_eq!(UniqueKey::TagName.constraint(), "tags_name_state_unique");
        assert_eq!(UniqueKey::UserEmail.constraint(), "users_email_state_unique");
    }
}
