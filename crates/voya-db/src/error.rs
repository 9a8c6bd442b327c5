use std::fmt;

use sqlx::postgres::PgDatabaseError;

/// Error returned by every row-level query in this crate.
///
/// The backend's own `{code, hint, message}` triplet is preserved for
/// statements the database rejected, because callers surface it verbatim
/// in API error payloads. Everything else (connectivity, pool exhaustion,
/// row decoding) is carried as the underlying driver error.
#[derive(Debug)]
pub enum StoreError {
    /// The database rejected a statement (constraint violation, bad input,
    /// unknown relation, ...).
    Rejected {
        /// SQLSTATE code, e.g. `23503` for a foreign-key violation.
        code: String,
        /// Optional remediation hint supplied by the server.
        hint: Option<String>,
        /// Primary human-readable message.
        message: String,
    },
    /// The statement never produced a server verdict: connection failures,
    /// timeouts, or a row that could not be decoded.
    Backend(sqlx::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected {
                code,
                hint: Some(hint),
                message,
            } => write!(f, "[{code}] {hint} > {message}"),
            Self::Rejected {
                code,
                hint: None,
                message,
            } => write!(f, "[{code}] {message}"),
            Self::Backend(err) => write!(f, "storage backend error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rejected { .. } => None,
            Self::Backend(err) => Some(err),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                match db_err.try_downcast_ref::<PgDatabaseError>() {
                    Some(pg) => Self::Rejected {
                        code: pg.code().to_owned(),
                        hint: pg.hint().map(str::to_owned),
                        message: pg.message().to_owned(),
                    },
                    None => Self::Rejected {
                        code: db_err
                            .code()
                            .map(|c| c.into_owned())
                            .unwrap_or_else(|| "unknown".to_owned()),
                        hint: None,
                        message: db_err.message().to_owned(),
                    },
                }
            }
            other => Self::Backend(other),
        }
    }
}
