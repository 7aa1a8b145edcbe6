use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use snafu::Snafu;
use std::num::ParseIntError;

pub type GradRegResult<T> = Result<T, GradRegError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum GradRegError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error getting db connection"))]
    GetDatabaseConnection { source: sqlx::Error },
    #[snafu(display("Error beginning SQL transaction"))]
    BeginTransaction { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error committing SQL transaction"))]
    CommitTransaction { source: sqlx::Error },
    #[snafu(display("Error rolling back SQL transaction"))]
    RollbackTransaction { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse IP port"))]
    ParsePort { source: ParseIntError },
    #[snafu(display("Unable to parse env var `{}` from {:?}", name, original))]
    ParseEnvVar {
        source: ParseIntError,
        name: &'static str,
        original: String,
    },
    #[snafu(display("Env var `{}` must be at least 1", name))]
    ZeroEnvVar { name: &'static str },
    #[snafu(display("Transaction hit a write conflict"))]
    TransactionConflict,
    #[snafu(display(
        "The record store is unavailable right now, please try again in a moment"
    ))]
    StoreUnavailable,
    #[snafu(display("Please enter a Student ID."))]
    EmptyStudentId,
    #[snafu(display("Seat number {:?} is not a valid seat number.", original))]
    InvalidSeatNumber { original: String },
    #[snafu(display("No student found with ID {}.", id))]
    StudentNotFound { id: String },
    #[snafu(display("Student {} is marked registered without a time or channel", id))]
    InconsistentRecord { id: String },
    #[snafu(display("Database timestamp out of range"))]
    InvalidTimestamp { source: jiff::Error },
}

impl GradRegError {
    /// Converts a database error into either a conflict (worth another transaction attempt),
    /// [`Self::StoreUnavailable`], or the given fallback.
    pub fn from_store(source: sqlx::Error, fallback: impl FnOnce(sqlx::Error) -> Self) -> Self {
        match &source {
            sqlx::Error::Database(db_error) => match db_error.code().as_deref() {
                // serialization_failure, deadlock_detected
                Some("40001" | "40P01") => Self::TransactionConflict,
                // lock_not_available, query_canceled (statement_timeout)
                Some("55P03" | "57014") => Self::StoreUnavailable,
                _ => fallback(source),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::StoreUnavailable
            }
            _ => fallback(source),
        }
    }

    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::TransactionConflict)
    }
}

impl IntoResponse for GradRegError {
    #[allow(clippy::match_same_arms)]
    fn into_response(self) -> Response {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input
        const SU: StatusCode = StatusCode::SERVICE_UNAVAILABLE; //try again later

        let basic_error = |desc| {
            html! {
                div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" role="alert" {
                    strong class="font-bold" {"Registration Error "}
                    span {(desc)}
                }
            }
        };

        let status_code = match &self {
            Self::OpenDatabase { .. } | Self::GetDatabaseConnection { .. } => SU,
            Self::BeginTransaction { .. } => SU,
            Self::MigrateError { .. } => ISE,
            Self::MakeQuery { source } => match source {
                sqlx::Error::RowNotFound => NF,
                _ => ISE,
            },
            Self::CommitTransaction { .. } | Self::RollbackTransaction { .. } => ISE,
            Self::BadEnvVar { .. } | Self::ParsePort { .. } => ISE,
            Self::ParseEnvVar { .. } | Self::ZeroEnvVar { .. } => ISE,
            Self::TransactionConflict | Self::StoreUnavailable => SU,
            Self::EmptyStudentId | Self::InvalidSeatNumber { .. } => BI,
            Self::StudentNotFound { .. } => NF,
            Self::InconsistentRecord { .. } | Self::InvalidTimestamp { .. } => ISE,
        };

        error!(?self, "Error!");
        (status_code, Html(basic_error(self.to_string()))).into_response()
    }
}
