use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Store unreachable: {0}")]
    StoreConnection(sqlx::Error),

    #[error("Store constraint violated: {0}")]
    StoreConstraint(sqlx::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed fetch error: {0}")]
    FeedFetch(String),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Entry not found: {0}")]
    EntryNotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Error::StoreConnection(err),
            sqlx::Error::Database(db_err) if is_constraint_violation(db_err.kind()) => {
                Error::StoreConstraint(err)
            }
            _ => Error::Database(err),
        }
    }
}

fn is_constraint_violation(kind: sqlx::error::ErrorKind) -> bool {
    use sqlx::error::ErrorKind;

    matches!(
        kind,
        ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation
    )
}

impl Error {
    /// Whether this failure happened while fetching or decoding a remote feed
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::FeedFetch(_) | Error::FeedParse(_) | Error::UrlParse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
