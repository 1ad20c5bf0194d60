use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Enum values are never removed, so additions cannot be undone.
    #[error("{operation} cannot be reversed: enum value removal is not supported")]
    Irreversible { operation: String },

    #[error("could not parse rendered operation `{input}`: {reason}")]
    Parse { input: String, reason: String },
}
