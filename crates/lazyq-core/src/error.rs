use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by sequences, combinators, and terminal consumers.
///
/// Combinators never raise `NoElements`, `NoMatch`, or `MultipleMatches`;
/// an empty intermediate result is an empty sequence. Those variants belong
/// to the single-element consumers in [`crate::terminal`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid collection: {0}")]
    InvalidCollection(String),

    #[error("Sequence contains no elements")]
    NoElements,

    #[error("No element satisfies the condition")]
    NoMatch,

    #[error("More than one element satisfies the condition")]
    MultipleMatches,

    // Raised by a source sequence and carried unchanged to the consumer.
    #[error("Source error: {0}")]
    Source(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Source(e.to_string())
    }
}
