use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("invalid date: {0:?} (expected YYYY-MM-DD)")]
    Invalid(String),
    #[error("end date {end} is before start date {start}")]
    Reversed { start: NaiveDate, end: NaiveDate },
}

/// Rejected user input. Raised before anything is written or sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("rating must be between 1 and 5, got {0}")]
    Rating(i64),
    #[error("priority must be between 1 and 5, got {0}")]
    Priority(i64),
    #[error(transparent)]
    Date(#[from] DateError),
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("review not found: {0}")]
    ReviewNotFound(String),
    #[error("wishlist item not found: {0}")]
    WishlistItemNotFound(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("expected a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}
