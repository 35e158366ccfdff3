use std::fmt;

pub mod api;
pub mod model;
pub mod storage;

pub use api::{ReviewApi, ReviewsHandle};
pub use model::{Attribute, Author, FeatureId, Rating, Review, Sentiment, Ugc, UgcUpdate};
pub use storage::{ReviewStorage, StorageError};

pub type ReviewsResult<T> = Result<T, ReviewsError>;

#[derive(Debug)]
pub enum ReviewsError {
    Storage(StorageError),
    /// The review actor is not running anymore.
    Stopped,
}

impl std::error::Error for ReviewsError {}

impl fmt::Display for ReviewsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReviewsError::Storage(why) => write!(f, "{}", why),
            ReviewsError::Stopped => write!(f, "review service is not running"),
        }
    }
}

impl From<StorageError> for ReviewsError {
    fn from(why: StorageError) -> Self {
        ReviewsError::Storage(why)
    }
}
