use std::{any::Any, path::PathBuf};

use actors::{
    actor::{Actor, SupervisionStrategy},
    actor_ref::ActorRef,
    handler::{Handler, Message},
    run,
};
use async_trait::async_trait;

use crate::{
    model::{FeatureId, Ugc, UgcUpdate},
    storage::{ReviewStorage, StorageError},
    ReviewsError, ReviewsResult,
};

/// Serves place reviews and keeps the local user's updates. Runs on its own
/// mailbox so that file access never blocks the caller.
pub struct ReviewApi {
    storage: ReviewStorage,
}

impl ReviewApi {
    pub fn new(storage: ReviewStorage) -> Self {
        Self { storage }
    }

    /// Starts the actor on the updates stored at `path`. After a panic the
    /// actor restarts and reloads the file.
    pub fn start(path: PathBuf) -> Result<ActorRef<ReviewApi>, StorageError> {
        // fail early on a broken file, restarts fall back to an empty store
        ReviewStorage::open(&path)?;
        Ok(run(move || {
            let storage = ReviewStorage::open(&path).unwrap_or_else(|why| {
                log::error!("could not reload review updates: {}", why);
                ReviewStorage::empty(&path)
            });
            ReviewApi::new(storage)
        }))
    }
}

impl Actor for ReviewApi {
    fn on_fail(&mut self, _: Box<dyn Any + Send>) -> SupervisionStrategy {
        SupervisionStrategy::Restart
    }
}

pub struct GetReviews(pub FeatureId);

impl Message for GetReviews {
    type Response = Ugc;
}

pub struct GetReviewUpdate(pub FeatureId);

impl Message for GetReviewUpdate {
    type Response = UgcUpdate;
}

pub struct SetReviewUpdate {
    pub feature: FeatureId,
    pub update: UgcUpdate,
}

impl Message for SetReviewUpdate {
    type Response = Result<(), StorageError>;
}

#[async_trait]
impl Handler<GetReviews> for ReviewApi {
    async fn handle(&mut self, message: GetReviews) -> Ugc {
        Ugc::sample(&message.0)
    }
}

#[async_trait]
impl Handler<GetReviewUpdate> for ReviewApi {
    async fn handle(&mut self, message: GetReviewUpdate) -> UgcUpdate {
        self.storage.get(&message.0).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Handler<SetReviewUpdate> for ReviewApi {
    async fn handle(&mut self, message: SetReviewUpdate) -> Result<(), StorageError> {
        log::debug!("storing review update for {}", message.feature);
        self.storage.set(message.feature, message.update)
    }
}

#[async_trait]
pub trait ReviewsHandle {
    async fn get_reviews(&self, feature: FeatureId) -> ReviewsResult<Ugc>;
    /// The stored update, empty if there is none.
    async fn get_review_update(&self, feature: FeatureId) -> ReviewsResult<UgcUpdate>;
    async fn set_review_update(&self, feature: FeatureId, update: UgcUpdate)
        -> ReviewsResult<()>;
}

#[async_trait]
impl ReviewsHandle for ActorRef<ReviewApi> {
    async fn get_reviews(&self, feature: FeatureId) -> ReviewsResult<Ugc> {
        self.ask(GetReviews(feature))
            .await
            .map_err(|_| ReviewsError::Stopped)
    }

    async fn get_review_update(&self, feature: FeatureId) -> ReviewsResult<UgcUpdate> {
        self.ask(GetReviewUpdate(feature))
            .await
            .map_err(|_| ReviewsError::Stopped)
    }

    async fn set_review_update(
        &self,
        feature: FeatureId,
        update: UgcUpdate,
    ) -> ReviewsResult<()> {
        self.ask(SetReviewUpdate { feature, update })
            .await
            .map_err(|_| ReviewsError::Stopped)??;
        Ok(())
    }
}
