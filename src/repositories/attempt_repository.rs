use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{db::Database, errors::AppResult, models::domain::Attempt};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Fails with `Conflict` when a single-attempt quiz already has an attempt by this user.
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>>;
    async fn exists_for_user_and_quiz(&self, user_id: &str, quiz_id: &str) -> AppResult<bool>;
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<Attempt>>;
    async fn find_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Attempt>>;
    async fn find_by_quizzes(&self, quiz_ids: &[String]) -> AppResult<Vec<Attempt>>;
    async fn find_all(&self) -> AppResult<Vec<Attempt>>;
    async fn delete_by_quiz(&self, quiz_id: &str) -> AppResult<u64>;
    async fn count(&self) -> AppResult<u64>;
    async fn average_score(&self) -> AppResult<Option<f64>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoAttemptRepository {
    collection: Collection<Attempt>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("attempts");
        Self { collection }
    }

    async fn find_many(&self, filter: Document) -> AppResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(filter)
            .sort(doc! { "attempt_date": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt> {
        // A duplicate key on `single_attempt_user_quiz` converts to AppError::Conflict.
        self.collection.insert_one(&attempt).await?;
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn exists_for_user_and_quiz(&self, user_id: &str, quiz_id: &str) -> AppResult<bool> {
        let attempt = self
            .collection
            .find_one(doc! { "user_id": user_id, "quiz_id": quiz_id })
            .await?;
        Ok(attempt.is_some())
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<Attempt>> {
        self.find_many(doc! { "user_id": user_id }).await
    }

    async fn find_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Attempt>> {
        self.find_many(doc! { "quiz_id": quiz_id }).await
    }

    async fn find_by_quizzes(&self, quiz_ids: &[String]) -> AppResult<Vec<Attempt>> {
        if quiz_ids.is_empty() {
            return Ok(vec![]);
        }
        self.find_many(doc! { "quiz_id": { "$in": quiz_ids } }).await
    }

    async fn find_all(&self) -> AppResult<Vec<Attempt>> {
        self.find_many(doc! {}).await
    }

    async fn delete_by_quiz(&self, quiz_id: &str) -> AppResult<u64> {
        let result = self.collection.delete_many(doc! { "quiz_id": quiz_id }).await?;
        Ok(result.deleted_count)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn average_score(&self) -> AppResult<Option<f64>> {
        let mut cursor = self
            .collection
            .aggregate(vec![doc! {
                "$group": { "_id": null, "avg_score": { "$avg": "$score" } }
            }])
            .await?;

        match cursor.try_next().await? {
            Some(result) => Ok(result.get_f64("avg_score").ok()),
            None => Ok(None),
        }
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // Closes the check-then-insert window for single-attempt quizzes.
        let single_attempt_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "quiz_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { "single_attempt": true })
                    .name("single_attempt_user_quiz".to_string())
                    .build(),
            )
            .build();

        let quiz_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "score": -1 })
            .options(IndexOptions::builder().name("quiz_score".to_string()).build())
            .build();

        let user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().name("user_id".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(single_attempt_index).await?;
        self.collection.create_index(quiz_index).await?;
        self.collection.create_index(user_index).await?;

        Ok(())
    }
}
