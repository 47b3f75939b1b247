use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Quiz,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>>;
    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Quiz>>;
    async fn find_enabled(&self) -> AppResult<Vec<Quiz>>;
    async fn find_all(&self) -> AppResult<Vec<Quiz>>;
    async fn find_by_creator(&self, user_id: &str) -> AppResult<Vec<Quiz>>;
    async fn find_enabled_by_code_hash(&self, code_hash: &str) -> AppResult<Option<Quiz>>;
    async fn update(&self, quiz: Quiz) -> AppResult<Quiz>;
    async fn set_enabled(&self, id: &str, enabled: bool) -> AppResult<()>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
    async fn count(&self) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoQuizRepository {
    collection: Collection<Quiz>,
}

impl MongoQuizRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quizzes");
        Self { collection }
    }

    async fn find_many(&self, filter: Document) -> AppResult<Vec<Quiz>> {
        let quizzes = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(quizzes)
    }
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.collection.insert_one(&quiz).await?;
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        let quiz = self.collection.find_one(doc! { "id": id }).await?;
        Ok(quiz)
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Quiz>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.find_many(doc! { "id": { "$in": ids } }).await
    }

    async fn find_enabled(&self) -> AppResult<Vec<Quiz>> {
        self.find_many(doc! { "is_enabled": true }).await
    }

    async fn find_all(&self) -> AppResult<Vec<Quiz>> {
        self.find_many(doc! {}).await
    }

    async fn find_by_creator(&self, user_id: &str) -> AppResult<Vec<Quiz>> {
        self.find_many(doc! { "created_by": user_id }).await
    }

    async fn find_enabled_by_code_hash(&self, code_hash: &str) -> AppResult<Option<Quiz>> {
        let quiz = self
            .collection
            .find_one(doc! {
                "access_type": "code",
                "access_code_hash": code_hash,
                "is_enabled": true,
            })
            .await?;
        Ok(quiz)
    }

    async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
        let result = self
            .collection
            .replace_one(doc! { "id": &quiz.id }, &quiz)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        Ok(quiz)
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> AppResult<()> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "is_enabled": enabled } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quizzes collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let creator_index = IndexModel::builder()
            .keys(doc! { "created_by": 1 })
            .options(IndexOptions::builder().name("created_by".to_string()).build())
            .build();

        let code_index = IndexModel::builder()
            .keys(doc! { "access_code_hash": 1 })
            .options(
                IndexOptions::builder()
                    .name("access_code_hash".to_string())
                    .sparse(true)
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(creator_index).await?;
        self.collection.create_index(code_index).await?;

        Ok(())
    }
}
