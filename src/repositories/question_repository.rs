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
    models::domain::{Question, QuestionScope},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionVisibility {
    Everything,
    OwnedBy(String),
    Global,
    OwnedOrGlobal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFilter {
    pub visibility: QuestionVisibility,
    pub category: Option<String>,
}

impl QuestionFilter {
    pub fn matches(&self, question: &Question) -> bool {
        let visible = match &self.visibility {
            QuestionVisibility::Everything => true,
            QuestionVisibility::OwnedBy(user_id) => &question.created_by == user_id,
            QuestionVisibility::Global => question.scope == QuestionScope::Global,
            QuestionVisibility::OwnedOrGlobal(user_id) => {
                &question.created_by == user_id || question.scope == QuestionScope::Global
            }
        };

        visible
            && self
                .category
                .as_deref()
                .map(|c| question.category == c)
                .unwrap_or(true)
    }

    pub fn to_document(&self) -> Document {
        let mut filter = match &self.visibility {
            QuestionVisibility::Everything => doc! {},
            QuestionVisibility::OwnedBy(user_id) => doc! { "created_by": user_id },
            QuestionVisibility::Global => doc! { "scope": "global" },
            QuestionVisibility::OwnedOrGlobal(user_id) => doc! {
                "$or": [ { "created_by": user_id }, { "scope": "global" } ]
            },
        };

        if let Some(category) = &self.category {
            filter.insert("category", category);
        }
        filter
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn create(&self, question: Question) -> AppResult<Question>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>>;
    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>>;
    async fn list(&self, filter: QuestionFilter) -> AppResult<Vec<Question>>;
    async fn update(&self, question: Question) -> AppResult<Question>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoQuestionRepository {
    collection: Collection<Question>,
}

impl MongoQuestionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("questions");
        Self { collection }
    }
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    async fn create(&self, question: Question) -> AppResult<Question> {
        self.collection.insert_one(&question).await?;
        Ok(question)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
        let question = self.collection.find_one(doc! { "id": id }).await?;
        Ok(question)
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let questions = self
            .collection
            .find(doc! { "id": { "$in": ids } })
            .await?
            .try_collect()
            .await?;
        Ok(questions)
    }

    async fn list(&self, filter: QuestionFilter) -> AppResult<Vec<Question>> {
        let questions = self
            .collection
            .find(filter.to_document())
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(questions)
    }

    async fn update(&self, question: Question) -> AppResult<Question> {
        let result = self
            .collection
            .replace_one(doc! { "id": &question.id }, &question)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
        Ok(question)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for questions collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let scope_index = IndexModel::builder()
            .keys(doc! { "scope": 1, "category": 1 })
            .options(IndexOptions::builder().name("scope_category".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(scope_index).await?;

        Ok(())
    }
}
