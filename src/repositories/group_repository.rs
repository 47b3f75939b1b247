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
    models::domain::Group,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn create(&self, group: Group) -> AppResult<Group>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Group>>;
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Group>>;
    async fn code_exists(&self, code: &str) -> AppResult<bool>;
    async fn find_all(&self) -> AppResult<Vec<Group>>;
    async fn find_by_owner(&self, user_id: &str) -> AppResult<Vec<Group>>;
    async fn find_by_member(&self, user_id: &str) -> AppResult<Vec<Group>>;
    /// Ids of every group `user_id` belongs to. Used as an access-control predicate.
    async fn group_ids_for_member(&self, user_id: &str) -> AppResult<Vec<String>>;
    /// Adds the member if absent. Adding twice is a no-op.
    async fn add_member(&self, group_id: &str, user_id: &str) -> AppResult<()>;
    /// Returns whether the member was present.
    async fn remove_member(&self, group_id: &str, user_id: &str) -> AppResult<bool>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoGroupRepository {
    collection: Collection<Group>,
}

impl MongoGroupRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("groups");
        Self { collection }
    }

    async fn find_many(&self, filter: Document) -> AppResult<Vec<Group>> {
        let groups = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(groups)
    }
}

#[async_trait]
impl GroupRepository for MongoGroupRepository {
    async fn create(&self, group: Group) -> AppResult<Group> {
        self.collection.insert_one(&group).await?;
        Ok(group)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Group>> {
        let group = self.collection.find_one(doc! { "id": id }).await?;
        Ok(group)
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Group>> {
        let group = self.collection.find_one(doc! { "code": code }).await?;
        Ok(group)
    }

    async fn code_exists(&self, code: &str) -> AppResult<bool> {
        let count = self.collection.count_documents(doc! { "code": code }).await?;
        Ok(count > 0)
    }

    async fn find_all(&self) -> AppResult<Vec<Group>> {
        self.find_many(doc! {}).await
    }

    async fn find_by_owner(&self, user_id: &str) -> AppResult<Vec<Group>> {
        self.find_many(doc! { "created_by": user_id }).await
    }

    async fn find_by_member(&self, user_id: &str) -> AppResult<Vec<Group>> {
        self.find_many(doc! { "members": user_id }).await
    }

    async fn group_ids_for_member(&self, user_id: &str) -> AppResult<Vec<String>> {
        let groups = self.find_by_member(user_id).await?;
        Ok(groups.into_iter().map(|g| g.id).collect())
    }

    async fn add_member(&self, group_id: &str, user_id: &str) -> AppResult<()> {
        let result = self
            .collection
            .update_one(
                doc! { "id": group_id },
                doc! { "$addToSet": { "members": user_id } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound("Group not found".to_string()));
        }
        Ok(())
    }

    async fn remove_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": group_id },
                doc! { "$pull": { "members": user_id } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound("Group not found".to_string()));
        }
        Ok(result.modified_count > 0)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for groups collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let code_index = IndexModel::builder()
            .keys(doc! { "code": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("code_unique".to_string())
                    .build(),
            )
            .build();

        let members_index = IndexModel::builder()
            .keys(doc! { "members": 1 })
            .options(IndexOptions::builder().name("members".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(code_index).await?;
        self.collection.create_index(members_index).await?;

        Ok(())
    }
}
