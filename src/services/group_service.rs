use std::{collections::HashSet, sync::Arc};

use validator::Validate;

use crate::{
    auth::{require_owner_or_admin, require_staff, Claims},
    errors::{AppError, AppResult},
    models::{
        domain::{
            group::{generate_code, normalize_code},
            Group, UserRole,
        },
        dto::{
            request::{CreateGroupRequest, JoinGroupRequest},
            response::GroupDto,
        },
    },
    repositories::{GroupRepository, UserRepository},
};

const MAX_CODE_ATTEMPTS: usize = 5;

pub struct GroupService {
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { groups, users }
    }

    pub async fn create(&self, actor: &Claims, request: CreateGroupRequest) -> AppResult<GroupDto> {
        require_staff(actor)?;
        request.validate()?;

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code(&mut rand::rng());
            if self.groups.code_exists(&code).await? {
                continue;
            }

            match self.groups.create(Group::new(&request.name, &code, &actor.sub)).await {
                Ok(group) => {
                    log::info!("User {} created group {}", actor.sub, group.id);
                    return self.to_dto(group).await;
                }
                // Lost a race for the code; try another.
                Err(AppError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AppError::InternalError(
            "Could not generate a unique group code".to_string(),
        ))
    }

    /// Admins list every group, teachers their own, students the groups they joined.
    pub async fn list(&self, actor: &Claims, scope: Option<&str>) -> AppResult<Vec<GroupDto>> {
        let owned_only = matches!(scope, Some(s) if s.eq_ignore_ascii_case("owned"));

        let groups = match actor.role {
            UserRole::Admin if !owned_only => self.groups.find_all().await?,
            UserRole::Admin | UserRole::Teacher => self.groups.find_by_owner(&actor.sub).await?,
            UserRole::Student if owned_only => {
                return Err(AppError::Forbidden(
                    "Only teachers and admins own groups".to_string(),
                ))
            }
            UserRole::Student => self.groups.find_by_member(&actor.sub).await?,
        };

        self.to_dtos(groups).await
    }

    pub async fn get(&self, actor: &Claims, group_id: &str) -> AppResult<GroupDto> {
        let group = self.find(group_id).await?;

        if !actor.role.is_admin() && !group.is_owner(&actor.sub) && !group.is_member(&actor.sub) {
            return Err(AppError::Forbidden(
                "You are not a member of this group".to_string(),
            ));
        }

        self.to_dto(group).await
    }

    /// Joining a group twice is a no-op.
    pub async fn join(&self, actor: &Claims, request: JoinGroupRequest) -> AppResult<GroupDto> {
        request.validate()?;

        let mut group = self
            .groups
            .find_by_code(&normalize_code(&request.code))
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid group code".to_string()))?;

        self.groups.add_member(&group.id, &actor.sub).await?;
        if !group.is_member(&actor.sub) {
            group.members.push(actor.sub.clone());
            log::info!("User {} joined group {}", actor.sub, group.id);
        }

        self.to_dto(group).await
    }

    pub async fn leave(&self, actor: &Claims, group_id: &str) -> AppResult<()> {
        let group = self.find(group_id).await?;

        if group.is_owner(&actor.sub) {
            return Err(AppError::ValidationError(
                "Group owner cannot leave their own group".to_string(),
            ));
        }
        if !group.is_member(&actor.sub) {
            return Err(AppError::ValidationError(
                "You are not a member of this group".to_string(),
            ));
        }

        self.groups.remove_member(&group.id, &actor.sub).await?;
        log::info!("User {} left group {}", actor.sub, group.id);
        Ok(())
    }

    pub async fn remove_member(
        &self,
        actor: &Claims,
        group_id: &str,
        member_id: &str,
    ) -> AppResult<()> {
        let group = self.find(group_id).await?;
        require_owner_or_admin(actor, &group.created_by)?;

        if group.is_owner(member_id) {
            return Err(AppError::ValidationError(
                "Cannot remove the group owner".to_string(),
            ));
        }
        if !group.is_member(member_id) {
            return Err(AppError::NotFound("Member not found in group".to_string()));
        }

        self.groups.remove_member(&group.id, member_id).await?;
        log::info!("User {} removed {} from group {}", actor.sub, member_id, group.id);
        Ok(())
    }

    pub async fn delete(&self, actor: &Claims, group_id: &str) -> AppResult<()> {
        let group = self.find(group_id).await?;
        require_owner_or_admin(actor, &group.created_by)?;

        if !self.groups.delete(&group.id).await? {
            return Err(AppError::NotFound("Group not found".to_string()));
        }
        log::info!("User {} deleted group {}", actor.sub, group.id);
        Ok(())
    }

    async fn find(&self, group_id: &str) -> AppResult<Group> {
        self.groups
            .find_by_id(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))
    }

    async fn to_dto(&self, group: Group) -> AppResult<GroupDto> {
        let mut dtos = self.to_dtos(vec![group]).await?;
        dtos.pop()
            .ok_or_else(|| AppError::InternalError("Group lost while resolving members".to_string()))
    }

    async fn to_dtos(&self, groups: Vec<Group>) -> AppResult<Vec<GroupDto>> {
        let user_ids: Vec<String> = groups
            .iter()
            .flat_map(|g| std::iter::once(&g.created_by).chain(g.members.iter()))
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let users = self.users.find_by_ids(&user_ids).await?;

        Ok(groups
            .into_iter()
            .map(|group| GroupDto::from_group(group, &users))
            .collect())
    }
}
