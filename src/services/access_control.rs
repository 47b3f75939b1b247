use sha2::{Digest, Sha256};

use crate::{
    auth::Claims,
    errors::{AppError, AppResult},
    models::domain::{group::normalize_code, AccessType, Quiz},
    repositories::GroupRepository,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(String),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }

    /// Turns a denial into `Forbidden` so handlers can use `?`.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny(reason) => Err(AppError::Forbidden(reason)),
        }
    }
}

/// Decides whether `actor` may view or attempt `quiz`.
///
/// `member_group_ids` are the groups the actor belongs to and `supplied_code` is
/// whatever code the client sent, raw. The same function runs when a quiz is
/// fetched and when it is submitted.
pub fn resolve_access(
    actor: &Claims,
    quiz: &Quiz,
    member_group_ids: &[String],
    supplied_code: Option<&str>,
) -> AccessDecision {
    if actor.role.is_admin() || (actor.role.is_staff() && quiz.is_owned_by(&actor.sub)) {
        return AccessDecision::Allow;
    }

    match quiz.access_type {
        AccessType::Global => AccessDecision::Allow,
        AccessType::Group => match &quiz.group_id {
            Some(group_id) if member_group_ids.iter().any(|g| g == group_id) => {
                AccessDecision::Allow
            }
            _ => AccessDecision::Deny("Access denied".to_string()),
        },
        AccessType::Code => match (supplied_code, &quiz.access_code_hash) {
            (Some(code), Some(expected)) if code_matches(code, expected) => AccessDecision::Allow,
            (None, _) => AccessDecision::Deny("Access code required".to_string()),
            _ => AccessDecision::Deny("Access denied".to_string()),
        },
    }
}

/// Runs the resolver for `actor`, looking up group membership only when the quiz needs it.
pub async fn authorize_quiz(
    groups: &dyn GroupRepository,
    actor: &Claims,
    quiz: &Quiz,
    supplied_code: Option<&str>,
) -> AppResult<()> {
    let member_group_ids = match quiz.access_type {
        AccessType::Group => groups.group_ids_for_member(&actor.sub).await?,
        AccessType::Global | AccessType::Code => vec![],
    };

    let decision = resolve_access(actor, quiz, &member_group_ids, supplied_code);
    if let AccessDecision::Deny(reason) = &decision {
        log::warn!("User {} denied access to quiz {}: {}", actor.sub, quiz.id, reason);
    }
    decision.into_result()
}

/// Hash stored alongside code-restricted quizzes.
pub fn hash_access_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_code(code).as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn code_matches(supplied: &str, expected_hash: &str) -> bool {
    constant_time_eq(hash_access_code(supplied).as_bytes(), expected_hash.as_bytes())
}

pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
