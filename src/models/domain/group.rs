use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Join and access codes avoid characters that are easy to misread (0/O, 1/I).
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 7;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub code: String,
    pub created_by: String,
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Group {
    /// The owner is the first member.
    pub fn new(name: &str, code: &str, created_by: &str) -> Self {
        Group {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            code: code.to_string(),
            created_by: created_by.to_string(),
            members: vec![created_by.to_string()],
            created_at: Some(Utc::now()),
        }
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }
}

pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Codes are matched case-insensitively and ignore surrounding whitespace.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
