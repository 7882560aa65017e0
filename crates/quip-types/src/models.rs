use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user, as exposed to views. The stored password hash never
/// leaves quip-db.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Joke {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub jokester_id: Uuid,
    pub created_at: DateTime<Utc>,
}
