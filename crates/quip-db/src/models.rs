/// Database row types — these map directly to SQLite rows.
/// Distinct from the quip-types view models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct JokeRow {
    pub id: String,
    pub name: String,
    pub content: String,
    pub jokester_id: String,
    pub created_at: String,
}

/// Listing projection: the jokes index only needs headers.
pub struct JokeHeaderRow {
    pub id: String,
    pub name: String,
}
