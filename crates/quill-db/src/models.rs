/// Database row types — these map directly to SQLite rows.
/// Distinct from the quill-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct LetterRow {
    pub id: String,
    pub text: String,
    pub ambit: Option<String>,
    pub receiver: String,
    pub receiver_email: Option<String>,
    pub creator: String,
    pub challenge: Option<String>,
    pub votes: Option<i64>,
    pub last_letter: Option<String>,
    pub next_letter: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub text: String,
    pub creator: String,
    pub creator_username: String,
    pub letter: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ChallengeRow {
    pub id: String,
    pub genre: String,
    pub objective: String,
    pub creator: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct StoryRow {
    pub id: String,
    pub genre: String,
    pub text: String,
    pub creator: String,
    pub challenge: Option<String>,
    pub last_story: Option<String>,
    /// Populated from the referenced challenge when present.
    pub challenge_objective: Option<String>,
    pub created_at: String,
}
