use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims shared between the REST middleware and the auth handlers.
/// Canonical definition lives here in quill-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Letters --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateLetterRequest {
    pub text: String,
    pub ambit: String,
    pub receiver: Option<String>,
    pub receiver_email: Option<String>,
    /// Entering the letter into a challenge opens it for voting.
    pub challenge: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditLetterRequest {
    pub text: String,
    pub receiver: String,
    pub receiver_email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContinueLetterRequest {
    pub text: String,
    pub receiver: String,
    pub receiver_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LetterResponse {
    pub id: Uuid,
    pub text: String,
    pub ambit: Option<String>,
    pub receiver: String,
    pub receiver_email: Option<String>,
    pub creator_id: Uuid,
    pub challenge_id: Option<Uuid>,
    pub votes: Option<i64>,
    pub last_letter: Option<Uuid>,
    pub next_letter: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LetterDetailResponse {
    pub letter: LetterResponse,
    pub creator_username: String,
    pub is_creator: bool,
    pub comments: Vec<CommentResponse>,
    pub challenge: Option<ChallengeResponse>,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub text: String,
    pub creator_id: Uuid,
    pub creator_username: String,
    pub created_at: DateTime<Utc>,
}

// -- Challenges --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChallengeRequest {
    pub genre: String,
    pub objective: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChallengeResponse {
    pub id: Uuid,
    pub genre: String,
    pub objective: String,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ChallengeDetailResponse {
    pub challenge: ChallengeResponse,
    pub creator_username: String,
    pub stories: Vec<StoryResponse>,
}

#[derive(Debug, Serialize)]
pub struct MyChallengesResponse {
    pub stories: Vec<StoryResponse>,
    pub challenges: Vec<ChallengeResponse>,
}

// -- Stories --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateStoryRequest {
    pub genre: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryResponse {
    pub id: Uuid,
    pub genre: String,
    pub text: String,
    pub creator_id: Uuid,
    pub challenge_id: Option<Uuid>,
    pub challenge_objective: Option<String>,
    pub created_at: DateTime<Utc>,
}

// -- Account --

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAccountRequest {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub confirmed_password: Option<String>,
}
