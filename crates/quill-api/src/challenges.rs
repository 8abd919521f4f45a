use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use quill_db::models::{ChallengeRow, StoryRow};
use quill_types::api::{
    ChallengeDetailResponse, ChallengeResponse, Claims, CreateChallengeRequest, CreateStoryRequest,
    MyChallengesResponse, StoryResponse,
};

use crate::auth::AppState;
use crate::convert::{opt_uuid_field, timestamp_field, uuid_field};
use crate::error::{ApiError, parse_id};
use crate::order::reverse_for_display;
use crate::search;

#[derive(Debug, Deserialize)]
pub struct GenreFilter {
    pub genre: Option<String>,
}

impl GenreFilter {
    /// "All" and absent both mean unfiltered.
    fn as_filter(&self) -> Option<&str> {
        match self.genre.as_deref() {
            None | Some("All") => None,
            Some(genre) => Some(genre),
        }
    }
}

pub(crate) fn challenge_response(row: ChallengeRow) -> ChallengeResponse {
    ChallengeResponse {
        id: uuid_field(&row.id, "challenge id"),
        genre: row.genre,
        objective: row.objective,
        creator_id: uuid_field(&row.creator, "challenge creator"),
        created_at: timestamp_field(&row.created_at),
    }
}

fn story_response(row: StoryRow) -> StoryResponse {
    StoryResponse {
        id: uuid_field(&row.id, "story id"),
        genre: row.genre,
        text: row.text,
        creator_id: uuid_field(&row.creator, "story creator"),
        challenge_id: opt_uuid_field(row.challenge.as_deref(), "story challenge"),
        challenge_objective: row.challenge_objective,
        created_at: timestamp_field(&row.created_at),
    }
}

pub async fn list_challenges(
    State(state): State<AppState>,
    Query(filter): Query<GenreFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let challenges = reverse_for_display(&state.db.list_challenges(filter.as_filter())?);
    let challenges: Vec<ChallengeResponse> =
        challenges.into_iter().map(challenge_response).collect();
    Ok(Json(challenges))
}

/// Free-text search over challenges; a blank term falls back to the full
/// listing instead of reaching the aggregator.
pub async fn search_challenges(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let challenges = if term.trim().is_empty() {
        reverse_for_display(&state.db.list_challenges(None)?)
    } else {
        search::search_challenges(&state.db, &term)?
    };
    let challenges: Vec<ChallengeResponse> =
        challenges.into_iter().map(challenge_response).collect();
    Ok(Json(challenges))
}

pub async fn create_challenge(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateChallengeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.objective.is_empty() {
        return Err(ApiError::validation("fill the field"));
    }

    let id = Uuid::new_v4().to_string();
    state
        .db
        .insert_challenge(&id, &req.genre, &req.objective, &claims.sub.to_string())?;

    let challenge = state
        .db
        .get_challenge(&id)?
        .ok_or_else(|| ApiError::Store(anyhow::anyhow!("challenge missing after insert")))?;
    Ok((StatusCode::CREATED, Json(challenge_response(challenge))))
}

/// Everything this user brought into the challenge system: chain-head stories
/// entered into challenges, plus challenges they authored. Both lists are
/// reversed independently.
pub async fn my_challenges(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(filter): Query<GenreFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let creator = claims.sub.to_string();
    let genre = filter.as_filter();

    let stories = reverse_for_display(&state.db.list_my_challenge_stories(&creator, genre)?);
    let challenges = reverse_for_display(&state.db.find_challenges_by_creator(&creator, genre)?);

    Ok(Json(MyChallengesResponse {
        stories: stories.into_iter().map(story_response).collect(),
        challenges: challenges.into_iter().map(challenge_response).collect(),
    }))
}

pub async fn challenge_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let challenge = state
        .db
        .get_challenge(&id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let creator_username = state
        .db
        .get_user_by_id(&challenge.creator)?
        .map(|u| u.username)
        .unwrap_or_else(|| "unknown".to_string());

    let stories = state
        .db
        .list_stories_for_challenge(&challenge.id)?
        .into_iter()
        .map(story_response)
        .collect();

    Ok(Json(ChallengeDetailResponse {
        challenge: challenge_response(challenge),
        creator_username,
        stories,
    }))
}

pub async fn create_story(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<CreateStoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let challenge = state
        .db
        .get_challenge(&id.to_string())?
        .ok_or(ApiError::NotFound)?;

    if req.genre.is_empty() || req.text.is_empty() {
        return Err(ApiError::validation("fill all the fields"));
    }

    let story_id = Uuid::new_v4().to_string();
    state.db.insert_story(
        &story_id,
        &req.genre,
        &req.text,
        &claims.sub.to_string(),
        Some(&challenge.id),
    )?;

    Ok(StatusCode::CREATED)
}
