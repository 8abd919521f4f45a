use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use quill_db::models::{CommentRow, LetterRow};
use quill_types::api::{
    Claims, CommentResponse, ContinueLetterRequest, CreateCommentRequest, CreateLetterRequest,
    EditLetterRequest, LetterDetailResponse, LetterResponse,
};

use crate::auth::AppState;
use crate::chain;
use crate::convert::{opt_uuid_field, timestamp_field, uuid_field};
use crate::error::{ApiError, parse_id};
use crate::order::reverse_for_display;
use crate::ownership;

fn letter_response(row: LetterRow) -> LetterResponse {
    LetterResponse {
        id: uuid_field(&row.id, "letter id"),
        text: row.text,
        ambit: row.ambit,
        receiver: row.receiver,
        receiver_email: row.receiver_email,
        creator_id: uuid_field(&row.creator, "letter creator"),
        challenge_id: opt_uuid_field(row.challenge.as_deref(), "letter challenge"),
        votes: row.votes,
        last_letter: opt_uuid_field(row.last_letter.as_deref(), "last_letter"),
        next_letter: opt_uuid_field(row.next_letter.as_deref(), "next_letter"),
        created_at: timestamp_field(&row.created_at),
    }
}

fn comment_response(row: CommentRow) -> CommentResponse {
    CommentResponse {
        id: uuid_field(&row.id, "comment id"),
        text: row.text,
        creator_id: uuid_field(&row.creator, "comment creator"),
        creator_username: row.creator_username,
        created_at: timestamp_field(&row.created_at),
    }
}

/// Public listing: chain heads only, newest first.
pub async fn list_letters(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let letters = reverse_for_display(&state.db.list_chain_heads()?);
    let letters: Vec<LetterResponse> = letters.into_iter().map(letter_response).collect();
    Ok(Json(letters))
}

pub async fn my_letters(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let letters =
        reverse_for_display(&state.db.list_chain_heads_by_creator(&claims.sub.to_string())?);
    let letters: Vec<LetterResponse> = letters.into_iter().map(letter_response).collect();
    Ok(Json(letters))
}

pub async fn create_letter(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateLetterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.text.is_empty() || req.ambit.is_empty() {
        return Err(ApiError::validation("fill all the fields"));
    }

    // A missing receiver is stored under a placeholder name, not rejected.
    let receiver = match req.receiver.as_deref() {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => "Unknown".to_string(),
    };

    // Entering a challenge opens the letter for voting.
    let (challenge, votes) = match req.challenge {
        Some(challenge_id) => (Some(challenge_id.to_string()), Some(0)),
        None => (None, None),
    };

    let id = Uuid::new_v4().to_string();
    state.db.insert_letter(
        &id,
        &req.text,
        Some(&req.ambit),
        &receiver,
        req.receiver_email.as_deref(),
        &claims.sub.to_string(),
        challenge.as_deref(),
        votes,
        None,
    )?;

    let letter = state
        .db
        .get_letter(&id)?
        .ok_or_else(|| ApiError::Store(anyhow::anyhow!("letter missing after insert")))?;
    Ok((StatusCode::CREATED, Json(letter_response(letter))))
}

pub async fn letter_detail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let letter = state
        .db
        .get_letter(&id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let creator_username = state
        .db
        .get_user_by_id(&letter.creator)?
        .map(|u| u.username)
        .unwrap_or_else(|| "unknown".to_string());

    let comments = state
        .db
        .get_comments_for_letter(&letter.id)?
        .into_iter()
        .map(comment_response)
        .collect();

    let challenge = match &letter.challenge {
        Some(challenge_id) => state
            .db
            .get_challenge(challenge_id)?
            .map(crate::challenges::challenge_response),
        None => None,
    };

    let is_creator = ownership::authorize(&claims.sub, Some(&letter));

    Ok(Json(LetterDetailResponse {
        letter: letter_response(letter),
        creator_username,
        is_creator,
        comments,
        challenge,
    }))
}

pub async fn edit_letter(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<EditLetterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let letter = ownership::require(&claims.sub, state.db.get_letter(&id.to_string())?)?;

    if req.text.is_empty() || req.receiver.is_empty() {
        return Err(ApiError::validation("fill all the fields"));
    }

    state
        .db
        .update_letter(&letter.id, &req.text, &req.receiver, req.receiver_email.as_deref())?;

    let updated = state
        .db
        .get_letter(&letter.id)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(letter_response(updated)))
}

pub async fn delete_letter(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let letter = ownership::require(&claims.sub, state.db.get_letter(&id.to_string())?)?;

    state.db.delete_letter(&letter.id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn continue_letter(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<ContinueLetterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let original = ownership::require(&claims.sub, state.db.get_letter(&id.to_string())?)?;

    if req.text.is_empty() || req.receiver.is_empty() {
        return Err(ApiError::validation("fill all the fields"));
    }

    let letter = chain::continue_letter(&state.db, claims.sub, &original.id, &req)?;
    Ok((StatusCode::CREATED, Json(letter_response(letter))))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    if req.text.is_empty() {
        return Err(ApiError::validation("fill the field"));
    }
    let letter = state
        .db
        .get_letter(&id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let comment_id = Uuid::new_v4().to_string();
    state
        .db
        .insert_comment(&comment_id, &req.text, &claims.sub.to_string(), &letter.id)?;

    Ok(StatusCode::CREATED)
}

pub async fn vote(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let letter = state
        .db
        .get_letter(&id.to_string())?
        .ok_or(ApiError::NotFound)?;

    // Only challenge entries carry a vote count.
    if letter.challenge.is_none() || letter.votes.is_none() {
        return Err(ApiError::validation("only challenge entries can be voted on"));
    }

    match state.db.cast_vote(&claims.sub.to_string(), &letter.id)? {
        Some(votes) => Ok(Json(serde_json::json!({ "votes": votes }))),
        None => Err(ApiError::validation("you already voted on this letter")),
    }
}

pub async fn favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let letter = state
        .db
        .get_letter(&id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let added = state.db.toggle_favorite(&claims.sub.to_string(), &letter.id)?;
    Ok(Json(serde_json::json!({ "added": added })))
}
