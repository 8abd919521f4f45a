use axum::{Extension, Json, extract::State, response::IntoResponse};

use quill_types::api::{AccountResponse, Claims, UpdateAccountRequest};

use crate::auth::{AppState, hash_password};
use crate::convert::uuid_field;
use crate::error::ApiError;

pub async fn get_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(AccountResponse {
        id: uuid_field(&user.id, "user id"),
        username: user.username,
        email: user.email,
    }))
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor_id = claims.sub.to_string();

    if req.username.is_empty() || req.email.is_empty() {
        return Err(ApiError::validation("fill all the fields"));
    }

    // Uniqueness checks tolerate the user's own current values.
    if let Some(existing) = state.db.get_user_by_username(&req.username)? {
        if existing.id != actor_id {
            return Err(ApiError::validation("this username is taken"));
        }
    }
    if let Some(existing) = state.db.get_user_by_email(&req.email)? {
        if existing.id != actor_id {
            return Err(ApiError::validation("there is an account with this email"));
        }
    }

    let current = state
        .db
        .get_user_by_id(&actor_id)?
        .ok_or(ApiError::NotFound)?;

    // Blank password keeps the current credential; a new one must be
    // confirmed before it is rehashed.
    let password = match req.password.as_deref() {
        None | Some("") => current.password,
        Some(new_password) => {
            if req.confirmed_password.as_deref() != Some(new_password) {
                return Err(ApiError::validation("the password fields do not match"));
            }
            hash_password(new_password)?
        }
    };

    state
        .db
        .update_user(&actor_id, &req.username, &req.email, &password)?;

    Ok(Json(serde_json::json!({
        "message": "the changes have been done successfully"
    })))
}
