use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, warn};
use uuid::Uuid;

use quip_db::models::JokeRow;
use quip_types::api::{
    DeleteJokeForm, JokeActionData, JokeDetail, JokeFieldErrors, JokeFields, JokeListItem,
    JokesList, NewJokeForm,
};
use quip_types::models::Joke;

use crate::auth::AppState;
use crate::error::{ApiError, bad_request};
use crate::session;

#[derive(Debug, Deserialize)]
pub struct JokesQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

fn validate_joke_name(name: &str) -> Option<String> {
    (name.len() < 3).then(|| "That joke's name is too short".to_string())
}

fn validate_joke_content(content: &str) -> Option<String> {
    (content.len() < 10).then(|| "That joke is too short".to_string())
}

/// GET /jokes — recent joke headers plus the current user (if any) for the
/// page chrome. Anonymous visitors see the same list.
pub async fn get_jokes(
    State(state): State<AppState>,
    Query(query): Query<JokesQuery>,
    jar: CookieJar,
) -> Result<Json<JokesList>, ApiError> {
    let user = match session::get_user_id(&jar, &state.jwt_secret) {
        Some(user_id) => state
            .db
            .get_user_by_id(&user_id.to_string())?
            .map(session::user_from_row)
            .transpose()?,
        None => None,
    };

    // Run the blocking listing query off the async runtime
    let db = state.clone();
    let limit = query.limit.min(200);

    let rows = tokio::task::spawn_blocking(move || db.db.list_jokes(limit))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("An error occurred while processing your request")
        })??;

    let jokes = rows
        .into_iter()
        .map(|row| JokeListItem {
            id: row.id.parse().unwrap_or_else(|e| {
                warn!("Corrupt joke id '{}': {}", row.id, e);
                Uuid::default()
            }),
            name: row.name,
        })
        .collect();

    Ok(Json(JokesList { jokes, user }))
}

/// GET /jokes/random — one joke at random, for the jokes landing view.
pub async fn random_joke(State(state): State<AppState>) -> Result<Json<Joke>, ApiError> {
    let Some(row) = state.db.random_joke()? else {
        return Err(ApiError::not_found("No jokes to tell yet"));
    };

    Ok(Json(joke_from_row(row)))
}

/// GET /jokes/{joke_id} — detail loader. Works anonymously; `is_owner` is
/// simply false without a session.
pub async fn get_joke(
    State(state): State<AppState>,
    Path(joke_id): Path<String>,
    jar: CookieJar,
) -> Result<Json<JokeDetail>, ApiError> {
    let user_id = session::get_user_id(&jar, &state.jwt_secret);

    let Some(row) = state.db.get_joke(&joke_id)? else {
        return Err(ApiError::not_found(format!(
            "What a joke! No joke found with id {joke_id}."
        )));
    };

    let is_owner = user_id.is_some_and(|uid| uid.to_string() == row.jokester_id);

    Ok(Json(JokeDetail {
        joke: joke_from_row(row),
        is_owner,
    }))
}

/// POST /jokes/{joke_id} — delete action. The form must carry
/// `_method=delete`; the method check comes first so an unsupported method is
/// rejected before any session or ownership work.
pub async fn delete_joke(
    State(state): State<AppState>,
    Path(joke_id): Path<String>,
    jar: CookieJar,
    Form(form): Form<DeleteJokeForm>,
) -> Result<Redirect, ApiError> {
    let method = form.method.as_deref().unwrap_or("");
    if method != "delete" {
        return Err(ApiError::bad_request(format!(
            "The _method {method} is not supported"
        )));
    }

    let user_id = session::require_user_id(&jar, &state.jwt_secret, &format!("/jokes/{joke_id}"))?;

    let Some(row) = state.db.get_joke(&joke_id)? else {
        return Err(ApiError::not_found("Can't delete what does not exist"));
    };

    if row.jokester_id != user_id.to_string() {
        return Err(ApiError::unauthorized("Nice try. That's not your joke"));
    }

    state.db.delete_joke(&joke_id)?;

    Ok(Redirect::to("/jokes"))
}

/// POST /jokes — create action. Requires a session; validation problems come
/// back as action data with the submitted values preserved.
pub async fn create_joke(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<NewJokeForm>,
) -> Result<Response, ApiError> {
    let user_id = session::require_user_id(&jar, &state.jwt_secret, "/jokes")?;

    let (Some(name), Some(content)) = (form.name, form.content) else {
        return Ok(bad_request(JokeActionData {
            form_error: Some("Form not submitted correctly.".to_string()),
            ..Default::default()
        }));
    };

    let field_errors = JokeFieldErrors {
        name: validate_joke_name(&name),
        content: validate_joke_content(&content),
    };
    if field_errors.name.is_some() || field_errors.content.is_some() {
        return Ok(bad_request(JokeActionData {
            field_errors: Some(field_errors),
            fields: Some(JokeFields { name, content }),
            ..Default::default()
        }));
    }

    let joke_id = Uuid::new_v4();

    state
        .db
        .create_joke(&joke_id.to_string(), &name, &content, &user_id.to_string())?;

    Ok(Redirect::to(&format!("/jokes/{joke_id}")).into_response())
}

fn joke_from_row(row: JokeRow) -> Joke {
    Joke {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt joke id '{}': {}", row.id, e);
            Uuid::default()
        }),
        jokester_id: row.jokester_id.parse().unwrap_or_else(|e| {
            warn!("Corrupt jokester_id '{}' on joke '{}': {}", row.jokester_id, row.id, e);
            Uuid::default()
        }),
        created_at: crate::parse_timestamp(&row.created_at, &row.id),
        name: row.name,
        content: row.content,
    }
}
