use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use quip_db::Database;
use quip_types::api::{LoginActionData, LoginFieldErrors, LoginFields, LoginForm, LoginPage};

use crate::error::{ApiError, bad_request};
use crate::session;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

/// Destinations a login may bounce back to. Anything else resolves to the
/// jokes listing.
const REDIRECT_ALLOW_LIST: [&str; 3] = ["/jokes", "/", "https://remux.run"];

fn validate_username(username: &str) -> Option<String> {
    (username.len() < 3).then(|| "Usernames must be at least 3 characters long".to_string())
}

fn validate_password(password: &str) -> Option<String> {
    (password.len() < 6).then(|| "Passwords must be at least 6 characters long".to_string())
}

fn validate_url(url: &str) -> String {
    if REDIRECT_ALLOW_LIST.contains(&url) {
        url.to_string()
    } else {
        "/jokes".to_string()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

/// GET /login — page view model; the `redirectTo` search param feeds the
/// hidden form field.
pub async fn get_login(Query(query): Query<LoginQuery>) -> Json<LoginPage> {
    Json(LoginPage {
        redirect_to: query.redirect_to,
    })
}

/// POST /login — handles both login and registration, demultiplexed on the
/// `loginType` field. Validation problems come back as action data with
/// status 400 so the form re-renders with the submitted values; only a
/// malformed request shape or an internal failure is thrown.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let redirect_to = validate_url(form.redirect_to.as_deref().unwrap_or("/jokes"));

    let (Some(login_type), Some(username), Some(password)) =
        (form.login_type, form.username, form.password)
    else {
        return Ok(bad_request(LoginActionData {
            form_error: Some("Form not submitted correctly.".to_string()),
            ..Default::default()
        }));
    };

    // Echoed back verbatim, password included, so the form can re-render as
    // submitted. Matches the upstream behavior; see DESIGN.md.
    let fields = LoginFields {
        login_type: login_type.clone(),
        username: username.clone(),
        password: password.clone(),
    };

    let field_errors = LoginFieldErrors {
        username: validate_username(&username),
        password: validate_password(&password),
    };
    if field_errors.username.is_some() || field_errors.password.is_some() {
        return Ok(bad_request(LoginActionData {
            field_errors: Some(field_errors),
            fields: Some(fields),
            ..Default::default()
        }));
    }

    match login_type.as_str() {
        "login" => {
            let Some(user) = session::login(&state.db, &username, &password)? else {
                return Ok(bad_request(LoginActionData {
                    fields: Some(fields),
                    form_error: Some("Username/Password combination is incorrect".to_string()),
                    ..Default::default()
                }));
            };

            let (jar, redirect) =
                session::create_user_session(jar, &state.jwt_secret, &user, &redirect_to)?;
            Ok((jar, redirect).into_response())
        }

        "register" => {
            if state.db.get_user_by_username(&username)?.is_some() {
                return Ok(bad_request(LoginActionData {
                    fields: Some(fields),
                    form_error: Some(format!("User with username {username} already exists")),
                    ..Default::default()
                }));
            }

            let Some(user) = session::register(&state.db, &username, &password)? else {
                return Ok(bad_request(LoginActionData {
                    fields: Some(fields),
                    form_error: Some(
                        "Something went wrong trying to create a new user.".to_string(),
                    ),
                    ..Default::default()
                }));
            };

            let (jar, redirect) =
                session::create_user_session(jar, &state.jwt_secret, &user, &redirect_to)?;
            Ok((jar, redirect).into_response())
        }

        _ => Ok(bad_request(LoginActionData {
            fields: Some(fields),
            form_error: Some("Login type invalid".to_string()),
            ..Default::default()
        })),
    }
}

/// POST /logout — destroy the session and go home. A POST (not a GET) so the
/// logout button is a form submission rather than a crawlable link.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (session::destroy_session(jar), Redirect::to("/"))
}

/// GET /logout — in case someone lands here by navigation, just send them
/// home without touching the session.
pub async fn get_logout() -> Redirect {
    Redirect::to("/")
}
