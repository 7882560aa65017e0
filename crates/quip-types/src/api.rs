use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Joke, User};

// -- Session claims --

/// Signed into the session cookie by quip-api. Canonical definition lives
/// here in quip-types so the token and the handlers agree on one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Login / registration --

/// The login form wire contract. Field names are exact: `loginType`,
/// `username`, `password`, `redirectTo`. Fields are optional so a malformed
/// submission reaches the handler and gets a form-level error rather than an
/// extractor rejection; unknown fields are still rejected outright.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginForm {
    pub login_type: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub redirect_to: Option<String>,
}

/// Submitted values echoed back so the form view can re-render them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginFields {
    pub login_type: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Serialize)]
pub struct LoginFieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Action-local validation outcome for the login action, returned as data
/// with status 400 rather than thrown.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginActionData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<LoginFieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<LoginFields>,
}

/// View model for the login page loader: the `redirectTo` search param, if
/// any, feeds the hidden form field.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPage {
    pub redirect_to: Option<String>,
}

// -- Jokes --

/// Form posted to a joke's detail URL. The only supported `_method` is
/// "delete"; anything else is a bad request.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteJokeForm {
    #[serde(rename = "_method")]
    pub method: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewJokeForm {
    pub name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JokeFields {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Default, Serialize)]
pub struct JokeFieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JokeActionData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<JokeFieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<JokeFields>,
}

/// Detail loader view model: the joke plus whether the requesting session
/// owns it (drives the delete button in the view).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JokeDetail {
    pub joke: Joke,
    pub is_owner: bool,
}

#[derive(Debug, Serialize)]
pub struct JokeListItem {
    pub id: Uuid,
    pub name: String,
}

/// Listing loader view model: recent joke headers plus the current user for
/// the page chrome.
#[derive(Debug, Serialize)]
pub struct JokesList {
    pub jokes: Vec<JokeListItem>,
    pub user: Option<User>,
}
