use anyhow::{Context, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use quip_db::Database;
use quip_db::models::UserRow;
use quip_types::api::Claims;
use quip_types::models::User;

use crate::error::ApiError;

/// Name of the session cookie. Its value is a signed token; the session is
/// derived state, `(raw cookie value) -> Option<user id>`, with no
/// server-side session table.
pub const SESSION_COOKIE: &str = "quip_session";

const SESSION_DAYS: i64 = 30;

pub fn mint_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Tampered, expired, or otherwise undecodable tokens all come back as None;
/// the request simply proceeds anonymously.
pub fn verify_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

pub fn get_user_id(jar: &CookieJar, secret: &str) -> Option<Uuid> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    verify_token(secret, &token).map(|claims| claims.sub)
}

/// Like [`get_user_id`], but an absent session answers the request with a
/// redirect to the login page carrying `redirect_to` as the way back.
pub fn require_user_id(jar: &CookieJar, secret: &str, redirect_to: &str) -> Result<Uuid, ApiError> {
    get_user_id(jar, secret).ok_or_else(|| ApiError::LoginRequired {
        redirect_to: redirect_to.to_string(),
    })
}

/// Verify credentials against the stored Argon2 hash. Unknown username and
/// wrong password are indistinguishable to the caller.
pub fn login(db: &Database, username: &str, password: &str) -> anyhow::Result<Option<User>> {
    let Some(row) = db.get_user_by_username(username)? else {
        return Ok(None);
    };

    let parsed_hash = PasswordHash::new(&row.password)
        .map_err(|e| anyhow!("stored hash for '{}' is unreadable: {}", row.username, e))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Ok(None);
    }

    user_from_row(row).map(Some)
}

/// Hash the password with Argon2id and create the user. Uniqueness of the
/// username is checked by the caller first; the DB constraint still backstops
/// races.
pub fn register(db: &Database, username: &str, password: &str) -> anyhow::Result<Option<User>> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4();

    db.create_user(&user_id.to_string(), username, &password_hash)?;

    db.get_user_by_id(&user_id.to_string())?
        .map(user_from_row)
        .transpose()
}

/// Issue the session cookie and redirect to the (already validated)
/// destination.
pub fn create_user_session(
    jar: CookieJar,
    secret: &str,
    user: &User,
    redirect_to: &str,
) -> anyhow::Result<(CookieJar, Redirect)> {
    let token = mint_token(secret, user.id, &user.username)?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Redirect::to(redirect_to)))
}

/// Clear the session cookie. Subsequent requests carry no session.
pub fn destroy_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
}

pub(crate) fn user_from_row(row: UserRow) -> anyhow::Result<User> {
    let id: Uuid = row
        .id
        .parse()
        .with_context(|| format!("corrupt user id '{}'", row.id))?;

    Ok(User {
        id,
        created_at: crate::parse_timestamp(&row.created_at, &row.id),
        username: row.username,
    })
}
