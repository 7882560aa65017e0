use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use quip_api::auth::{self, AppState};
use quip_api::jokes;

/// Build the full application router. Auth is per-handler via the session
/// module rather than a router layer: the joke detail loader serves anonymous
/// requests while its delete action does not.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/login", get(auth::get_login).post(auth::login))
        .route("/logout", get(auth::get_logout).post(auth::logout))
        .route("/jokes", get(jokes::get_jokes).post(jokes::create_joke))
        .route("/jokes/random", get(jokes::random_joke))
        .route("/jokes/{joke_id}", get(jokes::get_joke).post(jokes::delete_joke))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "quip",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
