//! JSON REST API for Rota.
//!
//! Exposes an axum [`Router`] driving a [`ReviewEngine`] over any
//! [`RotaStore`]. Request validation happens here; everything past it is the
//! engine's business. TLS and request tracing are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = rota_api::api_router(Arc::new(ReviewEngine::new(store)));
//! ```

pub mod error;
pub mod pull_requests;
pub mod stats;
pub mod teams;
pub mod users;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use rota_core::{ReviewEngine, store::RotaStore};
use serde_json::{Value, json};

pub use error::ApiError;

/// Build the full router: `/health` plus every `/api` route.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<ReviewEngine<S>>) -> Router<()>
where
  S: RotaStore + 'static,
{
  let api = Router::new()
    // Teams
    .route("/team/add", post(teams::create::<S>))
    .route("/team/get", get(teams::get_one::<S>))
    // Users
    .route("/users/setIsActive", post(users::set_active::<S>))
    .route("/users/getReview", get(users::reviews::<S>))
    .route("/users/bulkDeactivate", post(users::bulk_deactivate::<S>))
    // Pull requests
    .route("/pullRequest/create", post(pull_requests::create::<S>))
    .route("/pullRequest/merge", post(pull_requests::merge::<S>))
    .route("/pullRequest/reassign", post(pull_requests::reassign::<S>))
    // Stats
    .route("/stats/assignments/by-user", get(stats::by_user::<S>))
    .route("/stats/assignments/by-pr", get(stats::by_pull_request::<S>));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .with_state(engine)
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "OK" })) }

#[cfg(test)]
mod tests;
