//! User onboarding routes.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use serde_json::json;
use tracing::info;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/users/me/provision", post(provision))
}

/// POST `/users/me/provision` - Create the default account and copy the
/// system categories for the caller. Safe to call more than once.
async fn provision(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.accounts.provision_user(auth.user_id()).await?;
    info!(
        user_id = %auth.user_id(),
        account_created = outcome.account.is_some(),
        categories_cloned = outcome.categories_cloned,
        "User provisioned"
    );

    Ok(Json(json!({
        "account": outcome.account,
        "categories_cloned": outcome.categories_cloned,
    })))
}
