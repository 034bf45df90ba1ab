//! Category routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use fintrack_core::ledger::Polarity;
use fintrack_db::repositories::{CreateCategoryInput, UpdateCategoryInput};
use fintrack_shared::types::{CategoryId, query::parse_opt};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    AppState,
    error::ApiError,
    extractors::{IdPath, ValidatedJson},
    middleware::AuthUser,
};

/// Creates the category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

/// Query parameters for listing categories.
#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    /// `income` or `expense`; anything else lists both.
    #[serde(rename = "type")]
    pub polarity: Option<String>,
}

/// Request body for creating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    /// Name, unique per owner and type.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub polarity: Polarity,
    /// Display icon.
    #[serde(default)]
    #[validate(length(max = 50))]
    pub icon: String,
    /// Display color.
    #[validate(length(min = 1, max = 20))]
    pub color: String,
}

/// Request body for editing a category. The type cannot change.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    /// New name.
    #[validate(length(max = 100))]
    pub name: Option<String>,
    /// New icon.
    #[validate(length(max = 50))]
    pub icon: Option<String>,
    /// New color.
    #[validate(length(max = 20))]
    pub color: Option<String>,
}

/// GET `/categories` - Own and system categories.
async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let polarity = parse_opt::<Polarity>(query.polarity.as_deref());
    let categories = state
        .categories
        .list_categories(auth.user_id(), polarity)
        .await?;

    Ok(Json(json!({
        "count": categories.len(),
        "categories": categories,
    })))
}

/// POST `/categories` - Create a category.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateCategoryInput {
        name: payload.name,
        polarity: payload.polarity,
        icon: payload.icon,
        color: payload.color,
    };
    let category = state.categories.create_category(auth.user_id(), input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "category": category }))))
}

/// GET `/categories/{id}` - Get one category.
async fn get_category(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath<CategoryId>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.categories.get_category(auth.user_id(), id).await?;
    Ok(Json(json!({ "category": category })))
}

/// PUT `/categories/{id}` - Rename or restyle a category.
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath<CategoryId>,
    ValidatedJson(payload): ValidatedJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateCategoryInput {
        name: payload.name,
        icon: payload.icon,
        color: payload.color,
    };
    let category = state
        .categories
        .update_category(auth.user_id(), id, input)
        .await?;
    Ok(Json(json!({ "category": category })))
}

/// DELETE `/categories/{id}` - Delete an unused, non-system category.
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath<CategoryId>,
) -> Result<impl IntoResponse, ApiError> {
    state.categories.delete_category(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
