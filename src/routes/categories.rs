//! Category API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::annotations::HighlightCategory;
use crate::error::Result;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/documents/:id/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/documents/:id/categories/:cid",
            patch(update_category).delete(delete_category),
        )
        .route("/documents/:id/active-category", put(set_active_category))
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<HighlightCategory>,
    pub active: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub color: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub id: String,
}

async fn list_categories(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryListResponse>> {
    let session = state.session(&id).await?;
    let session = session.lock().await;
    let registry = session.categories();
    Ok(Json(CategoryListResponse {
        categories: registry.list().to_vec(),
        active: registry.active_id().to_string(),
    }))
}

async fn create_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<HighlightCategory>)> {
    let session = state.session(&id).await?;
    let category = session.lock().await.categories_mut().add(
        &request.name,
        &request.color,
        request.description.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Recolor a category; only highlights created afterwards pick it up
async fn update_category(
    State(state): State<AppState>,
    Path((id, cid)): Path<(String, String)>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<HighlightCategory>> {
    let session = state.session(&id).await?;
    let mut session = session.lock().await;
    let category = session
        .categories_mut()
        .set_color(&cid, &request.color)?
        .clone();
    Ok(Json(category))
}

async fn delete_category(
    State(state): State<AppState>,
    Path((id, cid)): Path<(String, String)>,
) -> Result<StatusCode> {
    let session = state.session(&id).await?;
    session.lock().await.categories_mut().remove(&cid)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_active_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<HighlightCategory>> {
    let session = state.session(&id).await?;
    let mut session = session.lock().await;
    let category = session.categories_mut().set_active(&request.id)?.clone();
    Ok(Json(category))
}
