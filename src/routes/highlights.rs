//! Highlights API routes

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::annotations::{AnnotationError, Highlight, HighlightPatch, HighlightQuery, QueryOrder};
use crate::error::{AppError, Result};
use crate::export::CsvExport;
use crate::html::{OverlapStrategy, RenderOutput};
use crate::selection::ReportedSelection;
use crate::state::AppState;

/// Create the highlights router
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/documents/:id/highlights",
            get(list_highlights)
                .post(create_highlight)
                .delete(clear_highlights),
        )
        .route(
            "/documents/:id/highlights/:hid",
            get(get_highlight)
                .patch(update_highlight)
                .delete(delete_highlight),
        )
        .route("/documents/:id/highlights/:hid/select", put(select_highlight))
        .route(
            "/documents/:id/selection",
            get(get_selection).delete(clear_selection),
        )
        .route("/documents/:id/render", get(render_document))
        .route("/documents/:id/export.csv", get(export_highlights))
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub order: Option<QueryOrder>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<ListQuery> for HighlightQuery {
    fn from(query: ListQuery) -> Self {
        HighlightQuery {
            category: query.category,
            text: query.q.filter(|q| !q.trim().is_empty()),
            order: query.order.unwrap_or_default(),
            limit: query.limit,
            offset: query.offset,
        }
    }
}

/// A selection reported by the client
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHighlightRequest {
    pub text: String,
    pub start_index: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenderQuery {
    pub overlap: Option<OverlapStrategy>,
}

async fn list_highlights(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Highlight>>> {
    let query = HighlightQuery::from(query);
    let session = state.session(&id).await?;
    let session = session.lock().await;
    let highlights = session
        .query(&query)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(highlights))
}

/// Create a highlight from a selection
///
/// A blank selection is not an error; nothing is created and 204 comes back.
async fn create_highlight(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreateHighlightRequest>,
) -> Result<Response> {
    let session = state.session(&id).await?;
    let mut session = session.lock().await;

    let source = ReportedSelection::new(&request.text, request.start_index);
    match session.highlight_selection(&source)? {
        Some(highlight) => Ok((StatusCode::CREATED, Json(highlight)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn clear_highlights(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClearResponse>> {
    let session = state.session(&id).await?;
    let removed = session.lock().await.clear();
    Ok(Json(ClearResponse { removed }))
}

async fn get_highlight(
    State(state): State<AppState>,
    Path((id, hid)): Path<(String, String)>,
) -> Result<Json<Highlight>> {
    let session = state.session(&id).await?;
    let session = session.lock().await;
    let highlight = session
        .highlights()
        .get(&hid)
        .cloned()
        .ok_or_else(|| AppError::from(AnnotationError::HighlightNotFound(hid)))?;
    Ok(Json(highlight))
}

async fn update_highlight(
    State(state): State<AppState>,
    Path((id, hid)): Path<(String, String)>,
    Json(patch): Json<HighlightPatch>,
) -> Result<Json<Highlight>> {
    if patch.is_empty() {
        return Err(AppError::BadRequest(
            "Patch must set note, category or color".to_string(),
        ));
    }

    let session = state.session(&id).await?;
    let mut session = session.lock().await;
    let highlight = session.update(&hid, patch)?.clone();
    Ok(Json(highlight))
}

async fn delete_highlight(
    State(state): State<AppState>,
    Path((id, hid)): Path<(String, String)>,
) -> Result<StatusCode> {
    let session = state.session(&id).await?;
    session.lock().await.remove(&hid)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a highlight as the one being edited
async fn select_highlight(
    State(state): State<AppState>,
    Path((id, hid)): Path<(String, String)>,
) -> Result<Json<Highlight>> {
    let session = state.session(&id).await?;
    let mut session = session.lock().await;
    let highlight = session.select(&hid)?.clone();
    Ok(Json(highlight))
}

async fn get_selection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Highlight>> {
    let session = state.session(&id).await?;
    let session = session.lock().await;
    let highlight = session
        .highlights()
        .selected()
        .cloned()
        .ok_or_else(|| AppError::NotFound("No highlight selected".to_string()))?;
    Ok(Json(highlight))
}

async fn clear_selection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let session = state.session(&id).await?;
    session.lock().await.deselect();
    Ok(StatusCode::NO_CONTENT)
}

async fn render_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RenderQuery>,
) -> Result<Json<RenderOutput>> {
    let session = state.session(&id).await?;
    let session = session.lock().await;
    let output = match query.overlap {
        Some(overlap) => session.render_as(overlap),
        None => session.render(),
    };
    Ok(Json(output))
}

/// Download all highlights as CSV
async fn export_highlights(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let session = state.session(&id).await?;
    let export = session.lock().await.export_csv()?;

    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, CsvExport::CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.into_bytes(),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use crate::state::AppState;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    const DOCUMENT: &str = "The term is 30 days. Tenant shall indemnify Landlord.";

    async fn server() -> TestServer {
        let server = TestServer::new(crate::app(AppState::ephemeral())).unwrap();
        server
            .put("/api/v1/documents/lease")
            .json(&json!({ "text": DOCUMENT }))
            .await;
        server
    }

    async fn create(server: &TestServer, text: &str, start: usize) -> Value {
        let response = server
            .post("/api/v1/documents/lease/highlights")
            .json(&json!({ "text": text, "startIndex": start }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json::<Value>()
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let server = server().await;
        let created = create(&server, "30 days", 12).await;

        assert_eq!(created["text"], "30 days");
        assert_eq!(created["startIndex"], 12);
        assert_eq!(created["endIndex"], 19);
        assert_eq!(created["category"], "risk");
        assert_eq!(created["color"], "#F44336");
        assert!(created.get("note").is_none());

        create(&server, "Tenant", 21).await;
        let listed = server
            .get("/api/v1/documents/lease/highlights")
            .add_query_param("order", "newest")
            .await
            .json::<Value>();
        assert_eq!(listed.as_array().unwrap().len(), 2);
        assert_eq!(listed[0]["text"], "Tenant");
    }

    #[tokio::test]
    async fn test_blank_selection_is_no_content() {
        let server = server().await;
        let response = server
            .post("/api/v1/documents/lease/highlights")
            .json(&json!({ "text": "  ", "startIndex": 3 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let response = server
            .post("/api/v1/documents/lease/highlights")
            .json(&json!({ "text": "x", "startIndex": 500 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_huge_start_index_is_no_content() {
        let server = server().await;
        let response = server
            .post("/api/v1/documents/lease/highlights")
            .json(&json!({ "text": "30 days", "startIndex": u64::MAX }))
            .await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let listed = server
            .get("/api/v1/documents/lease/highlights")
            .await
            .json::<Value>();
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_select_delete() {
        let server = server().await;
        let created = create(&server, "indemnify", 34).await;
        let path = format!(
            "/api/v1/documents/lease/highlights/{}",
            created["id"].as_str().unwrap()
        );

        let updated = server
            .patch(&path)
            .json(&json!({ "note": "Uncapped", "category": "obligation" }))
            .await
            .json::<Value>();
        assert_eq!(updated["note"], "Uncapped");
        assert_eq!(updated["color"], "#2196F3");

        let selected = server.put(&format!("{}/select", path)).await;
        selected.assert_status_ok();

        let empty_patch = server.patch(&path).json(&json!({})).await;
        assert_eq!(empty_patch.status_code(), StatusCode::BAD_REQUEST);

        let deleted = server.delete(&path).await;
        assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);
        let missing = server.get(&path).await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_selection_round() {
        let server = server().await;
        let none = server.get("/api/v1/documents/lease/selection").await;
        assert_eq!(none.status_code(), StatusCode::NOT_FOUND);

        let created = create(&server, "Tenant", 21).await;
        let id = created["id"].as_str().unwrap();
        server
            .put(&format!("/api/v1/documents/lease/highlights/{}/select", id))
            .await
            .assert_status_ok();

        let selected = server
            .get("/api/v1/documents/lease/selection")
            .await
            .json::<Value>();
        assert_eq!(selected["id"], id);

        let cleared = server.delete("/api/v1/documents/lease/selection").await;
        assert_eq!(cleared.status_code(), StatusCode::NO_CONTENT);
        let none = server.get("/api/v1/documents/lease/selection").await;
        assert_eq!(none.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_render_and_clear() {
        let server = server().await;
        create(&server, "Tenant shall indemnify", 21).await;
        create(&server, "indemnify Landlord.", 34).await;

        let nested = server
            .get("/api/v1/documents/lease/render")
            .await
            .json::<Value>();
        assert_eq!(nested["rendered"], 2);
        assert!(nested["html"].as_str().unwrap().starts_with("The term is 30 days. <span"));

        let segmented = server
            .get("/api/v1/documents/lease/render")
            .add_query_param("overlap", "segment")
            .await
            .json::<Value>();
        assert!(segmented["html"]
            .as_str()
            .unwrap()
            .contains("data-highlight-ids="));

        let cleared = server
            .delete("/api/v1/documents/lease/highlights")
            .await
            .json::<Value>();
        assert_eq!(cleared["removed"], 2);
    }

    #[tokio::test]
    async fn test_export_csv() {
        let server = server().await;

        let empty = server.get("/api/v1/documents/lease/export.csv").await;
        assert_eq!(empty.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(empty.json::<Value>()["error"], "nothing_to_export");

        create(&server, "30 days", 12).await;
        let response = server.get("/api/v1/documents/lease/export.csv").await;
        response.assert_status_ok();

        let disposition = response.header("content-disposition");
        let disposition = disposition.to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"contract-highlights-"));

        let body = response.text();
        assert!(body.starts_with("Text,Category,Note,Created At\n\"30 days\",risk,\"\","));
    }
}
