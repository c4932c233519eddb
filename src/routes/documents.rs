//! Document session endpoints
//!
//! A document must be opened (PUT with its text) before highlights can be
//! made on it. Re-sending the text of an open document replaces it in place;
//! stored highlights are kept.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::put,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::session::ReviewSession;
use crate::state::AppState;
use crate::text::char_len;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/documents/:id",
        put(open_document).get(get_document).delete(close_document),
    )
}

#[derive(Debug, Deserialize)]
pub struct OpenDocumentRequest {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CloseQuery {
    /// Also delete the document's stored highlights and categories
    #[serde(default)]
    pub purge: bool,
}

/// Summary of an open document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub length: usize,
    pub highlight_count: usize,
    pub category_count: usize,
    pub active_category: String,
}

impl DocumentSummary {
    pub fn of(session: &ReviewSession) -> Self {
        Self {
            id: session.document_id().to_string(),
            length: char_len(session.document()),
            highlight_count: session.highlights().len(),
            category_count: session.categories().list().len(),
            active_category: session.categories().active_id().to_string(),
        }
    }
}

/// Open a document or replace its text
async fn open_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<OpenDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentSummary>)> {
    if id.trim().is_empty() {
        return Err(AppError::BadRequest("Document id is empty".to_string()));
    }

    let (session, created) = state.open_document(&id, request.text).await;
    let summary = DocumentSummary::of(&*session.lock().await);
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(summary)))
}

async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentSummary>> {
    let session = state.session(&id).await?;
    let summary = DocumentSummary::of(&*session.lock().await);
    Ok(Json(summary))
}

/// Close a document, freeing its session
async fn close_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CloseQuery>,
) -> Result<StatusCode> {
    state.close_document(&id, query.purge).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::state::AppState;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    fn server() -> TestServer {
        TestServer::new(crate::app(AppState::ephemeral())).unwrap()
    }

    #[tokio::test]
    async fn test_open_then_replace() {
        let server = server();

        let response = server
            .put("/api/v1/documents/lease")
            .json(&json!({ "text": "The term is 30 days." }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["id"], "lease");
        assert_eq!(body["length"], 20);
        assert_eq!(body["categoryCount"], 4);
        assert_eq!(body["activeCategory"], "risk");

        let response = server
            .put("/api/v1/documents/lease")
            .json(&json!({ "text": "The term is 60 days, renewable." }))
            .await;
        response.assert_status_ok();

        let body = server
            .get("/api/v1/documents/lease")
            .await
            .json::<serde_json::Value>();
        assert_eq!(body["length"], 31);
    }

    #[tokio::test]
    async fn test_close_document() {
        let server = server();
        server
            .put("/api/v1/documents/lease")
            .json(&json!({ "text": "The term is 30 days." }))
            .await;

        let response = server.delete("/api/v1/documents/lease").await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let health = server.get("/health").await.json::<serde_json::Value>();
        assert_eq!(health["sessions"], 0);

        let missing = server.get("/api/v1/documents/lease").await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        let again = server
            .delete("/api/v1/documents/lease")
            .add_query_param("purge", "true")
            .await;
        assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_document_is_404() {
        let response = server().get("/api/v1/documents/missing").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(response.json::<serde_json::Value>()["error"], "not_found");
    }
}
