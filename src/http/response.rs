//! Response construction.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::docs::Document;
use crate::redirects::Redirect;
use crate::routing::Dispatched;

#[derive(Debug, Serialize)]
struct DocumentView<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    doc_type: &'a str,
    title: &'a str,
    url: Option<&'a str>,
}

impl<'a> From<&'a Document> for DocumentView<'a> {
    fn from(doc: &'a Document) -> Self {
        Self {
            id: &doc.id.0,
            doc_type: &doc.doc_type,
            title: &doc.title,
            url: doc.url.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PageView<'a> {
    page: Option<DocumentView<'a>>,
    piece: Option<DocumentView<'a>>,
    params: serde_json::Map<String, serde_json::Value>,
}

/// Render a dispatched page as JSON.
pub fn render(dispatched: &Dispatched) -> Response {
    let view = PageView {
        page: dispatched.page.as_ref().map(DocumentView::from),
        piece: dispatched.piece.as_ref().map(DocumentView::from),
        params: dispatched
            .params
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect(),
    };
    (StatusCode::OK, Json(view)).into_response()
}

/// Redirect with the resolver's status and `Location`.
pub fn redirect(redirect: Redirect) -> Response {
    (redirect.status, [(header::LOCATION, redirect.location)]).into_response()
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}
