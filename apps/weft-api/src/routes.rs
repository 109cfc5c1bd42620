use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use weft_service::{
	AddNodesRequest, AddNodesResponse, AddTextsRequest, DeleteNodesRequest, DeleteNodesResponse,
	Error, MmrTraversalRequest, SearchResponse, SimilarityRequest, TraversalRequest,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/nodes/add", post(add_nodes))
		.route("/v1/nodes/add_texts", post(add_texts))
		.route("/v1/nodes/delete", post(delete_nodes))
		.route("/v1/search/similarity", post(similarity_search))
		.route("/v1/search/traversal", post(traversal_search))
		.route("/v1/search/mmr_traversal", post(mmr_traversal_search))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn add_nodes(
	State(state): State<AppState>,
	Json(payload): Json<AddNodesRequest>,
) -> Result<Json<AddNodesResponse>, ApiError> {
	let response = state.service.add_nodes(payload).await?;

	Ok(Json(response))
}

async fn add_texts(
	State(state): State<AppState>,
	Json(payload): Json<AddTextsRequest>,
) -> Result<Json<AddNodesResponse>, ApiError> {
	let response = state.service.add_texts(payload).await?;

	Ok(Json(response))
}

async fn delete_nodes(
	State(state): State<AppState>,
	Json(payload): Json<DeleteNodesRequest>,
) -> Result<Json<DeleteNodesResponse>, ApiError> {
	let response = state.service.delete_nodes(payload).await?;

	Ok(Json(response))
}

async fn similarity_search(
	State(state): State<AppState>,
	Json(payload): Json<SimilarityRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.similarity_search(payload).await?;

	Ok(Json(response))
}

async fn traversal_search(
	State(state): State<AppState>,
	Json(payload): Json<TraversalRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.traversal_search(payload).await?;

	Ok(Json(response))
}

async fn mmr_traversal_search(
	State(state): State<AppState>,
	Json(payload): Json<MmrTraversalRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.mmr_traversal_search(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let message = err.to_string();

		match err {
			Error::InvalidArgument { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_argument", message, None),
			Error::NotFound { content_id } => Self::new(
				StatusCode::NOT_FOUND,
				"not_found",
				message,
				Some(vec![content_id]),
			),
			Error::StorageUnavailable { .. } => {
				tracing::error!(error = %message, "Storage unavailable.");

				Self::new(StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", message, None)
			},
			Error::Provider { .. } => {
				tracing::error!(error = %message, "Embedding provider failed.");

				Self::new(StatusCode::BAD_GATEWAY, "provider_error", message, None)
			},
			Error::Cancelled => Self::new(StatusCode::SERVICE_UNAVAILABLE, "cancelled", message, None),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
