use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use tkg_service::{AskRequest, Error, PipelineResult};

use crate::state::AppState;

const INVALID_REQUEST: &str = "INVALID_REQUEST";
const PIPELINE_FAILED: &str = "PIPELINE_FAILED";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/ask", post(ask))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn ask(
	State(state): State<AppState>,
	payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<PipelineResult>, ApiError> {
	let Json(req) = payload.map_err(|rejection| {
		ApiError::new(StatusCode::BAD_REQUEST, INVALID_REQUEST, rejection.body_text())
	})?;
	let result = state.service.ask(req).await?;

	Ok(Json(result))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				ApiError::new(StatusCode::BAD_REQUEST, INVALID_REQUEST, message),
			other => {
				tracing::error!(error = %other, "Question answering failed.");

				ApiError::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					PIPELINE_FAILED,
					"Failed to answer the question.",
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
