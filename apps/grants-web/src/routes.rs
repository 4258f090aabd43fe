use axum::{
	Json, Router,
	extract::{Path, RawQuery, Request, State},
	http::{HeaderMap, StatusCode},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use crate::{
	cookies::{self, ResponseCookies},
	state::AppState,
};
use grants_flags::{
	CookieStore, FEATURE_FLAGS_KEY, FeatureFlags, FeatureFlagsManager, SearchParams,
};
use grants_search::{SearchFetcherProps, SearchResponse};

/// Flag that takes the search page offline.
pub const SEARCH_OFF_FLAG: &str = "searchOff";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/feature-flags", get(get_feature_flags))
		.route("/api/feature-flags/{name}", put(put_feature_flag))
		.route("/api/search", post(search))
		.layer(middleware::from_fn_with_state(state.clone(), feature_flags_middleware))
		.with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeatureFlagsResponse {
	pub flags: FeatureFlags,
}

#[derive(Debug, Deserialize)]
pub struct SetFeatureFlagRequest {
	pub enabled: bool,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn get_feature_flags(
	State(state): State<AppState>,
	headers: HeaderMap,
	RawQuery(query): RawQuery,
) -> Json<FeatureFlagsResponse> {
	let manager = FeatureFlagsManager::new(&state.flags, cookies::request_cookies(&headers));
	let params = SearchParams::parse(query.as_deref());

	Json(FeatureFlagsResponse { flags: manager.feature_flags_with_override(Some(&params)) })
}

async fn put_feature_flag(
	State(state): State<AppState>,
	Path(name): Path<String>,
	headers: HeaderMap,
	Json(payload): Json<SetFeatureFlagRequest>,
) -> Result<Response, ApiError> {
	let mut jar = cookies::request_cookies(&headers);
	let mut manager = FeatureFlagsManager::new(&state.flags, &mut jar);

	manager.set_feature_flag_cookie(&name, payload.enabled)?;

	let flags = manager.feature_flags();
	let mut response = Json(FeatureFlagsResponse { flags }).into_response();

	cookies::apply_writes(&mut jar, response.headers_mut());

	Ok(response)
}

async fn search(
	State(state): State<AppState>,
	headers: HeaderMap,
	RawQuery(query): RawQuery,
	Json(props): Json<SearchFetcherProps>,
) -> Result<Json<SearchResponse>, ApiError> {
	let manager = FeatureFlagsManager::new(&state.flags, cookies::request_cookies(&headers));
	let params = SearchParams::parse(query.as_deref());

	if manager.is_valid_feature_flag(SEARCH_OFF_FLAG)
		&& manager.is_feature_enabled(SEARCH_OFF_FLAG, Some(&params))?
	{
		return Err(json_error(
			StatusCode::NOT_FOUND,
			"SEARCH_OFF",
			"Search is currently unavailable.",
			None,
		));
	}

	let response = state.search.fetch_opportunities(&props).await?;

	Ok(Json(response))
}

/// Promotes a `_ff` query override into the response cookie on every request.
async fn feature_flags_middleware(
	State(state): State<AppState>,
	request: Request,
	next: Next,
) -> Response {
	let params = SearchParams::parse(request.uri().query());
	let jar = cookies::request_cookies(request.headers());
	let mut response = next.run(request).await;
	let manager = FeatureFlagsManager::new(&state.flags, jar);
	let mut response_cookies = ResponseCookies::new(response.headers_mut());

	// A cookie written by the handler wins over the query override.
	if response_cookies.get(FEATURE_FLAGS_KEY).is_some() {
		tracing::debug!("Handler already wrote the feature flag cookie. Skipping promotion.");

		return response;
	}
	if let Err(err) = manager.middleware(&params, &mut response_cookies) {
		tracing::warn!(error = %err, "Failed to promote feature flag override.");
	}

	response
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
impl From<grants_flags::Error> for ApiError {
	fn from(err: grants_flags::Error) -> Self {
		match err {
			grants_flags::Error::UnknownFlag { name } => json_error(
				StatusCode::NOT_FOUND,
				"UNKNOWN_FEATURE_FLAG",
				format!("{name} is not a declared feature flag."),
				Some(vec![name]),
			),
			grants_flags::Error::SerdeJson(err) => json_error(
				StatusCode::INTERNAL_SERVER_ERROR,
				"INTERNAL",
				format!("Failed to encode feature flags: {err}."),
				None,
			),
		}
	}
}
impl From<grants_search::Error> for ApiError {
	fn from(err: grants_search::Error) -> Self {
		match err {
			grants_search::Error::Fetch { status, message } => json_error(
				StatusCode::BAD_GATEWAY,
				"UPSTREAM_ERROR",
				format!("Upstream search failed with status {status}: {message}"),
				None,
			),
			grants_search::Error::Cancelled => json_error(
				StatusCode::GATEWAY_TIMEOUT,
				"UPSTREAM_TIMEOUT",
				"Upstream search did not complete in time.",
				None,
			),
			other => json_error(
				StatusCode::BAD_GATEWAY,
				"UPSTREAM_ERROR",
				format!("Upstream search failed: {other}"),
				None,
			),
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

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
