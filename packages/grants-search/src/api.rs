use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
	BoxFuture, Error, Opportunity, PaginationInfo, Result, SearchFetcher, SearchFetcherProps,
	SearchResponse,
};

/// Live strategy: one POST to the backend opportunity search endpoint per call.
#[derive(Debug, Clone)]
pub struct ApiSearchFetcher {
	client: Client,
	url: String,
	page_size: u32,
}
impl ApiSearchFetcher {
	pub fn new(cfg: &grants_config::Search) -> Result<Self> {
		if cfg.api_base.trim().is_empty() {
			return Err(Error::InvalidConfig {
				message: "search.api_base must be non-empty for the live search fetcher."
					.to_string(),
			});
		}

		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(crate::auth_headers(
				cfg.api_auth_token.as_deref(),
				&cfg.default_headers,
			)?)
			.build()
			.map_err(Error::Transport)?;

		Ok(Self { client, url: format!("{}{}", cfg.api_base, cfg.path), page_size: cfg.page_size })
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	async fn search(&self, props: &SearchFetcherProps) -> Result<SearchResponse> {
		let body = request_body(props, self.page_size);
		let res = self.client.post(&self.url).json(&body).send().await?;
		let status = res.status();
		let bytes = res.bytes().await?;

		let response = parse_search_response(status, &bytes);

		if let Err(err) = &response {
			tracing::error!(error = %err, url = %self.url, "Error fetching opportunities.");
		}

		response
	}
}
impl SearchFetcher for ApiSearchFetcher {
	fn fetch_opportunities<'a>(
		&'a self,
		props: &'a SearchFetcherProps,
	) -> BoxFuture<'a, Result<SearchResponse>> {
		Box::pin(self.search(props))
	}
}

#[derive(Debug, Deserialize)]
struct RawSearchResponse {
	data: Option<Vec<Opportunity>>,
	status_code: Option<u16>,
	message: Option<String>,
	pagination_info: Option<PaginationInfo>,
	#[serde(flatten)]
	extra: Map<String, Value>,
}

pub(crate) fn request_body(props: &SearchFetcherProps, page_size: u32) -> Value {
	let mut body = Map::new();

	body.insert(
		"pagination".to_string(),
		serde_json::json!({
			"page_offset": props.page_offset(),
			"page_size": page_size,
			"order_by": props.sort_by.order_by(),
			"sort_direction": props.sort_by.sort_direction(),
		}),
	);

	if let Some(query) = props.query_text() {
		body.insert("query".to_string(), Value::from(query));
	}

	let mut filters = Map::new();

	for (key, values) in [
		("opportunity_status", &props.status),
		("funding_instrument", &props.funding_instrument),
		("applicant_type", &props.eligibility),
		("agency", &props.agency),
		("funding_category", &props.category),
	] {
		if values.is_empty() {
			continue;
		}

		filters.insert(key.to_string(), serde_json::json!({ "one_of": values }));
	}

	if !filters.is_empty() {
		body.insert("filters".to_string(), Value::Object(filters));
	}

	Value::Object(body)
}

fn parse_search_response(status: StatusCode, bytes: &[u8]) -> Result<SearchResponse> {
	let decoded = serde_json::from_slice::<RawSearchResponse>(bytes);

	if !status.is_success() {
		let message = decoded.ok().and_then(|raw| raw.message).unwrap_or_else(|| {
			status.canonical_reason().unwrap_or("Upstream request failed").to_string()
		});

		return Err(Error::Fetch { status: status.as_u16(), message });
	}

	let raw = decoded.map_err(|err| Error::Fetch {
		status: status.as_u16(),
		message: format!("Failed to decode search response: {err}."),
	})?;
	let status_code = raw.status_code.unwrap_or(status.as_u16());
	let message = raw.message.unwrap_or_default();

	if !(200..300).contains(&status_code) {
		return Err(Error::Fetch { status: status_code, message });
	}

	let Some(data) = raw.data else {
		return Err(Error::Fetch {
			status: status_code,
			message: "No data returned from API.".to_string(),
		});
	};

	Ok(SearchResponse {
		data,
		status_code,
		message,
		pagination_info: raw.pagination_info,
		extra: raw.extra,
	})
}
