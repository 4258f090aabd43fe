pub mod api;
pub mod mock;

mod error;
mod types;

pub use api::ApiSearchFetcher;
pub use error::{Error, Result};
pub use mock::MockSearchFetcher;
pub use types::{
	Opportunity, OpportunitySummary, PaginationInfo, SearchFetcherProps, SearchResponse,
	SortOption,
};

use std::{future::Future, pin::Pin, time::Duration};

use reqwest::header::{HeaderMap, HeaderName};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Header the backend API reads its service token from.
pub const API_AUTH_HEADER: &str = "x-auth";

pub trait SearchFetcher
where
	Self: Send + Sync,
{
	fn fetch_opportunities<'a>(
		&'a self,
		props: &'a SearchFetcherProps,
	) -> BoxFuture<'a, Result<SearchResponse>>;
}

/// The strategy picked at startup. Selection happens once; calls never re-check the switch.
#[derive(Debug, Clone)]
pub enum SelectedFetcher {
	Mock(MockSearchFetcher),
	Api(ApiSearchFetcher),
}
impl SelectedFetcher {
	pub fn select(cfg: &grants_config::Search) -> Result<Self> {
		if cfg.use_mock_data {
			tracing::info!(page_size = cfg.page_size, "Using mock search data.");

			return Ok(Self::Mock(MockSearchFetcher::new(cfg.page_size)?));
		}

		let fetcher = ApiSearchFetcher::new(cfg)?;

		tracing::info!(url = fetcher.url(), "Using live search API.");

		Ok(Self::Api(fetcher))
	}

	pub fn kind(&self) -> &'static str {
		match self {
			Self::Mock(_) => "mock",
			Self::Api(_) => "api",
		}
	}
}
impl SearchFetcher for SelectedFetcher {
	fn fetch_opportunities<'a>(
		&'a self,
		props: &'a SearchFetcherProps,
	) -> BoxFuture<'a, Result<SearchResponse>> {
		match self {
			Self::Mock(fetcher) => fetcher.fetch_opportunities(props),
			Self::Api(fetcher) => fetcher.fetch_opportunities(props),
		}
	}
}

pub fn auth_headers(api_key: Option<&str>, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if let Some(api_key) = api_key {
		headers.insert(HeaderName::from_static(API_AUTH_HEADER), api_key.parse()?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Runs one fetch under an aggregate deadline. Expiry fails with [`Error::Cancelled`].
pub async fn fetch_with_timeout<F>(
	fetcher: &F,
	props: &SearchFetcherProps,
	timeout: Duration,
) -> Result<SearchResponse>
where
	F: SearchFetcher + ?Sized,
{
	match tokio::time::timeout(timeout, fetcher.fetch_opportunities(props)).await {
		Ok(result) => result,
		Err(_) => {
			tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Search fetch timed out.");

			Err(Error::Cancelled)
		},
	}
}

/// Runs one fetch until it completes or `token` is cancelled, whichever happens first.
pub async fn fetch_cancellable<F>(
	fetcher: &F,
	props: &SearchFetcherProps,
	token: &CancellationToken,
) -> Result<SearchResponse>
where
	F: SearchFetcher + ?Sized,
{
	tokio::select! {
		biased;
		_ = token.cancelled() => {
			tracing::debug!("Search fetch cancelled by caller.");

			Err(Error::Cancelled)
		},
		result = fetcher.fetch_opportunities(props) => result,
	}
}
