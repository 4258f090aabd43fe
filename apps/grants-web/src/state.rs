use std::sync::Arc;

use grants_config::Config;
use grants_flags::FlagRegistry;
use grants_search::{SearchFetcher, SelectedFetcher};

/// Process-wide collaborators, built once at startup and cloned into every handler.
#[derive(Clone)]
pub struct AppState {
	pub flags: Arc<FlagRegistry>,
	pub search: Arc<dyn SearchFetcher>,
}
impl AppState {
	pub fn new(config: &Config) -> color_eyre::Result<Self> {
		let fetcher = SelectedFetcher::select(&config.search)?;

		Ok(Self::with_fetcher(config, Arc::new(fetcher)))
	}

	pub fn with_fetcher(config: &Config, search: Arc<dyn SearchFetcher>) -> Self {
		let flags = FlagRegistry::from_config(&config.feature_flags);

		Self { flags: Arc::new(flags), search }
	}
}
