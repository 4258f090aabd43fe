use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub feature_flags: FeatureFlags,
	pub search: Search,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
	/// Lifetime of the `_ff` cookie written by flag updates and the override middleware.
	#[serde(default = "default_cookie_ttl_days")]
	pub cookie_ttl_days: i64,
	/// The closed set of recognized flags. Keys are flag names as they appear in the cookie and
	/// the query override, values are the build-time defaults.
	#[serde(default)]
	pub defaults: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	/// Serve search results from the bundled fixture instead of the upstream API.
	#[serde(default)]
	pub use_mock_data: bool,
	#[serde(default)]
	pub api_base: String,
	#[serde(default = "default_search_path")]
	pub path: String,
	pub api_auth_token: Option<String>,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_page_size")]
	pub page_size: u32,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_cookie_ttl_days() -> i64 {
	7
}

fn default_search_path() -> String {
	"/v1/opportunities/search".to_string()
}

fn default_timeout_ms() -> u64 {
	10_000
}

fn default_page_size() -> u32 {
	25
}
