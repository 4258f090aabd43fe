mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, FeatureFlags, Search, Service};

use std::{collections::HashMap, env, fs, path::Path};

pub const FEATURE_ENV_PREFIX: &str = "FEATURE_";
/// Upper bound for `feature_flags.cookie_ttl_days`; user agents cap cookie lifetimes at 400 days.
pub const MAX_COOKIE_TTL_DAYS: i64 = 400;

pub fn load(path: &Path) -> Result<Config> {
	load_with_env(path, env::vars())
}

pub fn load_with_env<I>(path: &Path, vars: I) -> Result<Config>
where
	I: IntoIterator<Item = (String, String)>,
{
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	apply_env(&mut cfg, vars);

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

/// Overlays environment switches onto a parsed config.
///
/// `FEATURE_<NAME>` entries only touch flags already declared under `[feature_flags.defaults]`;
/// anything else in the environment is ignored.
pub fn apply_env<I>(cfg: &mut Config, vars: I)
where
	I: IntoIterator<Item = (String, String)>,
{
	let flag_keys: HashMap<String, String> =
		cfg.feature_flags.defaults.keys().map(|name| (feature_env_key(name), name.clone())).collect();

	for (key, value) in vars {
		match key.as_str() {
			"USE_SEARCH_MOCK_DATA" => cfg.search.use_mock_data = parse_truthy(&value),
			"API_URL" => cfg.search.api_base = value,
			"API_AUTH_TOKEN" => cfg.search.api_auth_token = Some(value),
			_ => {
				if let Some(name) = flag_keys.get(&key) {
					cfg.feature_flags.defaults.insert(name.clone(), parse_truthy(&value));
				}
			},
		}
	}
}

/// Maps a flag name to its environment switch: `searchOff` becomes `FEATURE_SEARCH_OFF`.
pub fn feature_env_key(name: &str) -> String {
	let mut out = String::with_capacity(FEATURE_ENV_PREFIX.len() + name.len() + 4);

	out.push_str(FEATURE_ENV_PREFIX);

	for (i, ch) in name.chars().enumerate() {
		if ch.is_ascii_uppercase() && i > 0 && !out.ends_with('_') {
			out.push('_');
		}

		out.push(ch.to_ascii_uppercase());
	}

	out
}

pub fn parse_truthy(raw: &str) -> bool {
	matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.feature_flags.cookie_ttl_days <= 0 {
		return Err(Error::Validation {
			message: "feature_flags.cookie_ttl_days must be greater than zero.".to_string(),
		});
	}
	if cfg.feature_flags.cookie_ttl_days > MAX_COOKIE_TTL_DAYS {
		return Err(Error::Validation {
			message: format!("feature_flags.cookie_ttl_days must be at most {MAX_COOKIE_TTL_DAYS}."),
		});
	}

	let mut env_keys = HashMap::new();

	for name in cfg.feature_flags.defaults.keys() {
		if name.is_empty() {
			return Err(Error::Validation {
				message: "feature_flags.defaults must not contain an empty flag name.".to_string(),
			});
		}
		if !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
			return Err(Error::Validation {
				message: format!(
					"Feature flag name {name:?} must contain only ASCII letters, digits, or underscores."
				),
			});
		}
		if let Some(other) = env_keys.insert(feature_env_key(name), name) {
			return Err(Error::Validation {
				message: format!(
					"Feature flags {other:?} and {name:?} map to the same environment variable {}.",
					feature_env_key(name)
				),
			});
		}
	}

	if cfg.search.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.page_size == 0 {
		return Err(Error::Validation {
			message: "search.page_size must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.path.starts_with('/') {
		return Err(Error::Validation {
			message: "search.path must start with '/'.".to_string(),
		});
	}
	if !cfg.search.use_mock_data && cfg.search.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.api_base must be non-empty when search.use_mock_data is false."
				.to_string(),
		});
	}

	for (key, value) in &cfg.search.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("search.default_headers.{key} must be a string."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let trimmed = cfg.search.api_base.trim().trim_end_matches('/').to_string();

	cfg.search.api_base = trimmed;

	if cfg.search.api_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false) {
		cfg.search.api_auth_token = None;
	}
}
