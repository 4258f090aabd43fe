use serde_json::Value;
use time::{Duration, OffsetDateTime, macros::datetime};

use crate::{FEATURE_FLAGS_KEY, FeatureFlags};

const DEFAULT_COOKIE_TTL_DAYS: i64 = 7;
const LATEST_COOKIE_EXPIRY: OffsetDateTime = datetime!(9999-12-31 23:59:59 UTC);

/// The closed set of recognized flags and their process-wide defaults.
///
/// Built once at startup and shared by reference with every per-request manager.
#[derive(Debug, Clone)]
pub struct FlagRegistry {
	defaults: FeatureFlags,
	cookie_ttl: Duration,
}
impl FlagRegistry {
	pub fn new(defaults: FeatureFlags) -> Self {
		Self { defaults, cookie_ttl: Duration::days(DEFAULT_COOKIE_TTL_DAYS) }
	}

	/// The TTL is clamped to `1..=MAX_COOKIE_TTL_DAYS` so an unvalidated config cannot overflow.
	pub fn from_config(cfg: &grants_config::FeatureFlags) -> Self {
		let days = cfg.cookie_ttl_days.clamp(1, grants_config::MAX_COOKIE_TTL_DAYS);

		Self { defaults: cfg.defaults.clone(), cookie_ttl: Duration::days(days) }
	}

	pub fn defaults(&self) -> &FeatureFlags {
		&self.defaults
	}

	pub fn cookie_ttl(&self) -> Duration {
		self.cookie_ttl
	}

	/// `now + ttl`, saturating at the last representable cookie date.
	pub fn cookie_expiry(&self, now: OffsetDateTime) -> OffsetDateTime {
		now.checked_add(self.cookie_ttl).unwrap_or(LATEST_COOKIE_EXPIRY)
	}

	pub fn is_valid_feature_flag(&self, name: &str) -> bool {
		self.defaults.contains_key(name)
	}

	/// Parses an override string such as `searchOff:true;authOff:false`.
	///
	/// Pairs with an unknown name or a value other than the exact literals `true`/`false` are
	/// dropped. Never fails.
	pub fn parse_feature_flags_from_string(&self, raw: Option<&str>) -> FeatureFlags {
		let mut flags = FeatureFlags::new();
		let Some(raw) = raw else {
			return flags;
		};

		for pair in raw.split(';') {
			let Some((name, value)) = pair.split_once(':') else {
				continue;
			};
			let name = name.trim();

			if !self.is_valid_feature_flag(name) {
				continue;
			}

			let value = match value.trim() {
				"true" => true,
				"false" => false,
				_ => continue,
			};

			flags.insert(name.to_string(), value);
		}

		flags
	}

	/// Decodes a persisted cookie value, keeping recognized names with strict boolean values.
	pub fn parse_feature_flags_json(&self, raw: &str) -> FeatureFlags {
		let value: Value = match serde_json::from_str(raw) {
			Ok(value) => value,
			Err(err) => {
				tracing::debug!(error = %err, "Discarding malformed feature flag cookie.");

				return FeatureFlags::new();
			},
		};
		let Value::Object(entries) = value else {
			tracing::debug!("Discarding feature flag cookie that is not a JSON object.");

			return FeatureFlags::new();
		};

		entries
			.into_iter()
			.filter(|(name, _)| self.is_valid_feature_flag(name))
			.filter_map(|(name, value)| value.as_bool().map(|enabled| (name, enabled)))
			.collect()
	}
}

/// Decoded URL query pairs of one request.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
	pairs: Vec<(String, String)>,
}
impl SearchParams {
	/// Decodes a raw query string. An undecodable query yields no params.
	pub fn parse(query: Option<&str>) -> Self {
		let Some(query) = query.filter(|query| !query.is_empty()) else {
			return Self::default();
		};

		match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
			Ok(pairs) => Self { pairs },
			Err(err) => {
				tracing::debug!(error = %err, "Ignoring undecodable query string.");

				Self::default()
			},
		}
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.pairs.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
	}

	pub fn feature_flags_override(&self) -> Option<&str> {
		self.get(FEATURE_FLAGS_KEY)
	}
}
impl<K, V> FromIterator<(K, V)> for SearchParams
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self { pairs: iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect() }
	}
}
