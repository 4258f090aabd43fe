use time::OffsetDateTime;

use crate::{
	CookieOptions, CookieStore, Error, FEATURE_FLAGS_KEY, FeatureFlags, FlagRegistry, Result,
	SearchParams,
};

/// Per-request view over the flag layers.
///
/// The cookie is re-read on every access, so a write made through another handle to the same
/// store is observed immediately.
pub struct FeatureFlagsManager<'a, S> {
	registry: &'a FlagRegistry,
	cookies: S,
}
impl<'a, S> FeatureFlagsManager<'a, S>
where
	S: CookieStore,
{
	pub fn new(registry: &'a FlagRegistry, cookies: S) -> Self {
		Self { registry, cookies }
	}

	pub fn default_feature_flags(&self) -> &FeatureFlags {
		self.registry.defaults()
	}

	pub fn is_valid_feature_flag(&self, name: &str) -> bool {
		self.registry.is_valid_feature_flag(name)
	}

	pub fn parse_feature_flags_from_string(&self, raw: Option<&str>) -> FeatureFlags {
		self.registry.parse_feature_flags_from_string(raw)
	}

	pub fn feature_flags_cookie(&self) -> FeatureFlags {
		match self.cookies.get(FEATURE_FLAGS_KEY) {
			Some(raw) => self.registry.parse_feature_flags_json(&raw),
			None => FeatureFlags::new(),
		}
	}

	/// Defaults overlaid by the persisted cookie.
	pub fn feature_flags(&self) -> FeatureFlags {
		let mut flags = self.registry.defaults().clone();

		flags.extend(self.feature_flags_cookie());

		flags
	}

	/// The effective flag set for one request: [`Self::feature_flags`] overlaid by any valid
	/// `_ff` query override.
	pub fn feature_flags_with_override(&self, search_params: Option<&SearchParams>) -> FeatureFlags {
		let mut flags = self.feature_flags();

		if let Some(raw) = search_params.and_then(SearchParams::feature_flags_override) {
			flags.extend(self.parse_feature_flags_from_string(Some(raw)));
		}

		flags
	}

	pub fn is_feature_enabled(
		&self,
		name: &str,
		search_params: Option<&SearchParams>,
	) -> Result<bool> {
		if !self.is_valid_feature_flag(name) {
			return Err(Error::UnknownFlag { name: name.to_string() });
		}

		self.feature_flags_with_override(search_params)
			.get(name)
			.copied()
			.ok_or_else(|| Error::UnknownFlag { name: name.to_string() })
	}

	pub fn set_feature_flag_cookie(&mut self, name: &str, value: bool) -> Result<()> {
		if !self.is_valid_feature_flag(name) {
			return Err(Error::UnknownFlag { name: name.to_string() });
		}

		let mut flags = self.feature_flags_cookie();

		flags.insert(name.to_string(), value);

		let serialized = serde_json::to_string(&flags)?;

		self.cookies.set(FEATURE_FLAGS_KEY, &serialized, self.cookie_options());

		tracing::debug!(flag = name, enabled = value, "Feature flag cookie updated.");

		Ok(())
	}

	/// Promotes a valid `_ff` query override into the response cookie.
	///
	/// Nothing is written unless at least one pair parses, so a request without a usable
	/// override never clobbers a cookie the client is about to update itself. Returns whether a
	/// cookie was written.
	pub fn middleware<R>(&self, request: &SearchParams, response: &mut R) -> Result<bool>
	where
		R: CookieStore + ?Sized,
	{
		let flags = self.parse_feature_flags_from_string(request.feature_flags_override());

		if flags.is_empty() {
			return Ok(false);
		}

		let serialized = serde_json::to_string(&flags)?;

		response.set(FEATURE_FLAGS_KEY, &serialized, self.cookie_options());

		tracing::info!(flags = %serialized, "Feature flag override promoted to cookie.");

		Ok(true)
	}

	fn cookie_options(&self) -> CookieOptions {
		CookieOptions::expiring_at(self.registry.cookie_expiry(OffsetDateTime::now_utc()))
	}
}
