use std::{cell::RefCell, rc::Rc};

use time::{Duration, OffsetDateTime};

use grants_flags::{
	CookieJar, CookieOptions, CookieStore, Error, FEATURE_FLAGS_KEY, FeatureFlags,
	FeatureFlagsManager, FlagRegistry, SearchParams,
};

const COOKIE_VALUE: &str = r#"{"feature1":true}"#;

/// Two handles onto one jar, standing in for a browser cookie store that other code may write
/// behind the manager's back.
#[derive(Clone, Default)]
struct SharedCookies(Rc<RefCell<CookieJar>>);
impl SharedCookies {
	fn write_raw(&self, value: &str) {
		self.0.borrow_mut().insert(FEATURE_FLAGS_KEY, value);
	}
}
impl CookieStore for SharedCookies {
	fn get(&self, name: &str) -> Option<String> {
		self.0.borrow().get(name)
	}

	fn set(&mut self, name: &str, value: &str, options: CookieOptions) {
		self.0.borrow_mut().set(name, value, options)
	}
}

fn flags(pairs: &[(&str, bool)]) -> FeatureFlags {
	pairs.iter().map(|(name, value)| (name.to_string(), *value)).collect()
}

fn registry() -> FlagRegistry {
	FlagRegistry::new(flags(&[("feature1", true), ("feature2", false), ("feature3", true)]))
}

fn jar_with(value: &str) -> CookieJar {
	let mut jar = CookieJar::new();

	jar.insert(FEATURE_FLAGS_KEY, value);

	jar
}

#[test]
fn cookie_getter_reads_jar() {
	let registry = registry();
	let manager = FeatureFlagsManager::new(&registry, jar_with(COOKIE_VALUE));

	assert_eq!(manager.feature_flags_cookie(), flags(&[("feature1", true)]));
}

#[test]
fn cookie_getter_reads_request_header() {
	let registry = registry();
	let jar = CookieJar::from_cookie_header(
		"session=abc; _ff=%7B%22feature1%22%3Atrue%2C%22feature2%22%3Afalse%7D",
	);
	let manager = FeatureFlagsManager::new(&registry, jar);

	assert_eq!(manager.feature_flags_cookie(), flags(&[("feature1", true), ("feature2", false)]));
}

#[test]
fn cookie_getter_tolerates_missing_and_invalid_cookie() {
	let registry = registry();

	assert!(FeatureFlagsManager::new(&registry, CookieJar::new()).feature_flags_cookie().is_empty());
	assert!(
		FeatureFlagsManager::new(&registry, jar_with("----------------"))
			.feature_flags_cookie()
			.is_empty()
	);
	assert!(
		FeatureFlagsManager::new(&registry, jar_with(r#"{"someInvalidFeatureFlagName":true}"#))
			.feature_flags_cookie()
			.is_empty()
	);
	assert!(
		FeatureFlagsManager::new(&registry, jar_with(r#"{"feature1":"someInvalidFeatureFlagValue"}"#))
			.feature_flags_cookie()
			.is_empty()
	);
}

#[test]
fn feature_flags_merge_cookie_over_defaults() {
	let registry = registry();
	let manager = FeatureFlagsManager::new(&registry, jar_with(r#"{"feature1":false}"#));

	assert_eq!(
		manager.feature_flags(),
		flags(&[("feature1", false), ("feature2", false), ("feature3", true)])
	);

	let empty = FeatureFlagsManager::new(&registry, jar_with("{}"));

	assert_eq!(&empty.feature_flags(), empty.default_feature_flags());
}

#[test]
fn is_feature_enabled_matches_effective_flags() {
	let registry = registry();
	let manager = FeatureFlagsManager::new(&registry, jar_with(COOKIE_VALUE));

	for (name, enabled) in manager.feature_flags() {
		assert_eq!(manager.is_feature_enabled(&name, None).expect("Known flag."), enabled);
	}
}

#[test]
fn is_feature_enabled_rejects_unknown_flags() {
	let registry = registry();
	let manager =
		FeatureFlagsManager::new(&registry, jar_with(r#"{"someFakeFeatureFlag":true}"#));
	let params = SearchParams::from_iter([(FEATURE_FLAGS_KEY, "someFakeFeatureFlag:true")]);

	for search_params in [None, Some(&params)] {
		let err = manager
			.is_feature_enabled("someFakeFeatureFlag", search_params)
			.expect_err("Unknown flags must fail.");

		assert!(matches!(err, Error::UnknownFlag { ref name } if name == "someFakeFeatureFlag"));
	}
}

#[test]
fn is_feature_enabled_observes_out_of_band_cookie_updates() {
	let registry = registry();
	let cookies = SharedCookies::default();

	cookies.write_raw(COOKIE_VALUE);

	let manager = FeatureFlagsManager::new(&registry, cookies.clone());

	assert!(manager.is_feature_enabled("feature1", None).expect("Known flag."));

	cookies.write_raw(r#"{"feature1":false}"#);

	assert!(!manager.is_feature_enabled("feature1", None).expect("Known flag."));
}

#[test]
fn precedence_is_default_then_cookie_then_query() {
	let registry = FlagRegistry::new(flags(&[("f", false)]));
	let manager = FeatureFlagsManager::new(&registry, jar_with(r#"{"f":true}"#));
	let overrides = SearchParams::from_iter([(FEATURE_FLAGS_KEY, "f:false")]);

	assert!(manager.is_feature_enabled("f", None).expect("Known flag."));
	assert!(!manager.is_feature_enabled("f", Some(&overrides)).expect("Known flag."));

	let defaults_only = FeatureFlagsManager::new(&registry, CookieJar::new());

	assert!(!defaults_only.is_feature_enabled("f", None).expect("Known flag."));
}

#[test]
fn invalid_query_override_falls_back_to_cookie() {
	let registry = registry();
	let manager = FeatureFlagsManager::new(&registry, jar_with(r#"{"feature2":true}"#));
	let overrides = SearchParams::from_iter([(FEATURE_FLAGS_KEY, "feature2:nope;;bogus:false")]);

	assert!(manager.is_feature_enabled("feature2", Some(&overrides)).expect("Known flag."));
}

#[test]
fn set_cookie_updates_flags() {
	let registry = registry();
	let mut jar = CookieJar::new();
	let mut manager = FeatureFlagsManager::new(&registry, &mut jar);

	manager.set_feature_flag_cookie("feature1", false).expect("Known flag.");

	assert_eq!(manager.feature_flags_cookie(), flags(&[("feature1", false)]));
	assert_eq!(
		manager.feature_flags(),
		flags(&[("feature1", false), ("feature2", false), ("feature3", true)])
	);

	let writes = jar.take_writes();

	assert_eq!(writes.len(), 1);
	assert_eq!(writes[0].name, FEATURE_FLAGS_KEY);
	assert_eq!(writes[0].value, r#"{"feature1":false}"#);
	assert_eq!(writes[0].options.path.as_deref(), Some("/"));
	assert!(writes[0].options.expires > OffsetDateTime::now_utc() + Duration::days(6));
}

#[test]
fn set_cookie_round_trips_for_every_flag_and_value() {
	let registry = registry();

	for name in registry.defaults().keys() {
		for value in [true, false] {
			let prior = r#"{"feature3":false,"junk":true}"#;
			let mut manager = FeatureFlagsManager::new(&registry, jar_with(prior));

			manager.set_feature_flag_cookie(name, value).expect("Known flag.");

			let mut want = flags(&[("feature3", false)]);

			want.insert(name.clone(), value);

			assert_eq!(manager.feature_flags_cookie(), want);
		}
	}
}

#[test]
fn set_cookie_rejects_unknown_flags() {
	let registry = registry();
	let mut jar = CookieJar::new();
	let mut manager = FeatureFlagsManager::new(&registry, &mut jar);
	let err = manager
		.set_feature_flag_cookie("someFakeFeatureFlag-------------------", true)
		.expect_err("Unknown flags must fail.");

	assert!(matches!(err, Error::UnknownFlag { .. }));
	assert!(jar.writes().is_empty());
}

#[test]
fn set_cookie_merges_out_of_band_updates() {
	let registry = registry();
	let cookies = SharedCookies::default();
	let mut manager = FeatureFlagsManager::new(&registry, cookies.clone());

	cookies.write_raw(r#"{"feature1":false,"feature2":false,"feature3":true}"#);

	manager.set_feature_flag_cookie("feature2", true).expect("Known flag.");

	let want = flags(&[("feature1", false), ("feature2", true), ("feature3", true)]);

	assert_eq!(manager.feature_flags_cookie(), want);
	assert_eq!(manager.feature_flags(), want);
}

#[test]
fn middleware_promotes_valid_override() {
	let registry = registry();
	let manager = FeatureFlagsManager::new(&registry, CookieJar::new());
	let request = SearchParams::parse(Some("_ff=feature1:false"));
	let mut response = CookieJar::new();
	let wrote = manager.middleware(&request, &mut response).expect("Middleware must succeed.");

	assert!(wrote);

	let writes = response.writes();

	assert_eq!(writes.len(), 1);
	assert_eq!(writes[0].name, FEATURE_FLAGS_KEY);
	assert_eq!(writes[0].value, r#"{"feature1":false}"#);
	assert!(writes[0].options.expires > OffsetDateTime::now_utc());
}

#[test]
fn middleware_skips_write_without_valid_flags() {
	let registry = registry();
	let manager = FeatureFlagsManager::new(&registry, CookieJar::new());
	let mut response = CookieJar::new();

	for query in [
		None,
		Some("fakeFeature:true;anotherFakeFeature:false"),
		Some("_ff=fakeFeature:true;anotherFakeFeature:false"),
		Some("_ff=feature1:yes"),
	] {
		let request = SearchParams::parse(query);
		let wrote = manager.middleware(&request, &mut response).expect("Middleware must succeed.");

		assert!(!wrote, "Unexpected write for {query:?}.");
	}

	assert!(response.writes().is_empty());
}

#[test]
fn registry_from_config_uses_configured_ttl() {
	let cfg = grants_config::FeatureFlags {
		cookie_ttl_days: 3,
		defaults: flags(&[("searchOff", false)]),
	};
	let registry = FlagRegistry::from_config(&cfg);

	assert_eq!(registry.cookie_ttl(), Duration::days(3));
	assert!(registry.is_valid_feature_flag("searchOff"));
	assert!(!registry.is_valid_feature_flag("opportunityOff"));
}

#[test]
fn oversized_configured_ttl_still_writes_cookie() {
	let cfg = grants_config::FeatureFlags {
		cookie_ttl_days: 1_000_000_000,
		defaults: flags(&[("searchOff", false)]),
	};
	let registry = FlagRegistry::from_config(&cfg);
	let mut manager = FeatureFlagsManager::new(&registry, CookieJar::new());
	let mut response = CookieJar::new();
	let request = SearchParams::parse(Some("_ff=searchOff:true"));

	assert!(manager.middleware(&request, &mut response).expect("Middleware must succeed."));

	manager.set_feature_flag_cookie("searchOff", true).expect("Setting a declared flag must succeed.");

	let horizon = OffsetDateTime::now_utc() + Duration::days(401);

	assert!(response.writes()[0].options.expires < horizon);
}
