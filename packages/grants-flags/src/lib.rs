//! Feature flag resolution for the grants portal.
//!
//! Effective flags are merged from three layers, lowest precedence first:
//! process defaults (config plus `FEATURE_*` environment), the persisted `_ff` cookie, and a
//! per-request `_ff` query override.

pub mod cookie;
pub mod manager;
pub mod registry;

mod error;

pub use cookie::{CookieJar, CookieOptions, CookieStore, SetCookie, parse_cookie_header};
pub use error::{Error, Result};
pub use manager::FeatureFlagsManager;
pub use registry::{FlagRegistry, SearchParams};

use std::collections::BTreeMap;

/// Cookie name and query key shared by the persisted layer and the override.
pub const FEATURE_FLAGS_KEY: &str = "_ff";

pub type FeatureFlags = BTreeMap<String, bool>;
