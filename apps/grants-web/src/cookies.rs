use axum::http::{
	HeaderMap, HeaderValue,
	header::{COOKIE, SET_COOKIE},
};

use grants_flags::{CookieJar, CookieOptions, CookieStore, SetCookie, parse_cookie_header};

/// Builds a jar from every `Cookie` header on the request. The first occurrence of a name wins.
pub fn request_cookies(headers: &HeaderMap) -> CookieJar {
	let raw = headers
		.get_all(COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.collect::<Vec<_>>()
		.join("; ");

	CookieJar::from_cookie_header(&raw)
}

/// Cookie view over outgoing response headers. Reads see `Set-Cookie` values already queued on
/// the response; writes append a new `Set-Cookie` header.
pub struct ResponseCookies<'a> {
	headers: &'a mut HeaderMap,
}
impl<'a> ResponseCookies<'a> {
	pub fn new(headers: &'a mut HeaderMap) -> Self {
		Self { headers }
	}

	pub fn append(&mut self, cookie: &SetCookie) {
		let rendered = cookie.to_string();

		match HeaderValue::from_str(&rendered) {
			Ok(value) => {
				self.headers.append(SET_COOKIE, value);
			},
			Err(err) => {
				tracing::warn!(cookie = %cookie.name, error = %err, "Dropped unrenderable cookie.");
			},
		}
	}
}
impl CookieStore for ResponseCookies<'_> {
	fn get(&self, name: &str) -> Option<String> {
		self.headers
			.get_all(SET_COOKIE)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.filter_map(|value| value.split(';').next())
			.flat_map(parse_cookie_header)
			.filter(|(key, _)| key == name)
			.map(|(_, value)| value)
			.last()
	}

	fn set(&mut self, name: &str, value: &str, options: CookieOptions) {
		self.append(&SetCookie::new(name, value, options));
	}
}

/// Moves every pending write recorded in `jar` onto the response.
pub fn apply_writes(jar: &mut CookieJar, headers: &mut HeaderMap) {
	let mut response = ResponseCookies::new(headers);

	for cookie in jar.take_writes() {
		response.append(&cookie);
	}
}
