use std::{collections::BTreeMap, fmt};

use time::{
	OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description,
};

const IMF_FIXDATE: &[BorrowedFormatItem<'static>] = format_description!(
	"[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Name-addressed cookie access, implemented once per environment (in-memory record, request
/// header, response header).
pub trait CookieStore {
	/// Returns the decoded value of `name`, if present.
	fn get(&self, name: &str) -> Option<String>;

	fn set(&mut self, name: &str, value: &str, options: CookieOptions);
}
impl<T> CookieStore for &mut T
where
	T: CookieStore + ?Sized,
{
	fn get(&self, name: &str) -> Option<String> {
		(**self).get(name)
	}

	fn set(&mut self, name: &str, value: &str, options: CookieOptions) {
		(**self).set(name, value, options)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
	pub expires: OffsetDateTime,
	pub path: Option<String>,
}
impl CookieOptions {
	pub fn expiring_at(expires: OffsetDateTime) -> Self {
		Self { expires, path: Some("/".to_string()) }
	}
}

/// One pending cookie write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
	pub name: String,
	pub value: String,
	pub options: CookieOptions,
}
impl SetCookie {
	pub fn new(name: &str, value: &str, options: CookieOptions) -> Self {
		Self { name: name.to_string(), value: value.to_string(), options }
	}
}
impl fmt::Display for SetCookie {
	/// Renders a `Set-Cookie` header value. The pair is form-encoded so JSON survives the
	/// cookie-octet grammar.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let pair = serde_urlencoded::to_string(vec![(self.name.as_str(), self.value.as_str())])
			.map_err(|_| fmt::Error)?;
		let expires =
			self.options.expires.to_offset(UtcOffset::UTC).format(IMF_FIXDATE).map_err(|_| fmt::Error)?;

		write!(f, "{pair}; Expires={expires}")?;

		if let Some(path) = self.options.path.as_deref() {
			write!(f, "; Path={path}")?;
		}

		write!(f, "; SameSite=Lax")
	}
}

/// Splits a `Cookie` request header into decoded name/value pairs. Segments that do not decode
/// are skipped.
pub fn parse_cookie_header(raw: &str) -> Vec<(String, String)> {
	raw.split(';')
		.map(str::trim)
		.filter(|segment| segment.contains('='))
		.filter_map(|segment| {
			serde_urlencoded::from_str::<Vec<(String, String)>>(segment).ok()?.into_iter().next()
		})
		.collect()
}

/// In-memory cookie record. Reads see earlier writes; every write is also kept as a pending
/// [`SetCookie`] so an HTTP layer can emit it.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
	values: BTreeMap<String, String>,
	writes: Vec<SetCookie>,
}
impl CookieJar {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_cookie_header(raw: &str) -> Self {
		let mut jar = Self::new();

		for (name, value) in parse_cookie_header(raw) {
			jar.values.entry(name).or_insert(value);
		}

		jar
	}

	/// Seeds a value without recording a write.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.values.insert(name.into(), value.into());
	}

	pub fn writes(&self) -> &[SetCookie] {
		&self.writes
	}

	pub fn take_writes(&mut self) -> Vec<SetCookie> {
		std::mem::take(&mut self.writes)
	}
}
impl CookieStore for CookieJar {
	fn get(&self, name: &str) -> Option<String> {
		self.values.get(name).cloned()
	}

	fn set(&mut self, name: &str, value: &str, options: CookieOptions) {
		self.values.insert(name.to_string(), value.to_string());
		self.writes.push(SetCookie::new(name, value, options));
	}
}
