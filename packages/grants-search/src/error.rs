pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Search request failed with status {status}: {message}")]
	Fetch { status: u16, message: String },
	#[error("Search request was cancelled.")]
	Cancelled,
	#[error(transparent)]
	Transport(reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
}
impl Error {
	/// Upstream HTTP status, when the failure carries one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Fetch { status, .. } => Some(*status),
			Self::Transport(err) => err.status().map(|status| status.as_u16()),
			_ => None,
		}
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() { Self::Cancelled } else { Self::Transport(err) }
	}
}
