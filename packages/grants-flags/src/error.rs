pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unknown feature flag {name:?}.")]
	UnknownFlag { name: String },
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
}
