pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The index could not be reached at all. No partial results exist.
	#[error("Record index unavailable: {message}")]
	BackendUnavailable { message: String },
	/// One collection failed. Its hits are excluded and the search continues.
	#[error("Collection {collection} failed: {message}")]
	PartialCollection { collection: String, message: String },
}
impl From<idcrawl_providers::Error> for Error {
	fn from(err: idcrawl_providers::Error) -> Self {
		Self::BackendUnavailable { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::BackendUnavailable { message: err.to_string() }
	}
}
