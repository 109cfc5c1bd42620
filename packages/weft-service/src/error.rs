pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid argument: {message}")]
	InvalidArgument { message: String },
	#[error("Content {content_id:?} not found.")]
	NotFound { content_id: String },
	#[error("Storage unavailable: {message}")]
	StorageUnavailable { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Operation cancelled.")]
	Cancelled,
}
impl Error {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidArgument { message: message.into() }
	}
}
impl From<weft_storage::Error> for Error {
	fn from(err: weft_storage::Error) -> Self {
		match err {
			weft_storage::Error::InvalidArgument(message) => Self::InvalidArgument { message },
			weft_storage::Error::NotFound(content_id) => Self::NotFound { content_id },
			weft_storage::Error::Sqlx(inner) =>
				Self::StorageUnavailable { message: inner.to_string() },
			weft_storage::Error::Qdrant(inner) =>
				Self::StorageUnavailable { message: inner.to_string() },
			weft_storage::Error::Corrupt(message) => Self::StorageUnavailable { message },
		}
	}
}
impl From<weft_domain::Error> for Error {
	fn from(err: weft_domain::Error) -> Self {
		Self::InvalidArgument { message: err.to_string() }
	}
}
impl From<weft_providers::Error> for Error {
	fn from(err: weft_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
