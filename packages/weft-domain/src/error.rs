pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("Invalid link direction {value:?}; expected incoming, outgoing, or bidir.")]
	InvalidLinkDirection { value: String },
	#[error("{message}")]
	InvalidArgument { message: String },
}
