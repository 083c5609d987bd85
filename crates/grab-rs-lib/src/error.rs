//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	/// A dependency or exclusion record is missing a required field or has one of the wrong type.
	///
	/// Raised by the coordinate parser before any repository is contacted.
	#[error("invalid coordinate: {0}")]
	InvalidCoordinate(String),
	/// The resolution engine failed, the cause is kept as the error source.
	#[error("dependency resolution failed")]
	DependencyResolutionFailed(#[source] crate::resolver::ResolutionError),
	#[error("{0} is not supported")]
	UnsupportedOperation(&'static str),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("parsing error: {0}")]
	Parse(String),
}

impl From<crate::resolver::ResolutionError> for Error {
	fn from(value: crate::resolver::ResolutionError) -> Self {
		Error::DependencyResolutionFailed(value)
	}
}
