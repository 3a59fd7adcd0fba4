//! Application error taxonomy.
//!
//! None of these are fatal: every variant ends up as a banner, an upload
//! status or a graph error message.

use thiserror::Error;

/// Errors surfaced to the UI.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
	/// Network failure, non-2xx status or a body that is not JSON.
	#[error("Service unavailable: {0}")]
	ServiceUnavailable(String),

	/// The upload filter rejected every file in the batch.
	#[error("No valid PDF files selected")]
	NoValidFiles,

	/// Graph payload is JSON but lacks the `nodes`/`links` arrays.
	#[error("Malformed graph data: {0}")]
	MalformedGraphData(String),

	/// The embedded viewer failed to load or navigate.
	#[error("Viewer error: {0}")]
	Viewer(String),
}

impl AppError {
	/// Whether this failure means the backend could not be reached at all.
	pub fn is_unavailable(&self) -> bool {
		matches!(self, Self::ServiceUnavailable(_))
	}
}

impl From<gloo_net::Error> for AppError {
	fn from(err: gloo_net::Error) -> Self {
		Self::ServiceUnavailable(err.to_string())
	}
}

/// Crate-wide result alias.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages_are_user_facing() {
		assert_eq!(AppError::NoValidFiles.to_string(), "No valid PDF files selected");
		assert_eq!(
			AppError::ServiceUnavailable("status 503".into()).to_string(),
			"Service unavailable: status 503"
		);
	}

	#[test]
	fn only_unavailable_triggers_fallback() {
		assert!(AppError::ServiceUnavailable(String::new()).is_unavailable());
		assert!(!AppError::MalformedGraphData(String::new()).is_unavailable());
		assert!(!AppError::NoValidFiles.is_unavailable());
	}
}
