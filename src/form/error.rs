use std::time::Duration;

/// Why a submission attempt produced no usable response.
#[derive(Clone, Debug, PartialEq, Eq, derive_more::Display)]
pub enum SubmitError {
	#[display("request failed: {_0}")]
	Transport(String),
	#[display("request timed out after {}s", _0.as_secs_f32())]
	Timeout(Duration),
	#[display("server answered with status {_0}")]
	Status(u16),
	#[display("malformed response: {_0}")]
	MalformedResponse(String),
	#[display("a submission is already in flight")]
	InFlight,
}

impl std::error::Error for SubmitError {}

impl From<reqwest::Error> for SubmitError {
	fn from(e: reqwest::Error) -> Self {
		match e.status() {
			Some(status) => Self::Status(status.as_u16()),
			None => Self::Transport(e.to_string()),
		}
	}
}

impl From<serde_json::Error> for SubmitError {
	fn from(e: serde_json::Error) -> Self {
		Self::MalformedResponse(e.to_string())
	}
}
