use serde::Deserialize;
use serde_json::{Map, Value};

use super::SubmitError;

/// What the endpoint said about a submission.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
	/// Whatever else the endpoint returned, `error_list` stripped.
	Success(Map<String, Value>),
	/// Never empty.
	ValidationFailure { errors: Vec<String> },
}

#[derive(Deserialize)]
struct Envelope {
	#[serde(default)]
	error_list: Option<Vec<String>>,
	#[serde(flatten)]
	payload: Map<String, Value>,
}

impl SubmitOutcome {
	/// Decodes a response body. Anything but a JSON object is malformed; an absent, `null` or empty `error_list` is success.
	pub fn from_body(body: &str) -> Result<Self, SubmitError> {
		let value: Value = serde_json::from_str(body)?;
		if !value.is_object() {
			return Err(SubmitError::MalformedResponse(format!("expected a JSON object, got `{value}`")));
		}
		let envelope: Envelope = serde_json::from_value(value)?;
		Ok(match envelope.error_list {
			Some(errors) if !errors.is_empty() => Self::ValidationFailure { errors },
			_ => Self::Success(envelope.payload),
		})
	}

	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;
	use serde_json::json;

	use super::*;

	#[test]
	fn error_list_is_a_validation_failure() {
		let outcome = SubmitOutcome::from_body(r#"{"error_list": ["Username not present"]}"#).unwrap();
		assert_eq!(outcome, SubmitOutcome::ValidationFailure {
			errors: vec!["Username not present".to_owned()],
		});
	}

	#[rstest]
	#[case::no_list("{}")]
	#[case::empty_list(r#"{"error_list": []}"#)]
	#[case::null_list(r#"{"error_list": null}"#)]
	fn missing_or_empty_list_is_success(#[case] body: &str) {
		assert!(SubmitOutcome::from_body(body).unwrap().is_success());
	}

	#[test]
	fn success_keeps_the_payload() {
		let outcome = SubmitOutcome::from_body(r#"{"username": "marco", "id": 3, "error_list": []}"#).unwrap();
		let SubmitOutcome::Success(payload) = outcome else {
			panic!("expected success");
		};
		assert_eq!(Value::Object(payload), json!({"username": "marco", "id": 3}));
	}

	#[rstest]
	#[case::not_json("<html>502</html>")]
	#[case::array("[]")]
	#[case::string(r#""ok""#)]
	#[case::bad_list(r#"{"error_list": "nope"}"#)]
	fn non_envelopes_are_malformed(#[case] body: &str) {
		assert!(matches!(SubmitOutcome::from_body(body), Err(SubmitError::MalformedResponse(_))));
	}
}
