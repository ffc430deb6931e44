use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

use tracing::{debug, warn};

use super::{ErrorDisplay, FieldMap, FormTransport, Navigation, Navigator, SubmitError};

/// The whole submit-and-branch flow for one form: post its fields, then show errors or navigate.
///
/// Each form owns its own submitter, built where the form is rendered. Clones share the in-flight flag.
#[derive(Clone, Debug)]
pub struct FormSubmitter<T> {
	endpoint: String,
	redirect: Option<String>,
	transport: T,
	in_flight: Arc<AtomicBool>,
}

impl<T: FormTransport> FormSubmitter<T> {
	pub fn new(endpoint: impl Into<String>, transport: T) -> Self {
		Self {
			endpoint: endpoint.into(),
			redirect: None,
			transport,
			in_flight: Arc::default(),
		}
	}

	/// Navigate here on success instead of reloading.
	pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
		self.redirect = Some(target.into());
		self
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	pub fn is_in_flight(&self) -> bool {
		self.in_flight.load(Ordering::Acquire)
	}

	pub async fn submit(&self, fields: &FieldMap) -> Result<Navigation, SubmitError> {
		let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(SubmitError::InFlight)?;
		let outcome = self.transport.submit_form(&self.endpoint, fields).await?;
		Ok(Navigation::route(outcome, self.redirect.as_deref()))
	}

	/// [`submit`](Self::submit), then act on the result.
	pub async fn run(&self, fields: &FieldMap, navigator: &impl Navigator, display: &impl ErrorDisplay) {
		if self.is_in_flight() {
			debug!(endpoint = %self.endpoint, "submission already in flight, ignoring");
			return;
		}
		display.clear();
		match self.submit(fields).await {
			Ok(navigation) => navigation.follow(navigator, display),
			Err(SubmitError::InFlight) => debug!(endpoint = %self.endpoint, "submission already in flight, ignoring"),
			Err(e) => {
				warn!(endpoint = %self.endpoint, "submission failed: {e}");
				display.show_failure(&e);
			}
		}
	}
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
	fn acquire(flag: &'a AtomicBool) -> Option<Self> {
		flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| Self(flag))
	}
}

impl Drop for InFlightGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

#[cfg(test)]
mod tests {
	use std::{cell::RefCell, future::Future};

	use futures::{channel::oneshot, executor::block_on, future::FutureExt as _};

	use super::*;
	use crate::form::{SubmitOutcome, router::testing::Recorder};

	/// Answers with a canned body and remembers what was posted.
	#[derive(Default)]
	struct Canned {
		body: &'static str,
		posted: RefCell<Vec<(String, FieldMap)>>,
	}

	impl FormTransport for Canned {
		fn submit_form(&self, endpoint: &str, fields: &FieldMap) -> impl Future<Output = Result<SubmitOutcome, SubmitError>> {
			self.posted.borrow_mut().push((endpoint.to_owned(), fields.clone()));
			futures::future::ready(SubmitOutcome::from_body(self.body))
		}
	}

	struct Failing(SubmitError);

	impl FormTransport for Failing {
		async fn submit_form(&self, _: &str, _: &FieldMap) -> Result<SubmitOutcome, SubmitError> {
			Err(self.0.clone())
		}
	}

	/// Holds the request open until the test lets it go.
	struct Gated(RefCell<Option<oneshot::Receiver<()>>>);

	impl FormTransport for Gated {
		async fn submit_form(&self, _: &str, _: &FieldMap) -> Result<SubmitOutcome, SubmitError> {
			let gate = self.0.borrow_mut().take().expect("gate used once");
			let _ = gate.await;
			Ok(SubmitOutcome::Success(Default::default()))
		}
	}

	fn login_fields() -> FieldMap {
		FieldMap::from_iter([("username", "marco"), ("password", "secret")])
	}

	#[test]
	fn posts_fields_to_the_endpoint() {
		let submitter = FormSubmitter::new("/ajax/login", Canned { body: "{}", ..Default::default() });
		block_on(submitter.submit(&login_fields())).unwrap();
		assert_eq!(*submitter.transport.posted.borrow(), vec![("/ajax/login".to_owned(), login_fields())]);
	}

	#[test]
	fn login_reloads_on_success() {
		let submitter = FormSubmitter::new("/ajax/login", Canned {
			body: r#"{"username": "marco", "error_list": []}"#,
			..Default::default()
		});
		assert_eq!(block_on(submitter.submit(&login_fields())), Ok(Navigation::Reload));
	}

	#[test]
	fn configured_redirect_wins_over_reload() {
		let submitter = FormSubmitter::new("/ajax/register", Canned { body: "{}", ..Default::default() }).redirect_to("/dashboard");
		assert_eq!(block_on(submitter.submit(&FieldMap::new())), Ok(Navigation::Redirect("/dashboard".into())));
	}

	#[test]
	fn run_shows_server_errors_without_navigating() {
		let submitter = FormSubmitter::new("/ajax/login", Canned {
			body: r#"{"error_list": ["Not authorized."]}"#,
			..Default::default()
		});
		let rec = Recorder::default();
		block_on(submitter.run(&login_fields(), &rec, &rec));
		assert_eq!(*rec.errors.borrow(), vec!["Not authorized.".to_owned()]);
		assert!(!rec.navigated());
		assert!(!submitter.is_in_flight());
	}

	#[test]
	fn run_surfaces_transport_failures() {
		let submitter = FormSubmitter::new("/ajax/login", Failing(SubmitError::Transport("connection refused".into())));
		let rec = Recorder::default();
		block_on(submitter.run(&login_fields(), &rec, &rec));
		assert_eq!(*rec.failures.borrow(), vec![SubmitError::Transport("connection refused".into())]);
		assert!(!rec.navigated());
		// the form stays usable
		assert!(!submitter.is_in_flight());
	}

	#[test]
	fn run_clears_previous_feedback() {
		let submitter = FormSubmitter::new("/ajax/login", Canned { body: "{}", ..Default::default() });
		let rec = Recorder::default();
		rec.errors.borrow_mut().push("stale".into());
		block_on(submitter.run(&login_fields(), &rec, &rec));
		assert_eq!(*rec.clears.borrow(), 1);
		assert!(rec.errors.borrow().is_empty());
		assert_eq!(*rec.reloads.borrow(), 1);
	}

	#[test]
	fn second_submit_while_in_flight_is_refused() {
		let (release, gate) = oneshot::channel();
		let submitter = FormSubmitter::new("/ajax/login", Gated(RefCell::new(Some(gate))));
		let fields = login_fields();

		block_on(async {
			let mut first = Box::pin(submitter.submit(&fields));
			assert!((&mut first).now_or_never().is_none());
			assert!(submitter.is_in_flight());

			assert_eq!(submitter.submit(&fields).await, Err(SubmitError::InFlight));

			release.send(()).unwrap();
			assert_eq!(first.await, Ok(Navigation::Reload));
		});
		assert!(!submitter.is_in_flight());
	}
}
