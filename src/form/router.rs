use tracing::warn;

use super::{SubmitError, SubmitOutcome};

/// Where a finished submission leaves the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
	/// Stay on the page and show these.
	ShowErrors(Vec<String>),
	Redirect(String),
	Reload,
}

impl Navigation {
	pub fn route(outcome: SubmitOutcome, redirect: Option<&str>) -> Self {
		match outcome {
			SubmitOutcome::ValidationFailure { errors } => Self::ShowErrors(errors),
			SubmitOutcome::Success(_) => match redirect {
				Some(target) => Self::Redirect(target.to_owned()),
				None => Self::Reload,
			},
		}
	}

	pub fn follow(self, navigator: &impl Navigator, display: &impl ErrorDisplay) {
		match self {
			Self::ShowErrors(errors) => display.show_errors(&errors),
			Self::Redirect(target) => navigator.go_to(&target),
			Self::Reload => navigator.reload(),
		}
	}
}

pub trait Navigator {
	fn reload(&self);
	fn go_to(&self, target: &str);
}

/// Inline, non-blocking feedback next to a form.
pub trait ErrorDisplay {
	fn show_errors(&self, errors: &[String]);
	fn show_failure(&self, error: &SubmitError);
	fn clear(&self);
}

/// `window.location`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
	fn reload(&self) {
		if let Some(window) = web_sys::window() {
			if let Err(e) = window.location().reload() {
				warn!("reload failed: {e:?}");
			}
		}
	}

	fn go_to(&self, target: &str) {
		if let Some(window) = web_sys::window() {
			if let Err(e) = window.location().set_href(target) {
				warn!("navigation to {target} failed: {e:?}");
			}
		}
	}
}

#[cfg(test)]
pub(crate) mod testing {
	use std::cell::RefCell;

	use super::*;

	#[derive(Debug, Default)]
	pub struct Recorder {
		pub visits: RefCell<Vec<String>>,
		pub reloads: RefCell<usize>,
		pub errors: RefCell<Vec<String>>,
		pub failures: RefCell<Vec<SubmitError>>,
		pub clears: RefCell<usize>,
	}

	impl Recorder {
		pub fn navigated(&self) -> bool {
			!self.visits.borrow().is_empty() || *self.reloads.borrow() > 0
		}
	}

	impl Navigator for Recorder {
		fn reload(&self) {
			*self.reloads.borrow_mut() += 1;
		}

		fn go_to(&self, target: &str) {
			self.visits.borrow_mut().push(target.to_owned());
		}
	}

	impl ErrorDisplay for Recorder {
		fn show_errors(&self, errors: &[String]) {
			self.errors.borrow_mut().extend_from_slice(errors);
		}

		fn show_failure(&self, error: &SubmitError) {
			self.failures.borrow_mut().push(error.clone());
		}

		fn clear(&self) {
			*self.clears.borrow_mut() += 1;
			self.errors.borrow_mut().clear();
			self.failures.borrow_mut().clear();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{testing::Recorder, *};

	fn follow(body: &str, redirect: Option<&str>) -> Recorder {
		let rec = Recorder::default();
		let outcome = SubmitOutcome::from_body(body).unwrap();
		Navigation::route(outcome, redirect).follow(&rec, &rec);
		rec
	}

	#[test]
	fn errors_are_shown_and_the_page_stays() {
		let rec = follow(r#"{"error_list": ["Username not present"]}"#, Some("/dashboard"));
		assert_eq!(*rec.errors.borrow(), vec!["Username not present".to_owned()]);
		assert!(!rec.navigated());
	}

	#[test]
	fn success_goes_to_the_redirect_target() {
		let rec = follow("{}", Some("/dashboard"));
		assert_eq!(*rec.visits.borrow(), vec!["/dashboard".to_owned()]);
		assert_eq!(*rec.reloads.borrow(), 0);
	}

	#[test]
	fn success_without_target_reloads() {
		let rec = follow("{}", None);
		assert_eq!(*rec.reloads.borrow(), 1);
		assert!(rec.visits.borrow().is_empty());
	}

	#[test]
	fn empty_error_list_is_success() {
		let rec = follow(r#"{"error_list": []}"#, None);
		assert_eq!(*rec.reloads.borrow(), 1);
		assert!(rec.errors.borrow().is_empty());
	}

	#[test]
	fn every_error_is_surfaced_in_order() {
		let rec = follow(r#"{"error_list": ["username: This field is required.", "email: Invalid email address."]}"#, None);
		assert_eq!(*rec.errors.borrow(), vec![
			"username: This field is required.".to_owned(),
			"email: Invalid email address.".to_owned()
		]);
	}
}
