use std::{future::Future, time::Duration};

use futures::future::{Either, select};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue, PRAGMA};
use tracing::{debug, instrument};

use super::{FieldMap, SubmitError, SubmitOutcome};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Posts a field mapping to an endpoint and decodes the answer.
pub trait FormTransport {
	fn submit_form(&self, endpoint: &str, fields: &FieldMap) -> impl Future<Output = Result<SubmitOutcome, SubmitError>>;
}

/// JSON-over-HTTP transport. Works natively and, through `fetch`, in the browser.
#[derive(Clone, Debug)]
pub struct HttpTransport {
	client: reqwest::Client,
	base_url: Option<String>,
	timeout: Duration,
}

impl Default for HttpTransport {
	fn default() -> Self {
		Self {
			client: reqwest::Client::new(),
			base_url: None,
			timeout: DEFAULT_TIMEOUT,
		}
	}
}

impl HttpTransport {
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	/// Prefix for endpoint paths. Without one, absolute paths resolve against the page origin in the browser.
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = Some(base_url.into());
		self
	}

	fn url(&self, endpoint: &str) -> String {
		match &self.base_url {
			Some(base) => format!("{}{endpoint}", base.trim_end_matches('/')),
			None => page_relative(endpoint),
		}
	}

	async fn post(&self, endpoint: &str, fields: &FieldMap) -> Result<SubmitOutcome, SubmitError> {
		let body = fields.to_json()?;
		let response = self
			.client
			.post(self.url(endpoint))
			.header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
			.header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
			.header(PRAGMA, HeaderValue::from_static("no-cache"))
			.body(body)
			.send()
			.await?
			.error_for_status()?;
		let text = response.text().await?;
		SubmitOutcome::from_body(&text)
	}
}

impl FormTransport for HttpTransport {
	#[instrument(skip(self, fields), fields(n_fields = fields.len()))]
	async fn submit_form(&self, endpoint: &str, fields: &FieldMap) -> Result<SubmitOutcome, SubmitError> {
		debug!("posting form");
		timeout(self.timeout, self.post(endpoint, fields)).await
	}
}

#[cfg(target_arch = "wasm32")]
fn page_relative(endpoint: &str) -> String {
	match web_sys::window().and_then(|w| w.location().origin().ok()) {
		Some(origin) if endpoint.starts_with('/') => format!("{origin}{endpoint}"),
		_ => endpoint.to_owned(),
	}
}

#[cfg(not(target_arch = "wasm32"))]
fn page_relative(endpoint: &str) -> String {
	endpoint.to_owned()
}

/// Races `fut` against a timer; the request is dropped when the timer wins.
pub async fn timeout<T>(limit: Duration, fut: impl Future<Output = Result<T, SubmitError>>) -> Result<T, SubmitError> {
	let fut = std::pin::pin!(fut);
	let timer = std::pin::pin!(sleep(limit));
	match select(fut, timer).await {
		Either::Left((res, _)) => res,
		Either::Right(((), _)) => Err(SubmitError::Timeout(limit)),
	}
}

#[cfg(target_arch = "wasm32")]
async fn sleep(d: Duration) {
	let (tx, rx) = futures::channel::oneshot::channel::<()>();
	leptos::prelude::set_timeout(
		move || {
			let _ = tx.send(());
		},
		d,
	);
	let _ = rx.await;
}

#[cfg(all(not(target_arch = "wasm32"), feature = "ssr"))]
async fn sleep(d: Duration) {
	tokio::time::sleep(d).await
}

// no timer on native builds without a runtime
#[cfg(all(not(target_arch = "wasm32"), not(feature = "ssr")))]
async fn sleep(_d: Duration) {
	futures::future::pending::<()>().await
}
