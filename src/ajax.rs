//! JSON endpoints the site's forms post to. Every answer carries an `error_list`; an empty one means success.

use axum::{
	Json, Router,
	extract::State,
	http::{
		HeaderMap, HeaderValue,
		header::{COOKIE, SET_COOKIE},
	},
	response::{IntoResponse, Redirect, Response},
	routing::{get, post},
};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{error, info, instrument, warn};

use crate::{api::ApiClient, form::FieldMap};

pub const SESSION_COOKIE: &str = "session_token";
/// Upstream tokens live for a day.
const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24;

const NOT_AUTHORIZED: &str = "Not authorized.";
const UNEXPECTED: &str = "Unexpected error.";

#[derive(Clone, Debug)]
pub struct AjaxState {
	pub api: ApiClient,
}

pub fn router<S: Clone + Send + Sync + 'static>(state: AjaxState) -> Router<S> {
	Router::new()
		.route("/ajax/login", post(login))
		.route("/ajax/register", post(register))
		.route("/ajax/logout", get(logout))
		.with_state(state)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AjaxResponse {
	pub error_list: Vec<String>,
	#[serde(flatten)]
	pub payload: Map<String, Value>,
}

impl AjaxResponse {
	fn error(msg: &str) -> Self {
		Self {
			error_list: vec![msg.to_owned()],
			..Default::default()
		}
	}
}

/// Reads our session token out of a `Cookie` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
	headers.get_all(COOKIE).iter().filter_map(|v| v.to_str().ok()).flat_map(|cookies| cookies.split(';')).find_map(|cookie| {
		let (name, value) = cookie.trim().split_once('=')?;
		(name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_owned())
	})
}

fn session_cookie(token: &str) -> Option<HeaderValue> {
	cookie_header(token, SESSION_MAX_AGE_SECS)
}

fn cleared_session_cookie() -> Option<HeaderValue> {
	cookie_header("", 0)
}

fn cookie_header(token: &str, max_age: u64) -> Option<HeaderValue> {
	HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")).ok()
}

/// The parts of an upstream user the page needs after logging in.
fn user_summary(user: &Value) -> Map<String, Value> {
	let mut out = Map::new();
	for key in ["username", "id", "first_name", "last_name", "city_id", "country", "country_code"] {
		out.insert(key.to_owned(), user.get(key).cloned().unwrap_or(Value::Null));
	}
	out.insert("city".to_owned(), user.pointer("/city/name").cloned().unwrap_or(Value::Null));
	out
}

/// Turns an upstream answer that should carry a token into our response, setting the session cookie on success.
async fn open_session(resp: Result<reqwest::Response, color_eyre::Report>) -> Response {
	let resp = match resp {
		Ok(resp) => resp,
		Err(e) => {
			error!("Upstream API unreachable: {e:#}");
			return Json(AjaxResponse::error(UNEXPECTED)).into_response();
		}
	};
	match resp.status().as_u16() {
		200 => {}
		401 => {
			info!("Upstream refused credentials");
			return Json(AjaxResponse::error(NOT_AUTHORIZED)).into_response();
		}
		status => {
			warn!(status, "Unexpected upstream status");
			return Json(AjaxResponse::error(UNEXPECTED)).into_response();
		}
	}
	let user: Value = match resp.json().await {
		Ok(user) => user,
		Err(e) => {
			error!("Upstream answered with unparsable user: {e}");
			return Json(AjaxResponse::error(UNEXPECTED)).into_response();
		}
	};
	let Some(cookie) = user.get("token").and_then(Value::as_str).and_then(session_cookie) else {
		error!("Upstream user carries no usable token");
		return Json(AjaxResponse::error(UNEXPECTED)).into_response();
	};
	info!("Session opened");
	let body = AjaxResponse {
		error_list: Vec::new(),
		payload: user_summary(&user),
	};
	([(SET_COOKIE, cookie)], Json(body)).into_response()
}

#[instrument(skip_all, fields(username = %payload.value("username")))]
pub async fn login(State(state): State<AjaxState>, payload: Json<FieldMap>) -> Response {
	let Json(fields) = payload;
	info!("Login attempt");
	let creds = json!({
		"username": fields.value("username"),
		"password": fields.value("password"),
	});
	open_session(state.api.call(Method::POST, "/auth", None, Some(&creds), &[("expand", "city")]).await).await
}

#[instrument(skip_all, fields(username = %payload.value("username")))]
pub async fn register(State(state): State<AjaxState>, payload: Json<FieldMap>) -> Response {
	let Json(fields) = payload;
	info!("Registration attempt");
	let request = match NewUser::parse(&fields) {
		Ok(request) => request,
		Err(error_list) => {
			info!(n_errors = error_list.len(), "Registration form rejected");
			return Json(AjaxResponse {
				error_list,
				..Default::default()
			})
			.into_response();
		}
	};
	open_session(state.api.call(Method::POST, "/users", None, Some(&request), &[("expand", "city")]).await).await
}

pub async fn logout(State(state): State<AjaxState>, headers: HeaderMap) -> Response {
	if let Some(token) = session_token(&headers) {
		if let Err(e) = state.api.call::<()>(Method::DELETE, "/auth", Some(&token), None, &[]).await {
			warn!("Failed to end upstream session: {e:#}");
		}
	}
	let mut resp = Redirect::to("/").into_response();
	if let Some(cookie) = cleared_session_cookie() {
		resp.headers_mut().insert(SET_COOKIE, cookie);
	}
	resp
}

/// Registration payload forwarded upstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewUser {
	pub username: String,
	pub password: String,
	pub first_name: String,
	pub last_name: String,
	pub email: String,
	pub city_id: u64,
}

impl NewUser {
	/// Validates the registration form. Errors come as `"<field>: <message>"`, in form order.
	pub fn parse(fields: &FieldMap) -> Result<Self, Vec<String>> {
		let mut errors = Vec::new();
		let username = required(fields, "username", &mut errors);
		let password = fields.value("password").to_owned();
		if password.is_empty() {
			errors.push(format!("password: {REQUIRED}"));
		}
		let confirm = fields.value("confirm_password");
		if confirm.is_empty() {
			errors.push(format!("confirm_password: {REQUIRED}"));
		} else if confirm != password {
			errors.push("confirm_password: Field must be equal to password.".to_owned());
		}
		let first_name = required(fields, "first_name", &mut errors);
		let last_name = required(fields, "last_name", &mut errors);
		let email = required(fields, "email", &mut errors);
		if !email.is_empty() && !looks_like_email(&email) {
			errors.push("email: Invalid email address.".to_owned());
		}
		let city_id = match required(fields, "city_id", &mut errors).as_str() {
			"" => None,
			v => {
				let parsed = v.parse().ok();
				if parsed.is_none() {
					errors.push("city_id: Not a valid integer value.".to_owned());
				}
				parsed
			}
		};

		match city_id {
			Some(city_id) if errors.is_empty() => Ok(Self {
				username,
				password,
				first_name,
				last_name,
				email,
				city_id,
			}),
			_ => Err(errors),
		}
	}
}

const REQUIRED: &str = "This field is required.";

/// Trimmed value of `name`, recording an error when it is blank.
fn required(fields: &FieldMap, name: &str, errors: &mut Vec<String>) -> String {
	let v = fields.value(name).trim();
	if v.is_empty() {
		errors.push(format!("{name}: {REQUIRED}"));
	}
	v.to_owned()
}

fn looks_like_email(s: &str) -> bool {
	match s.split_once('@') {
		Some((local, domain)) => !local.is_empty() && !domain.contains('@') && domain.split('.').count() >= 2 && domain.split('.').all(|p| !p.is_empty()),
		None => false,
	}
}
