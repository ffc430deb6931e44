//! Client for the upstream JSON API.

use color_eyre::eyre::{Context, Result};
use reqwest::{
	Method, Response,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::Serialize;
use tracing::debug;

use crate::{config::ApiConfig, user::CurrentUser};

#[derive(Clone)]
pub struct ApiClient {
	http: reqwest::Client,
	base_url: String,
	api_key: String,
}

impl std::fmt::Debug for ApiClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ApiClient").field("base_url", &self.base_url).finish()
	}
}

impl ApiClient {
	pub fn new(config: &ApiConfig) -> Result<Self> {
		let http = reqwest::Client::builder().timeout(config.timeout()).build().wrap_err("Failed to build API HTTP client")?;
		Ok(Self {
			http,
			base_url: config.url.trim_end_matches('/').to_owned(),
			api_key: config.key.0.clone(),
		})
	}

	/// `MYC apikey="…"`, plus the session token when there is one.
	pub fn auth_header(&self, token: Option<&str>) -> String {
		match token {
			Some(token) => format!(r#"MYC apikey="{}", token="{token}""#, self.api_key),
			None => format!(r#"MYC apikey="{}""#, self.api_key),
		}
	}

	fn headers(&self, token: Option<&str>) -> Result<HeaderMap> {
		let mut headers = HeaderMap::new();
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		headers.insert(AUTHORIZATION, HeaderValue::from_str(&self.auth_header(token)).wrap_err("API key or token is not a valid header value")?);
		Ok(headers)
	}

	/// Raw call; status handling is up to the caller.
	pub async fn call<B: Serialize + ?Sized>(&self, method: Method, path: &str, token: Option<&str>, body: Option<&B>, params: &[(&str, &str)]) -> Result<Response> {
		let url = format!("{}{path}", self.base_url);
		debug!(%method, %url, "API call");
		let mut req = self.http.request(method.clone(), &url).headers(self.headers(token)?).query(params);
		if let Some(body) = body {
			req = req.json(body);
		}
		req.send().await.wrap_err_with(|| format!("{method} {url} failed"))
	}

	/// `None` when the token is missing or no longer accepted.
	pub async fn current_user(&self, token: &str) -> Result<Option<CurrentUser>> {
		let resp = self.call::<()>(Method::GET, "/current_user", Some(token), None, &[("expand", "city")]).await?;
		if !resp.status().is_success() {
			debug!(status = %resp.status(), "current user lookup rejected");
			return Ok(None);
		}
		let user = resp.json().await.wrap_err("Failed to parse current user")?;
		Ok(Some(user))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::EnvString;

	fn client() -> ApiClient {
		ApiClient::new(&ApiConfig {
			url: "http://api.local/".into(),
			key: EnvString("k3y".into()),
			timeout_ms: 1000,
		})
		.unwrap()
	}

	#[test]
	fn auth_header_with_and_without_token() {
		let api = client();
		assert_eq!(api.auth_header(None), r#"MYC apikey="k3y""#);
		assert_eq!(api.auth_header(Some("abc")), r#"MYC apikey="k3y", token="abc""#);
	}

	#[test]
	fn base_url_loses_trailing_slash() {
		assert_eq!(client().base_url, "http://api.local");
	}
}
