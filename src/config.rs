extern crate clap;

use std::time::Duration;

/// A string that can be either a direct value or resolved from an environment variable.
/// Deserializes from either `"value"` or `{ env = "VAR_NAME" }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct EnvString(pub String);

impl<'de> serde::Deserialize<'de> for EnvString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::de::Deserializer<'de>, {
		use serde::de::{Error, MapAccess, Visitor};

		struct EnvStringVisitor;

		impl<'de> Visitor<'de> for EnvStringVisitor {
			type Value = EnvString;

			fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
				formatter.write_str("a string or a map with key 'env'")
			}

			fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
			where
				E: Error, {
				Ok(EnvString(value.to_owned()))
			}

			fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
			where
				M: MapAccess<'de>, {
				let mut env_var: Option<String> = None;
				while let Some(key) = map.next_key::<String>()? {
					if key == "env" {
						env_var = Some(map.next_value()?);
					} else {
						let _: serde::de::IgnoredAny = map.next_value()?;
					}
				}
				let env_var = env_var.ok_or_else(|| Error::custom("expected 'env' key"))?;
				let value = std::env::var(&env_var).map_err(|_| Error::custom(format!("environment variable '{env_var}' not found")))?;
				Ok(EnvString(value))
			}
		}

		deserializer.deserialize_any(EnvStringVisitor)
	}
}

#[derive(Clone, Debug, v_utils::macros::MyConfigPrimitives)]
#[cfg_attr(feature = "ssr", derive(v_utils::macros::Settings))]
pub struct Settings {
	/// Upstream JSON API the AJAX endpoints proxy to
	#[serde(default)]
	pub api: ApiConfig,
	#[serde(default)]
	pub maps: MapsConfig,
	/// Base URL for the site
	#[serde(default = "__default_site_url")]
	#[primitives(skip)]
	pub site_url: String,
}

fn __default_site_url() -> String {
	"http://localhost:61156".to_string()
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			api: ApiConfig::default(),
			maps: MapsConfig::default(),
			site_url: __default_site_url(),
		}
	}
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct ApiConfig {
	#[serde(default = "__default_api_url")]
	pub url: String,
	/// Sent as `apikey` in the `Authorization` header (can use { env = "VAR_NAME" })
	#[serde(default = "__default_api_key")]
	pub key: EnvString,
	#[serde(default = "__default_api_timeout_ms")]
	pub timeout_ms: u64,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			url: __default_api_url(),
			key: __default_api_key(),
			timeout_ms: __default_api_timeout_ms(),
		}
	}
}

impl ApiConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}
}

fn __default_api_url() -> String {
	"http://localhost:5000".to_string()
}

fn __default_api_key() -> EnvString {
	EnvString("whatever".to_string())
}

fn __default_api_timeout_ms() -> u64 {
	10_000
}

#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct MapsConfig {
	/// Google Maps JavaScript API key (from Google Cloud Console, can use { env = "VAR_NAME" })
	#[serde(default)]
	pub api_key: EnvString,
}

impl MapsConfig {
	pub fn is_configured(&self) -> bool {
		!self.api_key.0.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn env_string_reads_literals_and_env_vars() {
		let literal: EnvString = serde_json::from_str(r#""abc""#).unwrap();
		assert_eq!(literal, EnvString("abc".into()));

		// PATH is set in any environment that runs tests
		let from_env: EnvString = serde_json::from_str(r#"{"env": "PATH"}"#).unwrap();
		assert_eq!(from_env.0, std::env::var("PATH").unwrap());

		assert!(serde_json::from_str::<EnvString>(r#"{"env": "COUCH_SITE_SURELY_UNSET_VAR"}"#).is_err());
		assert!(serde_json::from_str::<EnvString>(r#"{"other": "x"}"#).is_err());
	}

	#[test]
	fn api_section_defaults_fill_gaps() {
		let api: ApiConfig = serde_json::from_str(r#"{"url": "https://api.example.org"}"#).unwrap();
		assert_eq!(api.url, "https://api.example.org");
		assert_eq!(api.key, EnvString("whatever".into()));
		assert_eq!(api.timeout(), Duration::from_secs(10));
	}

	#[test]
	fn maps_need_a_key() {
		assert!(!MapsConfig::default().is_configured());
		let maps: MapsConfig = serde_json::from_str(r#"{"api_key": "k"}"#).unwrap();
		assert!(maps.is_configured());
	}
}
