use serde::{Deserialize, Serialize};

use crate::form::FieldMap;

pub const URL_ROOT: &str = "/users";

/// Client-side mirror of a user resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserRecord {
	/// Assigned by the server.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<u64>,
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub first_name: Option<String>,
	#[serde(default)]
	pub last_name: Option<String>,
	#[serde(default)]
	pub city_id: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum UserInvalid {
	#[display("Username not present")]
	Username,
	#[display("First name not present")]
	FirstName,
	#[display("Last name not present")]
	LastName,
	#[display("City not present")]
	City,
}

impl std::error::Error for UserInvalid {}

impl UserRecord {
	/// Reads the record's attributes from submitted form fields. A `city_id` that is not an integer counts as absent.
	pub fn from_fields(fields: &FieldMap) -> Self {
		let text = |name: &str| fields.get(name).cloned();
		Self {
			id: None,
			username: text("username"),
			first_name: text("first_name"),
			last_name: text("last_name"),
			city_id: fields.get("city_id").and_then(|v| v.trim().parse().ok()),
		}
	}

	/// First missing attribute, checked as username, first name, last name, city.
	pub fn validate(&self) -> Result<(), UserInvalid> {
		let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
		if !present(&self.username) {
			return Err(UserInvalid::Username);
		}
		if !present(&self.first_name) {
			return Err(UserInvalid::FirstName);
		}
		if !present(&self.last_name) {
			return Err(UserInvalid::LastName);
		}
		if self.city_id.is_none() {
			return Err(UserInvalid::City);
		}
		Ok(())
	}

	pub fn is_valid(&self) -> bool {
		self.validate().is_ok()
	}

	pub fn url(&self) -> String {
		match self.id {
			Some(id) => format!("{URL_ROOT}/{id}"),
			None => URL_ROOT.to_owned(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct City {
	pub id: u64,
	pub name: String,
	#[serde(default)]
	pub latitude: Option<f64>,
	#[serde(default)]
	pub longitude: Option<f64>,
}

/// The logged-in user as the API returns it with `expand=city`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CurrentUser {
	pub id: u64,
	pub username: String,
	#[serde(default)]
	pub first_name: String,
	#[serde(default)]
	pub last_name: String,
	#[serde(default)]
	pub city: Option<City>,
}

impl CurrentUser {
	pub fn display_name(&self) -> String {
		match (self.first_name.is_empty(), self.last_name.is_empty()) {
			(true, true) => self.username.clone(),
			_ => format!("{} {}", self.first_name, self.last_name).trim().to_owned(),
		}
	}

	pub fn initial(&self) -> char {
		self.username.chars().next().unwrap_or('?').to_ascii_uppercase()
	}

	/// `(lat, lng)` of the user's city, when the API knows it.
	pub fn coordinates(&self) -> Option<(f64, f64)> {
		let city = self.city.as_ref()?;
		Some((city.latitude?, city.longitude?))
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	fn complete() -> UserRecord {
		UserRecord {
			id: None,
			username: Some("marco".into()),
			first_name: Some("Marco".into()),
			last_name: Some("Polo".into()),
			city_id: Some(3),
		}
	}

	#[test]
	fn complete_record_is_valid() {
		assert_eq!(complete().validate(), Ok(()));
	}

	#[rstest]
	#[case::username(|u: &mut UserRecord| u.username = None, "Username not present")]
	#[case::first_name(|u: &mut UserRecord| u.first_name = None, "First name not present")]
	#[case::last_name(|u: &mut UserRecord| u.last_name = None, "Last name not present")]
	#[case::city(|u: &mut UserRecord| u.city_id = None, "City not present")]
	#[case::empty_username(|u: &mut UserRecord| u.username = Some(String::new()), "Username not present")]
	#[case::empty_last_name(|u: &mut UserRecord| u.last_name = Some(String::new()), "Last name not present")]
	fn single_missing_field_is_reported(#[case] strip: fn(&mut UserRecord), #[case] expected: &str) {
		let mut user = complete();
		strip(&mut user);
		assert_eq!(user.validate().unwrap_err().to_string(), expected);
	}

	#[rstest]
	#[case::all(UserRecord::default(), UserInvalid::Username)]
	#[case::names(UserRecord { username: Some("marco".into()), ..Default::default() }, UserInvalid::FirstName)]
	#[case::last_and_city(UserRecord { last_name: None, city_id: None, ..complete() }, UserInvalid::LastName)]
	fn earliest_missing_field_wins(#[case] user: UserRecord, #[case] expected: UserInvalid) {
		assert_eq!(user.validate(), Err(expected));
	}

	#[test]
	fn record_from_form_fields() {
		let fields = FieldMap::from_iter([("username", "marco"), ("first_name", "Marco"), ("last_name", "Polo"), ("city_id", " 12 ")]);
		let user = UserRecord::from_fields(&fields);
		assert_eq!(user.city_id, Some(12));
		assert!(user.is_valid());

		let fields = FieldMap::from_iter([("username", "marco"), ("first_name", "Marco"), ("last_name", "Polo"), ("city_id", "Venice")]);
		assert_eq!(UserRecord::from_fields(&fields).validate(), Err(UserInvalid::City));
	}

	#[test]
	fn resource_path_follows_the_id() {
		assert_eq!(complete().url(), "/users");
		assert_eq!(UserRecord { id: Some(42), ..complete() }.url(), "/users/42");
	}

	#[test]
	fn current_user_coordinates_need_both_axes() {
		let json = r#"{"id": 1, "username": "marco", "first_name": "Marco", "last_name": "Polo",
			"city": {"id": 3, "name": "Venezia", "latitude": 45.44, "longitude": 12.33}}"#;
		let user: CurrentUser = serde_json::from_str(json).unwrap();
		assert_eq!(user.coordinates(), Some((45.44, 12.33)));
		assert_eq!(user.display_name(), "Marco Polo");
		assert_eq!(user.initial(), 'M');

		let user: CurrentUser = serde_json::from_str(r#"{"id": 1, "username": "marco", "city": {"id": 3, "name": "Venezia"}}"#).unwrap();
		assert_eq!(user.coordinates(), None);
		assert_eq!(user.display_name(), "marco");
	}
}
