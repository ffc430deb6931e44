use std::collections::BTreeMap;

use derive_more::{Deref, DerefMut, From};
use serde::{Deserialize, Serialize};

/// Flat `name -> value` mapping of a form's successful controls, taken at submit time.
#[derive(Clone, Debug, Default, Deref, DerefMut, From, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Empty string when the field was never submitted.
	pub fn value(&self, name: &str) -> &str {
		self.0.get(name).map(String::as_str).unwrap_or("")
	}

	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}

	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// What kind of form control an element is, as far as submission is concerned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlKind {
	/// text-like inputs, textareas, single selects
	Value(String),
	/// checkboxes and radios
	Checkable { checked: bool, value: String },
	/// `<select multiple>`: the selected option values in document order
	MultiSelect(Vec<String>),
	/// buttons, submit/reset/image/file inputs: never part of the payload
	Excluded,
}

/// A single form control, detached from the DOM.
#[derive(Clone, Debug, PartialEq, Eq, derive_new::new)]
pub struct Control {
	pub name: String,
	pub disabled: bool,
	pub kind: ControlKind,
}

impl Control {
	fn entries(self) -> Vec<(String, String)> {
		if self.name.is_empty() || self.disabled {
			return Vec::new();
		}
		match self.kind {
			ControlKind::Value(v) => vec![(self.name, v)],
			ControlKind::Checkable { checked: true, value } => vec![(self.name, value)],
			ControlKind::Checkable { checked: false, .. } | ControlKind::Excluded => Vec::new(),
			ControlKind::MultiSelect(selected) => selected.into_iter().map(|v| (self.name.clone(), v)).collect(),
		}
	}
}

/// Collects the successful controls into a [`FieldMap`]. Later entries win on repeated names.
pub fn collect_fields(controls: impl IntoIterator<Item = Control>) -> FieldMap {
	controls.into_iter().flat_map(Control::entries).collect()
}
