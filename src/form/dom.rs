//! Reads live form state out of the DOM.

use leptos::wasm_bindgen::JsCast;
use web_sys::{Element, HtmlButtonElement, HtmlFormElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement, HtmlTextAreaElement};

use super::fields::{Control, ControlKind, FieldMap, collect_fields};

/// Serializes `form` into its current field mapping.
pub fn serialize_form(form: &HtmlFormElement) -> FieldMap {
	collect_fields(read_controls(form))
}

pub fn read_controls(form: &HtmlFormElement) -> Vec<Control> {
	let elements = form.elements();
	(0..elements.length()).filter_map(|i| elements.item(i)).filter_map(control_of).collect()
}

fn control_of(el: Element) -> Option<Control> {
	let el = match el.dyn_into::<HtmlInputElement>() {
		Ok(input) => return Some(input_control(&input)),
		Err(el) => el,
	};
	let el = match el.dyn_into::<HtmlSelectElement>() {
		Ok(select) => return Some(select_control(&select)),
		Err(el) => el,
	};
	let el = match el.dyn_into::<HtmlTextAreaElement>() {
		Ok(area) => return Some(Control::new(area.name(), area.disabled(), ControlKind::Value(area.value()))),
		Err(el) => el,
	};
	// fieldsets, outputs and objects also live in `form.elements`; only buttons matter, and only to be skipped
	el.dyn_into::<HtmlButtonElement>().ok().map(|b| Control::new(b.name(), b.disabled(), ControlKind::Excluded))
}

fn input_control(input: &HtmlInputElement) -> Control {
	let kind = match input.type_().to_ascii_lowercase().as_str() {
		"submit" | "button" | "reset" | "image" | "file" => ControlKind::Excluded,
		"checkbox" | "radio" => ControlKind::Checkable {
			checked: input.checked(),
			value: input.value(),
		},
		_ => ControlKind::Value(input.value()),
	};
	Control::new(input.name(), input.disabled(), kind)
}

fn select_control(select: &HtmlSelectElement) -> Control {
	let kind = if select.multiple() {
		let options = select.selected_options();
		let selected = (0..options.length())
			.filter_map(|i| options.item(i))
			.filter_map(|o| o.dyn_into::<HtmlOptionElement>().ok())
			.map(|o| o.value())
			.collect();
		ControlKind::MultiSelect(selected)
	} else {
		ControlKind::Value(select.value())
	};
	Control::new(select.name(), select.disabled(), kind)
}
