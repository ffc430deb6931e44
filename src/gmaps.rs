//! Google Maps marker embed for a single point.
//!
//! The maps script is only fetched when a page actually carries the `#map_canvas` container.

pub const MAP_CANVAS_ID: &str = "map_canvas";
pub const MAP_SIZE_PX: u32 = 220;
pub const ZOOM: u8 = 8;
const SCRIPT_ID: &str = "gmaps-script";
const SCRIPT_BASE: &str = "https://maps.googleapis.com/maps/api/js";

#[derive(Clone, Copy, Debug, PartialEq, derive_new::new)]
pub struct MapEmbed {
	pub lat: f64,
	pub lng: f64,
}

pub fn script_url(api_key: &str) -> String {
	format!("{SCRIPT_BASE}?key={api_key}&sensor=false")
}

/// Inline style applied to the container once the map is drawn.
pub fn canvas_style() -> String {
	format!("width: {MAP_SIZE_PX}px; height: {MAP_SIZE_PX}px;")
}

#[cfg(feature = "hydrate")]
mod bindings {
	use wasm_bindgen::prelude::*;

	#[wasm_bindgen]
	extern "C" {
		#[wasm_bindgen(js_namespace = ["google", "maps"])]
		pub type LatLng;
		#[wasm_bindgen(constructor, js_namespace = ["google", "maps"])]
		pub fn new(lat: f64, lng: f64) -> LatLng;

		#[wasm_bindgen(js_namespace = ["google", "maps"], js_name = Map)]
		pub type GMap;
		#[wasm_bindgen(constructor, js_namespace = ["google", "maps"], js_class = "Map")]
		pub fn new(container: &web_sys::Element, options: &JsValue) -> GMap;

		#[wasm_bindgen(js_namespace = ["google", "maps"])]
		pub type Marker;
		#[wasm_bindgen(constructor, js_namespace = ["google", "maps"])]
		pub fn new(options: &JsValue) -> Marker;
	}
}

#[cfg(feature = "hydrate")]
impl MapEmbed {
	/// Draws the map into `#map_canvas`, loading the maps script first if needed. No container, no-op.
	pub fn mount(self, api_key: &str) {
		use wasm_bindgen::{JsCast, closure::Closure};

		let Some(document) = web_sys::window().and_then(|w| w.document()) else {
			return;
		};
		if document.get_element_by_id(MAP_CANVAS_ID).is_none() {
			return;
		}
		if maps_loaded() {
			self.render();
			return;
		}
		let script = match document.get_element_by_id(SCRIPT_ID) {
			Some(existing) => existing,
			None => {
				let Ok(script) = document.create_element("script") else {
					return;
				};
				let _ = script.set_attribute("id", SCRIPT_ID);
				let _ = script.set_attribute("type", "text/javascript");
				let _ = script.set_attribute("src", &script_url(api_key));
				if let Some(body) = document.body() {
					let _ = body.append_child(&script);
				}
				script
			}
		};
		let on_load = Closure::once_into_js(move || self.render());
		let _ = script.add_event_listener_with_callback("load", on_load.unchecked_ref());
	}

	fn render(self) {
		use wasm_bindgen::JsValue;

		let Some(canvas) = web_sys::window().and_then(|w| w.document()).and_then(|d| d.get_element_by_id(MAP_CANVAS_ID)) else {
			return;
		};
		let center = bindings::LatLng::new(self.lat, self.lng);
		let map = bindings::GMap::new(&canvas, &options(&[("zoom", JsValue::from(ZOOM)), ("center", center.clone().into()), ("mapTypeId", "roadmap".into())]));
		let _marker = bindings::Marker::new(&options(&[("position", center.into()), ("map", map.into())]));
		let _ = canvas.set_attribute("style", &canvas_style());
		tracing::debug!(lat = self.lat, lng = self.lng, "map rendered");
	}
}

#[cfg(not(feature = "hydrate"))]
impl MapEmbed {
	pub fn mount(self, _api_key: &str) {}
}

#[cfg(feature = "hydrate")]
fn maps_loaded() -> bool {
	use wasm_bindgen::JsValue;

	let global = js_sys::global();
	js_sys::Reflect::get(&global, &JsValue::from_str("google"))
		.and_then(|g| js_sys::Reflect::get(&g, &JsValue::from_str("maps")))
		.is_ok_and(|m| !m.is_undefined())
}

#[cfg(feature = "hydrate")]
fn options(entries: &[(&str, wasm_bindgen::JsValue)]) -> wasm_bindgen::JsValue {
	let obj = js_sys::Object::new();
	for (k, v) in entries {
		let _ = js_sys::Reflect::set(&obj, &(*k).into(), v);
	}
	obj.into()
}
