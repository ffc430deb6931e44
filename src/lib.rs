pub mod app;
pub mod config;
pub mod form;
pub mod gmaps;
pub mod user;

#[cfg(feature = "ssr")]
pub mod ajax;
#[cfg(feature = "ssr")]
pub mod api;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
	console_error_panic_hook::set_once();
	tracing_wasm::set_as_global_default();
	leptos::mount::hydrate_islands();
}
