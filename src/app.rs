use leptos::{ev, html::*, prelude::*};
use leptos_meta::{MetaTags, Stylesheet, StylesheetProps, Title, TitleProps, provide_meta_context};
use leptos_routable::prelude::*;
use leptos_router::{
	components::{A, AProps, Router},
	hooks::use_location,
};

use crate::{
	form::{self, BrowserNavigator, ErrorDisplay, FieldMap, FormSubmitter, HttpTransport, Navigator, SubmitError},
	gmaps::{MAP_CANVAS_ID, MapEmbed},
	user::{CurrentUser, UserRecord},
};

pub const LOGIN_ENDPOINT: &str = "/ajax/login";
pub const REGISTER_ENDPOINT: &str = "/ajax/register";
pub const LOGOUT_PATH: &str = "/ajax/logout";

#[cfg(feature = "ssr")]
pub mod server_impl {
	use leptos::server_fn::error::ServerFnError;
	use tracing::{debug, error, instrument};

	use super::*;
	use crate::{ajax::session_token, api::ApiClient, config::Settings};

	fn get_settings() -> Result<Settings, ServerFnError> {
		use_context::<Settings>().ok_or_else(|| ServerFnError::new("Settings not available"))
	}

	/// The one client built at startup; sharing it keeps a single connection pool.
	pub(super) fn get_api_client() -> Result<ApiClient, ServerFnError> {
		use_context::<ApiClient>().ok_or_else(|| ServerFnError::new("API client not available"))
	}

	#[instrument]
	pub async fn get_current_user_impl() -> Result<Option<CurrentUser>, ServerFnError> {
		use leptos_axum::extract;

		let headers: axum::http::HeaderMap = extract().await.map_err(|e| ServerFnError::new(format!("Failed to extract headers: {}", e)))?;
		let Some(token) = session_token(&headers) else {
			debug!("No session cookie");
			return Ok(None);
		};

		let api = get_api_client()?;
		api.current_user(&token).await.map_err(|e| {
			error!("Failed to fetch current user: {:#}", e);
			ServerFnError::new("Could not reach the API")
		})
	}

	pub fn get_maps_api_key_impl() -> Result<Option<String>, ServerFnError> {
		let settings = get_settings()?;
		Ok(settings.maps.is_configured().then(|| settings.maps.api_key.0.clone()))
	}
}

#[server(GetCurrentUser)]
pub async fn get_current_user() -> Result<Option<CurrentUser>, ServerFnError> {
	server_impl::get_current_user_impl().await
}

#[server(GetMapsApiKey)]
pub async fn get_maps_api_key() -> Result<Option<String>, ServerFnError> {
	server_impl::get_maps_api_key_impl()
}

/// Inline feedback for one form: the server's error list, or why the request itself failed.
#[derive(Clone, Copy, Debug)]
struct FormFeedback {
	errors: RwSignal<Vec<String>>,
	failure: RwSignal<Option<String>>,
}

impl FormFeedback {
	fn new() -> Self {
		Self {
			errors: RwSignal::new(Vec::new()),
			failure: RwSignal::new(None),
		}
	}

	fn view(self) -> impl IntoView {
		(
			move || {
				let errors = self.errors.get();
				(!errors.is_empty()).then(|| {
					ul().class("bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded mb-4 list-disc list-inside")
						.child(errors.into_iter().map(|e| li().child(e)).collect::<Vec<_>>())
				})
			},
			move || {
				self.failure
					.get()
					.map(|f| div().class("bg-yellow-100 border border-yellow-400 text-yellow-800 px-4 py-3 rounded mb-4").child(format!("Request failed: {f}. Please try again.")))
			},
		)
	}
}

impl ErrorDisplay for FormFeedback {
	fn show_errors(&self, errors: &[String]) {
		self.errors.set(errors.to_vec());
	}

	fn show_failure(&self, error: &SubmitError) {
		self.failure.set(Some(error.to_string()));
	}

	fn clear(&self) {
		self.errors.set(Vec::new());
		self.failure.set(None);
	}
}

/// Submit handler for an AJAX form: serializes the form, optionally vets the fields, then hands over to `submitter`.
/// `busy` is raised for the duration of the request.
fn ajax_submit(
	submitter: FormSubmitter<HttpTransport>,
	feedback: FormFeedback,
	busy: RwSignal<bool>,
	precheck: fn(&FieldMap) -> Result<(), String>,
) -> impl Fn(web_sys::SubmitEvent) + Clone + Send + Sync + 'static {
	move |e: web_sys::SubmitEvent| {
		e.prevent_default();
		if busy.get_untracked() {
			return;
		}
		let form_el: web_sys::HtmlFormElement = event_target(&e);
		let fields = form::dom::serialize_form(&form_el);
		if let Err(msg) = precheck(&fields) {
			feedback.clear();
			feedback.show_errors(&[msg]);
			return;
		}

		let submitter = submitter.clone();
		busy.set(true);
		wasm_bindgen_futures::spawn_local(async move {
			submitter.run(&fields, &BrowserNavigator, &feedback).await;
			busy.set(false);
		});
	}
}

fn text_input(name: &'static str, label_text: &'static str, input_type: &'static str) -> impl IntoView {
	div().class("mb-4").child((
		label().class("block text-gray-700 text-sm font-bold mb-2").attr("for", name).child(label_text),
		input()
			.attr("type", input_type)
			.attr("id", name)
			.attr("name", name)
			.class("w-full px-3 py-2 border border-gray-300 rounded focus:outline-none focus:border-blue-500"),
	))
}

/// Navigation link that highlights when the current route matches (or is a child of) the href.
/// For the root path "/", uses exact matching.
#[component]
fn NavLink(href: &'static str, label: &'static str) -> impl IntoView {
	let location = use_location();

	let is_active = Memo::new(move |_| {
		let pathname = location.pathname.get();
		if href == "/" {
			pathname == "/"
		} else {
			pathname == href || pathname.starts_with(&format!("{}/", href))
		}
	});

	A(AProps {
		href: href.to_string(),
		children: Box::new(move || {
			span()
				.class(move || {
					if is_active.get() {
						"px-3 py-1 rounded bg-gray-700 text-white transition-colors"
					} else {
						"px-3 py-1 rounded hover:bg-gray-700/50 transition-colors"
					}
				})
				.child(label)
				.into_any()
		}),
		target: None,
		exact: false,
		strict_trailing_slash: false,
		scroll: true,
	})
}

#[component]
fn TopBar() -> impl IntoView {
	nav().class("flex items-center gap-4 px-4 py-2 bg-gray-800 text-white").child((
		a().attr("href", "/").class("font-bold text-lg").child("MyCouch"),
		div().class("flex gap-2").child((
			NavLink(NavLinkProps { href: "/", label: "Home" }),
			NavLink(NavLinkProps { href: "/profile", label: "Profile" }),
		)),
		div().class("ml-auto").child(UserArea()),
	))
}

/// Login form when logged out, the user's name and a logout link otherwise.
#[island]
fn UserArea() -> impl IntoView {
	let user_resource = LocalResource::new(get_current_user);

	move || match user_resource.get().map(|w| w.take()) {
		None => div().class("w-32 h-8 rounded bg-gray-700 animate-pulse").into_any(),
		Some(Ok(Some(user))) => div()
			.class("flex items-center gap-3")
			.child((
				a().attr("href", "/profile")
					.class("w-8 h-8 rounded-full bg-blue-500 flex items-center justify-center font-bold text-white hover:opacity-80 transition-opacity")
					.attr("title", user.display_name())
					.child(user.initial().to_string()),
				a().attr("href", LOGOUT_PATH).class("text-sm hover:underline").child("Logout"),
			))
			.into_any(),
		Some(Ok(None)) => LoginForm().into_any(),
		Some(Err(e)) => div()
			.class("flex items-center gap-3")
			.child((span().class("text-sm text-yellow-300").child(unreachable_hint(&e)), LoginForm()))
			.into_any(),
	}
}

/// Shown next to the login form when the user lookup itself failed, so an outage doesn't pass for being logged out.
fn unreachable_hint(e: &ServerFnError) -> String {
	tracing::warn!("Could not look up the current user: {e}");
	format!("Server unreachable ({e})")
}

/// Posts to the login endpoint and reloads the page on success.
#[component]
fn LoginForm() -> impl IntoView {
	let feedback = FormFeedback::new();
	let busy = RwSignal::new(false);
	let submitter = FormSubmitter::new(LOGIN_ENDPOINT, HttpTransport::default());
	let on_submit = ajax_submit(submitter, feedback, busy, |_| Ok(()));

	div().class("relative").child((
		form()
			.attr("id", "login_form")
			.class("flex items-center gap-2")
			.on(ev::submit, on_submit)
			.child((
				input()
					.attr("type", "text")
					.attr("name", "username")
					.attr("placeholder", "Username")
					.class("px-2 py-1 rounded text-black"),
				input()
					.attr("type", "password")
					.attr("name", "password")
					.attr("placeholder", "Password")
					.class("px-2 py-1 rounded text-black"),
				button()
					.attr("type", "submit")
					.attr("disabled", move || busy.get())
					.class("px-3 py-1 bg-blue-500 rounded hover:bg-blue-600 transition-colors disabled:opacity-50")
					.child(move || if busy.get() { "..." } else { "Login" }),
				a().attr("href", "/register").class("text-sm hover:underline").child("Register"),
			)),
		div().class("absolute right-0 mt-2 w-80 text-sm z-10").child(feedback.view()),
	))
}

#[derive(Routable)]
#[routes(view_prefix = "", view_suffix = "View", transition = false)]
pub enum AppRoutes {
	#[route(path = "/")]
	Home,
	#[route(path = "/register")]
	Register,
	#[route(path = "/profile")]
	Profile,
	#[fallback]
	#[route(path = "/404")]
	NotFound,
}

pub fn shell(options: LeptosOptions) -> impl IntoView {
	view! {
		<!DOCTYPE html>
		<html lang="en">
			<head>
				<meta charset="utf-8" />
				<meta name="viewport" content="width=device-width, initial-scale=1" />
				<AutoReload options=options.clone() />
				<HydrationScripts options islands=true />
				<MetaTags />
			</head>
			<body>
				<App />
			</body>
		</html>
	}
}

#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();
	(
		Stylesheet(StylesheetProps {
			id: Some("leptos".to_owned()),
			href: format!("/pkg/{}.css", env!("CARGO_PKG_NAME")),
		}),
		Title(TitleProps {
			formatter: None,
			text: Some("MyCouch".into()),
		}),
		view! {
			<Router>
				<TopBar />
				<main class="min-h-screen">{move || AppRoutes::routes()}</main>
			</Router>
		},
	)
}

#[component]
fn HomeView() -> impl IntoView {
	section().class("p-8 max-w-2xl mx-auto text-center").child((
		Title(TitleProps {
			formatter: None,
			text: Some("Welcome".into()),
		}),
		h1().class("text-3xl font-bold mb-4").child("Welcome to MyCouch"),
		p().class("text-gray-600").child("Find hosts, travellers and activities in your city."),
	))
}

#[component]
fn RegisterView() -> impl IntoView {
	section().class("p-4 max-w-md mx-auto mt-8").child((
		Title(TitleProps {
			formatter: None,
			text: Some("Register".into()),
		}),
		RegisterForm(),
	))
}

/// Generic AJAX poster configured for registration: redirects to the profile on success.
#[island]
fn RegisterForm() -> impl IntoView {
	let feedback = FormFeedback::new();
	let busy = RwSignal::new(false);
	let submitter = FormSubmitter::new(REGISTER_ENDPOINT, HttpTransport::default()).redirect_to("/profile");
	let on_submit = ajax_submit(submitter, feedback, busy, |fields| UserRecord::from_fields(fields).validate().map_err(|e| e.to_string()));

	form().attr("id", "register_form").on(ev::submit, on_submit).child((
		h1().class("text-2xl font-bold mb-6 text-center").child("Register"),
		feedback.view(),
		text_input("username", "Username", "text"),
		text_input("password", "Password", "password"),
		text_input("confirm_password", "Confirm password", "password"),
		text_input("first_name", "First name", "text"),
		text_input("last_name", "Last name", "text"),
		text_input("email", "E-mail", "email"),
		text_input("city_id", "City ID", "number"),
		button()
			.attr("type", "submit")
			.attr("disabled", move || busy.get())
			.class("w-full bg-blue-500 text-white py-2 px-4 rounded hover:bg-blue-600 transition-colors disabled:opacity-50")
			.child(move || if busy.get() { "Loading..." } else { "Register" }),
	))
}

#[component]
fn ProfileView() -> impl IntoView {
	section().class("p-4 max-w-md mx-auto mt-8").child((
		Title(TitleProps {
			formatter: None,
			text: Some("Profile".into()),
		}),
		ProfileContent(),
	))
}

#[island]
fn ProfileContent() -> impl IntoView {
	let user_resource = LocalResource::new(get_current_user);

	move || match user_resource.get().map(|w| w.take()) {
		None => div().class("text-center").child("Loading...").into_any(),
		Some(Ok(Some(user))) => div()
			.class("text-center")
			.child((
				h1().class("text-2xl font-bold mb-4").child(user.display_name()),
				div().class("bg-gray-100 rounded-lg p-6 mb-4").child((
					p().class("text-lg mb-2").child(format!("Username: {}", user.username)),
					user.city.as_ref().map(|c| p().class("text-gray-600").child(format!("City: {}", c.name))),
				)),
				user.coordinates().map(|(lat, lng)| CityMap(CityMapProps { lat, lng })),
			))
			.into_any(),
		Some(Err(e)) => div().class("text-center text-red-600").child(format!("Could not load your profile: {e}")).into_any(),
		Some(Ok(None)) => {
			Effect::new(move |_| BrowserNavigator.go_to("/register"));
			div().class("text-center").child("Not logged in, redirecting...").into_any()
		}
	}
}

#[component]
fn CityMap(lat: f64, lng: f64) -> impl IntoView {
	let api_key = LocalResource::new(get_maps_api_key);
	Effect::new(move |_| {
		if let Some(Ok(Some(key))) = api_key.get().map(|w| w.take()) {
			MapEmbed::new(lat, lng).mount(&key);
		}
	});
	div().attr("id", MAP_CANVAS_ID).class("mx-auto rounded overflow-hidden")
}

#[component]
pub fn NotFoundView() -> impl IntoView {
	div().class("p-4 text-center").child((
		h1().class("text-2xl font-bold").child("404: Not Found"),
		p().child("Sorry, we can't find that page"),
		A(AProps {
			href: "/".to_string(),
			children: Box::new(|| view! { "Go Home" }.into_any()),
			target: None,
			exact: false,
			strict_trailing_slash: false,
			scroll: true,
		})
		.attr("class", "inline-block px-4 py-2 bg-green-500 text-white rounded mt-4"),
	))
}
