//! Leptos client-side app: PDF upload, text-selection insights and a
//! force-directed cluster graph.

use std::rc::Rc;

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

pub mod api;
pub mod config;
pub mod error;
pub mod upload;

// Modules
mod components;
mod pages;

use crate::api::DataSource;
use crate::config::AppConfig;
// Top-Level pages
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Handle to the injected [`DataSource`], shared through context.
#[derive(Clone, Copy)]
pub struct Backend(StoredValue<Rc<dyn DataSource>, LocalStorage>);

impl Backend {
	/// Wrap a data source for the current reactive owner.
	pub fn new(source: Rc<dyn DataSource>) -> Self {
		Self(StoredValue::new_local(source))
	}

	/// The shared data source.
	pub fn get(&self) -> Rc<dyn DataSource> {
		self.0.get_value()
	}
}

/// An app router which renders the workspace and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	let config = AppConfig::load();
	provide_context(Backend::new(api::source_for(&config)));
	provide_context(config);

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Insight Canvas" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
