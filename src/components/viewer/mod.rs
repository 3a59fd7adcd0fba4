//! Embedded PDF viewer.
//!
//! The rendering engine is the external PDF embed SDK (`AdobeDC.View`), which
//! must be loaded by the host page. We only load documents, listen for
//! selections, and jump to pages.

mod selection;
mod shelf;

use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::error::{AppError, AppResult};
pub use selection::{SelectionBridge, SelectionEvent};
pub use shelf::DocumentShelf;

const VIEWER_DIV: &str = "pdf-viewer";

mod sdk {
	use wasm_bindgen::prelude::*;

	#[wasm_bindgen]
	extern "C" {
		#[wasm_bindgen(js_namespace = AdobeDC, js_name = View)]
		pub type DcView;

		#[wasm_bindgen(catch, constructor, js_namespace = AdobeDC, js_class = "View")]
		pub fn new(config: &JsValue) -> Result<DcView, JsValue>;

		#[wasm_bindgen(catch, method, js_name = previewFile)]
		pub fn preview_file(this: &DcView, file: &JsValue, config: &JsValue) -> Result<js_sys::Promise, JsValue>;

		#[wasm_bindgen(catch, method, js_name = registerCallback)]
		pub fn register_callback(
			this: &DcView,
			kind: &str,
			callback: &js_sys::Function,
			options: &JsValue,
		) -> Result<(), JsValue>;
	}
}

/// A document the viewer can open.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerDocument {
	pub name: String,
	pub url: String,
}

/// Free the object URL behind a local document.
pub fn release(doc: &ViewerDocument) {
	if !doc.url.starts_with("blob:") {
		return;
	}
	if let Err(e) = web_sys::Url::revoke_object_url(&doc.url) {
		log::warn!("could not release {}: {e:?}", doc.name);
	}
}

fn viewer_error(value: JsValue) -> AppError {
	AppError::Viewer(format!("{value:?}"))
}

fn js_object(value: serde_json::Value) -> AppResult<JsValue> {
	js_sys::JSON::parse(&value.to_string()).map_err(viewer_error)
}

/// Load `doc` and route its selection events through a [`SelectionBridge`].
/// The returned closure must outlive the document.
fn open_document(
	client_id: &str,
	doc: &ViewerDocument,
	on_select: Callback<SelectionEvent>,
) -> AppResult<(js_sys::Promise, Closure<dyn FnMut(JsValue)>)> {
	let view = sdk::DcView::new(&js_object(serde_json::json!({
		"clientId": client_id,
		"divId": VIEWER_DIV,
	}))?)
	.map_err(viewer_error)?;

	let bridge = SelectionBridge::new(doc.name.clone(), move |event| on_select.run(event));
	let listener = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
		if let Some(json) = js_sys::JSON::stringify(&event).ok().and_then(|s| s.as_string()) {
			bridge.handle_viewer_event(&json);
		}
	});
	view.register_callback(
		"EVENT_LISTENER",
		listener.as_ref().unchecked_ref(),
		&js_object(serde_json::json!({ "enableFilePreviewEvents": true }))?,
	)
	.map_err(viewer_error)?;

	let file = js_object(serde_json::json!({
		"content": { "location": { "url": doc.url } },
		"metaData": { "fileName": doc.name },
	}))?;
	let config = js_object(serde_json::json!({
		"embedMode": "SIZED_CONTAINER",
		"showDownloadPDF": false,
	}))?;
	let promise = view.preview_file(&file, &config).map_err(viewer_error)?;
	log::info!("viewer loading {}", doc.name);
	Ok((promise, listener))
}

async fn goto_page(viewer: &JsValue, page: u32) -> Result<(), JsValue> {
	let get_apis: js_sys::Function = js_sys::Reflect::get(viewer, &"getAPIs".into())?.dyn_into()?;
	let apis = JsFuture::from(get_apis.call0(viewer)?.dyn_into::<js_sys::Promise>()?).await?;
	let goto: js_sys::Function = js_sys::Reflect::get(&apis, &"gotoLocation".into())?.dyn_into()?;
	goto.call1(&apis, &JsValue::from(page))?;
	Ok(())
}

#[component]
pub fn DocumentViewer(
	#[prop(into)] document: Signal<Option<ViewerDocument>>,
	/// Page requests from the coordinator; each new value triggers a jump.
	#[prop(into)]
	page: Signal<Option<u32>>,
	on_select: Callback<SelectionEvent>,
	#[prop(into)] client_id: String,
) -> impl IntoView {
	let error = RwSignal::new(None::<String>);
	let viewer = StoredValue::new_local(None::<(String, JsValue)>);
	let listener = StoredValue::new_local(None::<Closure<dyn FnMut(JsValue)>>);
	let pending_page = StoredValue::new_local(None::<u32>);

	// A page request may arrive while a document is still loading.
	let flush_page = move || {
		let current = document.with_untracked(|d| d.as_ref().map(|d| d.name.clone()));
		let Some(handle) = viewer
			.get_value()
			.filter(|(name, _)| Some(name) == current.as_ref())
			.map(|(_, handle)| handle)
		else {
			return;
		};
		let Some(page) = pending_page.try_update_value(Option::take).flatten() else {
			return;
		};
		spawn_local(async move {
			if let Err(e) = goto_page(&handle, page).await {
				log::warn!("could not jump to page {page}: {e:?}");
			}
		});
	};

	Effect::new(move |_| {
		let Some(doc) = document.get() else {
			return;
		};
		viewer.set_value(None);
		match open_document(&client_id, &doc, on_select) {
			Ok((promise, closure)) => {
				listener.set_value(Some(closure));
				error.set(None);
				spawn_local(async move {
					match JsFuture::from(promise).await {
						Ok(handle) => {
							if document.with_untracked(|d| d.as_ref() != Some(&doc)) {
								log::debug!("discarding stale viewer for {}", doc.name);
								return;
							}
							viewer.set_value(Some((doc.name.clone(), handle)));
							flush_page();
						}
						Err(e) => {
							log::error!("viewer failed to load {}: {e:?}", doc.name);
							error.set(Some(viewer_error(e).to_string()));
						}
					}
				});
			}
			Err(e) => {
				log::error!("viewer unavailable: {e}");
				error.set(Some(e.to_string()));
			}
		}
	});

	Effect::new(move |_| {
		let Some(page) = page.get() else {
			return;
		};
		pending_page.set_value(Some(page));
		flush_page();
	});

	view! {
		<div class="document-viewer">
			{move || error.get().map(|e| view! { <p class="viewer-error">{e}</p> })}
			{move || {
				document
					.get()
					.is_none()
					.then(|| view! { <p class="viewer-empty">"Upload a PDF to start reading."</p> })
			}}
			<div id=VIEWER_DIV class="pdf-embed"></div>
		</div>
	}
}
