use leptos::prelude::*;

use crate::components::force_graph::ForceGraphCanvas;
use crate::components::insights_panel::{InsightsPanel, SnippetLocation};
use crate::components::upload_panel::{UploadOutcome, UploadPanel};
use crate::components::viewer::{self, DocumentShelf, DocumentViewer, SelectionEvent, ViewerDocument};
use crate::config::AppConfig;

/// Document workspace. Owns the cluster, the open document and page
/// navigation, and hands them to the panels as explicit signals and callbacks.
#[component]
pub fn Home() -> impl IntoView {
	let config = expect_context::<AppConfig>();
	let (client_id, layout) = (config.viewer_client_id.clone(), config.layout);

	let cluster_id = RwSignal::new(None::<String>);
	let documents = RwSignal::new(DocumentShelf::default());
	let active = RwSignal::new(None::<ViewerDocument>);
	let selection = RwSignal::new(None::<SelectionEvent>);
	let page_request = RwSignal::new(None::<u32>);
	let show_graph = RwSignal::new(false);

	let on_uploaded = Callback::new(move |outcome: UploadOutcome| {
		cluster_id.set(Some(outcome.cluster_id));
		let first = outcome.documents.first().cloned();
		let replaced: Vec<ViewerDocument> = documents
			.try_update(|shelf| outcome.documents.into_iter().filter_map(|doc| shelf.insert(doc)).collect())
			.unwrap_or_default();
		for old in &replaced {
			log::info!("replacing earlier copy of {}", old.name);
			viewer::release(old);
		}
		active.set(first);
		selection.set(None);
	});

	// Show a neighbour when the open document goes away.
	let on_removed = Callback::new(move |name: String| {
		let Some(old) = documents.try_update(|shelf| shelf.remove(&name)).flatten() else {
			return;
		};
		viewer::release(&old);
		if active.with_untracked(|a| a.as_ref().is_some_and(|a| a.name == name)) {
			active.set(documents.with_untracked(|shelf| shelf.documents().first().cloned()));
		}
	});

	let on_cleared = Callback::new(move |_: ()| {
		for old in documents.try_update(DocumentShelf::clear).unwrap_or_default() {
			viewer::release(&old);
		}
		active.set(None);
		selection.set(None);
	});

	on_cleanup(move || {
		if let Some(shelf) = documents.try_get_untracked() {
			shelf.documents().iter().for_each(viewer::release);
		}
	});

	let on_select = Callback::new(move |event: SelectionEvent| selection.set(Some(event)));

	let on_navigate = Callback::new(move |location: SnippetLocation| {
		let target = documents.with_untracked(|shelf| shelf.find(&location.document_name).cloned());
		match target {
			Some(doc) if active.with_untracked(|a| a.as_ref() != Some(&doc)) => {
				log::info!("opening {} at page {}", doc.name, location.page_number);
				active.set(Some(doc));
			}
			Some(_) => {}
			None => log::warn!("snippet refers to unknown document {}", location.document_name),
		}
		page_request.set(Some(location.page_number));
	});

	let on_graph_close = Callback::new(move |_: ()| show_graph.set(false));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="workspace">
				<header class="workspace-header">
					<h1>"Insight Canvas"</h1>
					<button
						disabled=move || cluster_id.get().is_none()
						on:click=move |_| show_graph.set(true)
					>
						"Show document graph"
					</button>
				</header>

				<div class="workspace-body">
					<div class="workspace-left">
						<UploadPanel on_uploaded=on_uploaded on_removed=on_removed on_cleared=on_cleared />
						<ul class="document-tabs">
							{move || {
								documents
									.with(|shelf| shelf.documents().to_vec())
									.into_iter()
									.map(|doc| {
										let label = doc.name.clone();
										let is_active = {
											let doc = doc.clone();
											move || active.with(|a| a.as_ref() == Some(&doc))
										};
										view! {
											<li class:active=is_active on:click=move |_| active.set(Some(doc.clone()))>
												{label}
											</li>
										}
									})
									.collect_view()
							}}
						</ul>
					</div>

					<DocumentViewer
						document=active
						page=page_request
						on_select=on_select
						client_id=client_id
					/>

					<InsightsPanel selection=selection cluster_id=cluster_id on_navigate=on_navigate />
				</div>

				<Show when=move || show_graph.get()>
					<div class="graph-modal">
						<ForceGraphCanvas
							cluster_id=cluster_id
							on_close=on_graph_close
							params=layout
						/>
					</div>
				</Show>
			</div>
		</ErrorBoundary>
	}
}
