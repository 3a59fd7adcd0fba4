use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;

use super::viewer::SelectionEvent;
use crate::Backend;
use crate::api::token::RequestTokens;
use crate::api::{Insights, PodcastAudio, PodcastScript, RecommendationQuery, Snippet};

/// Where a snippet lives, for the page coordinator to navigate to.
#[derive(Clone, Debug, PartialEq)]
pub struct SnippetLocation {
	pub document_name: String,
	pub page_number: u32,
}

/// Which of the answers on screen are stub data.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Provenance {
	recommendations: bool,
	insights: bool,
	podcast: bool,
}

impl Provenance {
	fn any(self) -> bool {
		self.recommendations || self.insights || self.podcast
	}
}

#[derive(Default)]
struct Fetchers {
	recommendations: RequestTokens,
	insights: RequestTokens,
	podcast: RequestTokens,
}

#[component]
fn InsightList(title: &'static str, items: Vec<String>) -> impl IntoView {
	(!items.is_empty()).then(|| {
		view! {
			<div class="insight-group">
				<h4>{title}</h4>
				<ul>{items.into_iter().map(|item| view! { <li>{item}</li> }).collect_view()}</ul>
			</div>
		}
	})
}

/// Recommendations, insights and podcast for the current selection.
#[component]
pub fn InsightsPanel(
	#[prop(into)] selection: Signal<Option<SelectionEvent>>,
	#[prop(into)] cluster_id: Signal<Option<String>>,
	on_navigate: Callback<SnippetLocation>,
) -> impl IntoView {
	let backend = expect_context::<Backend>();
	let fetchers = Rc::new(Fetchers::default());

	let snippets = RwSignal::new(Vec::<Snippet>::new());
	let insights = RwSignal::new(None::<Insights>);
	let podcast = RwSignal::new(None::<PodcastAudio>);
	let loading = RwSignal::new(false);
	let podcast_loading = RwSignal::new(false);
	let error = RwSignal::new(None::<String>);
	let offline = RwSignal::new(Provenance::default());

	let fetch = fetchers.clone();
	Effect::new(move |_| {
		let Some(event) = selection.get() else {
			return;
		};
		let source = backend.get();
		let query = RecommendationQuery {
			query_text: event.text.clone(),
			cluster_id: cluster_id.get_untracked(),
		};
		log::debug!("selection from {}: {} chars", event.document_name, event.text.len());
		loading.set(true);
		error.set(None);
		podcast.set(None);
		podcast_loading.set(false);
		offline.update(|o| o.podcast = false);
		fetch.podcast.invalidate();

		let token = fetch.recommendations.issue();
		let (tokens, src) = (fetch.clone(), source.clone());
		spawn_local(async move {
			let result = src.recommendations(&query).await;
			if !tokens.recommendations.is_current(token) {
				return;
			}
			match result {
				Ok(found) => {
					offline.update(|o| o.recommendations = found.offline);
					snippets.set(found.value);
				}
				Err(e) => {
					log::error!("recommendations failed: {e}");
					offline.update(|o| o.recommendations = false);
					snippets.set(Vec::new());
					error.set(Some(e.to_string()));
				}
			}
			loading.set(false);
		});

		let token = fetch.insights.issue();
		let tokens = fetch.clone();
		spawn_local(async move {
			let result = source.insights(&event.text).await;
			if !tokens.insights.is_current(token) {
				return;
			}
			match result {
				Ok(found) => {
					offline.update(|o| o.insights = found.offline);
					insights.set(Some(found.value));
				}
				Err(e) => {
					log::error!("insights failed: {e}");
					offline.update(|o| o.insights = false);
					insights.set(None);
					error.set(Some(e.to_string()));
				}
			}
		});
	});

	let generate_podcast = {
		let fetch = fetchers.clone();
		move |_| {
			let Some(event) = selection.get_untracked() else {
				return;
			};
			let script = PodcastScript::compose(&event.text, &insights.get_untracked().unwrap_or_default());
			let token = fetch.podcast.issue();
			let (tokens, source) = (fetch.clone(), backend.get());
			podcast_loading.set(true);
			spawn_local(async move {
				let result = source.podcast(&script).await;
				if !tokens.podcast.is_current(token) {
					return;
				}
				podcast_loading.set(false);
				match result {
					Ok(audio) => {
						offline.update(|o| o.podcast = audio.offline);
						podcast.set(Some(audio.value));
					}
					Err(e) => {
						log::error!("podcast generation failed: {e}");
						offline.update(|o| o.podcast = false);
						podcast.set(None);
						error.set(Some(e.to_string()));
					}
				}
			});
		}
	};

	view! {
		<aside class="insights-panel">
			{move || offline.get().any().then(|| view! { <p class="offline-banner">"Offline demo data"</p> })}
			{move || error.get().map(|e| view! { <p class="insights-error">{e}</p> })}
			{move || {
				selection
					.get()
					.is_none()
					.then(|| view! { <p class="insights-empty">"Select text in a document to see related passages."</p> })
			}}
			{move || loading.get().then(|| view! { <p class="insights-loading">"Finding related passages…"</p> })}

			<ol class="snippet-list">
				{move || {
					snippets
						.get()
						.into_iter()
						.map(|s| {
							let target = s.page_number.map(|page_number| SnippetLocation {
								document_name: s.document_name.clone(),
								page_number,
							});
							view! {
								<li
									class="snippet"
									on:click=move |_| {
										if let Some(location) = target.clone() {
											on_navigate.run(location);
										}
									}
								>
									<div class="snippet-head">
										<span class="snippet-doc">{s.document_name}</span>
										<span class="snippet-section">{s.section_title}</span>
										<span class="snippet-score">
											{format!("{:.0}%", s.relevance_score * 100.0)}
										</span>
										{s.page_number.map(|p| view! { <span class="snippet-page">{format!("p. {p}")}</span> })}
									</div>
									<p>{s.snippet}</p>
								</li>
							}
						})
						.collect_view()
				}}
			</ol>

			{move || {
				insights
					.get()
					.map(|found| {
						view! {
							<div class="insights">
								<InsightList title="Key takeaways" items=found.key_takeaways />
								<InsightList title="Counterpoints" items=found.contradictions_or_counterpoints />
								<InsightList title="Related examples" items=found.related_examples />
							</div>
						}
					})
			}}

			<div class="podcast">
				<button
					on:click=generate_podcast
					disabled=move || selection.get().is_none() || podcast_loading.get()
				>
					{move || if podcast_loading.get() { "Generating…" } else { "Generate podcast" }}
				</button>
				{move || {
					podcast
						.get()
						.map(|audio| {
							if audio.audio_url.is_empty() {
								view! { <p class="podcast-missing">"No audio available offline."</p> }.into_any()
							} else {
								view! { <audio controls src=audio.audio_url></audio> }.into_any()
							}
						})
				}}
			</div>
		</aside>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn banner_stays_while_any_answer_is_stub() {
		let mut shown = Provenance::default();
		assert!(!shown.any());

		shown.recommendations = true;
		shown.insights = false;
		assert!(shown.any());

		shown.recommendations = false;
		assert!(!shown.any());
		shown.podcast = true;
		assert!(shown.any());
	}
}
