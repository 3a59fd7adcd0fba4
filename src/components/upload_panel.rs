use gloo_timers::callback::Interval;
use leptos::prelude::*;
use leptos::task::spawn_local;
use web_sys::{DragEvent, FileList, HtmlInputElement};

use super::viewer::ViewerDocument;
use crate::Backend;
use crate::upload::{PendingFile, UploadSession, UploadStatus};

const PROGRESS_INTERVAL_MS: u32 = 250;

/// Result of a successful batch, handed to the page coordinator.
#[derive(Clone, Debug)]
pub struct UploadOutcome {
	pub cluster_id: String,
	pub documents: Vec<ViewerDocument>,
}

fn pending_files(list: &FileList) -> Vec<PendingFile> {
	(0..list.length())
		.filter_map(|i| list.get(i))
		.map(|file| PendingFile::from_file(&file))
		.collect()
}

/// Object URLs so the viewer can open the local copies.
fn viewer_documents(files: &[PendingFile]) -> Vec<ViewerDocument> {
	files
		.iter()
		.filter_map(|file| {
			let blob = file.blob.as_ref()?;
			match web_sys::Url::create_object_url_with_blob(blob) {
				Ok(url) => Some(ViewerDocument {
					name: file.name.clone(),
					url,
				}),
				Err(e) => {
					log::warn!("no object URL for {}: {e:?}", file.name);
					None
				}
			}
		})
		.collect()
}

fn format_size(bytes: u64) -> String {
	match bytes {
		b if b >= 1 << 20 => format!("{:.1} MB", b as f64 / (1 << 20) as f64),
		b if b >= 1 << 10 => format!("{:.0} KB", b as f64 / (1 << 10) as f64),
		b => format!("{b} B"),
	}
}

/// File picker and upload list. `on_removed` fires with a file name once no
/// entry of that name is left; `on_cleared` fires when the list is emptied.
#[component]
pub fn UploadPanel(
	on_uploaded: Callback<UploadOutcome>,
	on_removed: Callback<String>,
	on_cleared: Callback<()>,
) -> impl IntoView {
	let backend = expect_context::<Backend>();
	let session = RwSignal::new_local(UploadSession::default());
	let notice = RwSignal::new(None::<String>);
	let dragging = RwSignal::new(false);

	let submit = move |files: Vec<PendingFile>| {
		if files.is_empty() {
			return;
		}
		let batch = match session.try_update(|s| s.begin(files)) {
			Some(Ok(batch)) => batch,
			Some(Err(e)) => {
				notice.set(Some(e.to_string()));
				return;
			}
			None => return,
		};
		notice.set((!batch.filtered.is_empty()).then(|| format!("Skipped non-PDF files: {}", batch.filtered.join(", "))));

		let source = backend.get();
		spawn_local(async move {
			let ticker = Interval::new(PROGRESS_INTERVAL_MS, move || {
				session.try_update(|s| s.step_progress());
			});
			let result = source.upload(&batch.files).await;
			drop(ticker);
			match session.try_update(|s| s.finish(&batch, result)) {
				Some(Ok((cluster_id, names))) => {
					log::info!("cluster {cluster_id} ready with {}", names.join(", "));
					on_uploaded.run(UploadOutcome {
						cluster_id,
						documents: viewer_documents(&batch.files),
					});
				}
				Some(Err(e)) => notice.set(Some(format!("Upload failed: {e}"))),
				None => {}
			}
		});
	};

	let on_change = move |ev: web_sys::Event| {
		let input: HtmlInputElement = event_target(&ev);
		if let Some(list) = input.files() {
			submit(pending_files(&list));
		}
		input.set_value("");
	};

	let on_drop = move |ev: DragEvent| {
		ev.prevent_default();
		dragging.set(false);
		if let Some(list) = ev.data_transfer().and_then(|dt| dt.files()) {
			submit(pending_files(&list));
		}
	};

	let status_label = |status: UploadStatus| match status {
		UploadStatus::Uploading => "uploading",
		UploadStatus::Success => "success",
		UploadStatus::Error => "error",
	};

	view! {
		<section class="upload-panel">
			<div
				class="drop-zone"
				class:dragging=move || dragging.get()
				on:dragover=move |ev: DragEvent| {
					ev.prevent_default();
					dragging.set(true);
				}
				on:dragleave=move |_| dragging.set(false)
				on:drop=on_drop
			>
				<p>"Drop PDF files here or"</p>
				<input type="file" accept="application/pdf" multiple on:change=on_change />
			</div>

			{move || notice.get().map(|msg| view! { <p class="upload-notice">{msg}</p> })}

			{move || {
				session
					.with(|s| s.is_uploading() || s.progress() == 100)
					.then(|| {
						let pct = session.with(|s| s.progress());
						view! {
							<div class="upload-progress">
								<div class="upload-progress-bar" style=format!("width: {pct}%")></div>
							</div>
						}
					})
			}}

			<ul class="upload-list">
				{move || {
					session
						.with(|s| {
							s.documents()
								.iter()
								.map(|d| (d.name.clone(), d.size, d.status))
								.collect::<Vec<_>>()
						})
						.into_iter()
						.enumerate()
						.map(|(i, (name, size, status))| {
							view! {
								<li class=format!("upload-item {}", status_label(status))>
									<span class="upload-name">{name}</span>
									<span class="upload-size">{format_size(size)}</span>
									<span class="upload-status">{status_label(status)}</span>
									<button
										title="Remove"
										on:click=move |_| {
											let gone = session
												.try_update(|s| {
													let removed = s.remove(i)?;
													(!s.contains(&removed.name)).then_some(removed.name)
												})
												.flatten();
											if let Some(name) = gone {
												on_removed.run(name);
											}
										}
									>
										"×"
									</button>
								</li>
							}
						})
						.collect_view()
				}}
			</ul>

			<button
				class="upload-clear"
				on:click=move |_| {
					session.update(UploadSession::clear);
					notice.set(None);
					on_cleared.run(());
				}
			>
				"Clear"
			</button>
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sizes_are_human_readable() {
		assert_eq!(format_size(512), "512 B");
		assert_eq!(format_size(2048), "2 KB");
		assert_eq!(format_size(3 * 1024 * 1024 + 512 * 1024), "3.5 MB");
	}
}
