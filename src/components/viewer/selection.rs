//! Bridges viewer selection events to the insight fetchers.

use serde::Deserialize;

/// Text the user selected in a document.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionEvent {
	pub text: String,
	pub document_name: String,
}

#[derive(Deserialize)]
struct ViewerEvent {
	#[serde(rename = "type", default)]
	kind: String,
	#[serde(default)]
	data: Option<EventData>,
}

#[derive(Deserialize)]
struct EventData {
	#[serde(default)]
	selection: Option<SelectionData>,
	#[serde(rename = "copiedText", default)]
	copied_text: Option<String>,
}

#[derive(Deserialize)]
struct SelectionData {
	#[serde(default)]
	text: Option<String>,
}

/// Forwards non-empty selections from one document to a callback.
pub struct SelectionBridge {
	document_name: String,
	on_select: Box<dyn Fn(SelectionEvent)>,
}

impl SelectionBridge {
	pub fn new(document_name: impl Into<String>, on_select: impl Fn(SelectionEvent) + 'static) -> Self {
		Self {
			document_name: document_name.into(),
			on_select: Box::new(on_select),
		}
	}

	/// Forward `text` if anything is left after trimming.
	pub fn handle_text(&self, text: &str) -> bool {
		let text = text.trim();
		if text.is_empty() {
			return false;
		}
		(self.on_select)(SelectionEvent {
			text: text.to_string(),
			document_name: self.document_name.clone(),
		});
		true
	}

	/// Handle a serialized viewer event. Events without selected text are ignored.
	pub fn handle_viewer_event(&self, json: &str) -> bool {
		let event: ViewerEvent = match serde_json::from_str(json) {
			Ok(event) => event,
			Err(e) => {
				log::debug!("ignoring unreadable viewer event: {e}");
				return false;
			}
		};
		let text = event.data.and_then(|data| {
			data.selection
				.and_then(|selection| selection.text)
				.or(data.copied_text)
		});
		match text {
			Some(text) => {
				log::debug!("viewer {} event with {} chars", event.kind, text.len());
				self.handle_text(&text)
			}
			None => false,
		}
	}
}
