//! Request and response bodies of the analysis backend.

use serde::{Deserialize, Serialize};

/// The caller keeps only this many recommendations.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// A reply together with its origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Answer<T> {
	/// The payload.
	pub value: T,
	/// Fabricated by the stub source instead of the backend.
	pub offline: bool,
}

impl<T> Answer<T> {
	/// An answer from the backend.
	pub fn live(value: T) -> Self {
		Self { value, offline: false }
	}

	/// An answer made up by the stub source.
	pub fn stub(value: T) -> Self {
		Self { value, offline: true }
	}
}

/// Response to a batch upload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
	/// Cluster the batch was added to.
	pub cluster_id: String,
	/// How many files the backend accepted.
	#[serde(default)]
	pub processed_files_count: usize,
}

/// Body of a recommendations request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationQuery {
	/// Selected text.
	pub query_text: String,
	/// Restrict the search to one cluster.
	pub cluster_id: Option<String>,
}

/// One related passage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
	/// Document the passage comes from.
	pub document_name: String,
	/// Heading of the enclosing section, if known.
	#[serde(default)]
	pub section_title: String,
	/// The passage itself.
	pub snippet: String,
	/// Relevance in `0..=1`.
	#[serde(default)]
	pub relevance_score: f64,
	/// One-based page in the source document.
	#[serde(default)]
	pub page_number: Option<u32>,
}

/// The endpoint answers either with a bare list or wrapped in an object.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum SnippetList {
	Bare(Vec<Snippet>),
	Wrapped { recommendations: Vec<Snippet> },
}

impl From<SnippetList> for Vec<Snippet> {
	fn from(list: SnippetList) -> Self {
		match list {
			SnippetList::Bare(items) | SnippetList::Wrapped { recommendations: items } => items,
		}
	}
}

/// Body of an insights request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InsightsRequest {
	/// Selected text.
	pub text: String,
}

/// Generated commentary on a selection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
	/// Main points of the passage.
	#[serde(default)]
	pub key_takeaways: Vec<String>,
	/// Places where other documents disagree.
	#[serde(default)]
	pub contradictions_or_counterpoints: Vec<String>,
	/// Pointers to similar material elsewhere in the cluster.
	#[serde(default)]
	pub related_examples: Vec<String>,
}

impl Insights {
	/// No insight of any kind.
	pub fn is_empty(&self) -> bool {
		self.key_takeaways.is_empty()
			&& self.contradictions_or_counterpoints.is_empty()
			&& self.related_examples.is_empty()
	}
}

/// Script sent to the speech backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PodcastScript {
	/// Opening line quoting the selection.
	pub intro: String,
	/// One line per talking point.
	pub discussion: String,
}

/// Generated audio.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PodcastAudio {
	/// Playable URL; empty when no audio could be produced.
	#[serde(default)]
	pub audio_url: String,
}

/// Keep the first [`MAX_RECOMMENDATIONS`] snippets with scores clamped to `0..=1`.
pub fn top_snippets(mut snippets: Vec<Snippet>) -> Vec<Snippet> {
	snippets.truncate(MAX_RECOMMENDATIONS);
	for snippet in &mut snippets {
		snippet.relevance_score = if snippet.relevance_score.is_finite() {
			snippet.relevance_score.clamp(0.0, 1.0)
		} else {
			0.0
		};
	}
	snippets
}

impl PodcastScript {
	/// Two-voice script built from a selection and its insights.
	pub fn compose(selection: &str, insights: &Insights) -> Self {
		let intro = format!(
			"Today we're looking at this passage: \"{}\".",
			selection.trim()
		);
		let mut discussion = Vec::new();
		for point in &insights.key_takeaways {
			discussion.push(format!("One key takeaway: {point}"));
		}
		for point in &insights.contradictions_or_counterpoints {
			discussion.push(format!("On the other hand: {point}"));
		}
		for point in &insights.related_examples {
			discussion.push(format!("A related example: {point}"));
		}
		if discussion.is_empty() {
			discussion.push("Let's unpack what this passage means in context.".into());
		}
		Self {
			intro,
			discussion: discussion.join("\n"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn snippet(score: f64) -> Snippet {
		Snippet {
			document_name: "a.pdf".into(),
			section_title: "Intro".into(),
			snippet: "text".into(),
			relevance_score: score,
			page_number: None,
		}
	}

	#[test]
	fn top_snippets_truncates_and_clamps() {
		let snippets = top_snippets(vec![
			snippet(1.4),
			snippet(-0.2),
			snippet(f64::NAN),
			snippet(0.5),
			snippet(0.4),
			snippet(0.3),
		]);
		assert_eq!(snippets.len(), MAX_RECOMMENDATIONS);
		let scores: Vec<f64> = snippets.iter().map(|s| s.relevance_score).collect();
		assert_eq!(scores, vec![1.0, 0.0, 0.0, 0.5, 0.4]);
	}

	#[test]
	fn snippet_list_accepts_both_shapes() {
		let bare: SnippetList =
			serde_json::from_str(r#"[{"document_name":"a","snippet":"s","relevance_score":0.9,"page_number":3}]"#)
				.unwrap();
		let wrapped: SnippetList =
			serde_json::from_str(r#"{"recommendations":[{"document_name":"a","snippet":"s"}]}"#).unwrap();
		let bare: Vec<Snippet> = bare.into();
		let wrapped: Vec<Snippet> = wrapped.into();
		assert_eq!(bare[0].page_number, Some(3));
		assert_eq!(wrapped[0].relevance_score, 0.0);
	}

	#[test]
	fn compose_covers_every_insight_kind() {
		let insights = Insights {
			key_takeaways: vec!["k".into()],
			contradictions_or_counterpoints: vec!["c".into()],
			related_examples: vec!["r".into()],
		};
		let script = PodcastScript::compose("  passage ", &insights);
		assert!(script.intro.contains("\"passage\""));
		assert_eq!(script.discussion.lines().count(), 3);
		assert!(!PodcastScript::compose("x", &Insights::default()).discussion.is_empty());
	}
}
