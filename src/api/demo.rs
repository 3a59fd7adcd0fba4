//! Stub data source for demos and offline use.

use std::cell::RefCell;

use async_trait::async_trait;

use super::DataSource;
use super::types::{
	Answer, Insights, PodcastAudio, PodcastScript, RecommendationQuery, Snippet, UploadReceipt,
	top_snippets,
};
use crate::components::force_graph::{GraphData, GraphLink, GraphNode};
use crate::error::AppResult;
use crate::upload::PendingFile;

/// Cluster id handed out for every stub upload.
pub const DEMO_CLUSTER_ID: &str = "demo-cluster";
const SAMPLE_DOCUMENTS: &[&str] = &["Getting Started.pdf", "Field Notes.pdf", "Annual Review.pdf"];

/// Offline stand-in that fabricates deterministic answers.
#[derive(Default)]
pub struct DemoSource {
	documents: RefCell<Vec<String>>,
}

fn excerpt(text: &str, max_chars: usize) -> String {
	let trimmed = text.trim();
	match trimmed.char_indices().nth(max_chars) {
		Some((cut, _)) => format!("{}…", &trimmed[..cut]),
		None => trimmed.to_string(),
	}
}

impl DemoSource {
	fn document_names(&self) -> Vec<String> {
		let docs = self.documents.borrow();
		if docs.is_empty() {
			SAMPLE_DOCUMENTS.iter().map(|s| s.to_string()).collect()
		} else {
			docs.clone()
		}
	}
}

#[async_trait(?Send)]
impl DataSource for DemoSource {
	async fn upload(&self, files: &[PendingFile]) -> AppResult<UploadReceipt> {
		let mut docs = self.documents.borrow_mut();
		for file in files {
			if !docs.contains(&file.name) {
				docs.push(file.name.clone());
			}
		}
		Ok(UploadReceipt {
			cluster_id: DEMO_CLUSTER_ID.into(),
			processed_files_count: files.len(),
		})
	}

	async fn recommendations(&self, query: &RecommendationQuery) -> AppResult<Answer<Vec<Snippet>>> {
		let quote = excerpt(&query.query_text, 60);
		let snippets = self
			.document_names()
			.into_iter()
			.enumerate()
			.map(|(i, document_name)| Snippet {
				section_title: format!("Section {}", i + 1),
				snippet: format!("A passage in {document_name} discussing \"{quote}\"."),
				relevance_score: 0.9 - 0.15 * i as f64,
				page_number: Some(i as u32 + 1),
				document_name,
			})
			.collect();
		Ok(Answer::stub(top_snippets(snippets)))
	}

	async fn insights(&self, text: &str) -> AppResult<Answer<Insights>> {
		let quote = excerpt(text, 40);
		Ok(Answer::stub(Insights {
			key_takeaways: vec![
				format!("\"{quote}\" states the central claim of the section."),
				"The surrounding pages build on the same idea.".into(),
			],
			contradictions_or_counterpoints: vec![
				"Other documents in the cluster weigh the trade-offs differently.".into(),
			],
			related_examples: vec![format!("See {} for a worked example.", self.document_names()[0])],
		}))
	}

	async fn podcast(&self, _script: &PodcastScript) -> AppResult<Answer<PodcastAudio>> {
		Ok(Answer::stub(PodcastAudio {
			audio_url: String::new(),
		}))
	}

	async fn graph(&self, _cluster_id: &str) -> AppResult<GraphData> {
		let names = self.document_names();
		let nodes = names
			.iter()
			.map(|name| GraphNode {
				label: Some(name.trim_end_matches(".pdf").to_string()),
				size: Some(10.0),
				..GraphNode::new(name.clone())
			})
			.collect();
		let links = names
			.windows(2)
			.enumerate()
			.map(|(i, pair)| GraphLink {
				weight: 1.0 + (i % 3) as f64,
				..GraphLink::new(pair[0].clone(), pair[1].clone())
			})
			.collect();
		Ok(GraphData { nodes, links })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::types::MAX_RECOMMENDATIONS;

	#[tokio::test]
	async fn uploaded_names_drive_the_graph() {
		let source = DemoSource::default();
		let files = vec![
			PendingFile::new("a.pdf", 10, "application/pdf"),
			PendingFile::new("b.pdf", 20, "application/pdf"),
		];
		let receipt = source.upload(&files).await.unwrap();
		assert_eq!(receipt.cluster_id, DEMO_CLUSTER_ID);
		assert_eq!(receipt.processed_files_count, 2);

		let graph = source.graph(DEMO_CLUSTER_ID).await.unwrap();
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.links.len(), 1);
		assert_eq!(graph.nodes[0].label.as_deref(), Some("a"));
	}

	#[tokio::test]
	async fn recommendations_are_capped_and_scored() {
		let source = DemoSource::default();
		let query = RecommendationQuery {
			query_text: "x".repeat(200),
			cluster_id: None,
		};
		let answer = source.recommendations(&query).await.unwrap();
		assert!(answer.offline);
		let snippets = answer.value;
		assert!(!snippets.is_empty() && snippets.len() <= MAX_RECOMMENDATIONS);
		assert!(snippets.iter().all(|s| (0.0..=1.0).contains(&s.relevance_score)));
		assert!(snippets[0].snippet.contains('…'));
	}

	#[test]
	fn excerpt_respects_char_boundaries() {
		assert_eq!(excerpt("  ééé  ", 2), "éé…");
		assert_eq!(excerpt("short", 10), "short");
	}
}
