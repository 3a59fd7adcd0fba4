//! Degrade from the live backend to stub answers.

use async_trait::async_trait;

use super::DataSource;
use super::demo::DemoSource;
use super::types::{
	Answer, Insights, PodcastAudio, PodcastScript, RecommendationQuery, Snippet, UploadReceipt,
};
use crate::components::force_graph::GraphData;
use crate::error::AppResult;
use crate::upload::PendingFile;

/// Live source that serves demo answers while the backend is unreachable.
///
/// Every answer carries its own origin, so one request falling back never
/// relabels another. Uploads and graph fetches are passed through untouched:
/// their failures must stay visible instead of being papered over with stub
/// data.
pub struct FallbackSource<L> {
	live: L,
	demo: DemoSource,
}

fn unavailable<T>(what: &str, result: &AppResult<T>) -> bool {
	match result {
		Err(e) if e.is_unavailable() => {
			log::warn!("{what} unavailable, serving demo data: {e}");
			true
		}
		_ => false,
	}
}

impl<L: DataSource> FallbackSource<L> {
	/// Wrap `live` with a fresh demo source.
	pub fn new(live: L) -> Self {
		Self {
			live,
			demo: DemoSource::default(),
		}
	}
}

#[async_trait(?Send)]
impl<L: DataSource> DataSource for FallbackSource<L> {
	async fn upload(&self, files: &[PendingFile]) -> AppResult<UploadReceipt> {
		self.live.upload(files).await
	}

	async fn recommendations(&self, query: &RecommendationQuery) -> AppResult<Answer<Vec<Snippet>>> {
		let result = self.live.recommendations(query).await;
		if unavailable("recommendations", &result) {
			return self.demo.recommendations(query).await;
		}
		result
	}

	async fn insights(&self, text: &str) -> AppResult<Answer<Insights>> {
		let result = self.live.insights(text).await;
		if unavailable("insights", &result) {
			return self.demo.insights(text).await;
		}
		result
	}

	async fn podcast(&self, script: &PodcastScript) -> AppResult<Answer<PodcastAudio>> {
		let result = self.live.podcast(script).await;
		if unavailable("podcast", &result) {
			return self.demo.podcast(script).await;
		}
		result
	}

	async fn graph(&self, cluster_id: &str) -> AppResult<GraphData> {
		self.live.graph(cluster_id).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::AppError;

	/// Backend stub that always fails with a fixed error.
	struct Down(AppError);

	#[async_trait(?Send)]
	impl DataSource for Down {
		async fn upload(&self, _: &[PendingFile]) -> AppResult<UploadReceipt> {
			Err(self.0.clone())
		}
		async fn recommendations(&self, _: &RecommendationQuery) -> AppResult<Answer<Vec<Snippet>>> {
			Err(self.0.clone())
		}
		async fn insights(&self, _: &str) -> AppResult<Answer<Insights>> {
			Err(self.0.clone())
		}
		async fn podcast(&self, _: &PodcastScript) -> AppResult<Answer<PodcastAudio>> {
			Err(self.0.clone())
		}
		async fn graph(&self, _: &str) -> AppResult<GraphData> {
			Err(self.0.clone())
		}
	}

	/// Backend whose recommendation service is down while insights still work.
	struct RecommendationsDown;

	#[async_trait(?Send)]
	impl DataSource for RecommendationsDown {
		async fn upload(&self, _: &[PendingFile]) -> AppResult<UploadReceipt> {
			unreachable!()
		}
		async fn recommendations(&self, _: &RecommendationQuery) -> AppResult<Answer<Vec<Snippet>>> {
			Err(AppError::ServiceUnavailable("status 503".into()))
		}
		async fn insights(&self, _: &str) -> AppResult<Answer<Insights>> {
			Ok(Answer::live(Insights {
				key_takeaways: vec!["from the service".into()],
				..Insights::default()
			}))
		}
		async fn podcast(&self, _: &PodcastScript) -> AppResult<Answer<PodcastAudio>> {
			unreachable!()
		}
		async fn graph(&self, _: &str) -> AppResult<GraphData> {
			unreachable!()
		}
	}

	fn query() -> RecommendationQuery {
		RecommendationQuery {
			query_text: "q".into(),
			cluster_id: Some("c1".into()),
		}
	}

	#[tokio::test]
	async fn unavailable_insights_fall_back_as_stub() {
		let source = FallbackSource::new(Down(AppError::ServiceUnavailable("503".into())));
		let insights = source.insights("selected passage").await.unwrap();
		assert!(insights.offline);
		assert!(!insights.value.is_empty());
	}

	#[tokio::test]
	async fn mixed_outcomes_keep_their_own_origin() {
		let source = FallbackSource::new(RecommendationsDown);
		let snippets = source.recommendations(&query()).await.unwrap();
		let insights = source.insights("selected passage").await.unwrap();

		assert!(snippets.offline);
		assert!(!snippets.value.is_empty());
		assert!(!insights.offline);
		assert_eq!(insights.value.key_takeaways, vec!["from the service".to_string()]);

		// asking again in the other order changes nothing
		let insights = source.insights("selected passage").await.unwrap();
		let snippets = source.recommendations(&query()).await.unwrap();
		assert!(snippets.offline && !insights.offline);
	}

	#[tokio::test]
	async fn upload_and_graph_failures_pass_through() {
		let source = FallbackSource::new(Down(AppError::ServiceUnavailable("503".into())));
		assert!(source.upload(&[]).await.is_err());
		assert!(source.graph("c1").await.is_err());
	}

	#[tokio::test]
	async fn other_errors_are_not_masked() {
		let source = FallbackSource::new(Down(AppError::Viewer("x".into())));
		assert_eq!(source.recommendations(&query()).await, Err(AppError::Viewer("x".into())));
	}
}
