//! Backend access behind an injectable [`DataSource`].
//!
//! [`live::LiveSource`] talks HTTP, [`demo::DemoSource`] fabricates plausible
//! answers, and [`fallback::FallbackSource`] degrades from the first to the
//! second when the service cannot be reached.

pub mod demo;
pub mod fallback;
pub mod live;
pub mod token;
pub mod types;

use std::rc::Rc;

use async_trait::async_trait;

use crate::components::force_graph::GraphData;
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::upload::PendingFile;
pub use types::{
	Answer, Insights, PodcastAudio, PodcastScript, RecommendationQuery, Snippet, UploadReceipt,
};

/// Everything the UI asks of the backend.
///
/// Answers to selection-driven requests say whether they are stub data, so a
/// caller can label each one on its own.
#[async_trait(?Send)]
pub trait DataSource {
	/// Upload one batch; the backend answers for the batch as a whole.
	async fn upload(&self, files: &[PendingFile]) -> AppResult<UploadReceipt>;

	/// Passages related to a selection, at most [`types::MAX_RECOMMENDATIONS`].
	async fn recommendations(&self, query: &RecommendationQuery) -> AppResult<Answer<Vec<Snippet>>>;

	/// Takeaways, counterpoints and related examples for a selection.
	async fn insights(&self, text: &str) -> AppResult<Answer<Insights>>;

	/// Narrate a script.
	async fn podcast(&self, script: &PodcastScript) -> AppResult<Answer<PodcastAudio>>;

	/// Node/link payload for one cluster.
	async fn graph(&self, cluster_id: &str) -> AppResult<GraphData>;
}

/// Source selected by configuration: pure demo, or live with a demo fallback.
pub fn source_for(config: &AppConfig) -> Rc<dyn DataSource> {
	if config.demo_mode {
		log::info!("demo mode: backend calls are stubbed");
		Rc::new(demo::DemoSource::default())
	} else {
		log::info!("using backend at {}", config.api_base_url);
		Rc::new(fallback::FallbackSource::new(live::LiveSource::new(config)))
	}
}
