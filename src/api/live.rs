//! HTTP access to the analysis backend.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::JsValue;
use web_sys::FormData;

use super::DataSource;
use super::types::{
	Answer, Insights, InsightsRequest, PodcastAudio, PodcastScript, RecommendationQuery, Snippet,
	SnippetList, UploadReceipt, top_snippets,
};
use crate::components::force_graph::GraphData;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::upload::PendingFile;

/// HTTP client for the analysis backend.
pub struct LiveSource {
	config: AppConfig,
}

fn js_error(value: JsValue) -> AppError {
	AppError::ServiceUnavailable(format!("{value:?}"))
}

fn check_status(status: u16) -> AppResult<()> {
	if (200..300).contains(&status) {
		Ok(())
	} else {
		Err(AppError::ServiceUnavailable(format!("backend returned status {status}")))
	}
}

/// Decode a JSON body; anything but a 2xx JSON answer counts as unavailable.
pub(crate) fn decode<T: DeserializeOwned>(status: u16, body: &str) -> AppResult<T> {
	check_status(status)?;
	serde_json::from_str(body)
		.map_err(|e| AppError::ServiceUnavailable(format!("unexpected response body: {e}")))
}

pub(crate) fn decode_graph(status: u16, body: &str) -> AppResult<GraphData> {
	check_status(status)?;
	GraphData::from_json(body)
}

/// Endpoint path for a cluster graph; the id is a single path segment.
fn graph_path(cluster_id: &str) -> String {
	format!("graph/{}", urlencoding::encode(cluster_id))
}

async fn read_body(response: Response) -> AppResult<(u16, String)> {
	let status = response.status();
	let body = response.text().await?;
	Ok((status, body))
}

impl LiveSource {
	/// Client for `config.api_base_url`.
	pub fn new(config: &AppConfig) -> Self {
		Self {
			config: config.clone(),
		}
	}

	async fn post_json<B, T>(&self, path: &str, body: &B) -> AppResult<T>
	where
		B: Serialize + ?Sized,
		T: DeserializeOwned,
	{
		let url = self.config.endpoint(path);
		log::debug!("POST {url}");
		let response = Request::post(&url).json(body)?.send().await?;
		let (status, body) = read_body(response).await?;
		decode(status, &body)
	}
}

#[async_trait(?Send)]
impl DataSource for LiveSource {
	async fn upload(&self, files: &[PendingFile]) -> AppResult<UploadReceipt> {
		let form = FormData::new().map_err(js_error)?;
		for file in files {
			let Some(blob) = file.blob.as_ref() else {
				return Err(AppError::ServiceUnavailable(format!("{} has no file contents", file.name)));
			};
			form.append_with_blob_and_filename("files", blob, &file.name)
				.map_err(js_error)?;
		}
		let url = self.config.endpoint("upload");
		log::info!("uploading {} file(s) to {url}", files.len());
		let response = Request::post(&url).body(form)?.send().await?;
		let (status, body) = read_body(response).await?;
		decode(status, &body)
	}

	async fn recommendations(&self, query: &RecommendationQuery) -> AppResult<Answer<Vec<Snippet>>> {
		let list: SnippetList = self.post_json("recommendations", query).await?;
		Ok(Answer::live(top_snippets(list.into())))
	}

	async fn insights(&self, text: &str) -> AppResult<Answer<Insights>> {
		self.post_json("insights", &InsightsRequest { text: text.to_string() })
			.await
			.map(Answer::live)
	}

	async fn podcast(&self, script: &PodcastScript) -> AppResult<Answer<PodcastAudio>> {
		self.post_json("podcast", script).await.map(Answer::live)
	}

	async fn graph(&self, cluster_id: &str) -> AppResult<GraphData> {
		let url = self.config.endpoint(&graph_path(cluster_id));
		log::debug!("GET {url}");
		let response = Request::get(&url).send().await?;
		let (status, body) = read_body(response).await?;
		decode_graph(status, &body)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_upload_receipt() {
		let receipt: UploadReceipt = decode(200, r#"{"cluster_id":"c1","processed_files_count":2}"#).unwrap();
		assert_eq!(receipt.cluster_id, "c1");
		assert_eq!(receipt.processed_files_count, 2);
	}

	#[test]
	fn error_status_is_unavailable() {
		let err = decode::<UploadReceipt>(503, r#"{"detail":"down"}"#).unwrap_err();
		assert_eq!(err, AppError::ServiceUnavailable("backend returned status 503".into()));
	}

	#[test]
	fn html_body_is_unavailable() {
		let err = decode::<Insights>(200, "<html>offline</html>").unwrap_err();
		assert!(err.is_unavailable());
	}

	#[test]
	fn cluster_id_stays_one_segment() {
		assert_eq!(graph_path("c1"), "graph/c1");
		assert_eq!(graph_path("a/b?x#y"), "graph/a%2Fb%3Fx%23y");
	}

	#[test]
	fn graph_errors_keep_their_kind() {
		assert!(decode_graph(500, "{}").unwrap_err().is_unavailable());
		assert!(matches!(
			decode_graph(200, r#"{"links":[]}"#).unwrap_err(),
			AppError::MalformedGraphData(_)
		));
		assert_eq!(decode_graph(200, r#"{"nodes":[],"links":[]}"#).unwrap(), GraphData::default());
	}
}
