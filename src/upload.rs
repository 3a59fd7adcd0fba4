//! Batch upload lifecycle.
//!
//! A batch moves as one: every file in it is `Uploading` until the single
//! backend response arrives, then all of them become `Success` or `Error`.
//! The backend does not report per-file outcomes, so neither do we.

use crate::api::{DataSource, UploadReceipt};
use crate::error::{AppError, AppResult};

const PDF_MEDIA_TYPE: &str = "application/pdf";
/// Synthetic progress increment per timer step.
pub const PROGRESS_STEP: u8 = 10;
/// Progress never passes this before the response resolves.
pub const PROGRESS_CAP: u8 = 90;

/// A local file picked by the user, not yet accepted.
#[derive(Clone, Debug)]
pub struct PendingFile {
	/// File name as picked.
	pub name: String,
	/// Size in bytes.
	pub size: u64,
	/// Declared MIME type; may be empty.
	pub media_type: String,
	/// File contents; absent outside the browser.
	pub blob: Option<web_sys::Blob>,
}

impl PendingFile {
	/// A file without contents.
	pub fn new(name: impl Into<String>, size: u64, media_type: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			size,
			media_type: media_type.into(),
			blob: None,
		}
	}

	/// Wrap a file picked in the browser.
	pub fn from_file(file: &web_sys::File) -> Self {
		Self {
			name: file.name(),
			size: file.size().max(0.0) as u64,
			media_type: file.type_(),
			blob: Some(file.clone().into()),
		}
	}

	/// Declared PDF, or no declared type and a `.pdf` name.
	pub fn is_document(&self) -> bool {
		if self.media_type.is_empty() {
			self.name.to_ascii_lowercase().ends_with(".pdf")
		} else {
			self.media_type.eq_ignore_ascii_case(PDF_MEDIA_TYPE)
		}
	}
}

/// Where an uploaded file stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadStatus {
	/// Its batch has not been answered yet.
	Uploading,
	/// The backend accepted its batch.
	Success,
	/// Its batch failed.
	Error,
}

/// One entry of the upload list.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadedDocument {
	/// File name.
	pub name: String,
	/// Size in bytes.
	pub size: u64,
	/// Outcome of its batch so far.
	pub status: UploadStatus,
	batch: u64,
}

/// Files accepted for one request.
#[derive(Clone, Debug)]
pub struct UploadBatch {
	/// Identifies the entries this batch created.
	pub id: u64,
	/// Files that passed the type filter.
	pub files: Vec<PendingFile>,
	/// Names of files dropped by the type filter.
	pub filtered: Vec<String>,
}

impl UploadBatch {
	/// Names of the accepted files, in order.
	pub fn names(&self) -> Vec<String> {
		self.files.iter().map(|f| f.name.clone()).collect()
	}
}

/// Upload list, progress and the batch in flight.
#[derive(Clone, Debug, Default)]
pub struct UploadSession {
	documents: Vec<UploadedDocument>,
	progress: u8,
	next_batch: u64,
	active: Option<u64>,
	last_error: Option<String>,
}

impl UploadSession {
	/// Every entry, oldest first.
	pub fn documents(&self) -> &[UploadedDocument] {
		&self.documents
	}

	/// Percentage shown for the current batch.
	pub fn progress(&self) -> u8 {
		self.progress
	}

	/// A batch is waiting for its answer.
	pub fn is_uploading(&self) -> bool {
		self.active.is_some()
	}

	/// Message of the last failed batch.
	pub fn last_error(&self) -> Option<&str> {
		self.last_error.as_deref()
	}

	/// Filter `files` to documents and mark them uploading. Fails with
	/// [`AppError::NoValidFiles`] when nothing survives the filter.
	pub fn begin(&mut self, files: Vec<PendingFile>) -> AppResult<UploadBatch> {
		let (accepted, rejected): (Vec<_>, Vec<_>) = files.into_iter().partition(PendingFile::is_document);
		let filtered: Vec<String> = rejected.into_iter().map(|f| f.name).collect();
		if !filtered.is_empty() {
			log::warn!("ignoring non-PDF files: {}", filtered.join(", "));
		}
		if accepted.is_empty() {
			return Err(AppError::NoValidFiles);
		}

		self.next_batch += 1;
		let id = self.next_batch;
		self.documents.extend(accepted.iter().map(|f| UploadedDocument {
			name: f.name.clone(),
			size: f.size,
			status: UploadStatus::Uploading,
			batch: id,
		}));
		self.active = Some(id);
		self.progress = 0;
		self.last_error = None;
		log::info!("upload batch {id}: {} file(s)", accepted.len());

		Ok(UploadBatch {
			id,
			files: accepted,
			filtered,
		})
	}

	/// Advance synthetic progress by one step, capped until the batch resolves.
	pub fn step_progress(&mut self) -> u8 {
		if self.active.is_some() {
			self.progress = self.progress.saturating_add(PROGRESS_STEP).min(PROGRESS_CAP);
		}
		self.progress
	}

	/// Resolve a batch with the backend's answer. On success yields the
	/// cluster id and the accepted file names.
	pub fn finish(
		&mut self,
		batch: &UploadBatch,
		result: AppResult<UploadReceipt>,
	) -> AppResult<(String, Vec<String>)> {
		let status = if result.is_ok() {
			UploadStatus::Success
		} else {
			UploadStatus::Error
		};
		for doc in self.documents.iter_mut().filter(|d| d.batch == batch.id) {
			doc.status = status;
		}
		if self.active == Some(batch.id) {
			self.active = None;
			self.progress = 100;
		}

		match result {
			Ok(receipt) => {
				if receipt.processed_files_count != batch.files.len() {
					log::warn!(
						"backend processed {} of {} file(s)",
						receipt.processed_files_count,
						batch.files.len()
					);
				}
				log::info!("upload batch {} done: cluster {}", batch.id, receipt.cluster_id);
				Ok((receipt.cluster_id, batch.names()))
			}
			Err(e) => {
				log::error!("upload batch {} failed: {e}", batch.id);
				self.last_error = Some(e.to_string());
				Err(e)
			}
		}
	}

	/// Begin, send and resolve a batch in one go.
	pub async fn submit(
		&mut self,
		files: Vec<PendingFile>,
		source: &dyn DataSource,
	) -> AppResult<(String, Vec<String>)> {
		let batch = self.begin(files)?;
		let result = source.upload(&batch.files).await;
		self.finish(&batch, result)
	}

	/// Whether any entry carries this file name.
	pub fn contains(&self, name: &str) -> bool {
		self.documents.iter().any(|d| d.name == name)
	}

	/// Drop one entry; other entries keep their status.
	pub fn remove(&mut self, index: usize) -> Option<UploadedDocument> {
		(index < self.documents.len()).then(|| self.documents.remove(index))
	}

	/// Forget every entry. A batch still in flight resolves into nothing.
	pub fn clear(&mut self) {
		*self = Self {
			next_batch: self.next_batch,
			..Self::default()
		};
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use async_trait::async_trait;

	use super::*;
	use crate::api::{Answer, Insights, PodcastAudio, PodcastScript, RecommendationQuery, Snippet};
	use crate::components::force_graph::GraphData;

	/// Records how many uploads were attempted and answers with a fixed result.
	struct Recorder {
		calls: Cell<usize>,
		answer: AppResult<UploadReceipt>,
	}

	impl Recorder {
		fn answering(answer: AppResult<UploadReceipt>) -> Self {
			Self {
				calls: Cell::new(0),
				answer,
			}
		}
	}

	#[async_trait(?Send)]
	impl DataSource for Recorder {
		async fn upload(&self, _: &[PendingFile]) -> AppResult<UploadReceipt> {
			self.calls.set(self.calls.get() + 1);
			self.answer.clone()
		}
		async fn recommendations(&self, _: &RecommendationQuery) -> AppResult<Answer<Vec<Snippet>>> {
			unreachable!()
		}
		async fn insights(&self, _: &str) -> AppResult<Answer<Insights>> {
			unreachable!()
		}
		async fn podcast(&self, _: &PodcastScript) -> AppResult<Answer<PodcastAudio>> {
			unreachable!()
		}
		async fn graph(&self, _: &str) -> AppResult<GraphData> {
			unreachable!()
		}
	}

	fn pdf(name: &str) -> PendingFile {
		PendingFile::new(name, 1024, "application/pdf")
	}

	fn receipt(id: &str, count: usize) -> AppResult<UploadReceipt> {
		Ok(UploadReceipt {
			cluster_id: id.into(),
			processed_files_count: count,
		})
	}

	#[test]
	fn recognizes_documents() {
		assert!(pdf("a.pdf").is_document());
		assert!(PendingFile::new("a.PDF", 1, "").is_document());
		assert!(PendingFile::new("a", 1, "Application/PDF").is_document());
		assert!(!PendingFile::new("a.pdf", 1, "image/png").is_document());
		assert!(!PendingFile::new("notes.txt", 1, "").is_document());
	}

	#[tokio::test]
	async fn no_valid_files_sends_nothing() {
		let source = Recorder::answering(receipt("c1", 0));
		let mut session = UploadSession::default();
		let result = session
			.submit(vec![PendingFile::new("a.png", 5, "image/png")], &source)
			.await;
		assert_eq!(result, Err(AppError::NoValidFiles));
		assert_eq!(source.calls.get(), 0);
		assert!(session.documents().is_empty());
	}

	#[tokio::test]
	async fn success_marks_batch_and_yields_cluster() {
		let source = Recorder::answering(receipt("c1", 2));
		let mut session = UploadSession::default();
		let result = session.submit(vec![pdf("one.pdf"), pdf("two.pdf")], &source).await;
		assert_eq!(result, Ok(("c1".to_string(), vec!["one.pdf".to_string(), "two.pdf".to_string()])));
		assert!(session.documents().iter().all(|d| d.status == UploadStatus::Success));
		assert_eq!(session.progress(), 100);
		assert!(!session.is_uploading());
	}

	#[tokio::test]
	async fn failure_marks_every_file_error() {
		let source = Recorder::answering(Err(AppError::ServiceUnavailable("status 500".into())));
		let mut session = UploadSession::default();
		let result = session.submit(vec![pdf("one.pdf"), pdf("two.pdf")], &source).await;
		assert!(result.unwrap_err().is_unavailable());
		assert!(session.documents().iter().all(|d| d.status == UploadStatus::Error));
		assert!(session.last_error().unwrap().contains("status 500"));
	}

	#[test]
	fn mixed_batch_uploads_only_documents() {
		let mut session = UploadSession::default();
		let batch = session
			.begin(vec![pdf("a.pdf"), PendingFile::new("b.docx", 9, "application/msword"), pdf("c.pdf")])
			.unwrap();
		assert_eq!(batch.names(), vec!["a.pdf", "c.pdf"]);
		assert_eq!(batch.filtered, vec!["b.docx"]);
		assert_eq!(session.documents().len(), 2);
		assert!(session.documents().iter().all(|d| d.status == UploadStatus::Uploading));
	}

	#[test]
	fn progress_is_stepped_and_capped() {
		let mut session = UploadSession::default();
		assert_eq!(session.step_progress(), 0);
		let batch = session.begin(vec![pdf("a.pdf")]).unwrap();
		assert_eq!(session.step_progress(), 10);
		for _ in 0..20 {
			session.step_progress();
		}
		assert_eq!(session.progress(), PROGRESS_CAP);
		session.finish(&batch, receipt("c", 1)).unwrap();
		assert_eq!(session.progress(), 100);
		assert_eq!(session.step_progress(), 100);
	}

	#[test]
	fn remove_keeps_other_entries() {
		let mut session = UploadSession::default();
		let first = session.begin(vec![pdf("a.pdf")]).unwrap();
		session.finish(&first, receipt("c", 1)).unwrap();
		let second = session.begin(vec![pdf("b.pdf"), pdf("c.pdf")]).unwrap();

		assert_eq!(session.remove(1).map(|d| d.name), Some("b.pdf".to_string()));
		assert!(!session.contains("b.pdf"));
		assert!(session.contains("c.pdf"));
		assert!(session.remove(7).is_none());
		session.finish(&second, receipt("c", 2)).unwrap();

		let names: Vec<_> = session.documents().iter().map(|d| (d.name.as_str(), d.status)).collect();
		assert_eq!(names, vec![("a.pdf", UploadStatus::Success), ("c.pdf", UploadStatus::Success)]);
	}

	#[test]
	fn clear_resets_everything() {
		let mut session = UploadSession::default();
		let batch = session.begin(vec![pdf("a.pdf")]).unwrap();
		session.clear();
		assert!(session.documents().is_empty());
		assert!(!session.is_uploading());
		assert_eq!(session.progress(), 0);
		session.finish(&batch, receipt("c", 1)).unwrap();
		assert!(session.documents().is_empty());
		assert_eq!(session.progress(), 0);
	}
}
