use super::ViewerDocument;

/// Documents the viewer can switch between, one per file name.
///
/// Entries that leave the shelf are handed back so their object URLs can be
/// released.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentShelf {
	docs: Vec<ViewerDocument>,
}

impl DocumentShelf {
	pub fn documents(&self) -> &[ViewerDocument] {
		&self.docs
	}

	pub fn find(&self, name: &str) -> Option<&ViewerDocument> {
		self.docs.iter().find(|d| d.name == name)
	}

	/// Add `doc`, replacing an entry with the same name in place.
	pub fn insert(&mut self, doc: ViewerDocument) -> Option<ViewerDocument> {
		match self.docs.iter_mut().find(|d| d.name == doc.name) {
			Some(slot) => Some(std::mem::replace(slot, doc)),
			None => {
				self.docs.push(doc);
				None
			}
		}
	}

	pub fn remove(&mut self, name: &str) -> Option<ViewerDocument> {
		let index = self.docs.iter().position(|d| d.name == name)?;
		Some(self.docs.remove(index))
	}

	pub fn clear(&mut self) -> Vec<ViewerDocument> {
		std::mem::take(&mut self.docs)
	}
}
