use super::layout::{GraphLayout, LayoutParams};
use super::types::GraphData;
use crate::api::token::{RequestTokens, Token};
use crate::error::AppResult;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 3.0;
pub const ZOOM_STEP: f64 = 1.2;
/// Extra world-space slack around a node for pointer hits.
pub const HIT_PADDING: f64 = 4.0;

/// Screen = graph * k + (x, y).
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphViewState {
	pub transform: ViewTransform,
	/// Looked up by id on every use; never keeps a node alive.
	pub selected: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Graph view: layout snapshot, view transform, pointer state and the
/// generation that owns the frame loop and the pending fetch.
pub struct ForceGraphState {
	layout: Option<GraphLayout>,
	pub view: GraphViewState,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	params: LayoutParams,
	generation: RequestTokens,
	visible: bool,
	loading: bool,
	error: Option<String>,
}

impl ForceGraphState {
	pub fn new(width: f64, height: f64, params: LayoutParams) -> Self {
		Self {
			layout: None,
			view: GraphViewState::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			params,
			generation: RequestTokens::new(),
			visible: false,
			loading: false,
			error: None,
		}
	}

	pub fn layout(&self) -> Option<&GraphLayout> {
		self.layout.as_ref()
	}

	pub fn selected(&self) -> Option<&str> {
		self.view.selected.as_deref()
	}

	pub fn zoom(&self) -> f64 {
		self.view.transform.k
	}

	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	pub fn is_loading(&self) -> bool {
		self.loading
	}

	pub fn is_visible(&self) -> bool {
		self.visible
	}

	pub fn is_current(&self, token: Token) -> bool {
		self.generation.is_current(token)
	}

	/// Show the view and start a new generation for its fetch and frame loop.
	pub fn open(&mut self) -> Token {
		self.visible = true;
		self.loading = true;
		self.error = None;
		self.generation.issue()
	}

	/// Hide the view. Drops the data and stales the running loop.
	pub fn close(&mut self) {
		self.visible = false;
		self.loading = false;
		self.clear_data();
		self.generation.invalidate();
		log::debug!("graph view closed");
	}

	/// Discard data and view transform; the returned token belongs to the refetch.
	pub fn reset(&mut self) -> Token {
		self.clear_data();
		self.error = None;
		self.loading = true;
		log::info!("graph view reset");
		self.generation.issue()
	}

	fn clear_data(&mut self) {
		self.layout = None;
		self.view = GraphViewState::default();
		self.drag = DragState::default();
		self.pan = PanState::default();
	}

	/// Apply a finished graph fetch. Stale tokens are ignored; a failure keeps
	/// whatever graph is already loaded. Returns whether anything changed.
	pub fn apply_fetch(&mut self, token: Token, result: AppResult<GraphData>) -> bool {
		if !self.visible || !self.generation.is_current(token) {
			log::debug!("dropping stale graph response");
			return false;
		}
		self.loading = false;
		match result {
			Ok(data) => {
				let layout = GraphLayout::new(&data, self.width, self.height, self.params);
				log::info!(
					"graph loaded: {} nodes, {} links",
					layout.nodes().len(),
					layout.links().len()
				);
				if self.view.selected.as_deref().is_some_and(|id| !layout.contains(id)) {
					self.view.selected = None;
				}
				self.drag = DragState::default();
				self.layout = Some(layout);
				self.error = None;
			}
			Err(e) => {
				log::error!("graph fetch failed: {e}");
				self.error = Some(e.to_string());
			}
		}
		true
	}

	/// One simulation step for the loop holding `token`. Returns `false` when
	/// nothing moved, or when the loop is stale.
	pub fn tick(&mut self, token: Token) -> bool {
		if !self.visible || !self.generation.is_current(token) {
			return false;
		}
		match self.layout.as_mut() {
			Some(layout) if !layout.is_settled() || self.drag.node.is_some() => layout.tick(),
			_ => false,
		}
	}

	/// Select a node by id. Unknown ids leave the selection unchanged.
	pub fn select(&mut self, id: &str) -> bool {
		if self.layout.as_ref().is_some_and(|l| l.contains(id)) {
			self.view.selected = Some(id.to_string());
			true
		} else {
			false
		}
	}

	pub fn clear_selection(&mut self) {
		self.view.selected = None;
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		let t = &self.view.transform;
		((sx - t.x) / t.k, (sy - t.y) / t.k)
	}

	/// Topmost node under a screen position.
	pub fn node_at(&self, sx: f64, sy: f64) -> Option<usize> {
		let layout = self.layout.as_ref()?;
		let (gx, gy) = self.screen_to_graph(sx, sy);
		layout
			.nodes()
			.iter()
			.enumerate()
			.rev()
			.find(|(_, node)| {
				let (dx, dy) = (node.x - gx, node.y - gy);
				(dx * dx + dy * dy).sqrt() <= node.radius + HIT_PADDING
			})
			.map(|(idx, _)| idx)
	}

	/// Take hold of a node; it follows the pointer until [`end_drag`](Self::end_drag).
	pub fn begin_drag(&mut self, id: &str, sx: f64, sy: f64) -> bool {
		let Some(idx) = self.layout.as_ref().and_then(|l| l.index_of(id)) else {
			return false;
		};
		self.drag.node = Some(idx);
		self.drag_to(sx, sy);
		true
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		if let (Some(idx), Some(layout)) = (self.drag.node, self.layout.as_mut()) {
			layout.pin(idx, gx, gy);
		}
	}

	/// Hand the dragged node back to the simulation.
	pub fn end_drag(&mut self) {
		if let (Some(idx), Some(layout)) = (self.drag.node.take(), self.layout.as_mut()) {
			layout.release(idx);
		}
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.view.transform.x,
			transform_start_y: self.view.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if self.pan.active {
			self.view.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.view.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Mouse-down: grab and select a node if one is hit, otherwise pan.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		let hit = self
			.node_at(sx, sy)
			.and_then(|idx| self.layout.as_ref().map(|l| l.nodes()[idx].id.clone()));
		match hit {
			Some(id) => {
				self.select(&id);
				self.begin_drag(&id, sx, sy);
			}
			None => self.begin_pan(sx, sy),
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if self.drag.node.is_some() {
			self.drag_to(sx, sy);
		} else {
			self.pan_to(sx, sy);
		}
	}

	pub fn pointer_up(&mut self) {
		self.end_drag();
		self.end_pan();
	}

	pub fn zoom_in(&mut self) {
		self.zoom_at(ZOOM_STEP, self.width / 2.0, self.height / 2.0);
	}

	pub fn zoom_out(&mut self) {
		self.zoom_at(1.0 / ZOOM_STEP, self.width / 2.0, self.height / 2.0);
	}

	/// Scale the zoom by `factor`, keeping the screen point `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, factor: f64, sx: f64, sy: f64) {
		let t = &mut self.view.transform;
		let new_k = (t.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / t.k;
		t.x = sx - (sx - t.x) * ratio;
		t.y = sy - (sy - t.y) * ratio;
		t.k = new_k;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		if let Some(layout) = self.layout.as_mut() {
			layout.resize(width, height);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{GraphLink, GraphNode};
	use crate::error::AppError;

	fn sample() -> GraphData {
		GraphData {
			nodes: vec![GraphNode::new("a"), GraphNode::new("b"), GraphNode::new("c")],
			links: vec![GraphLink::new("a", "b"), GraphLink::new("b", "c")],
		}
	}

	fn loaded() -> ForceGraphState {
		let mut state = ForceGraphState::new(800.0, 600.0, LayoutParams::default());
		let token = state.open();
		assert!(state.apply_fetch(token, Ok(sample())));
		state
	}

	#[test]
	fn select_unknown_is_noop() {
		let mut state = loaded();
		assert!(state.select("a"));
		assert!(state.select("a"));
		assert!(!state.select("zz"));
		assert_eq!(state.selected(), Some("a"));
	}

	#[test]
	fn replacing_data_clears_missing_selection() {
		let mut state = loaded();
		state.select("c");
		let token = state.open();
		let data = GraphData {
			nodes: vec![GraphNode::new("a")],
			links: vec![],
		};
		state.apply_fetch(token, Ok(data));
		assert_eq!(state.selected(), None);
	}

	#[test]
	fn five_zoom_ins_clamp() {
		let mut state = loaded();
		for _ in 0..5 {
			state.zoom_in();
		}
		let expected = (1.0_f64 * 1.2_f64.powi(5)).min(3.0);
		assert!((state.zoom() - expected).abs() < 1e-12);
		for _ in 0..5 {
			state.zoom_in();
		}
		assert_eq!(state.zoom(), MAX_ZOOM);
		for _ in 0..20 {
			state.zoom_out();
		}
		assert_eq!(state.zoom(), MIN_ZOOM);
	}

	#[test]
	fn zoom_keeps_center_fixed() {
		let mut state = loaded();
		let before = state.screen_to_graph(400.0, 300.0);
		state.zoom_in();
		let after = state.screen_to_graph(400.0, 300.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
	}

	#[test]
	fn drag_pins_then_release_resumes() {
		let mut state = loaded();
		let token = state.open();
		state.apply_fetch(token, Ok(sample()));
		state.zoom_in();
		assert!(state.begin_drag("b", 300.0, 250.0));
		let (gx, gy) = state.screen_to_graph(300.0, 250.0);
		let node = state.layout().unwrap().node("b").unwrap();
		assert_eq!((node.x, node.y, node.vx, node.vy), (gx, gy, 0.0, 0.0));

		state.tick(token);
		let node = state.layout().unwrap().node("b").unwrap();
		assert_eq!((node.x, node.y), (gx, gy));

		state.end_drag();
		state.tick(token);
		let node = state.layout().unwrap().node("b").unwrap();
		assert!(node.vx != 0.0 || node.vy != 0.0);
	}

	#[test]
	fn pointer_down_on_node_selects_and_drags() {
		let mut state = loaded();
		let node = state.layout().unwrap().node("a").unwrap().clone();
		state.pointer_down(node.x, node.y);
		assert_eq!(state.selected(), Some("a"));
		assert!(state.drag.node.is_some());
		state.pointer_up();
		assert!(state.drag.node.is_none());
	}

	#[test]
	fn pointer_down_on_background_pans() {
		let mut state = loaded();
		state.pointer_down(5.0, 5.0);
		state.pointer_move(25.0, 15.0);
		state.pointer_up();
		assert_eq!((state.view.transform.x, state.view.transform.y), (20.0, 10.0));
		assert_eq!(state.selected(), None);
	}

	#[test]
	fn failed_fetch_keeps_previous_graph() {
		let mut state = loaded();
		let token = state.open();
		state.apply_fetch(token, Err(AppError::MalformedGraphData("missing `links` array".into())));
		assert_eq!(state.layout().unwrap().nodes().len(), 3);
		assert!(state.error().unwrap().contains("links"));
	}

	#[test]
	fn stale_fetch_is_ignored() {
		let mut state = ForceGraphState::new(800.0, 600.0, LayoutParams::default());
		let first = state.open();
		let second = state.reset();
		assert!(!state.apply_fetch(first, Ok(sample())));
		assert!(state.layout().is_none());
		assert!(state.apply_fetch(second, Ok(sample())));
		assert!(!state.is_loading());
	}

	#[test]
	fn unresolved_link_renders_nodes() {
		let mut state = ForceGraphState::new(800.0, 600.0, LayoutParams::default());
		let token = state.open();
		let data = GraphData::from_json(
			r#"{"nodes":[{"id":"a"},{"id":"b"}],"links":[{"source":"a","target":"z"}]}"#,
		);
		state.apply_fetch(token, data);
		let layout = state.layout().unwrap();
		assert_eq!(layout.nodes().len(), 2);
		assert!(layout.links().is_empty());
		assert!(state.error().is_none());
	}

	#[test]
	fn close_stops_loop_and_drops_data() {
		let mut state = loaded();
		let token = state.open();
		state.apply_fetch(token, Ok(sample()));
		assert!(state.tick(token));
		state.close();
		assert!(!state.tick(token));
		assert!(state.layout().is_none());
		assert!(!state.is_visible());
	}

	#[test]
	fn reset_discards_view() {
		let mut state = loaded();
		state.select("a");
		state.zoom_in();
		state.reset();
		assert!(state.layout().is_none());
		assert_eq!(state.view, GraphViewState::default());
		assert!(state.is_loading());
	}
}
