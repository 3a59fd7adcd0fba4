//! Force-directed layout over a small node set.
//!
//! Repulsion is evaluated for every pair, so a tick costs O(n²). That is fine
//! for the tens of nodes a document cluster produces and nothing more.

use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use super::types::GraphData;

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

pub const DEFAULT_NODE_RADIUS: f64 = 8.0;
const INITIAL_RING_RADIUS: f64 = 100.0;
/// Consecutive calm ticks before the layout counts as settled.
const SETTLE_TICKS: u32 = 30;

/// Tuning constants for [`GraphLayout::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
	pub center_strength: f64,
	pub repulsion: f64,
	pub spring_strength: f64,
	pub rest_distance: f64,
	pub damping: f64,
	/// Distance kept free along each canvas edge.
	pub margin: f64,
	/// Below this speed a node counts as resting.
	pub rest_speed: f64,
}

impl Default for LayoutParams {
	fn default() -> Self {
		Self {
			center_strength: 0.01,
			repulsion: 500.0,
			spring_strength: 0.1,
			rest_distance: 100.0,
			damping: 0.9,
			margin: 20.0,
			rest_speed: 0.01,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
	pub id: String,
	pub label: String,
	pub radius: f64,
	pub color: String,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Held by the pointer; forces are not applied.
	pub pinned: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutLink {
	pub source: usize,
	pub target: usize,
	pub weight: f64,
	pub label: Option<String>,
}

/// Node and link snapshot plus the simulation that positions it.
#[derive(Clone, Debug)]
pub struct GraphLayout {
	nodes: Vec<LayoutNode>,
	links: Vec<LayoutLink>,
	index: HashMap<String, usize>,
	params: LayoutParams,
	width: f64,
	height: f64,
	calm_ticks: u32,
}

fn positive_or(value: Option<f64>, fallback: f64) -> f64 {
	value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(fallback)
}

/// Explicit weights are kept, floored at zero; a zero-weight link is inert.
fn link_weight(weight: f64) -> f64 {
	if weight.is_finite() { weight.max(0.0) } else { 1.0 }
}

fn clamp_axis(value: f64, extent: f64, margin: f64) -> f64 {
	let (lo, hi) = (margin, extent - margin);
	if hi < lo {
		extent / 2.0
	} else {
		value.clamp(lo, hi)
	}
}

/// Direction used to separate two nodes sitting on the same spot.
fn tie_break(i: usize, j: usize) -> (f64, f64) {
	let angle = ((i as f64) * 0.618_034 + (j as f64) * 0.414_214) * TAU;
	(angle.cos(), angle.sin())
}

impl GraphLayout {
	/// Build a layout from fetched data. Duplicate node ids keep their first
	/// occurrence; links with an unresolved or identical endpoint are dropped.
	pub fn new(data: &GraphData, width: f64, height: f64, params: LayoutParams) -> Self {
		let mut nodes = Vec::with_capacity(data.nodes.len());
		let mut index = HashMap::with_capacity(data.nodes.len());

		for node in &data.nodes {
			if index.contains_key(&node.id) {
				log::warn!("duplicate graph node id {:?} ignored", node.id);
				continue;
			}
			let i = nodes.len();
			let color = node
				.color
				.clone()
				.unwrap_or_else(|| COLORS[i % COLORS.len()].into());
			index.insert(node.id.clone(), i);
			nodes.push(LayoutNode {
				id: node.id.clone(),
				label: node.label.clone().unwrap_or_else(|| node.id.clone()),
				radius: positive_or(node.size, DEFAULT_NODE_RADIUS),
				color,
				x: 0.0,
				y: 0.0,
				vx: 0.0,
				vy: 0.0,
				pinned: false,
			});
		}

		let count = nodes.len().max(1) as f64;
		for (i, node) in nodes.iter_mut().enumerate() {
			let angle = (i as f64) * 2.0 * PI / count;
			node.x = clamp_axis(width / 2.0 + INITIAL_RING_RADIUS * angle.cos(), width, params.margin);
			node.y = clamp_axis(height / 2.0 + INITIAL_RING_RADIUS * angle.sin(), height, params.margin);
		}

		let mut links = Vec::with_capacity(data.links.len());
		for link in &data.links {
			match (index.get(&link.source), index.get(&link.target)) {
				(Some(&source), Some(&target)) if source != target => links.push(LayoutLink {
					source,
					target,
					weight: link_weight(link.weight),
					label: link.label.clone(),
				}),
				_ => log::debug!("skipping link {} -> {}", link.source, link.target),
			}
		}

		Self {
			nodes,
			links,
			index,
			params,
			width,
			height,
			calm_ticks: 0,
		}
	}

	pub fn nodes(&self) -> &[LayoutNode] {
		&self.nodes
	}

	pub fn links(&self) -> &[LayoutLink] {
		&self.links
	}

	pub fn params(&self) -> &LayoutParams {
		&self.params
	}

	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	pub fn node(&self, id: &str) -> Option<&LayoutNode> {
		self.index_of(id).map(|i| &self.nodes[i])
	}

	/// Indices of nodes sharing a link with `idx`.
	pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
		self.links.iter().filter_map(move |link| {
			if link.source == idx {
				Some(link.target)
			} else if link.target == idx {
				Some(link.source)
			} else {
				None
			}
		})
	}

	pub fn is_settled(&self) -> bool {
		self.calm_ticks >= SETTLE_TICKS
	}

	/// Resume ticking after an external change.
	pub fn wake(&mut self) {
		self.calm_ticks = 0;
	}

	/// Hold a node at `(x, y)` with zero velocity until [`release`](Self::release).
	pub fn pin(&mut self, idx: usize, x: f64, y: f64) {
		let (width, height, margin) = (self.width, self.height, self.params.margin);
		if let Some(node) = self.nodes.get_mut(idx) {
			node.x = clamp_axis(x, width, margin);
			node.y = clamp_axis(y, height, margin);
			node.vx = 0.0;
			node.vy = 0.0;
			node.pinned = true;
			self.calm_ticks = 0;
		}
	}

	pub fn release(&mut self, idx: usize) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.pinned = false;
			self.calm_ticks = 0;
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		let margin = self.params.margin;
		for node in &mut self.nodes {
			node.x = clamp_axis(node.x, width, margin);
			node.y = clamp_axis(node.y, height, margin);
		}
		self.calm_ticks = 0;
	}

	/// Advance the simulation by one step. Returns `false` once settled.
	pub fn tick(&mut self) -> bool {
		let n = self.nodes.len();
		if n == 0 {
			self.calm_ticks = SETTLE_TICKS;
			return false;
		}
		let p = self.params;
		let (cx, cy) = (self.width / 2.0, self.height / 2.0);

		let mut forces: Vec<(f64, f64)> = self
			.nodes
			.iter()
			.map(|node| ((cx - node.x) * p.center_strength, (cy - node.y) * p.center_strength))
			.collect();

		for i in 0..n {
			for j in (i + 1)..n {
				let (dx, dy) = (self.nodes[i].x - self.nodes[j].x, self.nodes[i].y - self.nodes[j].y);
				let raw = (dx * dx + dy * dy).sqrt();
				let (ux, uy) = if raw > 1e-9 { (dx / raw, dy / raw) } else { tie_break(i, j) };
				let d = raw.max(1.0);
				let f = p.repulsion / (d * d);
				forces[i].0 += ux * f;
				forces[i].1 += uy * f;
				forces[j].0 -= ux * f;
				forces[j].1 -= uy * f;
			}
		}

		for link in &self.links {
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			let (dx, dy) = (t.x - s.x, t.y - s.y);
			let d = (dx * dx + dy * dy).sqrt();
			if d < 1e-9 {
				continue;
			}
			let half = (d - p.rest_distance) * p.spring_strength * link.weight / 2.0;
			let (fx, fy) = (dx / d * half, dy / d * half);
			forces[link.source].0 += fx;
			forces[link.source].1 += fy;
			forces[link.target].0 -= fx;
			forces[link.target].1 -= fy;
		}

		let mut max_speed: f64 = 0.0;
		for (node, (fx, fy)) in self.nodes.iter_mut().zip(forces) {
			if node.pinned {
				node.vx = 0.0;
				node.vy = 0.0;
				continue;
			}
			node.vx = (node.vx + fx) * p.damping;
			node.vy = (node.vy + fy) * p.damping;
			node.x = clamp_axis(node.x + node.vx, self.width, p.margin);
			node.y = clamp_axis(node.y + node.vy, self.height, p.margin);
			max_speed = max_speed.max((node.vx * node.vx + node.vy * node.vy).sqrt());
		}

		if max_speed < p.rest_speed {
			self.calm_ticks = self.calm_ticks.saturating_add(1);
		} else {
			self.calm_ticks = 0;
		}
		!self.is_settled()
	}
}
