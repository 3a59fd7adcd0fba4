use std::collections::HashSet;
use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::layout::GraphLayout;
use super::state::ForceGraphState;

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	let Some(layout) = state.layout() else {
		return;
	};

	let t = &state.view.transform;
	let selected = state.selected().and_then(|id| layout.index_of(id));
	let neighbors: HashSet<usize> = selected
		.map(|idx| layout.neighbors(idx).collect())
		.unwrap_or_default();

	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_links(layout, ctx, t.k, selected);
	draw_nodes(layout, ctx, t.k, selected, &neighbors);
	ctx.restore();
}

fn draw_links(layout: &GraphLayout, ctx: &CanvasRenderingContext2d, k: f64, selected: Option<usize>) {
	let nodes = layout.nodes();
	for link in layout.links() {
		let (s, t) = (&nodes[link.source], &nodes[link.target]);
		let touches_selection = selected.is_some_and(|idx| idx == link.source || idx == link.target);
		let alpha = match (selected, touches_selection) {
			(Some(_), true) => 0.9,
			(Some(_), false) => 0.15,
			(None, _) => 0.6,
		};

		ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {})", alpha));
		ctx.set_line_width((link.weight.sqrt() * 1.5).max(0.5) / k.max(0.5));
		ctx.begin_path();
		ctx.move_to(s.x, s.y);
		ctx.line_to(t.x, t.y);
		ctx.stroke();

		if let Some(label) = &link.label {
			ctx.set_fill_style_str(&format!("rgba(200, 220, 255, {})", alpha));
			ctx.set_font(&format!("{}px sans-serif", 9.0 / k.max(0.5)));
			let _ = ctx.fill_text(label, (s.x + t.x) / 2.0, (s.y + t.y) / 2.0);
		}
	}
}

fn draw_nodes(
	layout: &GraphLayout,
	ctx: &CanvasRenderingContext2d,
	k: f64,
	selected: Option<usize>,
	neighbors: &HashSet<usize>,
) {
	for (idx, node) in layout.nodes().iter().enumerate() {
		let is_selected = selected == Some(idx);
		let dimmed = selected.is_some() && !is_selected && !neighbors.contains(&idx);

		ctx.set_global_alpha(if dimmed { 0.35 } else { 1.0 });
		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, node.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&node.color);
		ctx.fill();

		if is_selected {
			ctx.begin_path();
			let _ = ctx.arc(node.x, node.y, node.radius + 3.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.8)");
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		}

		ctx.set_fill_style_str(if dimmed { "rgba(255, 255, 255, 0.4)" } else { "white" });
		ctx.set_font(&format!("{}px sans-serif", 11.0 / k.max(0.5)));
		let _ = ctx.fill_text(&node.label, node.x + node.radius + 3.0, node.y + 3.0);
		ctx.set_global_alpha(1.0);
	}
}
