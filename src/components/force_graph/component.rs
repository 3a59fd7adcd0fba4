use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::layout::LayoutParams;
use super::render;
use super::state::ForceGraphState;
use crate::Backend;
use crate::api::token::Token;

/// Per-frame callback that stops itself once its generation goes stale.
#[derive(Clone, Default)]
struct FrameLoop {
	callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
	handle: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
	fn start(&self, token: Token, state: Rc<RefCell<ForceGraphState>>, ctx: CanvasRenderingContext2d) {
		self.cancel();
		let (callback, handle) = (self.callback.clone(), self.handle.clone());
		*self.callback.borrow_mut() = Some(Closure::new(move || {
			handle.set(None);
			{
				let mut s = state.borrow_mut();
				if !s.is_current(token) {
					log::debug!("frame loop retired");
					return;
				}
				// Settled layouts skip physics but still redraw for pan and zoom.
				s.tick(token);
				render::render(&s, &ctx);
			}
			if let (Some(cb), Some(window)) = (callback.borrow().as_ref(), web_sys::window()) {
				handle.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		self.schedule();
	}

	fn schedule(&self) {
		if let (Some(cb), Some(window)) = (self.callback.borrow().as_ref(), web_sys::window()) {
			self.handle
				.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	}

	fn cancel(&self) {
		if let (Some(id), Some(window)) = (self.handle.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		self.callback.borrow_mut().take();
	}
}

/// Everything the canvas owns; torn down in one place on close/cleanup.
struct GraphRuntime {
	state: Rc<RefCell<ForceGraphState>>,
	frames: FrameLoop,
	ctx: RefCell<Option<CanvasRenderingContext2d>>,
	resize_cb: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl GraphRuntime {
	fn shutdown(&self) {
		self.state.borrow_mut().close();
		self.frames.cancel();
		if let (Some(cb), Some(window)) = (self.resize_cb.borrow_mut().take(), web_sys::window()) {
			let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
	}
}

fn viewport(window: &Window) -> (f64, f64) {
	let dim = |v: Result<JsValue, JsValue>, fallback: f64| v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback);
	(dim(window.inner_width(), 800.0), dim(window.inner_height(), 600.0))
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

/// Interactive cluster graph: fetches `{nodes, links}` for `cluster_id` and
/// lays it out on a canvas.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] cluster_id: Signal<Option<String>>,
	on_close: Callback<()>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(default = LayoutParams::default())] params: LayoutParams,
) -> impl IntoView {
	let backend = expect_context::<Backend>();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let runtime = StoredValue::new_local(GraphRuntime {
		state: Rc::new(RefCell::new(ForceGraphState::new(
			width.unwrap_or(800.0),
			height.unwrap_or(600.0),
			params,
		))),
		frames: FrameLoop::default(),
		ctx: RefCell::new(None),
		resize_cb: RefCell::new(None),
	});

	let loading = RwSignal::new(false);
	let error = RwSignal::new(None::<String>);
	let selected = RwSignal::new(None::<String>);
	let zoom = RwSignal::new(1.0_f64);

	let sync = move || {
		runtime.with_value(|rt| {
			let s = rt.state.borrow();
			loading.set(s.is_loading());
			error.set(s.error().map(str::to_string));
			selected.set(
				s.selected()
					.and_then(|id| s.layout().and_then(|l| l.node(id)))
					.map(|n| n.label.clone()),
			);
			zoom.set(s.zoom());
		});
	};

	// Start a generation: frame loop plus graph fetch under the same token.
	let load = move |token: Token| {
		runtime.with_value(|rt| {
			if let Some(ctx) = rt.ctx.borrow().clone() {
				rt.frames.start(token, rt.state.clone(), ctx);
			}
		});
		let Some(cluster) = cluster_id.get_untracked() else {
			runtime.with_value(|rt| {
				rt.state
					.borrow_mut()
					.apply_fetch(token, Ok(Default::default()));
			});
			sync();
			return;
		};
		sync();
		let source = backend.get();
		spawn_local(async move {
			let result = source.graph(&cluster).await;
			let applied = runtime.try_with_value(|rt| rt.state.borrow_mut().apply_fetch(token, result));
			if applied == Some(true) {
				sync();
			}
		});
	};

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let _ = cluster_id.get();
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			viewport(&window)
		} else {
			let parent = canvas.parent_element();
			(
				width.unwrap_or_else(|| parent.as_ref().map(|p| p.client_width() as f64).unwrap_or(800.0)),
				height.unwrap_or_else(|| parent.as_ref().map(|p| p.client_height() as f64).unwrap_or(600.0)),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx.dyn_into::<CanvasRenderingContext2d>().ok(),
			_ => None,
		};
		if ctx.is_none() {
			log::error!("canvas has no 2d context");
			error.set(Some("Canvas rendering is not available".into()));
			return;
		}

		let token = runtime.with_value(|rt| {
			*rt.ctx.borrow_mut() = ctx;
			let mut s = rt.state.borrow_mut();
			s.resize(w, h);
			s.open()
		});

		if fullscreen {
			runtime.with_value(|rt| {
				if rt.resize_cb.borrow().is_some() {
					return;
				}
				let (state_resize, canvas_resize) = (rt.state.clone(), canvas.clone());
				let cb = Closure::<dyn FnMut()>::new(move || {
					let Some(win) = web_sys::window() else {
						return;
					};
					let (nw, nh) = viewport(&win);
					canvas_resize.set_width(nw as u32);
					canvas_resize.set_height(nh as u32);
					state_resize.borrow_mut().resize(nw, nh);
				});
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				*rt.resize_cb.borrow_mut() = Some(cb);
			});
		}

		load(token);
	});

	on_cleanup(move || {
		runtime.try_with_value(|rt| rt.shutdown());
	});

	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		runtime.with_value(|rt| rt.state.borrow_mut().pointer_down(x, y));
		sync();
	};

	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		runtime.with_value(|rt| rt.state.borrow_mut().pointer_move(x, y));
	};

	let on_mouseup = move |_: MouseEvent| {
		runtime.with_value(|rt| rt.state.borrow_mut().pointer_up());
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		runtime.with_value(|rt| rt.state.borrow_mut().zoom_at(factor, x, y));
		sync();
	};

	let zoom_in = move |_| {
		runtime.with_value(|rt| rt.state.borrow_mut().zoom_in());
		sync();
	};
	let zoom_out = move |_| {
		runtime.with_value(|rt| rt.state.borrow_mut().zoom_out());
		sync();
	};
	let reset = move |_| {
		let token = runtime.with_value(|rt| rt.state.borrow_mut().reset());
		load(token);
	};
	let close = move |_| {
		runtime.with_value(|rt| rt.shutdown());
		on_close.run(());
	};

	view! {
		<div class="force-graph">
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseup
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<div class="graph-controls">
				<button on:click=zoom_in title="Zoom in">"+"</button>
				<button on:click=zoom_out title="Zoom out">"−"</button>
				<button on:click=reset title="Reset">"Reset"</button>
				<button on:click=close title="Close">"×"</button>
				<span class="graph-zoom">{move || format!("{:.0}%", zoom.get() * 100.0)}</span>
			</div>
			{move || loading.get().then(|| view! { <p class="graph-status">"Loading graph…"</p> })}
			{move || error.get().map(|e| view! { <p class="graph-error">{e}</p> })}
			{move || selected.get().map(|label| view! { <p class="graph-selected">{label}</p> })}
		</div>
	}
}
