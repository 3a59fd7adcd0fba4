mod component;
mod layout;
mod render;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use layout::{GraphLayout, LayoutParams};
pub use state::ForceGraphState;
pub use types::{GraphData, GraphLink, GraphNode};
