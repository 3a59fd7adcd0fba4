pub mod force_graph;
pub mod insights_panel;
pub mod upload_panel;
pub mod viewer;
