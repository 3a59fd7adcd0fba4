use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

fn default_weight() -> f64 {
	1.0
}

/// A node as delivered by the graph endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	pub id: String,
	#[serde(default, alias = "name")]
	pub label: Option<String>,
	#[serde(default)]
	pub size: Option<f64>,
	#[serde(default)]
	pub color: Option<String>,
}

/// A link between two node ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
	pub source: String,
	pub target: String,
	#[serde(default = "default_weight")]
	pub weight: f64,
	#[serde(default)]
	pub label: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

impl GraphNode {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			label: None,
			size: None,
			color: None,
		}
	}
}

impl GraphLink {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			weight: default_weight(),
			label: None,
		}
	}
}

impl GraphData {
	/// Parse a graph endpoint body.
	///
	/// A body that is not JSON is a transport problem; JSON without both
	/// arrays is malformed graph data.
	pub fn from_json(body: &str) -> AppResult<Self> {
		let value: Value = serde_json::from_str(body)
			.map_err(|e| AppError::ServiceUnavailable(format!("graph response is not JSON: {e}")))?;
		Self::from_value(value)
	}

	pub fn from_value(value: Value) -> AppResult<Self> {
		for key in ["nodes", "links"] {
			if !value.get(key).is_some_and(Value::is_array) {
				return Err(AppError::MalformedGraphData(format!("missing `{key}` array")));
			}
		}
		serde_json::from_value(value).map_err(|e| AppError::MalformedGraphData(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_minimal_payload_with_defaults() {
		let data = GraphData::from_json(
			r#"{"nodes":[{"id":"a"},{"id":"b","name":"Bee","size":12}],"links":[{"source":"a","target":"z"}]}"#,
		)
		.unwrap();
		assert_eq!(data.nodes.len(), 2);
		assert_eq!(data.nodes[1].label.as_deref(), Some("Bee"));
		assert_eq!(data.links[0].weight, 1.0);
		assert_eq!(data.links[0].label, None);
	}

	#[test]
	fn missing_arrays_are_malformed() {
		let err = GraphData::from_json(r#"{"nodes":[]}"#).unwrap_err();
		assert!(matches!(err, AppError::MalformedGraphData(ref m) if m.contains("links")));

		let err = GraphData::from_json(r#"{"nodes":{},"links":[]}"#).unwrap_err();
		assert!(matches!(err, AppError::MalformedGraphData(_)));
	}

	#[test]
	fn node_without_id_is_malformed() {
		let err = GraphData::from_json(r#"{"nodes":[{"label":"x"}],"links":[]}"#).unwrap_err();
		assert!(matches!(err, AppError::MalformedGraphData(_)));
	}

	#[test]
	fn html_body_is_unavailable() {
		let err = GraphData::from_json("<!doctype html><p>502</p>").unwrap_err();
		assert!(err.is_unavailable());
	}
}
