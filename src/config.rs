//! Runtime configuration.
//!
//! Defaults are overridden at build time through environment variables, since a
//! CSR bundle has no process environment of its own:
//!
//! - `INSIGHT_API_URL`: backend base URL (default `http://localhost:8080/api`)
//! - `INSIGHT_VIEWER_CLIENT_ID`: client id for the PDF embed SDK
//! - `INSIGHT_DEMO`: `1`/`true` serves stub data without touching the network

use serde::{Deserialize, Serialize};

use crate::components::force_graph::LayoutParams;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Application configuration, shared through context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
	/// Base URL of the analysis backend, without a trailing slash.
	pub api_base_url: String,
	/// Client id for the embedded PDF viewer.
	pub viewer_client_id: String,
	/// Use the stub data source exclusively.
	pub demo_mode: bool,
	/// Force simulation tuning.
	pub layout: LayoutParams,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			api_base_url: DEFAULT_API_URL.into(),
			viewer_client_id: String::new(),
			demo_mode: false,
			layout: LayoutParams::default(),
		}
	}
}

impl AppConfig {
	/// Configuration baked in at build time.
	pub fn load() -> Self {
		Self::from_overrides(
			option_env!("INSIGHT_API_URL"),
			option_env!("INSIGHT_VIEWER_CLIENT_ID"),
			option_env!("INSIGHT_DEMO"),
		)
	}

	/// Apply optional overrides on top of the defaults. Blank values are ignored.
	pub fn from_overrides(
		api_url: Option<&str>,
		client_id: Option<&str>,
		demo: Option<&str>,
	) -> Self {
		let mut config = Self::default();
		if let Some(url) = api_url.map(str::trim).filter(|s| !s.is_empty()) {
			config.api_base_url = url.trim_end_matches('/').to_string();
		}
		if let Some(id) = client_id.map(str::trim).filter(|s| !s.is_empty()) {
			config.viewer_client_id = id.to_string();
		}
		if let Some(flag) = demo {
			config.demo_mode = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
		}
		config
	}

	/// Absolute URL for an endpoint path such as `"upload"`.
	pub fn endpoint(&self, path: &str) -> String {
		format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_without_overrides() {
		let config = AppConfig::from_overrides(None, None, None);
		assert_eq!(config, AppConfig::default());
		assert!(!config.demo_mode);
	}

	#[test]
	fn overrides_trim_and_normalize() {
		let config = AppConfig::from_overrides(Some(" https://api.example/v1/ "), Some("abc"), Some("TRUE"));
		assert_eq!(config.api_base_url, "https://api.example/v1");
		assert_eq!(config.viewer_client_id, "abc");
		assert!(config.demo_mode);
		assert_eq!(config.endpoint("/graph/c1"), "https://api.example/v1/graph/c1");
	}

	#[test]
	fn blank_overrides_keep_defaults() {
		let config = AppConfig::from_overrides(Some("  "), Some(""), Some("0"));
		assert_eq!(config.api_base_url, DEFAULT_API_URL);
		assert!(!config.demo_mode);
	}

	#[test]
	fn partial_json_fills_defaults() {
		let config: AppConfig = serde_json::from_str(r#"{"demo_mode": true}"#).unwrap();
		assert!(config.demo_mode);
		assert_eq!(config.layout, LayoutParams::default());
	}
}
