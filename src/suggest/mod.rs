//! Micro-habit suggestions.
//!
//! A suggestion comes either from the deterministic local heuristic or from a
//! remote endpoint. The remote path is strictly best effort: every failure
//! collapses into the local answer, so callers always get something usable.

pub mod heuristic;
pub mod remote;
pub mod resolver;

use crate::app::Preferences;
use crate::domain::SphereKey;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use heuristic::{daily_check_in, local_heuristic, micro_action_by_name, weekly_plan};
pub use remote::{SuggestionTransport, UreqTransport};
pub use resolver::resolve;

/// Timeout applied to the remote call unless overridden
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Errors from the remote suggestion path. None of them reach the user.
#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("remote suggestions are disabled")]
    Disabled,

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("suggestion endpoint answered with HTTP {status}")]
    Status { status: u16 },

    #[error("suggestion endpoint returned unparseable JSON: {0}")]
    Body(#[source] serde_json::Error),

    #[error("suggestion response has unexpected shape: {0}")]
    Shape(String),
}

/// Accept any non-negative JSON number as is; anything else is dropped
fn deserialize_minutes<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_f64())
        .filter(|m| m.is_finite() && *m >= 0.0))
}

/// Strings pass through; null or any other type reads as empty
fn deserialize_reason<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(reason)) => reason,
        _ => String::new(),
    })
}

fn deserialize_sphere<'de, D>(deserializer: D) -> Result<Option<SphereKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok()))
}

/// A single small activity with an estimated duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedAction {
    pub text: String,
    #[serde(
        default,
        deserialize_with = "deserialize_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_min: Option<f64>,
}

impl RecommendedAction {
    pub fn new(text: &str, duration_min: u32) -> Self {
        Self {
            text: text.to_string(),
            duration_min: Some(duration_min as f64),
        }
    }

    /// Duration in whole minutes, for display
    pub fn rounded_minutes(&self) -> Option<u64> {
        self.duration_min.map(|m| m.round() as u64)
    }
}

/// What the resolver hands back, in the endpoint's wire shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub recommended_action: RecommendedAction,
    #[serde(default, deserialize_with = "deserialize_reason")]
    pub reason: String,
    /// Sphere the action targets, when known
    #[serde(
        default,
        deserialize_with = "deserialize_sphere",
        skip_serializing_if = "Option::is_none"
    )]
    pub sphere_key: Option<SphereKey>,
}

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionConfig {
    pub ai_enabled: bool,
    pub api_url: Option<String>,
    pub timeout: Duration,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            ai_enabled: false,
            api_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SuggestionConfig {
    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self {
            ai_enabled: prefs.ai_enabled,
            api_url: prefs.ai_api_url.clone(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The endpoint to call, or None when the remote path must be skipped
    pub fn remote_url(&self) -> Option<&str> {
        if !self.ai_enabled {
            return None;
        }
        self.api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
