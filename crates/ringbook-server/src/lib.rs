//! HTTP server wiring for Ringbook.
//!
//! Mounts the [`ringbook_api`] router under `/api`, adds request tracing and
//! a liveness probe, and defines the runtime [`ServerConfig`].

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use ringbook_core::{Phonebook, phone::DEFAULT_REGION, store::DirectoryStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `RINGBOOK_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  /// ISO 3166 region applied to numbers written without a country code.
  #[serde(default = "default_region")]
  pub default_region: String,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/ringbook/ringbook.db") }

fn default_region() -> String { DEFAULT_REGION.to_string() }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:           default_host(),
      port:           default_port(),
      store_path:     default_store_path(),
      default_region: default_region(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level axum [`Router`] for the server.
pub fn router<S>(phonebook: Arc<Phonebook<S>>) -> Router
where
  S: DirectoryStore + 'static,
{
  Router::new()
    .route("/healthz", get(|| async { "ok" }))
    .nest("/api", ringbook_api::api_router(phonebook))
    .layer(TraceLayer::new_for_http())
}
