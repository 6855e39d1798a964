//! Retrieval settings loader.
//!
//! Loads and merges:
//! - System defaults: `<PRJ_ROOT>/packages/conf/lexgraph.yaml`
//! - User overrides:  `<PRJ_CONFIG_HOME>/lexgraph/settings.yaml`
//!
//! Merge precedence is user over system. Missing keys fall back to the
//! defaults of [`crate::HybridRetrieverConfig`].

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;

const DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH: &str = "packages/conf/lexgraph.yaml";
const DEFAULT_USER_SETTINGS_RELATIVE_PATH: &str = "lexgraph/settings.yaml";
const DEFAULT_CONFIG_HOME_RELATIVE_PATH: &str = ".config";
static CONFIG_HOME_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

/// All retrieval settings; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RetrievalSettings {
    /// Fusion and fan-out knobs.
    #[serde(default)]
    pub retrieval: RetrievalSection,
    /// Graph item weights.
    #[serde(default)]
    pub weights: WeightSettings,
    /// Response cache.
    #[serde(default)]
    pub cache: CacheSettings,
}

/// `retrieval:` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RetrievalSection {
    /// RRF smoothing constant.
    pub rrf_k: Option<f32>,
    /// Default semantic hit cap per call.
    pub n_semantic: Option<usize>,
    /// Default per-kind graph item cap per call.
    pub n_graph: Option<usize>,
    /// Clause cap inside each graph traversal.
    pub max_clauses: Option<usize>,
    /// Concurrent graph fetch permits.
    pub max_concurrent_graph_fetches: Option<usize>,
    /// Per-contract graph fetch timeout.
    pub graph_fetch_timeout_ms: Option<u64>,
}

/// `weights:` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WeightSettings {
    /// Contract metadata item weight.
    pub metadata: Option<f32>,
    /// Company item weight.
    pub company: Option<f32>,
    /// Clause item weight.
    pub clause: Option<f32>,
    /// High-severity risk weight.
    pub risk_high: Option<f32>,
    /// Medium-severity risk weight.
    pub risk_medium: Option<f32>,
    /// Low-severity risk weight.
    pub risk_low: Option<f32>,
    /// Unknown-severity risk weight.
    pub risk_unknown: Option<f32>,
}

/// `cache:` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CacheSettings {
    /// Wrap the retriever in a response cache.
    pub enabled: Option<bool>,
    /// Entry time-to-live.
    pub ttl_secs: Option<u64>,
    /// Maximum cached responses.
    pub max_entries: Option<usize>,
}

impl RetrievalSettings {
    /// Overlay `overlay` on `self`, field by field.
    #[must_use]
    pub fn merge(self, overlay: Self) -> Self {
        Self {
            retrieval: self.retrieval.merge(overlay.retrieval),
            weights: self.weights.merge(overlay.weights),
            cache: self.cache.merge(overlay.cache),
        }
    }
}

impl RetrievalSection {
    fn merge(self, overlay: Self) -> Self {
        Self {
            rrf_k: overlay.rrf_k.or(self.rrf_k),
            n_semantic: overlay.n_semantic.or(self.n_semantic),
            n_graph: overlay.n_graph.or(self.n_graph),
            max_clauses: overlay.max_clauses.or(self.max_clauses),
            max_concurrent_graph_fetches: overlay
                .max_concurrent_graph_fetches
                .or(self.max_concurrent_graph_fetches),
            graph_fetch_timeout_ms: overlay
                .graph_fetch_timeout_ms
                .or(self.graph_fetch_timeout_ms),
        }
    }
}

impl WeightSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            metadata: overlay.metadata.or(self.metadata),
            company: overlay.company.or(self.company),
            clause: overlay.clause.or(self.clause),
            risk_high: overlay.risk_high.or(self.risk_high),
            risk_medium: overlay.risk_medium.or(self.risk_medium),
            risk_low: overlay.risk_low.or(self.risk_low),
            risk_unknown: overlay.risk_unknown.or(self.risk_unknown),
        }
    }
}

impl CacheSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            enabled: overlay.enabled.or(self.enabled),
            ttl_secs: overlay.ttl_secs.or(self.ttl_secs),
            max_entries: overlay.max_entries.or(self.max_entries),
        }
    }
}

/// Load system + user settings from their default locations.
#[must_use]
pub fn load_retrieval_settings() -> RetrievalSettings {
    let (system_path, user_path) = retrieval_settings_paths();
    load_retrieval_settings_from_paths(&system_path, &user_path)
}

/// Resolved `(system, user)` settings paths.
#[must_use]
pub fn retrieval_settings_paths() -> (PathBuf, PathBuf) {
    let root = project_root();
    let system_path = root.join(DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH);
    let user_path = resolve_config_home(&root).join(DEFAULT_USER_SETTINGS_RELATIVE_PATH);
    (system_path, user_path)
}

/// Load and merge settings from explicit paths (user over system).
#[must_use]
pub fn load_retrieval_settings_from_paths(system: &Path, user: &Path) -> RetrievalSettings {
    load_one(system).merge(load_one(user))
}

fn load_one(path: &Path) -> RetrievalSettings {
    if !path.exists() {
        return RetrievalSettings::default();
    }
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to read settings file; ignoring"
            );
            return RetrievalSettings::default();
        }
    };
    if raw.trim().is_empty() {
        return RetrievalSettings::default();
    }
    match serde_yaml::from_str::<RetrievalSettings>(&raw) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to parse settings yaml; ignoring file"
            );
            RetrievalSettings::default()
        }
    }
}

fn project_root() -> PathBuf {
    std::env::var("PRJ_ROOT")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Set config-home override (used by CLI `--conf`).
///
/// The path can be absolute, or relative to `PRJ_ROOT`/cwd.
pub fn set_config_home_override(path: impl Into<PathBuf>) {
    let path = path.into();
    if path.as_os_str().is_empty() {
        return;
    }
    if CONFIG_HOME_OVERRIDE.set(path.clone()).is_err()
        && let Some(current) = CONFIG_HOME_OVERRIDE.get()
        && current != &path
    {
        tracing::warn!(
            current = %current.display(),
            ignored = %path.display(),
            "config home override already set; ignoring subsequent value"
        );
    }
}

fn resolve_config_home(project_root: &Path) -> PathBuf {
    if let Some(path) = CONFIG_HOME_OVERRIDE.get() {
        return absolutize(project_root, path.clone());
    }

    let configured = std::env::var("PRJ_CONFIG_HOME")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_HOME_RELATIVE_PATH.to_string());
    absolutize(project_root, PathBuf::from(configured))
}

fn absolutize(project_root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        project_root.join(path)
    }
}
