//! Layered configuration loading.
//!
//! | Layer | Source | Disabled by |
//! |-------|--------|-------------|
//! | defaults | [`TrellisConfig::default`] | - |
//! | global | `~/.trellis/config.toml` | [`ConfigLoader::skip_global_config`] |
//! | project | `<root>/.trellis/config.toml` | [`ConfigLoader::skip_project_config`] |
//! | environment | `TRELLIS_*` | [`ConfigLoader::skip_env_vars`] |
//!
//! Later layers win. A missing file contributes nothing.

use super::{
    default_config_path, ConfigError, InvalidLinkMode, TrellisConfig, PROJECT_CONFIG_DIR,
    PROJECT_CONFIG_FILE,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-backed configuration layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileLayer {
    Global,
    Project,
}

impl FileLayer {
    fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Project => "project",
        }
    }
}

/// Builds a [`TrellisConfig`] from defaults, files and the environment.
///
/// # Example
///
/// ```no_run
/// use trellis_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_project_root("/srv/shop")
///     .skip_env_vars()
///     .load()
///     .expect("config should load");
/// assert_eq!(config.presenter.default_action, "default");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    global_config_path: Option<PathBuf>,
    project_root: Option<PathBuf>,
    skip_env: bool,
    skip_global: bool,
    skip_project: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the global layer from `path` instead of `~/.trellis/config.toml`.
    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Enables the project layer at `<root>/.trellis/config.toml`.
    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    #[must_use]
    pub fn skip_project_config(mut self) -> Self {
        self.skip_project = true;
        self
    }

    /// Loads every enabled layer and merges them in order.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ReadFile`] or [`ConfigError::ParseToml`] for a file
    /// that exists but cannot be used, [`ConfigError::InvalidEnvVar`] for a
    /// malformed `TRELLIS_*` value.
    pub fn load(&self) -> Result<TrellisConfig, ConfigError> {
        let mut config = TrellisConfig::default();

        for (layer, path) in self.file_layers() {
            if let Some(overlay) = read_layer(&path)? {
                debug!(layer = layer.as_str(), path = %path.display(), "config layer applied");
                config.merge(&overlay);
            }
        }

        if !self.skip_env {
            apply_env(&mut config, |name| std::env::var(name).ok())?;
        }

        Ok(config)
    }

    fn file_layers(&self) -> Vec<(FileLayer, PathBuf)> {
        let mut layers = Vec::with_capacity(2);
        if !self.skip_global {
            let path = self
                .global_config_path
                .clone()
                .unwrap_or_else(default_config_path);
            layers.push((FileLayer::Global, path));
        }
        if let (false, Some(root)) = (self.skip_project, self.project_root.as_ref()) {
            let path = root.join(PROJECT_CONFIG_DIR).join(PROJECT_CONFIG_FILE);
            layers.push((FileLayer::Project, path));
        }
        layers
    }
}

fn read_layer(path: &Path) -> Result<Option<TrellisConfig>, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::read_file(path, e)),
    };
    TrellisConfig::from_toml(&text)
        .map(Some)
        .map_err(|e| ConfigError::parse_toml(path, e))
}

/// Applies `TRELLIS_*` overrides read through `lookup`.
fn apply_env<F>(config: &mut TrellisConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let flag = |name: &'static str| -> Result<Option<bool>, ConfigError> {
        lookup(name)
            .map(|raw| {
                parse_bool(&raw).ok_or_else(|| {
                    ConfigError::invalid_env_var(name, format!("expected bool, got '{raw}'"))
                })
            })
            .transpose()
    };

    if let Some(production) = flag("TRELLIS_PRODUCTION")? {
        config.production = production;
    }
    if let Some(absolute) = flag("TRELLIS_ABSOLUTE_URLS")? {
        config.presenter.absolute_urls = absolute;
    }
    if let Some(canonicalize) = flag("TRELLIS_AUTO_CANONICALIZE")? {
        config.presenter.auto_canonicalize = canonicalize;
    }

    if let Some(raw) = lookup("TRELLIS_INVALID_LINK_MODE") {
        let mode = raw
            .parse::<InvalidLinkMode>()
            .map_err(|message| ConfigError::invalid_env_var("TRELLIS_INVALID_LINK_MODE", message))?;
        config.presenter.invalid_link_mode = Some(mode);
    }
    if let Some(action) = lookup("TRELLIS_DEFAULT_ACTION") {
        config.presenter.default_action = action;
    }
    if let Some(dir) = lookup("TRELLIS_TEMPLATES_DIR") {
        config.templates.dir = PathBuf::from(dir);
    }

    Ok(())
}

/// `1/0`, `true/false`, `yes/no`, `on/off`, any case.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write_layer(dir: &Path, body: &str) -> PathBuf {
        std::fs::create_dir_all(dir).expect("create layer dir");
        let path = dir.join("config.toml");
        std::fs::write(&path, body).expect("write layer");
        path
    }

    fn files_only() -> ConfigLoader {
        ConfigLoader::new().skip_env_vars()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn nothing_enabled_yields_defaults() {
        let config = files_only()
            .skip_global_config()
            .skip_project_config()
            .load()
            .expect("defaults");
        assert_eq!(config, TrellisConfig::default());
    }

    #[test]
    fn global_layer_sets_production() {
        let temp = TempDir::new().expect("temp dir");
        let global = write_layer(
            temp.path(),
            "production = true\n\n[presenter]\ndefault_action = \"list\"\n",
        );

        let config = files_only()
            .with_global_config(&global)
            .load()
            .expect("global layer");

        assert!(config.production);
        assert_eq!(config.presenter.default_action, "list");
        assert_eq!(config.invalid_link_mode(), InvalidLinkMode::Silent);
    }

    #[test]
    fn project_layer_wins_over_global() {
        let home = TempDir::new().expect("temp dir");
        let shop = TempDir::new().expect("temp dir");
        let global = write_layer(
            home.path(),
            "production = true\n\n[templates]\ndir = \"shared/templates\"\n",
        );
        write_layer(
            &shop.path().join(".trellis"),
            "[templates]\ndir = \"app/templates\"\n\n[presenter]\ninvalid_link_mode = \"exception\"\n",
        );

        let config = files_only()
            .with_global_config(&global)
            .with_project_root(shop.path())
            .load()
            .expect("both layers");

        assert!(config.production);
        assert_eq!(config.templates.dir, PathBuf::from("app/templates"));
        assert_eq!(config.invalid_link_mode(), InvalidLinkMode::Exception);
    }

    #[test]
    fn skipped_project_layer_is_not_read() {
        let shop = TempDir::new().expect("temp dir");
        write_layer(&shop.path().join(".trellis"), "production = [");

        let config = files_only()
            .skip_global_config()
            .with_project_root(shop.path())
            .skip_project_config()
            .load()
            .expect("project skipped");
        assert!(!config.production);
    }

    #[test]
    fn absent_files_contribute_nothing() {
        let config = files_only()
            .with_global_config("/nonexistent/trellis/config.toml")
            .with_project_root("/nonexistent/shop")
            .load()
            .expect("absent files");
        assert_eq!(config, TrellisConfig::default());
    }

    #[test]
    fn broken_toml_is_reported_with_its_path() {
        let temp = TempDir::new().expect("temp dir");
        let global = write_layer(temp.path(), "[presenter\nabsolute_urls = true");

        let err = files_only()
            .with_global_config(&global)
            .load()
            .expect_err("parse failure");

        assert!(matches!(err, ConfigError::ParseToml { ref path, .. } if *path == global));
    }

    #[test]
    fn env_overrides_every_field() {
        let mut config = TrellisConfig::default();
        apply_env(
            &mut config,
            env_of(&[
                ("TRELLIS_PRODUCTION", "on"),
                ("TRELLIS_ABSOLUTE_URLS", "YES"),
                ("TRELLIS_AUTO_CANONICALIZE", "0"),
                ("TRELLIS_INVALID_LINK_MODE", "Warning"),
                ("TRELLIS_DEFAULT_ACTION", "overview"),
                ("TRELLIS_TEMPLATES_DIR", "views"),
            ]),
        )
        .expect("env applies");

        assert!(config.production);
        assert!(config.presenter.absolute_urls);
        assert!(!config.presenter.auto_canonicalize);
        assert_eq!(config.invalid_link_mode(), InvalidLinkMode::Warning);
        assert_eq!(config.presenter.default_action, "overview");
        assert_eq!(config.templates.dir, PathBuf::from("views"));
    }

    #[test]
    fn env_rejects_malformed_values() {
        let mut config = TrellisConfig::default();
        let err = apply_env(&mut config, env_of(&[("TRELLIS_PRODUCTION", "maybe")]))
            .expect_err("bad bool");
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref name, .. } if name == "TRELLIS_PRODUCTION"));

        let err = apply_env(&mut config, env_of(&[("TRELLIS_INVALID_LINK_MODE", "loud")]))
            .expect_err("bad mode");
        assert!(err.to_string().contains("got 'loud'"));
    }

    #[test]
    fn empty_env_changes_nothing() {
        let mut config = TrellisConfig::default();
        apply_env(&mut config, env_of(&[])).expect("no vars");
        assert_eq!(config, TrellisConfig::default());
    }

    #[test]
    fn bool_spellings() {
        for raw in ["1", "true", "Yes", " on "] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["0", "FALSE", "no", "off"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_bool("2"), None);
    }
}
