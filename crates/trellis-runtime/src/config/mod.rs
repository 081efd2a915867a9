//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! Configuration is loaded from multiple sources with priority-based merging:
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌───────────────────────────────────────────┐
//! │  1. Environment Variables (TRELLIS_*)     │  Runtime override
//! ├───────────────────────────────────────────┤
//! │  2. Project Config (.trellis/config.toml) │  Project-specific
//! ├───────────────────────────────────────────┤
//! │  3. Global Config (~/.trellis/config.toml)│  User defaults
//! ├───────────────────────────────────────────┤
//! │  4. Default Values (compile-time)         │  Fallback
//! └───────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use trellis_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_project_root("/path/to/project")
//!     .load()
//!     .expect("config should load");
//!
//! // TRELLIS_PRODUCTION=1 overrides config.production
//! if config.production {
//!     println!("links fail silently");
//! }
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `TRELLIS_PRODUCTION` | `production` | bool |
//! | `TRELLIS_ABSOLUTE_URLS` | `presenter.absolute_urls` | bool |
//! | `TRELLIS_AUTO_CANONICALIZE` | `presenter.auto_canonicalize` | bool |
//! | `TRELLIS_INVALID_LINK_MODE` | `presenter.invalid_link_mode` | `silent` / `warning` / `exception` |
//! | `TRELLIS_DEFAULT_ACTION` | `presenter.default_action` | String |
//! | `TRELLIS_TEMPLATES_DIR` | `templates.dir` | PathBuf |
//!
//! # Example Configuration
//!
//! ```toml
//! # <project>/.trellis/config.toml
//!
//! production = true
//!
//! [presenter]
//! default_action = "default"
//! auto_canonicalize = true
//! absolute_urls = false
//! invalid_link_mode = "exception"
//!
//! [templates]
//! dir = "app/templates"
//! extension = "phtml"
//! layout = "layout"
//!
//! [flash]
//! redirect_expiration_secs = 30
//! expiration_secs = 3
//! ```

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{FlashConfig, InvalidLinkMode, PresenterConfig, TemplatesConfig, TrellisConfig};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".trellis")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".trellis";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
