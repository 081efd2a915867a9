//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main configuration structure.
///
/// This is the unified configuration after merging all layers.
///
/// # Example
///
/// ```
/// use trellis_runtime::config::{InvalidLinkMode, TrellisConfig};
///
/// let config = TrellisConfig::default();
/// assert!(!config.production);
/// assert_eq!(config.invalid_link_mode(), InvalidLinkMode::Warning);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrellisConfig {
    /// Production mode: conditional caching is active and invalid links
    /// render silently unless configured otherwise.
    pub production: bool,

    /// Presenter dispatch settings.
    pub presenter: PresenterConfig,

    /// Template lookup settings.
    pub templates: TemplatesConfig,

    /// Flash session lifetimes.
    pub flash: FlashConfig,
}

impl TrellisConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Effective invalid-link mode.
    ///
    /// An explicit setting wins; otherwise production mode renders invalid
    /// links silently and development mode renders a warning.
    #[must_use]
    pub fn invalid_link_mode(&self) -> InvalidLinkMode {
        match self.presenter.invalid_link_mode {
            Some(mode) => mode,
            None if self.production => InvalidLinkMode::Silent,
            None => InvalidLinkMode::Warning,
        }
    }

    /// Merges another config into this one.
    ///
    /// Values from `other` override values in `self` only if they
    /// differ from the default. This enables layered configuration.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.production != default.production {
            self.production = other.production;
        }

        self.presenter.merge(&other.presenter);
        self.templates.merge(&other.templates);
        self.flash.merge(&other.flash);
    }
}

/// How links that cannot be resolved are rendered.
///
/// | Mode | `link()` returns |
/// |------|------------------|
/// | `Silent` | `#` |
/// | `Warning` | `error: <escaped message>` |
/// | `Exception` | the error |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidLinkMode {
    Silent,
    Warning,
    Exception,
}

impl InvalidLinkMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Warning => "warning",
            Self::Exception => "exception",
        }
    }
}

impl fmt::Display for InvalidLinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvalidLinkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "warning" => Ok(Self::Warning),
            "exception" => Ok(Self::Exception),
            other => Err(format!(
                "expected silent, warning or exception, got '{other}'"
            )),
        }
    }
}

/// Presenter dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PresenterConfig {
    /// Action used when a request or link names none.
    pub default_action: String,

    /// Redirect (301) requests whose URL is not the canonical one.
    pub auto_canonicalize: bool,

    /// Keep generated links absolute instead of host-relative.
    pub absolute_urls: bool,

    /// Explicit invalid-link mode; `None` derives it from `production`.
    pub invalid_link_mode: Option<InvalidLinkMode>,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            default_action: "default".into(),
            auto_canonicalize: true,
            absolute_urls: false,
            invalid_link_mode: None,
        }
    }
}

impl PresenterConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.default_action != default.default_action {
            self.default_action = other.default_action.clone();
        }
        if other.auto_canonicalize != default.auto_canonicalize {
            self.auto_canonicalize = other.auto_canonicalize;
        }
        if other.absolute_urls != default.absolute_urls {
            self.absolute_urls = other.absolute_urls;
        }
        if other.invalid_link_mode.is_some() {
            self.invalid_link_mode = other.invalid_link_mode;
        }
    }
}

/// Template lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Root directory searched for templates.
    pub dir: PathBuf,

    /// Template file extension, without the dot.
    pub extension: String,

    /// Layout name used when a presenter sets none.
    pub layout: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("templates"),
            extension: "phtml".into(),
            layout: "layout".into(),
        }
    }
}

impl TemplatesConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.dir != default.dir {
            self.dir = other.dir.clone();
        }
        if other.extension != default.extension {
            self.extension = other.extension.clone();
        }
        if other.layout != default.layout {
            self.layout = other.layout.clone();
        }
    }
}

/// Flash session lifetimes, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlashConfig {
    /// Lifetime after a dispatch that ended in a redirect.
    pub redirect_expiration_secs: u64,

    /// Lifetime after any other dispatch.
    pub expiration_secs: u64,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            redirect_expiration_secs: 30,
            expiration_secs: 3,
        }
    }
}

impl FlashConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.redirect_expiration_secs != default.redirect_expiration_secs {
            self.redirect_expiration_secs = other.redirect_expiration_secs;
        }
        if other.expiration_secs != default.expiration_secs {
            self.expiration_secs = other.expiration_secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TrellisConfig::default();
        assert!(!config.production);
        assert_eq!(config.presenter.default_action, "default");
        assert!(config.presenter.auto_canonicalize);
        assert_eq!(config.templates.extension, "phtml");
        assert_eq!(config.flash.redirect_expiration_secs, 30);
        assert_eq!(config.flash.expiration_secs, 3);
    }

    #[test]
    fn toml_roundtrip() {
        let config = TrellisConfig {
            production: true,
            presenter: PresenterConfig {
                invalid_link_mode: Some(InvalidLinkMode::Exception),
                ..Default::default()
            },
            ..Default::default()
        };
        let toml = config.to_toml().expect("should serialize config to TOML");
        let restored = TrellisConfig::from_toml(&toml).expect("should deserialize roundtripped TOML");
        assert_eq!(config, restored);
    }

    #[test]
    fn toml_partial_parse() {
        let toml = r#"
production = true

[presenter]
invalid_link_mode = "exception"
"#;
        let config = TrellisConfig::from_toml(toml).expect("should parse partial TOML with defaults");
        assert!(config.production);
        assert_eq!(
            config.presenter.invalid_link_mode,
            Some(InvalidLinkMode::Exception)
        );
        // Defaults for unspecified fields
        assert_eq!(config.presenter.default_action, "default");
    }

    #[test]
    fn invalid_link_mode_follows_production() {
        let mut config = TrellisConfig::default();
        assert_eq!(config.invalid_link_mode(), InvalidLinkMode::Warning);

        config.production = true;
        assert_eq!(config.invalid_link_mode(), InvalidLinkMode::Silent);

        config.presenter.invalid_link_mode = Some(InvalidLinkMode::Exception);
        assert_eq!(config.invalid_link_mode(), InvalidLinkMode::Exception);
    }

    #[test]
    fn invalid_link_mode_parses_case_insensitively() {
        assert_eq!("Silent".parse::<InvalidLinkMode>(), Ok(InvalidLinkMode::Silent));
        assert_eq!("WARNING".parse::<InvalidLinkMode>(), Ok(InvalidLinkMode::Warning));
        assert!("loud".parse::<InvalidLinkMode>().is_err());
    }

    #[test]
    fn merge_overrides_non_default() {
        let mut base = TrellisConfig::default();
        let overlay = TrellisConfig {
            production: true,
            templates: TemplatesConfig {
                dir: PathBuf::from("app/templates"),
                ..Default::default()
            },
            ..Default::default()
        };

        base.merge(&overlay);

        assert!(base.production);
        assert_eq!(base.templates.dir, PathBuf::from("app/templates"));
        // Should keep base value for unmodified fields
        assert_eq!(base.templates.extension, "phtml");
    }

    #[test]
    fn merge_keeps_base_when_overlay_is_default() {
        let mut base = TrellisConfig {
            production: true,
            flash: FlashConfig {
                expiration_secs: 10,
                ..Default::default()
            },
            ..Default::default()
        };

        base.merge(&TrellisConfig::default());

        assert!(base.production);
        assert_eq!(base.flash.expiration_secs, 10);
    }
}
