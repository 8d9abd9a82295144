//! Layered configuration for the bot, read with figment.
//!
//! Sources are merged in this order, each one overriding the previous:
//!
//! 1. [`ThronebotConfig::default`]
//! 2. values passed to [`ConfigLoader::merge`]
//! 3. `thronebot.{profile}.toml`, next to the main file
//! 4. `thronebot.toml` (or `config.toml`)
//! 5. `THRONEBOT_*` environment variables
//!
//! With `yaml-config` enabled the same search runs for `thronebot.yaml`,
//! `thronebot.yml`, `config.yaml` and `config.yml`. YAML is merged after TOML.
//!
//! Nested keys are reached with a double underscore, so
//! `THRONEBOT_ROUTER__PREFIX=!` sets `router.prefix` and
//! `THRONEBOT_SETTINGS__STAFF=mods` sets `settings.staff`.
//!
//! ```rust,ignore
//! use thronebot_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("prod")
//!     .file("deploy/thronebot.toml")
//!     .load()?;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::ThronebotConfig;
use super::validation::validate_config;

/// Prefix of environment variables read by the loader.
pub const ENV_PREFIX: &str = "THRONEBOT_";

/// Selects the `thronebot.{profile}.*` overlay file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    /// Any other name, kept lowercase.
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Accepts `dev`/`prod` shorthands, case-insensitively.
    pub fn parse(name: &str) -> Self {
        let name = name.to_lowercase();
        match name.as_str() {
            "dev" | "development" => Self::Development,
            "prod" | "production" => Self::Production,
            _ => Self::Custom(name),
        }
    }

    /// Reads `THRONEBOT_PROFILE`; unset means development.
    pub fn from_env() -> Self {
        match std::env::var("THRONEBOT_PROFILE") {
            Ok(name) => Self::parse(&name),
            Err(_) => Self::default(),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base file names searched for, one list per enabled format.
#[allow(unused_mut)]
fn file_formats() -> Vec<&'static [&'static str]> {
    let mut formats: Vec<&'static [&'static str]> = Vec::new();
    #[cfg(feature = "toml-config")]
    formats.push(&["thronebot.toml", "config.toml"]);
    #[cfg(feature = "yaml-config")]
    formats.push(&["thronebot.yaml", "thronebot.yml", "config.yaml", "config.yml"]);
    formats
}

/// Merges `path` with the provider its extension names.
fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    match path.extension().and_then(|ext| ext.to_str()) {
        #[cfg(feature = "toml-config")]
        Some("toml") => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        Some("yaml" | "yml") => Ok(figment.merge(Yaml::file(path))),
        ext => Err(ConfigError::ParseError(format!(
            "Unsupported or disabled configuration file format: .{}",
            ext.unwrap_or_default()
        ))),
    }
}

/// Builder that resolves a [`ThronebotConfig`] from defaults, files and the
/// environment.
pub struct ConfigLoader {
    overrides: Figment,
    profile: Profile,
    dirs: Vec<PathBuf>,
    file: Option<PathBuf>,
    env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Profile from `THRONEBOT_PROFILE`, environment enabled, no search
    /// directories (the working and user config directories are used then).
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            dirs: Vec::new(),
            file: None,
            env: true,
        }
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a directory to search for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.dirs.push(dir.as_ref().to_path_buf());
        self
    }

    /// Searches the working directory.
    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Layers `config` over the defaults, below every file.
    pub fn merge(mut self, config: ThronebotConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Merges every source, then extracts and validates the result.
    pub fn load(self) -> ConfigResult<ThronebotConfig> {
        let profile = self.profile.clone();
        let config: ThronebotConfig = self.into_figment()?.extract()?;
        validate_config(&config)?;

        debug!(
            %profile,
            prefix = %config.router.prefix,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    fn into_figment(mut self) -> ConfigResult<Figment> {
        let files = match self.file.take() {
            Some(path) if !path.is_file() => return Err(ConfigError::FileNotFound(path)),
            Some(path) => vec![path],
            None => self.discover(),
        };

        let mut figment = Figment::from(Serialized::defaults(ThronebotConfig::default()))
            .merge(std::mem::take(&mut self.overrides));
        for path in &files {
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_file(figment, path)?;
        }

        if self.env {
            trace!(prefix = ENV_PREFIX, "Merging environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }
        Ok(figment)
    }

    /// Directories to search; the working and user config directories when
    /// none were given.
    fn search_dirs(&self) -> Vec<PathBuf> {
        if !self.dirs.is_empty() {
            return self.dirs.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join("thronebot")))
            .collect()
    }

    /// For each format, the first base file found plus its profile overlay,
    /// overlay first.
    fn discover(&self) -> Vec<PathBuf> {
        let dirs = self.search_dirs();
        let mut files = Vec::new();
        for names in file_formats() {
            let base = dirs
                .iter()
                .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
                .find(|path| path.is_file());
            let Some(base) = base else { continue };

            if let Some(overlay) = self.overlay_of(&base)
                && overlay.is_file()
            {
                debug!(path = %overlay.display(), "Found profile configuration");
                files.push(overlay);
            }
            files.push(base);
        }

        if files.is_empty() {
            warn!("No configuration file found, using defaults");
        }
        files
    }

    /// `dir/thronebot.toml` becomes `dir/thronebot.{profile}.toml`.
    fn overlay_of(&self, base: &Path) -> Option<PathBuf> {
        let stem = base.file_stem()?.to_str()?;
        let ext = base.extension()?.to_str()?;
        Some(base.with_file_name(format!("{stem}.{}.{ext}", self.profile)))
    }
}

/// Loads from the default locations and the environment.
pub fn load_config() -> ConfigResult<ThronebotConfig> {
    ConfigLoader::new().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogFormat, LogLevel};

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn empty_dir_loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new().search_path(dir).without_env()
    }

    #[test]
    fn test_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = empty_dir_loader(dir.path()).load().unwrap();

        assert_eq!(config.router.prefix, "thronebot");
        assert!(config.router.bot_id.is_empty());
        assert_eq!(config.logging.level.as_str(), "info");
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_load_specific_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "bot.toml",
            r#"
                [router]
                prefix = "!"
                bot_id = "42"
                owners = ["1", "2"]

                [logging]
                level = "debug"
                format = "pretty"
                filters = { thronebot_router = "trace" }

                [settings]
                weekly_channel = "general"
            "#,
        );

        let config = ConfigLoader::new().file(&path).without_env().load().unwrap();
        assert_eq!(config.router.prefix, "!");
        assert_eq!(config.router.bot_id, "42");
        assert_eq!(config.router.owners, vec!["1", "2"]);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(
            config.logging.filters.get("thronebot_router"),
            Some(&LogLevel::Trace)
        );
        assert_eq!(
            config.settings.get("weekly_channel").map(String::as_str),
            Some("general")
        );
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_is_overridden_by_base_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "thronebot.production.toml",
            "[settings]\nmode = \"production\"\nonly_profile = \"yes\"\n",
        );
        write(dir.path(), "thronebot.toml", "[settings]\nmode = \"base\"\n");

        let config = empty_dir_loader(dir.path())
            .profile("prod")
            .load()
            .unwrap();
        assert_eq!(config.settings["mode"], "base");
        assert_eq!(config.settings["only_profile"], "yes");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::new()
            .file(dir.path().join("missing.toml"))
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bot.ini", "prefix = !");
        let result = ConfigLoader::new().file(path).without_env().load();
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_loaded_config_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bot.toml", "[router]\nprefix = \"\"\n");
        let result = ConfigLoader::new().file(path).without_env().load();
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_merge_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut overrides = ThronebotConfig::default();
        overrides.router.bot_id = "42".to_string();

        let config = empty_dir_loader(dir.path()).merge(overrides).load().unwrap();
        assert_eq!(config.router.bot_id, "42");
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }
}
