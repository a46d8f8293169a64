//! Configuration loading and validation.
//!
//! The config file is TOML with two sections:
//!
//! ```toml
//! [Obsidian]
//! vault_path = "~/Documents/ObsidianVault"
//! output_folder = "Notes/Generated"
//!
//! [Gemini]
//! api_key = "..."
//! model = "gemini-1.5-flash"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use obsidian_fs::validate_relative_path;
use serde::Deserialize;

/// Credential value written by the bootstrap file; never a real key.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

/// Model used when the config does not name one.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini REST root used when the config does not override it.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// File name looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "config.toml";

const DEFAULT_CONFIG: &str = r#"[Obsidian]
vault_path = "~/Documents/ObsidianVault"
output_folder = "Notes/Generated"

[Gemini]
api_key = "YOUR_API_KEY_HERE"
model = "gemini-1.5-flash"
"#;

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub vault: VaultSettings,
    pub gemini: GeminiSettings,
}

/// Where notes live.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    /// Vault root with `~` already expanded
    pub vault_path: PathBuf,
    /// Folder inside the vault that receives new notes (empty = vault root)
    pub output_folder: PathBuf,
}

impl VaultSettings {
    /// Directory new notes are written to.
    pub fn output_dir(&self) -> PathBuf {
        self.vault_path.join(&self.output_folder)
    }
}

/// Gemini credentials and request settings.
#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Raw file layout. Every field is optional so validation can say exactly what is missing.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(rename = "Obsidian")]
    obsidian: Option<ObsidianSection>,
    #[serde(rename = "Gemini")]
    gemini: Option<GeminiSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ObsidianSection {
    vault_path: Option<String>,
    output_folder: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiSection {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl Config {
    /// Default config location: `config.toml` next to the running executable.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let exe = std::env::current_exe().map_err(|source| ConfigError::Locate { source })?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(dir.join(CONFIG_FILE_NAME))
    }

    /// Load and validate the config file at `path`.
    ///
    /// If the file does not exist, a default file with placeholder values is
    /// written and `ConfigError::Created` is returned so the user can edit it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = read_config_file(path)?.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate config text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        parse_config(content)?.validate()
    }
}

impl VaultSettings {
    /// Load only the `[Obsidian]` section of the config file at `path`.
    ///
    /// The `[Gemini]` section is not required, so notes can be read without
    /// an API key. A missing file is bootstrapped as in [`Config::load`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_config_file(path)?.vault_settings()
    }

    /// Parse config text and validate only the `[Obsidian]` section.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        parse_config(content)?.vault_settings()
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    if !path.is_file() {
        write_default_config(path)?;
        tracing::info!("Created default config at {}", path.display());
        return Err(ConfigError::Created {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_config(content: &str) -> Result<ConfigFile, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: PathBuf::new(),
        source,
    })
}

impl ConfigFile {
    fn validate(self) -> Result<Config, ConfigError> {
        let vault = Self::validate_obsidian(self.obsidian)?;
        let gemini = self
            .gemini
            .ok_or(ConfigError::MissingSection { section: "Gemini" })?;
        let gemini = Self::validate_gemini(gemini)?;
        Ok(Config { vault, gemini })
    }

    fn vault_settings(self) -> Result<VaultSettings, ConfigError> {
        Self::validate_obsidian(self.obsidian)
    }

    fn validate_obsidian(section: Option<ObsidianSection>) -> Result<VaultSettings, ConfigError> {
        let obsidian = section.ok_or(ConfigError::MissingSection { section: "Obsidian" })?;

        let vault_path = obsidian
            .vault_path
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::MissingKey {
                section: "Obsidian",
                key: "vault_path",
            })?;
        let vault_path = expand_tilde(vault_path.trim());

        let output_folder = obsidian.output_folder.unwrap_or_else(|| ".".to_string());
        let output_folder = validate_relative_path(Path::new(output_folder.trim())).map_err(|e| {
            ConfigError::InvalidOutputFolder {
                folder: output_folder.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(VaultSettings {
            vault_path,
            output_folder,
        })
    }

    fn validate_gemini(gemini: GeminiSection) -> Result<GeminiSettings, ConfigError> {
        let api_key = gemini.api_key.ok_or(ConfigError::MissingKey {
            section: "Gemini",
            key: "api_key",
        })?;
        let api_key = validate_api_key(&api_key)?;

        let model = gemini
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = gemini
            .base_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = match gemini.timeout_secs {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(GeminiSettings {
            api_key,
            model,
            base_url,
            timeout,
        })
    }
}

/// Reject blank credentials and the bootstrap placeholder.
pub fn validate_api_key(api_key: &str) -> Result<String, ConfigError> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err(ConfigError::EmptyApiKey);
    }
    if key == PLACEHOLDER_API_KEY {
        return Err(ConfigError::PlaceholderApiKey);
    }
    Ok(key.to_string())
}

fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let bootstrap_err = |source| ConfigError::Bootstrap {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(bootstrap_err)?;
    }
    std::fs::write(path, DEFAULT_CONFIG).map_err(bootstrap_err)
}

/// Expand ~ or ~/ prefix to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not locate the executable directory: {source}")]
    Locate { source: std::io::Error },

    #[error("no config file found; a default one was created at {}. Edit it with your vault path and API key, then re-run", path.display())]
    Created { path: PathBuf },

    #[error("could not create default config file at {}: {source}", path.display())]
    Bootstrap {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config is missing the [{section}] section")]
    MissingSection { section: &'static str },

    #[error("config is missing '{key}' in the [{section}] section")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },

    #[error("output_folder '{folder}' must stay inside the vault: {reason}")]
    InvalidOutputFolder { folder: String, reason: String },

    #[error("Gemini api_key is empty; add a key from Google AI Studio to the [Gemini] section")]
    EmptyApiKey,

    #[error("Gemini api_key is still the placeholder; add a key from Google AI Studio to the [Gemini] section")]
    PlaceholderApiKey,

    #[error("Gemini timeout_secs must be at least 1")]
    ZeroTimeout,
}
