use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use siblink_core::SiblingConfig;
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Vault configuration
    pub vault: VaultConfig,
    /// Linker settings
    pub linker: SiblingConfig,
}

/// Vault configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Path to the vault directory
    pub path: PathBuf,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl CliConfig {
    /// Load configuration with precedence: defaults < file < env < args
    pub fn load(config_file: Option<PathBuf>, vault_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::from_file_or_default(config_file)?;

        config.apply_env(|key| std::env::var(key).ok())?;

        if let Some(path) = vault_path {
            config.vault.path = path;
        }

        config
            .linker
            .validate()
            .context("Invalid linker configuration")?;
        Ok(config)
    }

    /// Apply `SIBLINK_*` overrides from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SIBLINK_VAULT_PATH") {
            self.vault.path = PathBuf::from(path);
        }
        if let Some(property) = lookup("SIBLINK_PROPERTY") {
            self.linker.property = property;
        }
        if let Some(pattern) = lookup("SIBLINK_PATTERN") {
            self.linker.eligible_pattern = pattern;
        }
        if let Some(ms) = lookup("SIBLINK_QUIESCENCE_MS") {
            self.linker.quiescence_ms = ms
                .trim()
                .parse()
                .with_context(|| format!("SIBLINK_QUIESCENCE_MS is not a number: '{}'", ms))?;
        }
        Ok(())
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("siblink");
        Ok(config_dir.join("config.toml"))
    }

    /// Create a new config file with example values
    pub fn create_example(path: &Path) -> Result<()> {
        let example = r#"# siblink configuration
# Location: ~/.config/siblink/config.toml

[vault]
# Path to your vault
# Default: current directory
path = "/home/user/Documents/my-vault"

[linker]
# Notes whose file name (without extension) matches this regex are scanned
eligible_pattern = "[0-9]{4}-[0-9]{2}-[0-9]{2}"

# Notes whose vault-relative path contains any of these are never scanned
exclude_paths = ["templates/"]

# Frontmatter list that receives sibling references
property = "mentions"

# Quiet period after the last edit before a rescan (100-60000 ms)
quiescence_ms = 1000

# Print a line whenever a scan writes something
notify_on_change = false

# What an edit rescans: "document" (just that note) or "vault"
change_scope = "document"

# Also scan references inside the frontmatter block
include_frontmatter = false

# Extension of notes, without the dot
text_extension = "md"
"#;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        std::fs::write(path, example).context("Failed to write config file")?;

        Ok(())
    }

    /// Load config from file or return default
    fn from_file_or_default(config_file: Option<PathBuf>) -> Result<Self> {
        let path = config_file
            .or_else(|| Self::default_config_path().ok())
            .filter(|p| p.exists());

        if let Some(path) = path {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }
}
