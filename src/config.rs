//! Configuration combined from the user config file and command line arguments.

use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Context;
use itertools::Itertools;
use serde::Deserialize;

use crate::media_type::MediaType;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

/// Video file extensions that are never scheduled for deletion.
pub const VIDEO_EXTENSIONS: [&str; 7] = [".mkv", ".mp4", ".avi", ".mov", ".m4v", ".wmv", ".iso"];

/// Delete targets larger than this are commented out in the cleanup script.
pub const DEFAULT_MAX_DELETE_SIZE: u64 = 1_073_741_824;

/// Path to the user config file: `$HOME/.config/media-tidy.toml`
///
/// Returns `None` if the home directory cannot be determined.
pub static CONFIG_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join(".config").join(format!("{PROJECT_NAME}.toml")))
});

/// Config from the user config file.
#[derive(Debug, Default, Deserialize)]
pub struct MediaTidyConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub dryrun: bool,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub max_delete_size: Option<u64>,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub video_extensions: Vec<String>,
}

/// Wrapper needed for parsing the user config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    media_tidy: MediaTidyConfig,
}

/// Options given on the command line.
#[derive(Debug, Default)]
pub struct CliOptions {
    pub debug: bool,
    pub dryrun: bool,
    pub force: bool,
    pub media_type: Option<MediaType>,
    pub verbose: bool,
}

/// Final config created from CLI arguments and user config file.
///
/// Passed explicitly to every component instead of relying on process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub debug: bool,
    pub dryrun: bool,
    pub force: bool,
    pub max_delete_size: u64,
    pub media_type: Option<MediaType>,
    pub verbose: bool,
    pub video_extensions: Vec<String>,
}

impl MediaTidyConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    pub fn get_user_config() -> anyhow::Result<Self> {
        let Some(path) = CONFIG_PATH.as_deref() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {error}",
                path.display()
            )),
        }
    }

    /// Parse config from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.media_tidy)
            .with_context(|| "Failed to parse config TOML")
    }
}

impl Config {
    /// Create config from given command line options and user config file contents.
    #[must_use]
    pub fn from_options(options: CliOptions, user_config: MediaTidyConfig) -> Self {
        let video_extensions = VIDEO_EXTENSIONS
            .iter()
            .map(|extension| (*extension).to_string())
            .chain(user_config.video_extensions.iter().map(|e| normalize_extension(e)))
            .filter(|extension| extension.len() > 1)
            .unique()
            .collect();

        Self {
            debug: options.debug || user_config.debug,
            dryrun: options.dryrun || user_config.dryrun,
            force: options.force || user_config.force,
            max_delete_size: user_config.max_delete_size.unwrap_or(DEFAULT_MAX_DELETE_SIZE),
            media_type: options.media_type.or(user_config.media_type),
            verbose: options.verbose || user_config.verbose,
            video_extensions,
        }
    }

    /// Create config from command line options and the user config file.
    ///
    /// # Errors
    /// Returns an error if the user config file cannot be read or parsed.
    pub fn from_cli(options: CliOptions) -> anyhow::Result<Self> {
        let user_config = MediaTidyConfig::get_user_config()?;
        Ok(Self::from_options(options, user_config))
    }

    /// Config for unattended runs: every prompt takes its default.
    #[must_use]
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    /// Check if the given dotted, lowercase extension belongs to a video file.
    #[must_use]
    pub fn is_video_extension(&self, extension: &str) -> bool {
        self.video_extensions.iter().any(|e| e == extension)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_options(CliOptions::default(), MediaTidyConfig::default())
    }
}

/// Lowercase an extension and make sure it starts with a dot.
fn normalize_extension(extension: &str) -> String {
    let extension = extension.trim().to_lowercase();
    if extension.starts_with('.') {
        extension
    } else {
        format!(".{extension}")
    }
}
