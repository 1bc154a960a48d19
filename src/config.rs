use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::OAuthCredentials;
use crate::error::{Error, Result};
use crate::store::DEFAULT_TABLE_NAME;

pub const GMAIL_REFRESH_TOKEN: &str = "GMAIL_REFRESH_TOKEN";
pub const GOOGLE_DRIVE_REFRESH_TOKEN: &str = "GOOGLE_DRIVE_REFRESH_TOKEN";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const GOOGLE_DRIVE_FOLDER_ID: &str = "GOOGLE_DRIVE_FOLDER_ID";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const JOB_TRACKER_MODEL: &str = "JOB_TRACKER_MODEL";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_AUTOMATED_SENDERS: [&str; 2] = ["noreply", "github.com"];

/// Non-secret settings read from `config.toml`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FileSettings {
    pub table_name: Option<String>,
    pub model: Option<String>,
    pub openai_base_url: Option<String>,
    pub automated_senders: Option<Vec<String>>,
}

/// Which collaborators the invocation needs credentials for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Gmail, OpenAI and Drive.
    Full,
    /// Gmail and OpenAI; the table lives on local disk.
    LocalTable,
    /// OpenAI only.
    ClassifyOnly,
}

#[derive(Clone)]
pub struct ClassifierConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub automated_senders: Vec<String>,
}

impl std::fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("automated_senders", &self.automated_senders)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub credentials: OAuthCredentials,
    pub folder_id: String,
    pub table_name: String,
}

/// Validated startup configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub classifier: ClassifierConfig,
    pub gmail: Option<OAuthCredentials>,
    pub drive: Option<DriveConfig>,
}

fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("job_tracker"))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Reads settings from `path`, or from the default location if present.
pub fn load_file_settings(path: Option<&Path>) -> Result<FileSettings> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "config file {} does not exist",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(FileSettings::default()),
        },
    };
    let s = fs::read_to_string(&path)?;
    toml::from_str(&s).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

impl Config {
    /// Loads settings and validates them against the process environment.
    pub fn load(file: Option<&Path>, scope: Scope) -> Result<Self> {
        let settings = load_file_settings(file)?;
        Self::from_parts(settings, scope, |key| std::env::var(key).ok())
    }

    /// Validates `settings` plus values from `env`; blank values count as unset.
    pub fn from_parts(
        settings: FileSettings,
        scope: Scope,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let var = |key: &str| {
            env(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| var(key).ok_or(Error::MissingSetting(key));

        let api_key = require(OPENAI_API_KEY)?;

        let gmail = match scope {
            Scope::Full | Scope::LocalTable => Some(OAuthCredentials::from_json(
                GMAIL_REFRESH_TOKEN,
                &require(GMAIL_REFRESH_TOKEN)?,
            )?),
            Scope::ClassifyOnly => None,
        };

        let table_name = settings
            .table_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());

        let drive = match scope {
            Scope::Full => Some(DriveConfig {
                credentials: OAuthCredentials::from_json(
                    GOOGLE_DRIVE_REFRESH_TOKEN,
                    &require(GOOGLE_DRIVE_REFRESH_TOKEN)?,
                )?,
                folder_id: require(GOOGLE_DRIVE_FOLDER_ID)?,
                table_name,
            }),
            Scope::LocalTable | Scope::ClassifyOnly => None,
        };

        let automated_senders = settings
            .automated_senders
            .unwrap_or_else(|| {
                DEFAULT_AUTOMATED_SENDERS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let classifier = ClassifierConfig {
            api_key,
            base_url: var(OPENAI_BASE_URL)
                .or(settings.openai_base_url)
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: var(JOB_TRACKER_MODEL)
                .or(settings.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            automated_senders,
        };

        Ok(Config {
            classifier,
            gmail,
            drive,
        })
    }
}
