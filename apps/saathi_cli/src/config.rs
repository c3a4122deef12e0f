use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use client_core::api::build_time_api_base;
use serde::Deserialize;
use tracing::warn;
use url::Url;

pub const CONFIG_FILE_NAME: &str = "saathi.toml";
pub const DEFAULT_DAILY_HOURS: f64 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base: String,
    pub database_url: String,
    pub daily_hours: f64,
    pub tts_command: Option<String>,
    pub stt_command: Option<String>,
    /// Locale tags offered to voice selection for the TTS command.
    pub tts_voices: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: build_time_api_base().to_string(),
            database_url: default_database_url(),
            daily_hours: DEFAULT_DAILY_HOURS,
            tts_command: None,
            stt_command: None,
            tts_voices: vec!["en-IN".to_string()],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    api_base: Option<String>,
    database_url: Option<String>,
    daily_hours: Option<f64>,
    tts_command: Option<String>,
    stt_command: Option<String>,
    tts_voices: Option<Vec<String>>,
}

/// Reads `saathi.toml` (or `config_path`), then applies `SAATHI_*` overrides.
///
/// A missing default file is fine; a missing explicit file is an error.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    let file = match fs::read_to_string(&path) {
        Ok(raw) => Some(
            toml::from_str::<FileSettings>(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?,
        ),
        Err(err) if err.kind() == io::ErrorKind::NotFound && config_path.is_none() => None,
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };

    resolve_settings(file, |key| std::env::var(key).ok())
}

fn resolve_settings(
    file: Option<FileSettings>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(file) = file {
        if let Some(v) = file.api_base {
            settings.api_base = v;
        }
        if let Some(v) = file.database_url {
            settings.database_url = v;
        }
        if let Some(v) = file.daily_hours {
            settings.daily_hours = v;
        }
        if let Some(v) = file.tts_command {
            settings.tts_command = Some(v);
        }
        if let Some(v) = file.stt_command {
            settings.stt_command = Some(v);
        }
        if let Some(v) = file.tts_voices {
            settings.tts_voices = v;
        }
    }

    if let Some(v) = env("SAATHI_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = env("SAATHI_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("SAATHI_DAILY_HOURS") {
        match v.parse::<f64>() {
            Ok(parsed) => settings.daily_hours = parsed,
            Err(_) => warn!(value = %v, "ignoring unparsable SAATHI_DAILY_HOURS"),
        }
    }
    if let Some(v) = env("SAATHI_TTS_COMMAND") {
        settings.tts_command = Some(v);
    }
    if let Some(v) = env("SAATHI_STT_COMMAND") {
        settings.stt_command = Some(v);
    }

    Url::parse(&settings.api_base)
        .with_context(|| format!("invalid api base url '{}'", settings.api_base))?;
    if !settings.daily_hours.is_finite() || settings.daily_hours <= 0.0 {
        bail!("daily hours must be positive, got {}", settings.daily_hours);
    }
    settings.database_url = normalize_database_url(&settings.database_url);
    settings.tts_command = settings.tts_command.filter(|cmd| !cmd.trim().is_empty());
    settings.stt_command = settings.stt_command.filter(|cmd| !cmd.trim().is_empty());

    Ok(settings)
}

fn default_database_url() -> String {
    match dirs::data_local_dir() {
        Some(base) => normalize_database_url(&base.join("saathi").join("client.db").to_string_lossy()),
        None => "sqlite://./data/saathi.db".to_string(),
    }
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return "sqlite://./data/saathi.db".to_string();
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

/// Splits a configured command line into program and arguments on whitespace.
pub fn command_parts(raw: &str) -> Option<(String, Vec<String>)> {
    let mut parts = raw.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
