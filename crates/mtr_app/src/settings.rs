use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use log::LevelFilter;
use mtr_core::QueueSettings;
use mtr_engine::{ApiSettings, ReportOptions};
use mtr_logging::{mtr_info, LogDestination};
use serde::Deserialize;

/// Looked up in the working directory when `--settings` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "mtr_desk.ron";

/// Everything the binary can be tuned with, read from a RON file.
///
/// Missing fields fall back to [`AppSettings::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub api_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub resume_delay_ms: u64,
    pub session_file: PathBuf,
    pub report_dir: PathBuf,
    pub write_json_manifest: bool,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_url: ApiSettings::default().base_url,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            resume_delay_ms: QueueSettings::default().resume_delay.as_millis() as u64,
            session_file: PathBuf::from(".mtr_session.ron"),
            report_dir: PathBuf::from("relatorios"),
            write_json_manifest: true,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppSettings {
    /// An explicit path must exist; the default file is optional.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings = Self::parse(&content)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        mtr_info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn queue_settings(&self) -> QueueSettings {
        QueueSettings {
            resume_delay: Duration::from_millis(self.resume_delay_ms),
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            output_dir: self.report_dir.clone(),
            write_manifest: self.write_json_manifest,
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }

    /// Unknown level names fall back to `info`.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = AppSettings::parse(
            r#"(
                api_url: "https://mtr.example.com",
                resume_delay_ms: 250,
            )"#,
        )
        .unwrap();

        assert_eq!(settings.api_url, "https://mtr.example.com");
        assert_eq!(settings.queue_settings().resume_delay, Duration::from_millis(250));
        assert_eq!(settings.request_timeout_secs, 30);
        assert_eq!(settings.report_dir, PathBuf::from("relatorios"));
    }

    #[test]
    fn defaults_match_the_library_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.api_settings(), ApiSettings::default());
        assert_eq!(settings.queue_settings(), QueueSettings::default());
        assert_eq!(settings.log_destination(), LogDestination::Terminal);
    }

    #[test]
    fn log_file_logs_to_both() {
        let settings = AppSettings {
            log_file: Some(PathBuf::from("desk.log")),
            log_level: "debug".to_string(),
            ..AppSettings::default()
        };
        assert_eq!(
            settings.log_destination(),
            LogDestination::Both(PathBuf::from("desk.log"))
        );
        assert_eq!(settings.log_level(), LevelFilter::Debug);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(AppSettings::parse("(api_url: 42)").is_err());
        assert!(AppSettings::parse("not ron at all").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = AppSettings::load(Some(&temp.path().join("nope.ron"))).unwrap_err();
        assert!(err.to_string().contains("failed to read settings file"));
    }
}
