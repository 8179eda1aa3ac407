//! Configuration module
//!
//! Session configuration read from `ALLCONV_*` environment variables (a `.env` file is
//! honored). Every value has a default, so an empty environment yields a usable config.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::ConversionSettings;

const PROGRESS_STEP: u8 = 10;
const TICK_INTERVAL_MS: u64 = 200;
const DOWNLOAD_STAGGER_MS: u64 = 100;
const MAX_FILES: usize = 10;
const DEFAULT_FORMAT: &str = "jpeg";
const DEFAULT_QUALITY: u8 = 85;
const DEFAULT_COMPRESSION: u32 = 6;
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Configuration for a conversion session and its simulated run driver.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Percent added to the in-flight file's progress on every tick.
    pub progress_step: u8,
    /// Delay between two progress ticks.
    pub tick_interval: Duration,
    /// Delay between two deliveries of a bulk download.
    pub download_stagger: Duration,
    /// Maximum number of files the intake surface admits into one session.
    pub max_files: usize,
    /// Accepted intake patterns (`*/*`, `image/*`, `image/png`, `.png`).
    pub accepted_formats: Vec<String>,
    /// Settings a fresh session starts with.
    pub default_settings: ConversionSettings,
    /// Capacity of the session event broadcast channel.
    pub event_channel_capacity: usize,
    /// Directory the local download sink writes into.
    pub output_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            progress_step: PROGRESS_STEP,
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
            download_stagger: Duration::from_millis(DOWNLOAD_STAGGER_MS),
            max_files: MAX_FILES,
            accepted_formats: vec!["*/*".to_string()],
            default_settings: ConversionSettings {
                format: DEFAULT_FORMAT.to_string(),
                quality: Some(DEFAULT_QUALITY),
                resolution: None,
                compression: Some(DEFAULT_COMPRESSION),
                custom: None,
            },
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
            output_dir: PathBuf::from("converted"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let accepted_formats = env::var("ALLCONV_ACCEPTED_FORMATS")
            .unwrap_or_else(|_| "*/*".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let default_format = env::var("ALLCONV_DEFAULT_FORMAT")
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|_| DEFAULT_FORMAT.to_string());

        let config = SessionConfig {
            progress_step: env_parse("ALLCONV_PROGRESS_STEP", PROGRESS_STEP),
            tick_interval: Duration::from_millis(env_parse(
                "ALLCONV_TICK_INTERVAL_MS",
                TICK_INTERVAL_MS,
            )),
            download_stagger: Duration::from_millis(env_parse(
                "ALLCONV_DOWNLOAD_STAGGER_MS",
                DOWNLOAD_STAGGER_MS,
            )),
            max_files: env_parse("ALLCONV_MAX_FILES", MAX_FILES),
            accepted_formats,
            default_settings: ConversionSettings {
                format: default_format,
                quality: Some(env_parse("ALLCONV_DEFAULT_QUALITY", DEFAULT_QUALITY)),
                resolution: env::var("ALLCONV_DEFAULT_RESOLUTION").ok(),
                compression: Some(env_parse("ALLCONV_DEFAULT_COMPRESSION", DEFAULT_COMPRESSION)),
                custom: None,
            },
            event_channel_capacity: env_parse(
                "ALLCONV_EVENT_CHANNEL_CAPACITY",
                defaults.event_channel_capacity,
            ),
            output_dir: env::var("ALLCONV_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.progress_step == 0 || self.progress_step > 100 {
            return Err(anyhow::anyhow!(
                "ALLCONV_PROGRESS_STEP must be between 1 and 100 (got {})",
                self.progress_step
            ));
        }
        if self.max_files == 0 {
            return Err(anyhow::anyhow!("ALLCONV_MAX_FILES must be at least 1"));
        }
        if self.event_channel_capacity == 0 {
            return Err(anyhow::anyhow!(
                "ALLCONV_EVENT_CHANNEL_CAPACITY must be at least 1"
            ));
        }
        if self.default_settings.format.is_empty() {
            return Err(anyhow::anyhow!("ALLCONV_DEFAULT_FORMAT cannot be empty"));
        }
        Ok(())
    }

    /// Number of ticks needed to drive one file from 0 to 100 percent.
    pub fn ticks_per_file(&self) -> u32 {
        let step = u32::from(self.progress_step.max(1));
        100u32.div_ceil(step) + 1
    }

    /// Simulated wall time spent on one file before the converter is invoked.
    pub fn simulated_duration_per_file(&self) -> Duration {
        self.tick_interval.saturating_mul(self.ticks_per_file())
    }
}
