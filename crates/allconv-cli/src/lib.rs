use allconv_core::{convert_units, format_converted, AppError, RawFile, SessionConfig, UnitCategory};
use allconv_processing::mime_for_format;
use anyhow::Context;
use std::path::Path;

/// Shorten a name to max_len characters, appending "..." if shortened.
pub fn truncate_name(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Mime type guessed from the file extension.
pub fn guess_mime_type(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(mime_for_format)
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Reads `path` into a raw file named after its final path component.
pub async fn read_raw_file(path: &Path) -> anyhow::Result<RawFile> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string();
    Ok(RawFile::new(name, guess_mime_type(path), data))
}

/// Session configuration from the environment, with bad values reported as
/// [`AppError::Config`].
pub fn load_config() -> Result<SessionConfig, AppError> {
    SessionConfig::from_env().map_err(|e| AppError::Config(format!("{:#}", e)))
}

/// One line such as `-40 celsius = -40.00 fahrenheit`.
pub fn units_line(category: &str, value: f64, from: &str, to: &str) -> Result<String, AppError> {
    let category: UnitCategory = category.parse()?;
    let result = convert_units(category, value, from, to)?;
    Ok(format!(
        "{} {} = {} {}",
        value,
        from,
        format_converted(category, result),
        to
    ))
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
