//! allconv CLI: converts files through a conversion session.
//!
//! Session tuning comes from `ALLCONV_*` environment variables (a `.env` file is honored).

use allconv_core::{
    format_file_size, log_error, ErrorMetadata, IntakePolicy, SessionConfig, SettingsUpdate,
    UnitCategory,
};
use allconv_processing::{default_converter, LocalDirectorySink, RasterFormat};
use allconv_cli::{init_tracing, load_config, read_raw_file, truncate_name, units_line};
use allconv_session::{ConversionSessionStore, RunSummary, SessionEvent};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

#[derive(Parser)]
#[command(name = "allconv", about = "Convert files between formats")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert files one after another and save the results
    Convert {
        /// Files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Target format (jpeg, png, webp, gif, or any identifier for pass-through)
        #[arg(long)]
        format: Option<String>,
        /// Quality percent for lossy formats
        #[arg(long)]
        quality: Option<u8>,
        /// Bounding box such as 1920x1080
        #[arg(long)]
        resolution: Option<String>,
        /// Output directory (defaults to ALLCONV_OUTPUT_DIR or ./converted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Convert a value between units
    Units {
        /// length, weight or temperature
        category: String,
        #[arg(allow_negative_numbers = true)]
        value: f64,
        from: String,
        to: String,
    },
    /// List output formats and unit tables
    Formats,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            files,
            format,
            quality,
            resolution,
            out,
        } => {
            let config = match load_config() {
                Ok(config) => config,
                Err(e) => {
                    log_error(&e);
                    if let Some(action) = e.suggested_action() {
                        eprintln!("{}", action);
                    }
                    return Err(e.into());
                }
            };
            let update = SettingsUpdate {
                format,
                quality,
                resolution,
                ..SettingsUpdate::default()
            };
            run_convert(config, files, update, out).await?;
        }
        Commands::Units {
            category,
            value,
            from,
            to,
        } => {
            println!("{}", units_line(&category, value, &from, &to)?);
        }
        Commands::Formats => {
            let raster: Vec<&str> = RasterFormat::all().iter().map(|f| f.extension()).collect();
            let units: BTreeMap<String, Vec<&str>> = UnitCategory::all()
                .into_iter()
                .map(|c| (c.to_string(), c.units()))
                .collect();
            print_json(&serde_json::json!({
                "raster_formats": raster,
                "units": units,
            }))?;
        }
    }

    Ok(())
}

async fn run_convert(
    config: SessionConfig,
    paths: Vec<PathBuf>,
    update: SettingsUpdate,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut raws = Vec::with_capacity(paths.len());
    for path in &paths {
        raws.push(read_raw_file(path).await?);
    }

    let policy = IntakePolicy::from_config(&config);
    let admission = policy.admit(0, raws);
    for rejected in &admission.rejected {
        tracing::warn!(reason = %rejected, max_files = policy.max_files(), "File skipped");
    }
    if admission.admitted.is_empty() {
        anyhow::bail!("No files left to convert");
    }

    let out_dir = out.unwrap_or_else(|| config.output_dir.clone());
    let sink = LocalDirectorySink::new(&out_dir).await?;
    let store = ConversionSessionStore::new(config, default_converter(), Arc::new(sink));

    if !update.is_empty() {
        store.update_settings(update).await;
    }
    store.enqueue(admission.admitted).await;

    let reporter = tokio::spawn(report_progress(store.clone(), store.subscribe()));
    let run = store.spawn_run().await;

    let summary = tokio::select! {
        result = run => result.context("Conversion task failed")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, cancelling conversion");
            store.cancel_run().await;
            RunSummary {
                started: true,
                cancelled: true,
                ..Default::default()
            }
        }
    };
    reporter.abort();

    let delivered = if summary.cancelled {
        0
    } else {
        store.download_all().await
    };

    print_json(&serde_json::json!({
        "run": summary,
        "session": store.summary().await,
        "saved": delivered,
        "output_dir": out_dir.display().to_string(),
    }))?;
    Ok(())
}

/// Prints one line per finished file while the run is going.
async fn report_progress(store: ConversionSessionStore, mut events: Receiver<SessionEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Progress reporter lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        match event {
            SessionEvent::FileCompleted { id, output_name } => {
                let size = store
                    .file(id)
                    .await
                    .and_then(|f| f.output)
                    .map(|o| format_file_size(o.size_bytes))
                    .unwrap_or_default();
                eprintln!("  done    {} ({})", truncate_name(&output_name, 48), size);
            }
            SessionEvent::FileFailed { id, message } => {
                let name = store.file(id).await.map(|f| f.name).unwrap_or_default();
                eprintln!("  failed  {}: {}", truncate_name(&name, 48), message);
            }
            SessionEvent::RunFinished { .. } => break,
            _ => {}
        }
    }
}
