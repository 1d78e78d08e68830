//! Application wiring: argument parsing, tracing setup, and dispatch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::logic::settings::{SETTINGS_GROUP, SettingKey};
use crate::logic::transfer::{TransferDirs, TransferService};
use crate::store::{ArticleSource, JsonlTransferLog, Library, SettingsSource, TransferLog};

/// Bundle manuscripts for Editorial Manager transfer.
#[derive(Debug, Parser)]
#[command(name = "empack", version, about)]
pub struct Cli {
    /// Path to the JSON article library.
    #[arg(long, value_name = "FILE")]
    pub library: PathBuf,

    /// Base directory for the export/import folders and the transfer log.
    #[arg(long, value_name = "DIR")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the export and import directories.
    Init,
    /// Build (or reuse) the transfer bundle for one article and print its
    /// paths.
    Export {
        journal_code: String,
        article_id: String,
        /// Record the transfer outcome immediately and clean up the bundle.
        #[arg(long, value_name = "OUTCOME")]
        complete: Option<TransferOutcome>,
    },
    /// Show the transfer settings configured for a journal.
    Settings { journal_code: String },
    /// Set one transfer setting for a journal.
    SetSetting {
        journal_code: String,
        name: String,
        value: String,
    },
    /// Print every recorded transfer log entry.
    Logs,
}

/// Outcome reported for a delivered bundle.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TransferOutcome {
    Success,
    Failure,
}

/// Parse arguments, initialize logging, and run the requested command.
pub fn run() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    dispatch(Cli::parse())
}

fn dispatch(cli: Cli) -> Result<()> {
    let dirs = TransferDirs::new(&cli.data_dir);

    match cli.command {
        Command::Init => dirs.provision(),
        Command::Export {
            journal_code,
            article_id,
            complete,
        } => export(&cli.library, &dirs, &journal_code, &article_id, complete),
        Command::Settings { journal_code } => show_settings(&cli.library, &journal_code),
        Command::SetSetting {
            journal_code,
            name,
            value,
        } => set_setting(&cli.library, &journal_code, &name, &value),
        Command::Logs => print_logs(&dirs),
    }
}

fn export(
    library_path: &Path,
    dirs: &TransferDirs,
    journal_code: &str,
    article_id: &str,
    complete: Option<TransferOutcome>,
) -> Result<()> {
    let library = Arc::new(Library::from_path(library_path)?);
    let log = Arc::new(JsonlTransferLog::new(dirs.log_path()));
    let service = TransferService::new(library.clone(), library, log, dirs.export_dir());

    let archive = service.export_zip_filepath(journal_code, article_id)?;
    let descriptor = service.export_go_filepath(journal_code, article_id)?;

    println!("{}", archive.display());
    println!("{}", descriptor.display());

    // TODO: push the bundle to the Editorial Manager FTP endpoint once
    // credential handling lands; until then the outcome is reported by the
    // operator.
    match complete {
        Some(TransferOutcome::Success) => service.record_success(journal_code, article_id),
        Some(TransferOutcome::Failure) => service.record_failure(journal_code, article_id),
        None => info!("bundle left in the export folder for pickup"),
    }
    Ok(())
}

fn show_settings(library_path: &Path, journal_code: &str) -> Result<()> {
    let library = Library::from_path(library_path)?;
    if library.find_journal(journal_code).is_none() {
        bail!("No journal with code '{}' in the library", journal_code);
    }

    for key in SettingKey::ALL {
        println!("{}", setting_line(&library, journal_code, key));
    }
    Ok(())
}

/// One display line per key. Blank values count as missing, the same way
/// the export resolver treats them.
fn setting_line(library: &Library, journal_code: &str, key: SettingKey) -> String {
    match library.setting(SETTINGS_GROUP, key.as_str(), journal_code) {
        Some(value) if !value.trim().is_empty() => format!("{key} = {}", value.trim()),
        _ => format!("{key} is not configured"),
    }
}

fn set_setting(library_path: &Path, journal_code: &str, name: &str, value: &str) -> Result<()> {
    if !SettingKey::ALL.iter().any(|key| key.as_str() == name) {
        bail!(
            "Unknown setting '{}'; expected one of: {}",
            name,
            SettingKey::ALL.map(|key| key.as_str()).join(", ")
        );
    }

    let mut library = Library::from_path(library_path)?;
    library.set_setting(journal_code, SETTINGS_GROUP, name, value)?;
    library.save(library_path)?;
    info!(journal_code, name, "updated transfer setting");
    Ok(())
}

fn print_logs(dirs: &TransferDirs) -> Result<()> {
    let log = JsonlTransferLog::new(dirs.log_path());
    let entries = log.entries()?;
    if entries.is_empty() {
        println!("No transfer log entries recorded yet");
        return Ok(());
    }

    for entry in entries {
        let outcome = if entry.success { "ok" } else { "failed" };
        println!(
            "{} {:7} {:6} journal={} article={} {}",
            entry.logged_at.format("%Y-%m-%d %H:%M:%S"),
            entry.message_type.as_str(),
            outcome,
            entry.journal_code.as_deref().unwrap_or("-"),
            entry.article_id.as_deref().unwrap_or("-"),
            entry.message
        );
    }
    Ok(())
}
