// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context as _, bail};
use clap::{Args, Parser, Subcommand};
use directories::ProjectDirs;
use log::LevelFilter;
use semval::prelude::*;
use url::Url;

use muxtag_core::{
    RawMetadataRecord, build_canonical_record,
    codec::{classify_codec, compose_codec_source},
    locale::LocaleContext,
};
use muxtag_media_file::io::embed::{
    EmbedReport, EmbedStatus, Embedder, EmbeddingRequest, FieldOverlap,
};

pub mod settings;
use self::settings::{EmbedMetadata, EmbedThumbnail, Settings};

/// Default log level for debug builds.
#[cfg(debug_assertions)]
const DEFAULT_LOG_FILTER_LEVEL: LevelFilter = LevelFilter::Info;

/// Reduce log verbosity for release builds.
#[cfg(not(debug_assertions))]
const DEFAULT_LOG_FILTER_LEVEL: LevelFilter = LevelFilter::Warn;

const APP_NAME: &str = "muxtag";

#[derive(Debug, Parser)]
#[command(name = APP_NAME, version, about = "Embed metadata and artwork into MP4/M4A files")]
struct Cli {
    /// Directory of the settings file
    #[arg(long, global = true, env = "MUXTAG_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Embed an extracted metadata record into a media file
    Embed(EmbedArgs),

    /// Classify a raw codec string
    Classify {
        /// Format note of the stream, e.g. `16/JOC`
        #[arg(long)]
        format_note: Option<String>,

        /// Audio codec, e.g. `ec-3`
        #[arg(long)]
        acodec: Option<String>,
    },

    /// Print the effective settings
    Settings {
        /// Write the settings file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Args)]
struct EmbedArgs {
    /// JSON file with the metadata record
    #[arg(long, short)]
    metadata: PathBuf,

    /// URL of the source page, implies region and language
    #[arg(long)]
    source_url: Option<Url>,

    /// Two-letter storefront region
    #[arg(long)]
    region: Option<String>,

    /// Preferred language for localized credits
    #[arg(long)]
    language: Option<String>,

    #[arg(long, value_enum)]
    embed_metadata: Option<EmbedMetadata>,

    #[arg(long, value_enum)]
    embed_thumbnail: Option<EmbedThumbnail>,

    #[arg(long)]
    embed_credits: bool,

    /// Let the tag library overwrite fields written by the container tool
    #[arg(long)]
    prefer_library: bool,

    /// Location of the MP4Box executable
    #[arg(long, env = "MUXTAG_MP4BOX")]
    mp4box: Option<PathBuf>,

    #[arg(long)]
    timeout_secs: Option<u64>,

    /// The MP4/M4A file
    target: PathBuf,
}

impl EmbedArgs {
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(embed_metadata) = self.embed_metadata {
            settings.embed_metadata = embed_metadata;
        }
        if let Some(embed_thumbnail) = self.embed_thumbnail {
            settings.embed_thumbnail = embed_thumbnail;
        }
        if self.embed_credits {
            settings.embed_credits = true;
        }
        if let Some(mp4box) = &self.mp4box {
            settings.path = Some(mp4box.clone());
        }
        if let Some(timeout_secs) = self.timeout_secs {
            settings.timeout_secs = timeout_secs;
        }
    }

    fn locale(&self, raw: &RawMetadataRecord) -> LocaleContext {
        if self.region.is_some() || self.language.is_some() {
            return LocaleContext::new(self.region.as_deref(), self.language.as_deref());
        }
        self.source_url
            .clone()
            .or_else(|| {
                raw.resolve_text("webpage_url")
                    .and_then(|url| Url::parse(url).ok())
            })
            .map(|url| LocaleContext::from_url(&url))
            .unwrap_or_default()
    }
}

#[must_use]
fn app_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

fn load_settings(config_dir: Option<&Path>) -> anyhow::Result<(Settings, PathBuf)> {
    let Some(config_dir) = config_dir.map(Path::to_path_buf).or_else(app_config_dir) else {
        bail!("config directory is unavailable");
    };
    log::debug!("Config directory: {}", config_dir.display());
    let settings = Settings::load(&config_dir).context("loading settings")?;
    Ok((settings, config_dir))
}

fn validate_settings(settings: &Settings) -> anyhow::Result<()> {
    if let Err(err) = settings.validate() {
        bail!("invalid settings: {err:?}");
    }
    Ok(())
}

fn print_report(target: &Path, report: &EmbedReport) {
    for field in &report.embedded {
        log::debug!("Embedded {field}");
    }
    for skipped in &report.skipped {
        println!("skipped {skipped}");
    }
    for path in &report.deleted {
        println!("deleted {}", path.display());
    }
    match &report.status {
        EmbedStatus::Success => {
            println!(
                "{target}: embedded {count} field(s)",
                target = target.display(),
                count = report.embedded.len()
            );
        }
        EmbedStatus::Partial => {
            println!(
                "{target}: embedded {count} field(s), skipped {skipped}",
                target = target.display(),
                count = report.embedded.len(),
                skipped = report.skipped.len()
            );
        }
        EmbedStatus::Failed { kind, message } => {
            eprintln!(
                "{target}: {kind} failure: {message}",
                target = target.display()
            );
        }
    }
}

async fn embed(args: EmbedArgs, config_dir: Option<&Path>) -> anyhow::Result<ExitCode> {
    let (mut settings, _) = load_settings(config_dir)?;
    args.apply_to(&mut settings);
    validate_settings(&settings)?;

    let json = fs::read(&args.metadata)
        .with_context(|| format!("reading {}", args.metadata.display()))?;
    let raw: RawMetadataRecord = serde_json::from_slice(&json)
        .with_context(|| format!("parsing {}", args.metadata.display()))?;
    let locale = args.locale(&raw);
    log::debug!("Locale: {locale:?}");

    let built = build_canonical_record(&raw, &locale);
    let mut record = built.record;
    if record.ext.is_none() {
        record.ext = args
            .target
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned());
    }

    let request = EmbeddingRequest {
        features: settings.features(),
        backends: settings.backends(),
        thumbnail_action: settings.thumbnail_action(),
        thumbnail_constraints: Some(settings.thumbnail_constraints()),
        timeout: settings.timeout(),
        skipped: built.skipped,
        ..EmbeddingRequest::new(&args.target, &record)
    };
    let overlap = if args.prefer_library {
        FieldOverlap::PreferLibrary
    } else {
        FieldOverlap::KeepContainer
    };
    let embedder = Embedder::with_mp4box(settings.program()).with_overlap(overlap);
    let report = embedder.embed(&request).await;
    print_report(&args.target, &report);
    let exit_code = if report.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    };
    Ok(exit_code)
}

fn classify(format_note: Option<&str>, acodec: Option<&str>) -> ExitCode {
    let label = classify_codec(&compose_codec_source(format_note, acodec));
    println!("{label}");
    ExitCode::SUCCESS
}

fn print_settings(config_dir: Option<&Path>, save: bool) -> anyhow::Result<ExitCode> {
    let (settings, config_dir) = load_settings(config_dir)?;
    validate_settings(&settings)?;
    println!(
        "{}",
        ron::ser::to_string_pretty(&settings, Default::default())?
    );
    if save {
        settings.save(&config_dir)?;
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(DEFAULT_LOG_FILTER_LEVEL)
        // Parse environment variables after configuring all default option(s).
        .parse_default_env()
        .init();

    let Cli {
        config_dir,
        command,
    } = Cli::parse();
    let config_dir = config_dir.as_deref();
    let result = match command {
        Command::Embed(args) => embed(args, config_dir).await,
        Command::Classify {
            format_note,
            acodec,
        } => Ok(classify(format_note.as_deref(), acodec.as_deref())),
        Command::Settings { save } => print_settings(config_dir, save),
    };
    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
