use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};

#[cfg(feature = "onnx")]
use crate::analysis::onnx::OnnxModelLoader;
use crate::{
    analysis::{ModelLoader, UnavailableModel},
    config::PipelineConfig,
    session::FarmSession,
    settings::{Language, Thresholds},
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

const DEFAULT_DATA_DIR: &str = ".agriguard";

#[derive(Parser, Debug)]
#[command(name = "agriguard")]
#[command(about = "Crop photo pest-risk analysis and yield forecasting", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory holding the session database and settings file
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Seed for the synthetic field grid
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl GlobalArgs {
    pub fn level_filter(&self) -> Option<log::LevelFilter> {
        if self.quiet {
            return Some(log::LevelFilter::Warn);
        }
        match self.verbose {
            0 => None,
            1 => Some(log::LevelFilter::Debug),
            _ => Some(log::LevelFilter::Trace),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run crop photographs through the analysis pipeline
    Analyze(AnalyzeCommand),

    /// Print the dashboard summary
    Summary,

    /// List, acknowledge or clear notifications
    Notifications(NotificationsCommand),

    /// Show or change alert thresholds and language
    Settings(SettingsCommand),
}

#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// Images to analyse, in order
    #[arg(value_name = "IMAGE", required = true)]
    pub images: Vec<PathBuf>,

    /// ONNX classifier model
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Newline-separated class labels matching the model output
    #[arg(long, value_name = "PATH")]
    pub labels: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct NotificationsCommand {
    #[arg(long)]
    pub mark_all_read: bool,

    #[arg(long, conflicts_with = "mark_all_read")]
    pub clear: bool,
}

#[derive(Args, Debug)]
pub struct SettingsCommand {
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub pest: Option<u8>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub moisture: Option<u8>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub nitrogen: Option<u8>,

    /// english, french, spanish or hindi
    #[arg(long)]
    pub language: Option<Language>,
}

pub fn model_loader(
    model: Option<PathBuf>,
    labels: Option<PathBuf>,
) -> Result<Arc<dyn ModelLoader>> {
    match (model, labels) {
        #[cfg(feature = "onnx")]
        (Some(model), Some(labels)) => Ok(Arc::new(OnnxModelLoader::new(model, labels))),
        #[cfg(not(feature = "onnx"))]
        (Some(_), Some(_)) => Ok(Arc::new(UnavailableModel::new(
            "agriguard was built without the `onnx` feature",
        ))),
        (Some(_), None) | (None, Some(_)) => bail!("--model and --labels must be given together"),
        (None, None) => Ok(Arc::new(UnavailableModel::new(
            "no classifier configured; pass --model and --labels",
        ))),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn execute(cli: Cli) -> Result<()> {
    let config = PipelineConfig::from_env();
    let data_dir = cli
        .global
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let mut rng = match cli.global.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let loader: Arc<dyn ModelLoader> = match &cli.command {
        Command::Analyze(cmd) => model_loader(cmd.model.clone(), cmd.labels.clone())?,
        _ => Arc::new(UnavailableModel::new("not needed for this command")),
    };

    let session = FarmSession::open(config, &data_dir, loader, &mut rng).await?;
    let outcome = run_command(&session, cli.command).await;
    session.shutdown().await;
    outcome
}

async fn run_command(session: &FarmSession, command: Command) -> Result<()> {
    match command {
        Command::Analyze(cmd) => {
            let total = cmd.images.len();
            let mut failed = 0;
            for path in cmd.images {
                let payload = std::fs::read(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                match session.analyze(payload).await {
                    Ok(report) => {
                        log_info!("{}: {}", path.display(), report.result.pattern);
                        print_json(&report)?;
                    }
                    Err(err) => {
                        failed += 1;
                        log_error!("{}: {err}", path.display());
                        session.pipeline().reset().await;
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} of {total} images could not be analysed");
            }
            Ok(())
        }
        Command::Summary => print_json(&session.summary().await?),
        Command::Notifications(cmd) => {
            let center = session.notifications();
            if cmd.clear {
                center.clear().await?;
            } else if cmd.mark_all_read {
                center.mark_all_read().await?;
            }
            print_json(&center.list().await?)
        }
        Command::Settings(cmd) => {
            let settings = session.settings();
            let current = settings.preferences().thresholds;
            let thresholds = Thresholds {
                pest: cmd.pest.unwrap_or(current.pest),
                moisture: cmd.moisture.unwrap_or(current.moisture),
                nitrogen: cmd.nitrogen.unwrap_or(current.nitrogen),
            };
            if thresholds != current {
                settings.update_thresholds(thresholds)?;
            }
            if let Some(language) = cmd.language {
                settings.set_language(language)?;
            }
            print_json(&serde_json::json!({
                "preferences": settings.preferences(),
                "farm": settings.farm_profile(),
            }))
        }
    }
}
