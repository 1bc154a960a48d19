use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use job_tracker::auth::TokenManager;
use job_tracker::classify::{Classifier, Classify, OpenAiModel, SenderFilter};
use job_tracker::config::{ClassifierConfig, Config, Scope};
use job_tracker::mail::GmailClient;
use job_tracker::runner::{RunOptions, RunOutcome, Runner};
use job_tracker::store::TableStore;
use job_tracker::store::drive::DriveTableStore;
use job_tracker::store::local::LocalTableStore;

#[derive(Parser)]
#[command(name = "job_tracker")]
#[command(about = "Track job-application emails in a CSV table", long_about = None)]
struct Cli {
    /// Settings file (defaults to <config dir>/job_tracker/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the last day's mail and merge new rows into the table
    Run {
        /// Keep the table in a local CSV file instead of Google Drive
        #[arg(long)]
        local_table: Option<PathBuf>,

        /// Report what would be added without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Classify a single email and print its category
    Classify {
        #[arg(long)]
        sender: String,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        snippet: String,
    },
}

fn build_classifier(cfg: &ClassifierConfig) -> Result<Classifier<OpenAiModel>> {
    Ok(Classifier::new(
        SenderFilter::new(&cfg.automated_senders),
        OpenAiModel::new(cfg)?,
    ))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Run {
            local_table,
            dry_run,
        } => {
            let scope = if local_table.is_some() {
                Scope::LocalTable
            } else {
                Scope::Full
            };
            let cfg = Config::load(cli.config.as_deref(), scope)?;

            let gmail_creds = cfg
                .gmail
                .clone()
                .ok_or_else(|| anyhow!("gmail credentials not loaded"))?;
            let mail = GmailClient::new(TokenManager::new("gmail", gmail_creds))?;
            let classifier = build_classifier(&cfg.classifier)?;

            let store: Box<dyn TableStore> = match local_table {
                Some(path) => Box::new(LocalTableStore::new(path)),
                None => {
                    let drive = cfg
                        .drive
                        .clone()
                        .ok_or_else(|| anyhow!("drive settings not loaded"))?;
                    Box::new(DriveTableStore::new(
                        TokenManager::new("drive", drive.credentials),
                        drive.folder_id,
                        drive.table_name,
                    )?)
                }
            };

            let outcome = Runner::new(&mail, &classifier, store.as_ref(), RunOptions { dry_run })
                .run()
                .context("run aborted; stored table left unchanged")?;
            log::info!("run finished: {outcome:?}");
            if let RunOutcome::Updated { saved: true, .. } = outcome {
                println!("Job application tracking updated.");
            }
            Ok(())
        }

        Command::Classify {
            sender,
            subject,
            snippet,
        } => {
            let cfg = Config::load(cli.config.as_deref(), Scope::ClassifyOnly)?;
            let classifier = build_classifier(&cfg.classifier)?;
            let category = classifier.category(&sender, &subject, &snippet)?;
            println!("{category}");
            Ok(())
        }
    }
}
