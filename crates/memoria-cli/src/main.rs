//! Memoria CLI: attach memorial portraits and slideshow photos to an interment record.
//!
//! Configure with MEMORIA_API_URL and optionally MEMORIA_API_TOKEN (Bearer auth).

use anyhow::Context;
use clap::{Parser, Subcommand};
use memoria_api_client::ApiClient;
use memoria_cli::{describe_error, format_progress, init_tracing, read_photo};
use memoria_core::models::{DocumentContext, EntityKey, SubmitReport};
use memoria_core::{LinkLookup, RecordStore, UploadConfig, UploadError};
use memoria_upload::{
    CropRegion, LocalConstraints, ReviewDraft, ReviewSubmitter, UploadMode, UploadOrchestrator,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "memoria", about = "Interment photo upload CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the link status, occupants and stored photos of a document
    Context {
        document_no: String,
        /// Show the slideshow instead of portraits
        #[arg(long)]
        slideshow: bool,
    },
    /// Upload or replace the memorial portrait of one occupant
    Portrait {
        document_no: String,
        /// Occupant name as listed on the record
        #[arg(long)]
        occupant: String,
        #[arg(long)]
        uploader: String,
        #[arg(long)]
        gender: String,
        /// Crop region as x,y,width,height (defaults to the whole image)
        #[arg(long)]
        crop: Option<CropRegion>,
        /// Replace the stored portrait
        #[arg(long)]
        replace: bool,
        file: PathBuf,
    },
    /// Upload photos to the slideshow, in batches
    Slideshow {
        document_no: String,
        /// Uploader name (defaults to the stored one)
        #[arg(long)]
        uploader: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Stored photo URL to delete (repeatable)
        #[arg(long = "remove-url")]
        remove_url: Vec<String>,
        files: Vec<PathBuf>,
    },
    /// Submit family feedback
    Review {
        document_no: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        contact: String,
        #[arg(long)]
        public_question: String,
        #[arg(long)]
        private_question: String,
        /// Extra public comment (repeatable)
        #[arg(long = "public-other")]
        public_others: Vec<String>,
        #[arg(long, default_value = "")]
        private_answer: String,
        #[arg(long, default_value = "")]
        private_others: String,
        /// Facebook review screenshot
        #[arg(long)]
        fb: Option<PathBuf>,
        /// Google review screenshot
        #[arg(long)]
        google: Option<PathBuf>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn user_error(error: UploadError) -> anyhow::Error {
    anyhow::anyhow!(describe_error(&error))
}

fn ensure_usable(context: &DocumentContext) -> anyhow::Result<()> {
    if context.is_valid() {
        return Ok(());
    }
    Err(user_error(UploadError::read_only(
        context.link_status,
        context.message.as_deref(),
    )))
}

fn finish(report: SubmitReport) -> anyhow::Result<()> {
    print_json(&report)?;
    report.into_result().map(|_| ()).map_err(user_error)
}

fn context_summary(orchestrator: &UploadOrchestrator) -> serde_json::Value {
    let records: Vec<_> = orchestrator
        .records()
        .iter()
        .map(|r| {
            serde_json::json!({
                "entity": r.key(),
                "stored": r.existing().iter().filter_map(|a| a.remote_url()).collect::<Vec<_>>(),
                "uploader_name": r.uploader_name(),
            })
        })
        .collect();
    serde_json::json!({
        "context": orchestrator.context(),
        "records": records,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = UploadConfig::from_env().context("Invalid MEMORIA_* configuration")?;
    tracing::debug!(api_url = %config.api_url, "Using record store");
    let client = ApiClient::from_config(&config)
        .context("Failed to create API client. Set MEMORIA_API_URL")?;
    let store: Arc<dyn RecordStore> = Arc::new(client);

    let cli = Cli::parse();

    match cli.command {
        Commands::Context {
            document_no,
            slideshow,
        } => {
            let mode = if slideshow {
                UploadMode::Slideshow
            } else {
                UploadMode::Portraits
            };
            let mut orchestrator = UploadOrchestrator::new(store, config, mode);
            orchestrator.load_context(&document_no).await;
            print_json(&context_summary(&orchestrator))?;
        }
        Commands::Portrait {
            document_no,
            occupant,
            uploader,
            gender,
            crop,
            replace,
            file,
        } => {
            let photo = read_photo(&file)?;
            let mut orchestrator = UploadOrchestrator::new(store, config, UploadMode::Portraits);
            let context = orchestrator.load_context(&document_no).await;
            ensure_usable(&context)?;

            let key = EntityKey::Occupant(occupant);
            if replace {
                orchestrator.toggle_edit(&key).map_err(user_error)?;
            }
            let report = orchestrator
                .select_files(&key, vec![photo])
                .map_err(user_error)?;
            if let Some(e) = report.rejected.into_iter().next() {
                return Err(user_error(e));
            }
            orchestrator
                .set_uploader_name(&key, uploader)
                .map_err(user_error)?;
            orchestrator.set_gender(&key, gender).map_err(user_error)?;

            let verdict = orchestrator
                .confirm_crop_region(&key, crop)
                .await
                .map_err(user_error)?;
            eprintln!("Photo accepted: {}", verdict.explanation);

            let report = orchestrator.submit().await.map_err(user_error)?;
            finish(report)?;
        }
        Commands::Slideshow {
            document_no,
            uploader,
            email,
            remove_url,
            files,
        } => {
            let photos = files
                .iter()
                .map(|f| read_photo(f))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let mut orchestrator = UploadOrchestrator::new(store, config, UploadMode::Slideshow);
            let context = orchestrator.load_context(&document_no).await;
            ensure_usable(&context)?;

            let key = EntityKey::Slideshow(document_no.trim().to_string());
            if let Some(name) = uploader {
                orchestrator
                    .set_uploader_name(&key, name)
                    .map_err(user_error)?;
            }
            if email.is_some() {
                orchestrator.set_email(&key, email).map_err(user_error)?;
            }
            for url in &remove_url {
                orchestrator
                    .remove_existing(&key, url)
                    .map_err(user_error)?;
            }
            if !photos.is_empty() {
                let report = orchestrator
                    .select_files(&key, photos)
                    .map_err(user_error)?;
                for e in &report.rejected {
                    eprintln!("Skipped {}", describe_error(e));
                }
            }

            let mut progress = orchestrator.progress();
            let printer = tokio::spawn(async move {
                while progress.changed().await.is_ok() {
                    let current = *progress.borrow_and_update();
                    if current.total > 0 {
                        eprintln!("{}", format_progress(current));
                    }
                }
            });

            let result = orchestrator.submit().await;
            drop(orchestrator);
            printer.await.ok();
            finish(result.map_err(user_error)?)?;
        }
        Commands::Review {
            document_no,
            name,
            contact,
            public_question,
            private_question,
            public_others,
            private_answer,
            private_others,
            fb,
            google,
        } => {
            let fb_screenshot = fb.as_deref().map(read_photo).transpose()?;
            let google_screenshot = google.as_deref().map(read_photo).transpose()?;
            let constraints = LocalConstraints::from_config(&config);

            let review_config = UploadConfig {
                link_lookup: LinkLookup::ReviewLink,
                ..config
            };
            let mut orchestrator =
                UploadOrchestrator::new(store.clone(), review_config, UploadMode::Portraits);
            let context = orchestrator.load_context(&document_no).await;
            ensure_usable(&context)?;

            let draft = ReviewDraft {
                reviewer_name: name,
                contact_number: contact,
                selected_public_question: public_question,
                selected_private_question: private_question,
                public_others,
                private_faq_answer: private_answer,
                private_others,
                fb_screenshot,
                google_screenshot,
            };
            let response = ReviewSubmitter::new(store, constraints)
                .submit(&context, draft)
                .await
                .map_err(user_error)?;
            print_json(&response)?;
        }
    }

    Ok(())
}
