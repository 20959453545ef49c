use anyhow::Result;
use clap::{Parser, Subcommand};
use coursework_sync::state::{self, StateStore};
use coursework_sync::sync::DEBOUNCE_SECONDS;
use coursework_sync::{source, FileStateStore, SourceApi, SyncEngine, SyncOptions, SyncOutcome};
use tracing_subscriber::EnvFilter;

mod config;
mod destination_client;
mod source_client;

use config::{Config, ConfigArgs};
use destination_client::DocServiceClient;
use source_client::LmsClient;

#[derive(Parser)]
struct Synchronizer {
    #[clap(flatten)]
    config: ConfigArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sync assignments from the LMS into the document workspace.
    Sync {
        /// Bypass the debounce gate.
        #[clap(short, long)]
        force: bool,
    },
    /// Forget what has been synced; the next run rewrites everything.
    ClearCache,
    /// Print the last run's summary.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(feature = "env-file")]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let synchronizer = Synchronizer::parse();
    let config = Config::from(synchronizer.config);
    let store = FileStateStore::new(config.state_path.clone());

    match synchronizer.command {
        Command::Sync { force } => sync(&config, &store, force).await,
        Command::ClearCache => {
            store.remove(state::SYNC_CACHE_KEY).await?;
            println!("sync cache cleared; the next run re-syncs everything");
            Ok(())
        }
        Command::Status => status(&store).await,
    }
}

async fn sync(config: &Config, store: &FileStateStore, force: bool) -> Result<()> {
    let lms = LmsClient::new(config.lms_base_url.clone(), config.lms_access_token.clone())?;
    let destination = DocServiceClient::new(config.docs_api_token.clone())?;

    let courses = lms.list_courses().await?;
    let payload =
        source::build_payload(&lms, lms.domain(), config.lms_user_id.clone(), courses).await;

    let engine = SyncEngine {
        destination: &destination,
        store,
        course_collection_id: config.course_collection_id.clone(),
        assignment_collection_id: config.assignment_collection_id.clone(),
        link_style: config.link_style,
    };

    match engine.run(&payload, SyncOptions { force }).await? {
        SyncOutcome::Skipped => {
            println!(
                "skipped: a sync ran within the last {} minutes (use --force to override)",
                DEBOUNCE_SECONDS / 60
            );
        }
        SyncOutcome::Completed(summary) => {
            println!(
                "created {}, updated {}, unchanged {}, across {} courses",
                summary.created, summary.updated, summary.skipped, summary.courses
            );
        }
    }

    Ok(())
}

async fn status(store: &FileStateStore) -> Result<()> {
    let last_sync = store.get(state::LAST_SYNC_KEY).await?;
    let last_result = store.get(state::LAST_SYNC_RESULT_KEY).await?;

    match (last_sync, last_result) {
        (Some(at), Some(result)) => {
            println!("last sync: {at}");
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => println!("no sync has run yet"),
    }

    Ok(())
}
