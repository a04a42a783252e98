// src/bin/sync_all.rs
//
// One-shot sync for cron: `sync_all` runs every registered source,
// `sync_all --source <uuid>` runs just one. Prints the JSON report to stdout.

use anyhow::Context;
use color_sync_hub::infra::{config, logging};
use color_sync_hub::{ExportClient, PostgresStore, SyncCoordinator, SyncError, SyncStore};
use std::sync::Arc;
use uuid::Uuid;

fn usage_and_exit() -> ! {
    eprintln!("usage: sync_all [--source <uuid>]");
    std::process::exit(2);
}

fn parse_args() -> Option<Uuid> {
    let mut args = std::env::args().skip(1);
    let mut source = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--source" => {
                let value = args.next().unwrap_or_else(|| usage_and_exit());
                source = Some(Uuid::parse_str(&value).unwrap_or_else(|_| usage_and_exit()));
            }
            _ => usage_and_exit(),
        }
    }
    source
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let source = parse_args();
    dotenv::dotenv().ok();
    logging::init_logging(config::log_format()?)?;

    let store = PostgresStore::connect(
        &config::database_url()?,
        config::database_max_connections()?,
    )
    .await
    .context("failed to connect the Postgres store")?;
    let store: Arc<dyn SyncStore> = Arc::new(store);
    let client = ExportClient::new(config::sync_http_timeout()?)
        .context("failed to build the export HTTP client")?;
    let coordinator = SyncCoordinator::new(store, client, config::reference_policy()?);

    let report = match source {
        Some(id) => match coordinator.sync_source(id).await {
            Ok(report) => serde_json::to_value(report)?,
            // Storage trouble is infrastructure; anything else is the source's problem.
            Err(SyncError::Storage(e)) => return Err(e.into()),
            Err(e) => serde_json::json!({ "success": false, "error": e.to_string() }),
        },
        None => serde_json::to_value(coordinator.sync_all().await?)?,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
