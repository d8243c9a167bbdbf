use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use approver_core::config::WorkerConfig;
use approver_core::domain::{ApprovalAck, ApproveJobRequest};
use approver_core::impls::{GearmanBroker, GearmanClient, SharedLock};
use approver_core::typed::codec::{decode_listing_reply, encode_for_transport};
use approver_core::typed::{ApproveJob, GetJobsAwaitingApproval, Operation};
use approver_core::{ApprovalRegistry, ApprovalWorker};

mod telemetry;

/// Approval RPC worker and its companion client commands.
#[derive(Parser, Debug)]
#[command(name = "approver", version)]
struct Cli {
    /// TOML config file.
    #[arg(long, env = "APPROVER_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Register with the broker and serve until Ctrl-C.
    ///
    /// Standalone/dev mode: the registry starts empty and the datastore lock
    /// is private to this process, so the listing is always empty and every
    /// approval is a no-op. A workflow engine embeds `approver-core` and
    /// hands its own registry and lock to `ApprovalWorker` instead.
    Serve,
    /// Print the jobs currently awaiting approval.
    List,
    /// Resolve one pending decision.
    Approve {
        #[arg(long)]
        job: String,
        #[arg(long)]
        chain: String,
        #[arg(long)]
        agent: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = WorkerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    telemetry::initialise(&config.logging)?;

    match cli.command {
        Command::Serve => serve(config).await,
        Command::List => list(&config).await,
        Command::Approve { job, chain, agent } => approve(&config, job, chain, agent).await,
    }
}

async fn serve(config: WorkerConfig) -> Result<()> {
    let worker = ApprovalWorker::new(config, ApprovalRegistry::new(), Arc::new(SharedLock::new()));
    let broker = Arc::new(GearmanBroker::new(worker.config().broker.endpoint.clone()));
    let handle = worker.supervisor(broker)?.spawn();

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    info!("shutdown requested");
    handle.shutdown_and_join().await;
    Ok(())
}

async fn list(config: &WorkerConfig) -> Result<()> {
    let mut client = GearmanClient::connect(&config.broker.endpoint).await?;
    let reply = client.submit(GetJobsAwaitingApproval::NAME, b"").await?;
    match decode_listing_reply(&reply)? {
        Some(document) => print!("{document}"),
        None => bail!("worker returned an empty reply"),
    }
    Ok(())
}

async fn approve(config: &WorkerConfig, job: String, chain: String, agent: String) -> Result<()> {
    let request = ApproveJobRequest::new(job, chain, agent);
    let payload = encode_for_transport(&request)?;

    let mut client = GearmanClient::connect(&config.broker.endpoint).await?;
    let reply = client.submit(ApproveJob::NAME, &payload).await?;
    if reply.is_empty() {
        bail!("worker returned an empty reply");
    }
    let ack: ApprovalAck = serde_json::from_slice(&reply).context("decoding acknowledgement")?;
    println!("{}{} {}", ack.message, ack.job_uuid, ack.chain);
    Ok(())
}
