//! channelblam daemon: entry point for running the policy engine.

mod config;
mod shutdown;

use anyhow::Context;
use blam_engine::{CancelToken, PolicyEngine};
use blam_idv::HttpIdvOracle;
use blam_roster::SlackRoster;
use blam_rpc::RpcServer;
use blam_store::{MemoryPolicyStore, PolicyStore};
use blam_store_lmdb::LmdbEnvironment;
use blam_utils::LogFormat;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use config::{DaemonConfig, StoreBackend};
use shutdown::ShutdownController;

#[derive(Parser)]
#[command(name = "blam-daemon", about = "Channel membership policy daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "BLAM_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB policy store.
    #[arg(long, env = "BLAM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Policy store backend: "lmdb" or "memory".
    #[arg(long, env = "BLAM_STORE")]
    store: Option<String>,

    /// RPC server port.
    #[arg(long, env = "BLAM_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Member id the bot acts as.
    #[arg(long, env = "BLAM_ACTOR_ID")]
    actor_id: Option<String>,

    /// Administrator member id.
    #[arg(long, env = "ADMIN_ID")]
    admin_id: Option<String>,

    /// Identity verification endpoint.
    #[arg(long, env = "BLAM_IDV_ENDPOINT")]
    idv_endpoint: Option<String>,

    /// Bot token for the chat platform.
    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    slack_token: String,

    /// Seconds between background sweeps; 0 disables them.
    #[arg(long, env = "BLAM_SWEEP_INTERVAL_SECS")]
    sweep_interval_secs: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, env = "BLAM_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "BLAM_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve RPC and run periodic sweeps (the default).
    Run,
    /// Run one sweep over every restricted channel, then exit.
    Sweep,
}

fn parse_store(s: &str) -> anyhow::Result<StoreBackend> {
    match s.to_lowercase().as_str() {
        "lmdb" => Ok(StoreBackend::Lmdb),
        "memory" => Ok(StoreBackend::Memory),
        other => anyhow::bail!("unknown store backend '{other}' (expected lmdb or memory)"),
    }
}

/// File config first, then CLI flags and env vars on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<DaemonConfig> {
    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DaemonConfig::default(),
    };

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(store) = &cli.store {
        config.store = parse_store(store)?;
    }
    if let Some(port) = cli.rpc_port {
        config.rpc_port = port;
    }
    if let Some(actor) = &cli.actor_id {
        config.actor_id = Some(actor.clone());
    }
    if let Some(admin) = &cli.admin_id {
        config.admin_id = Some(admin.clone());
    }
    if let Some(endpoint) = &cli.idv_endpoint {
        config.idv_endpoint = endpoint.clone();
    }
    if let Some(secs) = cli.sweep_interval_secs {
        config.sweep_interval_secs = secs;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn open_store(config: &DaemonConfig) -> anyhow::Result<Arc<dyn PolicyStore>> {
    match config.store {
        StoreBackend::Lmdb => {
            let env = LmdbEnvironment::open(&config.data_dir, config.lmdb_map_size)
                .with_context(|| format!("opening LMDB store at {}", config.data_dir.display()))?;
            tracing::info!("policy store: LMDB at {}", config.data_dir.display());
            Ok(Arc::new(env.policy_store()))
        }
        StoreBackend::Memory => {
            tracing::warn!("policy store: in-memory; policies are lost on restart");
            Ok(Arc::new(MemoryPolicyStore::new()))
        }
    }
}

async fn run_sweep(engine: &PolicyEngine, cancel: &CancelToken) {
    match engine.sweep(cancel).await {
        Ok(results) => {
            let failed = results.iter().filter(|(_, r)| r.is_err()).count();
            let removed: usize = results
                .iter()
                .filter_map(|(_, r)| r.as_ref().ok())
                .map(|report| report.removed().count())
                .sum();
            tracing::info!(channels = results.len(), failed, removed, "sweep complete");
        }
        Err(e) => tracing::warn!(kind = %e.kind(), "sweep failed: {e}"),
    }
}

async fn sweep_loop(
    engine: Arc<PolicyEngine>,
    interval: Duration,
    cancel: CancelToken,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ticker.tick() => run_sweep(&engine, &cancel).await,
        }
    }
    tracing::debug!("sweep loop stopped");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    blam_utils::init_logging(config.log_format, &config.log_level);

    let engine_config = config.engine_config()?;
    let store = open_store(&config)?;
    let oracle = Arc::new(HttpIdvOracle::with_timeout(
        config.idv_endpoint.clone(),
        config.call_timeout(),
    ));
    let roster = Arc::new(SlackRoster::with_api_base(
        cli.slack_token.clone(),
        config.slack_api_base.clone(),
        config.call_timeout(),
    ));
    let engine = Arc::new(PolicyEngine::new(engine_config, store, oracle, roster));
    let shutdown = ShutdownController::new();

    match cli.command.unwrap_or(Command::Run) {
        Command::Sweep => {
            tracing::info!("running one-off sweep");
            let cancel = shutdown.cancel_token();
            let sweep = run_sweep(&engine, &cancel);
            tokio::select! {
                _ = sweep => {}
                _ = shutdown.wait_for_signal() => {}
            }
        }
        Command::Run => {
            tracing::info!(
                "starting blam daemon (RPC:{}, sweep:{})",
                config.rpc_port,
                config
                    .sweep_interval()
                    .map_or_else(|| "off".to_string(), |d| format!("{}s", d.as_secs())),
            );

            let sweeper = config.sweep_interval().map(|interval| {
                tokio::spawn(sweep_loop(
                    Arc::clone(&engine),
                    interval,
                    shutdown.cancel_token(),
                    shutdown.subscribe(),
                ))
            });

            let server = RpcServer::new(config.rpc_port, Arc::clone(&engine), shutdown.cancel_token());
            let mut stop = shutdown.subscribe();
            let mut rpc = tokio::spawn(async move {
                server
                    .start(async move {
                        let _ = stop.recv().await;
                    })
                    .await
            });

            let early_exit = tokio::select! {
                _ = shutdown.wait_for_signal() => None,
                result = &mut rpc => Some(result),
            };
            let rpc_result = match early_exit {
                Some(result) => {
                    shutdown.shutdown();
                    result
                }
                None => rpc.await,
            };
            if let Some(sweeper) = sweeper {
                let _ = sweeper.await;
            }
            rpc_result
                .context("RPC server task panicked")?
                .context("RPC server failed")?;

            tracing::info!("blam daemon exited cleanly");
        }
    }

    Ok(())
}
