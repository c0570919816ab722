use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use textgate::banner::{print_banner, print_shutdown};
use textgate::config::GatewayConfig;
use textgate::consts::{
    DEFAULT_ALLOWED_ORIGIN, DEFAULT_BODY_LIMIT, DEFAULT_HOST, DEFAULT_MAX_WORKER_OUTPUT,
    DEFAULT_PORT, DEFAULT_WORKER_PROGRAM, DEFAULT_WORKER_SCRIPT, DEFAULT_WORKER_TIMEOUT,
};
use textgate::server;
use textgate::worker::process::{ProcessWorker, WorkerConfig};

#[derive(Parser)]
#[command(
    name = "textgate",
    version,
    about = "Validates text-processing requests and hands them to an external worker."
)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Origin allowed by CORS
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = DEFAULT_ALLOWED_ORIGIN)]
    allowed_origin: String,

    /// Executable that runs the worker
    #[arg(long, env = "WORKER_PROGRAM", default_value = DEFAULT_WORKER_PROGRAM)]
    worker_program: PathBuf,

    /// Entry script passed to the worker program
    #[arg(long, env = "WORKER_SCRIPT", default_value = DEFAULT_WORKER_SCRIPT)]
    worker_script: PathBuf,

    /// Run the worker program directly, without an entry script
    #[arg(long, default_value_t = false)]
    no_worker_script: bool,

    /// Working directory for worker processes
    #[arg(long, env = "WORKER_DIR")]
    worker_dir: Option<PathBuf>,

    /// Worker timeout in seconds
    #[arg(short = 't', long, env = "WORKER_TIMEOUT_SECS", default_value_t = DEFAULT_WORKER_TIMEOUT.as_secs())]
    worker_timeout: u64,

    /// Cap on captured worker stdout/stderr, in bytes per stream
    #[arg(long, env = "WORKER_MAX_OUTPUT_BYTES", default_value_t = DEFAULT_MAX_WORKER_OUTPUT)]
    worker_max_output: usize,

    /// Request body ceiling in bytes
    #[arg(long, env = "BODY_LIMIT_BYTES", default_value_t = DEFAULT_BODY_LIMIT)]
    body_limit: usize,
}

impl Cli {
    fn into_config(self) -> GatewayConfig {
        GatewayConfig {
            host: self.host,
            port: self.port,
            allowed_origin: self.allowed_origin,
            body_limit: self.body_limit,
            worker: WorkerConfig {
                program: self.worker_program,
                script: (!self.no_worker_script).then_some(self.worker_script),
                working_dir: self.worker_dir,
                timeout: Duration::from_secs(self.worker_timeout),
                max_output_bytes: self.worker_max_output,
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config();
    print_banner(&config);

    let started = Instant::now();
    let worker = Arc::new(ProcessWorker::new(config.worker.clone()));
    let handle = server::serve(&config, worker).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to install ctrl-c handler")?;
    handle.shutdown().await?;

    tracing::info!("gateway shut down");
    print_shutdown(started.elapsed());
    Ok(())
}
