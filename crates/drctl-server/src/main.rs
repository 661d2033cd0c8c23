//! drctl Server
//!
//! gRPC control plane that schedules and lists disaster-recovery jobs.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tonic::transport::Server;
use tracing::info;

use drctl_core::config::{self, Config};
use drctl_core::tracing_init::{default_filter, init_tracing};
use drctl_proto::v1::job_service_server::JobServiceServer;

use drctl_server::jobs::{JobLister, JobScheduler};
use drctl_server::minio::MinioAdmin;
use drctl_server::server::JobServiceImpl;
use drctl_server::storage::ServerDatabase;

#[derive(Parser, Debug)]
#[command(name = "drctl-server")]
#[command(version, about = "drctl server - disaster-recovery job scheduling")]
struct Args {
    /// Path to a JSON config file layered over the global one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Object store endpoint URL.
    #[arg(long)]
    storage_endpoint: Option<String>,

    /// Object store admin access key.
    #[arg(long, env = "DRCTL_STORAGE_ACCESS_KEY", hide_env_values = true)]
    storage_access_key: Option<String>,

    /// Object store admin secret key.
    #[arg(long, env = "DRCTL_STORAGE_SECRET_KEY", hide_env_values = true)]
    storage_secret_key: Option<String>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Apply the command line, the highest-priority config layer.
    fn apply(self, config: &mut Config) {
        if let Some(addr) = self.addr {
            config.server.listen_addr = addr;
        }
        if let Some(path) = self.db_path {
            config.database.path = Some(path);
        }
        if let Some(secs) = self.request_timeout {
            config.server.request_timeout_secs = secs;
        }
        if let Some(endpoint) = self.storage_endpoint {
            config.storage.endpoint = endpoint;
        }
        if let Some(key) = self.storage_access_key {
            config.storage.access_key = key;
        }
        if let Some(secret) = self.storage_secret_key {
            config.storage.secret_key = secret;
        }
        if self.log_json {
            config.server.log_json = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = config::load_config(args.config.as_deref())?;
    args.apply(&mut config);

    init_tracing(
        &default_filter("drctl_server", &config.server.log_level),
        config.server.log_json,
    );

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.listen_addr,
        "Starting drctl-server"
    );

    let db_path = match config.database.path.clone() {
        Some(path) => path,
        None => config::database_path()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine config directory"))?,
    };
    info!(path = %db_path.display(), "Opening server database");
    let db = Arc::new(ServerDatabase::open(&db_path).await?);

    info!(endpoint = %config.storage.endpoint, "Using object store");
    let minio = Arc::new(MinioAdmin::new(&config.storage)?);

    let scheduler = Arc::new(JobScheduler::new(
        Arc::clone(&db) as _,
        Arc::clone(&db) as _,
        minio,
        Arc::clone(&db) as _,
        config.storage.bucket_prefix.clone(),
    ));
    let lister = Arc::new(JobLister::new(Arc::clone(&db) as _, db));
    let jobs = JobServiceImpl::new(scheduler, lister);

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<JobServiceServer<JobServiceImpl>>()
        .await;

    let grpc_router = Server::builder()
        .timeout(Duration::from_secs(config.server.request_timeout_secs))
        .http2_keepalive_interval(Some(Duration::from_secs(30)))
        .http2_keepalive_timeout(Some(Duration::from_secs(10)))
        .add_service(health_service)
        .add_service(JobServiceServer::new(jobs));

    info!(addr = %config.server.listen_addr, "Server listening (plaintext)");

    tokio::select! {
        result = grpc_router.serve(config.server.listen_addr) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Server stopped");
    Ok(())
}
