use clap::{Parser, Subcommand};
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "fetchfan")]
#[command(about = "Concurrent fan-out fetch proxy and worker-offload demo", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the WebSocket fetch proxy
    Proxy(ProxyArgs),
    /// Run the compute-offload HTTP service
    Sleepy(SleepyArgs),
}

#[derive(clap::Args, Debug)]
pub struct ProxyArgs {
    /// Address to bind the proxy to
    #[arg(long, default_value = "127.0.0.1:8082")]
    pub address: SocketAddr,
}

#[derive(clap::Args, Debug)]
pub struct SleepyArgs {
    /// Address to bind the service to
    #[arg(long, default_value = "127.0.0.1:8081")]
    pub address: SocketAddr,

    /// Number of worker threads for background jobs
    #[arg(long, default_value_t = 2)]
    pub workers: usize,
}
