//! driftkv - A Single-Threaded In-Memory Key-Value Store
//!
//! This is the main entry point for the driftkv server.
//! It parses the configuration, rebuilds the keyspace from the append-only
//! file, and runs the event loop until SIGINT or SIGTERM.

use anyhow::Context;
use clap::Parser;
use driftkv::commands::CommandHandler;
use driftkv::persistence::{AofConfig, AppendOnlyLog, FsyncPolicy};
use driftkv::server::{Server, ServerConfig};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use tokio::signal;
use tracing::info;

/// Server configuration
#[derive(Parser, Debug)]
#[command(name = "driftkv", version, about = "driftkv - single-threaded in-memory key-value store")]
struct Args {
    /// Port to listen on
    #[arg(env = "PORT", default_value_t = driftkv::DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = driftkv::DEFAULT_HOST)]
    host: String,

    /// Append-only file location
    #[arg(long, env = "AOF_PATH", value_name = "FILE", default_value = driftkv::DEFAULT_AOF_PATH)]
    aof_path: PathBuf,

    /// Run purely in memory, without an append-only file
    #[arg(long)]
    no_aof: bool,

    /// When to fsync the append-only file: always, everysec or no
    #[arg(long, default_value = "everysec", value_parser = parse_fsync)]
    fsync: FsyncPolicy,
}

impl Args {
    /// Resolves `host:port` to the first matching socket address.
    fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))?
            .next()
            .with_context(|| format!("{}:{} did not resolve to an address", self.host, self.port))
    }
}

fn parse_fsync(s: &str) -> Result<FsyncPolicy, String> {
    s.parse()
}

fn print_banner(addr: SocketAddr, persistence: &str) {
    println!(
        r#"
     _      _  __ _   _
  __| |_ __(_)/ _| |_| | ____   __
 / _` | '__| | |_| __| |/ /\ \ / /
| (_| | |  | |  _| |_|   <  \ V /
 \__,_|_|  |_|_|  \__|_|\_\  \_/

driftkv v{} - Single-Threaded In-Memory Key-Value Store
──────────────────────────────────────────────────────────────
Listening on   {}
Append-only    {}

Use Ctrl+C to shutdown gracefully.
"#,
        driftkv::VERSION,
        addr,
        persistence
    );
}

/// Resolves when SIGINT (or SIGTERM on unix) arrives.
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    signal::ctrl_c().await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments (CLI beats environment beats defaults)
    let args = Args::parse();

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driftkv=info".into()),
        )
        .with_target(false)
        .init();

    let addr = args.bind_address()?;

    // Open the append-only file and rebuild the keyspace from it
    let mut handler = if args.no_aof {
        info!("Persistence disabled");
        CommandHandler::new()
    } else {
        let config = AofConfig {
            fsync: args.fsync,
            ..AofConfig::default()
        };
        let aof = AppendOnlyLog::open(&args.aof_path, config)?;
        CommandHandler::with_aof(aof)
    };

    let persistence = match handler.aof_mut() {
        Some(log) => format!("{} (fsync {:?})", log.path().display(), log.config().fsync),
        None => "disabled".to_string(),
    };

    let summary = handler.replay_aof()?;
    if summary.frames > 0 {
        info!(
            commands = summary.frames,
            keys = handler.storage().len(),
            "Keyspace restored from append-only file"
        );
    }

    let server = Server::bind(ServerConfig { addr, ..ServerConfig::default() }, handler)
        .with_context(|| format!("failed to bind {}", addr))?;
    let shutdown = server.shutdown_handle();

    print_banner(server.local_addr()?, &persistence);
    info!(addr = %addr, "Server started");

    // The event loop blocks, so it gets its own thread
    let mut event_loop = tokio::task::spawn_blocking(move || server.run());

    tokio::select! {
        result = &mut event_loop => {
            result??;
        }
        signal = shutdown_signal() => {
            signal?;
            info!("Shutdown signal received, stopping server...");
            shutdown.trigger();
            event_loop.await??;
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
