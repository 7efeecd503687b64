//! vpnmgr - Multi-Session VPN Manager CLI
//!
//! Drives one or more client sessions from JSON profile files against the
//! simulated tunnel engine, printing events and final statistics.
//!
//! # Usage
//!
//! ```bash
//! # Run one session for 10 seconds
//! vpnmgr --profile office.json
//!
//! # Run several sessions with verbose logging
//! vpnmgr -p office.json -p backup.json --duration 30 --verbose
//! ```

use clap::Parser;
use libvpnmgr::{SessionConfig, SessionManager, SimulatedEngine, VpnmgrError, VpnmgrResult};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Multi-Session VPN Manager
#[derive(Parser, Debug)]
#[command(name = "vpnmgr")]
#[command(author = "vpnmgr contributors")]
#[command(version)]
#[command(about = "Drive VPN client sessions from profile files and watch their events", long_about = None)]
struct Args {
    /// JSON session profile file (repeatable, one session each)
    #[arg(short, long, required = true)]
    profile: Vec<PathBuf>,

    /// Seconds to keep the sessions running
    #[arg(short, long, default_value_t = 10)]
    duration: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> VpnmgrResult<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting vpnmgr");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let manager = SessionManager::new(Arc::new(SimulatedEngine::new()));

    // Create and connect one session per profile
    let mut ids = Vec::new();
    for path in &args.profile {
        let config = match SessionConfig::from_file(path).await {
            Ok(config) => config,
            Err(e) => {
                error!("✗ Failed to load profile {:?}: {}", path, e);
                return Err(e);
            }
        };

        let id = manager.create_session(config).await?;
        manager.connect(id).await?;
        info!("✓ Session {} started from {:?}", id, path);
        ids.push(id);
    }

    // Drain and print events until the run duration elapses
    let deadline = tokio::time::Instant::now() + Duration::from_secs(args.duration);
    while tokio::time::Instant::now() < deadline {
        for &id in &ids {
            while let Some(event) = manager.next_event(id).await? {
                info!(
                    "[session {}] {} ({}): {}",
                    event.session_id,
                    event.event_type,
                    event.state,
                    event.message
                );
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    // Final per-session report
    for &id in &ids {
        match manager.test_latency(id).await {
            Ok(latency_ms) => info!("Session {} latency: {} ms", id, latency_ms),
            Err(VpnmgrError::NotConnected(_)) => warn!("Session {} never connected", id),
            Err(e) => warn!("Session {} latency probe failed: {}", id, e),
        }

        let stats = manager.get_stats(id).await?;
        info!(
            "Session {} totals: {}",
            id,
            serde_json::to_string(&stats).unwrap_or_else(|_| "<unserializable>".to_string())
        );
    }

    info!("Shutting down {} session(s)...", ids.len());
    manager.shutdown().await;
    info!("vpnmgr stopped");

    Ok(())
}

/// Initialize logging based on command-line arguments
fn init_logging(args: &Args) {
    let log_level = if args.verbose {
        "debug"
    } else {
        &args.log_level
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            EnvFilter::new(format!("vpnmgr={},libvpnmgr={}", log_level, log_level))
        });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(atty::is(atty::Stream::Stdout))
        .init();
}
