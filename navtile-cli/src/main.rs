//! navtile CLI - runs the map service as a standalone daemon.
//!
//! Thin wrapper: parses arguments, initializes logging, starts the map
//! service on a Unix socket and blocks until stdin closes (or "quit" is
//! entered), then stops the service cleanly.

use clap::Parser;
use navtile::ipc::UdsTransport;
use navtile::logging::init_logging;
use navtile::service::{MapService, ServiceConfig};
use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use tracing::info;

#[derive(Parser)]
#[command(name = "navtile", version)]
#[command(about = "Serve road-network tile queries over a Unix socket", long_about = None)]
struct Args {
    /// Path to the tile index file (synthetic demo data when omitted)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Unix socket path for the IPC channel
    #[arg(long, default_value = "/tmp/navtile.sock")]
    socket: PathBuf,

    /// Maximum number of decoded tiles kept in memory
    #[arg(long, default_value = "32")]
    cache_capacity: usize,

    /// Nearest-node search radius in meters
    #[arg(long, default_value = "500")]
    search_radius: f64,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: String,
}

fn main() {
    let args = Args::parse();

    let _guard = match init_logging(&args.log_dir, "navtile.log") {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {}", e);
            process::exit(1);
        }
    };

    let mut config = ServiceConfig::default()
        .with_cache_capacity(args.cache_capacity)
        .with_search_radius_m(args.search_radius);
    if let Some(data) = args.data {
        config = config.with_data_path(data);
    }

    let mut service = MapService::new(config);
    if let Err(e) = service.initialize() {
        eprintln!("Error initializing map service: {}", e);
        process::exit(1);
    }

    let transport = match UdsTransport::bind(&args.socket) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error binding socket {}: {}", args.socket.display(), e);
            process::exit(1);
        }
    };

    if let Err(e) = service.start(Box::new(transport)) {
        eprintln!("Error starting map service: {}", e);
        process::exit(1);
    }

    info!(
        socket = %args.socket.display(),
        version = navtile::VERSION,
        "navtile serving; enter \"quit\" (or close stdin) to stop"
    );

    // Block until the operator asks us to exit.
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(text) if text.trim() == "quit" => break,
            Ok(_) => continue,
            Err(_) => break,
        }
    }

    service.stop();
}
