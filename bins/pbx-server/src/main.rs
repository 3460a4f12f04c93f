mod client;
mod logging;
mod sink;

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use signal_hook::consts::signal::SIGHUP;
use signal_hook::flag;

use pbx_config::ServerConfig;
use pbx_core::Pbx;

fn main() {
    logging::setup_logging_default();

    let config = ServerConfig::from_args();
    let pbx = Arc::new(Pbx::new());

    let shutdown_requested = Arc::new(AtomicBool::new(false));
    if let Err(err) = flag::register(SIGHUP, Arc::clone(&shutdown_requested)) {
        tracing::error!(%err, "failed to install SIGHUP handler");
        std::process::exit(1);
    }
    spawn_shutdown_watcher(Arc::clone(&pbx), Arc::clone(&shutdown_requested));

    let listener = match TcpListener::bind(("0.0.0.0", config.port)) {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(port = config.port, %err, "failed to bind listening socket");
            std::process::exit(1);
        }
    };
    tracing::info!(port = config.port, "pbx server listening");

    for incoming in listener.incoming() {
        match incoming {
            Ok(stream) => {
                let pbx = Arc::clone(&pbx);
                thread::spawn(move || client::handle_client(stream, pbx));
            }
            Err(err) => {
                tracing::warn!(%err, "failed to accept a connection");
            }
        }
    }
}

/// Poll `shutdown_requested` (set by the SIGHUP handler) and, once it
/// fires, drain the registry and exit the process. A dedicated thread
/// keeps this off the accept loop, which has no natural point to
/// check a flag while blocked in `accept(2)`.
fn spawn_shutdown_watcher(pbx: Arc<Pbx>, shutdown_requested: Arc<AtomicBool>) {
    thread::spawn(move || loop {
        if shutdown_requested.load(Ordering::Relaxed) {
            tracing::info!("SIGHUP received, draining connections");
            pbx.shutdown();
            tracing::info!("drain complete, exiting");
            std::process::exit(0);
        }
        thread::sleep(Duration::from_millis(200));
    });
}
