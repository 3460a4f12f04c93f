use std::io::{BufRead, BufReader};
use std::net::TcpStream;
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

use pbx_core::{Pbx, Tu};
use pbx_proto::{parse_command, Command};

use crate::sink::TcpSink;

/// Drive one client connection end to end: register a TU at this
/// socket's file descriptor, dispatch commands read from the socket
/// until EOF or an I/O error, then unregister it (which hangs it up).
pub fn handle_client(stream: TcpStream, pbx: Arc<Pbx>) {
    let ext = extension_for(&stream);

    let write_half = match stream.try_clone() {
        Ok(s) => s,
        Err(err) => {
            tracing::warn!(%err, "failed to clone client socket");
            return;
        }
    };

    let tu = Tu::new(Box::new(TcpSink::new(write_half)));
    if let Err(err) = pbx.register(tu.clone(), ext) {
        tracing::info!(ext, %err, "rejected new connection");
        return;
    }
    tu.notify();

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\r', '\n']).trim_start();
                dispatch(trimmed, &tu, &pbx);
            }
            Err(err) => {
                tracing::debug!(ext, %err, "read error on client socket");
                break;
            }
        }
    }

    if let Err(err) = pbx.unregister(&tu) {
        tracing::warn!(ext, %err, "unregister failed for disconnecting client");
    }
    tracing::info!(ext, "client disconnected");
}

fn dispatch(line: &str, tu: &Arc<Tu>, pbx: &Pbx) {
    match parse_command(line) {
        Command::Pickup => tu.pickup(),
        Command::Hangup => tu.hangup(),
        Command::Dial(n) => pbx.dial(tu, n),
        Command::Chat(text) => tu.chat(&text),
        Command::Unknown(raw) => {
            if !raw.is_empty() {
                tracing::debug!(line = raw, "ignoring unrecognized command");
            }
        }
    }
}

#[cfg(unix)]
fn extension_for(stream: &TcpStream) -> usize {
    stream.as_raw_fd() as usize
}

#[cfg(not(unix))]
fn extension_for(stream: &TcpStream) -> usize {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    // No stable raw descriptor off Unix; derive a unique-enough slot
    // from the peer address instead.
    let mut hasher = DefaultHasher::new();
    if let Ok(addr) = stream.peer_addr() {
        addr.hash(&mut hasher);
    }
    (hasher.finish() as usize) % pbx_core::MAX_EXTENSIONS
}
