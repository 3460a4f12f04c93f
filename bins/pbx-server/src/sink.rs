use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};

use pbx_core::TuSink;

/// [`TuSink`] backed by a cloned [`TcpStream`] handle. `write_all`
/// already retries on `ErrorKind::Interrupted` and loops until the
/// full line is written, so no retry logic is needed here.
pub struct TcpSink {
    stream: TcpStream,
}

impl TcpSink {
    pub fn new(stream: TcpStream) -> Self {
        TcpSink { stream }
    }
}

impl TuSink for TcpSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(b"\r\n")
    }

    fn shutdown_read(&mut self) {
        // Best-effort: if the peer already closed the socket this is
        // already a no-op error we don't care about.
        let _ = self.stream.shutdown(Shutdown::Read);
    }
}
