use std::io;

/// A TU's outbound byte-stream write capability, plus the ability to
/// shut down the read side so a blocked driver read returns EOF during
/// registry shutdown.
///
/// Writes are expected to behave like [`std::io::Write::write_all`]:
/// retry on `ErrorKind::Interrupted`, loop until the full line is
/// transmitted, and never drop partial output. A real socket-backed
/// implementation gets this for free from `write_all` itself.
pub trait TuSink: Send {
    /// Write one CRLF-terminated line. `line` does not include the
    /// terminator; implementations append `\r\n`.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Shut down the read half of the underlying transport, if any,
    /// causing a blocked driver read to observe EOF. Best-effort: errors
    /// are not actionable here and should be logged by the caller.
    fn shutdown_read(&mut self);
}
