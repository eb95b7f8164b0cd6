//! Relay client.
//!
//! Connects to the server, then sends each line read from the input until
//! the `exit\n` sentinel has been sent. Traffic is one-directional; the
//! client never reads from the socket.

use crate::config::ClientConfig;
use crate::error::RelayError;
use crate::protocol::{bound_line, LineBound, Message, CLIENT_PROMPT};
use crate::session::{CloseReason, Role, Session};
use std::io::{self, BufRead, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use tracing::{debug, info, warn};

/// A connected relay client.
pub struct Client {
    stream: TcpStream,
    session: Session,
    buffer_size: usize,
}

impl Client {
    /// Connect to the configured server address.
    ///
    /// On failure nothing has been sent and the socket is already closed.
    pub fn connect(config: &ClientConfig) -> Result<Self, RelayError> {
        let mut session = Session::new(Role::Client);
        let stream = TcpStream::connect(config.connect)
            .map_err(|e| RelayError::Connect(config.connect, e))?;

        info!(addr = %config.connect, "Connected to server");
        session.connected(config.connect);

        Ok(Client {
            stream,
            session,
            buffer_size: config.buffer_size,
        })
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.session.peer()
    }

    /// Send lines from `input` until the sentinel is sent or input ends.
    ///
    /// `prompt` receives the interactive prompt before every read.
    pub fn run<R: BufRead, W: Write>(
        mut self,
        input: &mut R,
        prompt: &mut W,
    ) -> Result<Session, RelayError> {
        send_lines(
            input,
            prompt,
            &mut self.stream,
            self.buffer_size,
            &mut self.session,
        )?;

        if let Err(e) = self.stream.shutdown(Shutdown::Write) {
            debug!(error = %e, "Shutdown after session failed");
        }
        Ok(self.session)
    }
}

/// Send loop.
///
/// At most `capacity` bytes of a line (newline included) are read before
/// it is sent with exactly its own length; the rest of an overlong line is
/// discarded after the send. Returns after the sentinel has been
/// written, or when `input` reaches end of file.
pub fn send_lines<R: BufRead, P: Write, W: Write>(
    input: &mut R,
    prompt: &mut P,
    writer: &mut W,
    capacity: usize,
    session: &mut Session,
) -> io::Result<CloseReason> {
    let mut line = Vec::with_capacity(capacity);

    loop {
        prompt.write_all(CLIENT_PROMPT.as_bytes())?;
        prompt.flush()?;

        line.clear();
        if input.by_ref().take(capacity as u64).read_until(b'\n', &mut line)? == 0 {
            info!("Input closed before exit was sent");
            session.close(CloseReason::InputClosed);
            return Ok(CloseReason::InputClosed);
        }
        let overlong = line.len() >= capacity && line.last() != Some(&b'\n');

        let bound = bound_line(&mut line, capacity);
        if bound == LineBound::Terminated {
            debug!("Terminated final input line");
        }

        writer.write_all(&line)?;
        writer.flush()?;

        match Message::classify(&line) {
            Message::Exit => {
                session.close(CloseReason::Sentinel);
                return Ok(CloseReason::Sentinel);
            }
            Message::Line(sent) => session.record(sent.len()),
        }

        if let LineBound::Truncated { dropped } = bound {
            let skipped = if overlong { skip_line(input)? } else { 0 };
            warn!(
                dropped = dropped + skipped,
                max = capacity - 1,
                "Input line too long, truncated"
            );
        }
    }
}

/// Discard input up to and including the next newline.
///
/// Returns the number of content bytes dropped, newline excluded. Never
/// holds more than one `fill_buf` worth of the line in memory.
fn skip_line<R: BufRead>(input: &mut R) -> io::Result<usize> {
    let mut skipped = 0;
    loop {
        let (used, done) = {
            let available = match input.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(skipped);
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (available.len(), false),
            }
        };
        input.consume(used);
        if done {
            return Ok(skipped + used - 1);
        }
        skipped += used;
    }
}
