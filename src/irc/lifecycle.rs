//! Connection lifecycle.
//!
//! One task owns the transport and runs this loop:
//!
//! 1. `Connecting`: open the transport, sleeping the backoff between failures.
//! 2. `Registering`: drop control lines left over from the previous
//!    connection and queue NICK/USER; the dispatch table moves the session
//!    to `Active` once the end of the MOTD arrives. Queued chat text is held
//!    back until then.
//! 3. Each iteration sets a short read deadline. Data is framed and
//!    dispatched; a timeout drains the outbound queue; EOF or an I/O error
//!    tears the connection down and goes back to step 1.
//!
//! Retries are unbounded. Cancellation is checked at the top of every
//! iteration and also interrupts pending reads, connects and sleeps.

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use troet_proto::{LifecycleState, LineFramer, Message};

use super::dispatch::DispatchTable;
use super::session::Session;
use super::transport::Connector;
use crate::error::TransportError;

const READ_BUFFER_SIZE: usize = 4096;

/// Upper bound for a single write before the link is considered dead.
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Timing knobs of the lifecycle loop.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleTimings {
    /// Read deadline per iteration; also the drain interval.
    pub read_timeout: Duration,
    /// Delay after a failed or lost connection.
    pub reconnect_backoff: Duration,
}

/// How a served connection ended.
enum Ended {
    Cancelled,
    Failed(TransportError),
}

/// The IRC client: owns the connector and drives the lifecycle.
pub struct IrcClient<C: Connector> {
    connector: C,
    session: Arc<Session>,
    dispatch: DispatchTable,
    timings: LifecycleTimings,
}

impl<C: Connector> IrcClient<C> {
    pub fn new(
        connector: C,
        session: Arc<Session>,
        dispatch: DispatchTable,
        timings: LifecycleTimings,
    ) -> Self {
        Self {
            connector,
            session,
            dispatch,
            timings,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Run until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.session.set_state(LifecycleState::Connecting);

            let connected = tokio::select! {
                _ = cancel.cancelled() => break,
                res = self.connector.connect() => res,
            };

            match connected {
                Ok(stream) => match self.serve(stream, &cancel).await {
                    Ended::Cancelled => break,
                    Ended::Failed(e) => {
                        warn!(error = %e, "IRC connection lost");
                        self.session.set_state(LifecycleState::Disconnected);
                        self.session.operators().clear();
                    }
                },
                Err(e) => warn!(error = %e, "IRC connect failed"),
            }

            debug!(backoff = ?self.timings.reconnect_backoff, "Waiting before reconnect");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.timings.reconnect_backoff) => {}
            }
        }

        self.session.set_state(LifecycleState::Disconnected);
        info!("IRC client stopped");
    }

    async fn serve(&self, mut stream: C::Stream, cancel: &CancellationToken) -> Ended {
        let outbox = self.session.outbox();
        let dropped = outbox.discard_control();
        if dropped > 0 {
            info!(dropped, "Discarded control lines queued for the previous connection");
        }

        let identity = self.session.identity();
        self.session.reset_nick();
        self.session.enqueue(Message::nick(&identity.nick));
        self.session.enqueue(Message::user(&identity.nick, &identity.realname));
        self.session.set_state(LifecycleState::Registering);

        let mut framer = LineFramer::new();
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            if cancel.is_cancelled() {
                self.shutdown(&mut stream).await;
                return Ended::Cancelled;
            }

            let read = tokio::select! {
                _ = cancel.cancelled() => continue,
                r = timeout(self.timings.read_timeout, stream.read(&mut buf)) => r,
            };

            let result = match read {
                Err(_elapsed) => self.drain(&mut stream).await,
                Ok(Ok(0)) => Err(TransportError::Closed),
                Ok(Ok(n)) => self.process(&mut framer, &buf[..n]),
                Ok(Err(e)) => Err(e.into()),
            };

            if let Err(e) = result {
                return Ended::Failed(e);
            }
        }
    }

    fn process(&self, framer: &mut LineFramer, chunk: &[u8]) -> Result<(), TransportError> {
        for line in framer.push(chunk)? {
            let line = String::from_utf8_lossy(&line);
            self.dispatch.dispatch(&line, &self.session);
        }
        Ok(())
    }

    /// Write every queued line that may go out now. Text lines wait until
    /// the session is `Active`. A failed line goes back to its lane's head.
    async fn drain<S>(&self, stream: &mut S) -> Result<(), TransportError>
    where
        S: AsyncWrite + Unpin,
    {
        let outbox = self.session.outbox();
        let text_ready = self.session.state() == LifecycleState::Active;
        let mut wrote = false;

        while let Some((lane, line)) = outbox.pop(text_ready) {
            let framed = format!("{line}\r\n");
            match timeout(WRITE_TIMEOUT, stream.write_all(framed.as_bytes())).await {
                Ok(Ok(())) => wrote = true,
                Ok(Err(e)) => {
                    outbox.requeue_front(lane, line);
                    return Err(e.into());
                }
                Err(_) => {
                    outbox.requeue_front(lane, line);
                    return Err(std::io::Error::from(std::io::ErrorKind::TimedOut).into());
                }
            }
        }

        if wrote {
            stream.flush().await?;
        }
        Ok(())
    }

    /// Say goodbye and close the transport. Errors no longer matter here.
    async fn shutdown<S>(&self, stream: &mut S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut result = self.drain(stream).await;
        if result.is_ok() && self.session.state() == LifecycleState::Active {
            self.session.enqueue(Message::quit("Bridge shutting down"));
            result = self.drain(stream).await;
        }
        if let Err(e) = result {
            debug!(error = %e, "Final drain failed");
        }
        let _ = stream.shutdown().await;
    }
}
