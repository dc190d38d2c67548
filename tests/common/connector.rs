//! Connector that replays prepared streams.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{DuplexStream, duplex};
use troet_bridge::error::TransportError;
use troet_bridge::irc::Connector;

use super::server::TestServer;

/// Hands out one prepared stream per connect; fails once they run out.
#[derive(Default)]
pub struct ScriptedConnector {
    streams: Mutex<VecDeque<DuplexStream>>,
    attempts: AtomicUsize,
}

impl ScriptedConnector {
    /// Prepare the next connection and return its server end.
    pub fn accept_next(&self) -> TestServer {
        let (client, server) = duplex(16 * 1024);
        self.streams.lock().push_back(client);
        TestServer::new(server)
    }

    /// Prepare a connection whose server side is already gone.
    #[allow(dead_code)]
    pub fn dead_next(&self) {
        let (client, server) = duplex(1024);
        drop(server);
        self.streams.lock().push_back(client);
    }

    /// Number of connect calls so far.
    #[allow(dead_code)]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Stream = DuplexStream;

    async fn connect(&self) -> Result<DuplexStream, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.streams.lock().pop_front().ok_or(TransportError::Closed)
    }
}
