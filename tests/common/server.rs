//! Server end of a scripted connection.

use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};
use tokio::time::timeout;

/// Plays the IRC server on one in-memory connection.
pub struct TestServer {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl TestServer {
    pub fn new(stream: DuplexStream) -> Self {
        let (read_half, writer) = tokio::io::split(stream);
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    /// Send a raw line; CR-LF is appended.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive the next line from the client.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a line with a timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let line = timeout(dur, self.lines.next_line())
            .await??
            .ok_or_else(|| anyhow::anyhow!("client closed the connection"))?;
        Ok(line.trim_end_matches('\r').to_string())
    }

    /// Receive lines until `predicate` matches; returns everything received.
    #[allow(dead_code)]
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<String>>
    where
        F: FnMut(&str) -> bool,
    {
        let mut received = Vec::new();
        loop {
            let line = self.recv().await?;
            let done = predicate(&line);
            received.push(line);
            if done {
                return Ok(received);
            }
        }
    }

    /// Complete registration: read NICK and USER, answer with end of MOTD.
    #[allow(dead_code)]
    pub async fn register(&mut self) -> anyhow::Result<(String, String)> {
        let nick = self.recv().await?;
        let user = self.recv().await?;
        self.send_raw(":irc.test 376 troetbot :End of /MOTD command.")
            .await?;
        Ok((nick, user))
    }
}
